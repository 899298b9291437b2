use std::time::{Duration, Instant};

use crate::clipboard::ClipboardError;

/// How long the copied/failed label stays up
pub const FLASH_DURATION: Duration = Duration::from_millis(2000);

pub const LABEL_IDLE: &str = "󰆏 Copy";
pub const LABEL_COPIED: &str = "󰄬 Copied!";
pub const LABEL_FAILED: &str = "󰅖 Copy failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyState {
    Idle,
    Copied,
    Failed,
}

/// Copy label with its auto-revert timer
///
/// At most one reset is pending: every new result replaces the deadline.
/// While a write is in flight the current label is held.
#[derive(Debug, Clone)]
pub struct CopyButton {
    state: CopyState,
    reset_at: Option<Instant>,
    in_flight: usize,
}

impl Default for CopyButton {
    fn default() -> Self {
        Self {
            state: CopyState::Idle,
            reset_at: None,
            in_flight: 0,
        }
    }
}

impl CopyButton {
    pub fn state(&self) -> CopyState {
        self.state
    }

    #[cfg(test)]
    pub fn reset_at(&self) -> Option<Instant> {
        self.reset_at
    }

    /// A clipboard write was started for this button
    pub fn request(&mut self) {
        self.in_flight += 1;
    }

    /// Apply a finished clipboard write observed at `now`
    pub fn finish(&mut self, result: &Result<(), ClipboardError>, now: Instant) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.state = match result {
            Ok(()) => CopyState::Copied,
            Err(_) => CopyState::Failed,
        };
        self.reset_at = Some(now + FLASH_DURATION);
    }

    /// Revert to idle once the deadline has passed and no write is pending
    pub fn tick(&mut self, now: Instant) {
        if self.in_flight > 0 {
            return;
        }
        if let Some(deadline) = self.reset_at {
            if now >= deadline {
                self.state = CopyState::Idle;
                self.reset_at = None;
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self.state {
            CopyState::Idle => LABEL_IDLE,
            CopyState::Copied => LABEL_COPIED,
            CopyState::Failed => LABEL_FAILED,
        }
    }
}

/// A command shown to the user together with its copy button
#[derive(Debug, Clone)]
pub struct CommandBlock {
    text: String,
    pub copy: CopyButton,
}

impl CommandBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            copy: CopyButton::default(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text to hand to the clipboard, or `None` when there is nothing to copy
    pub fn copy_request(&self) -> Option<String> {
        if self.text.is_empty() {
            None
        } else {
            Some(self.text.clone())
        }
    }
}
