//! System clipboard access.
//!
//! Writes run on a blocking task so the UI loop never waits on the display
//! server. Completions come back through a channel and are drained by
//! `App::tick`.

use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::guide::Side;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("clipboard write rejected: {0}")]
    Rejected(String),
}

/// Something text can be written to
pub trait ClipboardBackend: Send {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The desktop clipboard
///
/// The arboard handle is kept alive after the first write: on X11 the
/// copied text disappears when its owner is dropped.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl ClipboardBackend for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.inner.is_none() {
            let clipboard = arboard::Clipboard::new()
                .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            self.inner = Some(clipboard);
        }

        match self.inner.as_mut() {
            Some(cb) => cb
                .set_text(text.to_string())
                .map_err(|e| ClipboardError::Rejected(e.to_string())),
            None => Err(ClipboardError::Unavailable("not initialized".to_string())),
        }
    }
}

/// Which command block asked for a copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyTarget {
    pub guide_id: u64,
    pub side: Side,
    pub step: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOutcome {
    pub target: CopyTarget,
    pub result: Result<(), ClipboardError>,
}

pub struct ClipboardWorker {
    backend: Arc<Mutex<Box<dyn ClipboardBackend>>>,
    tx: UnboundedSender<CopyOutcome>,
    rx: UnboundedReceiver<CopyOutcome>,
}

impl ClipboardWorker {
    pub fn new(backend: Box<dyn ClipboardBackend>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            backend: Arc::new(Mutex::new(backend)),
            tx,
            rx,
        }
    }

    pub fn system() -> Self {
        Self::new(Box::new(SystemClipboard::default()))
    }

    /// Start writing `text`. The outcome shows up in a later `poll()`.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn request(&self, target: CopyTarget, text: String) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();

        tokio::task::spawn_blocking(move || {
            let result = match backend.lock() {
                Ok(mut cb) => cb.set_text(&text),
                Err(_) => Err(ClipboardError::Unavailable("clipboard lock poisoned".to_string())),
            };

            match &result {
                Ok(()) => tracing::debug!("Copied {} bytes to clipboard", text.len()),
                Err(e) => tracing::warn!("Clipboard write failed: {}", e),
            }

            // Receiver only goes away on shutdown
            let _ = tx.send(CopyOutcome { target, result });
        });
    }

    /// Drain finished writes without blocking
    pub fn poll(&mut self) -> Vec<CopyOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(outcome) = self.rx.try_recv() {
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Wait for the next finished write
    #[cfg(test)]
    pub async fn next(&mut self) -> Option<CopyOutcome> {
        self.rx.recv().await
    }
}
