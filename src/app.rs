use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::clipboard::ClipboardWorker;
use crate::config::{AppConfig, Connection};
use crate::modal::{GuideEvent, SetupGuide};

/// How long status messages stay in the info line
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Guide,
    Help,
}

pub struct App {
    pub popup: Popup,

    pub config: AppConfig,
    pub config_path: Option<PathBuf>,  // None when running on an ad-hoc connection

    pub selected: usize,

    /// Mounted only while `popup == Popup::Guide`
    pub guide: Option<SetupGuide>,
    next_guide_id: u64,

    clipboard: ClipboardWorker,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,
}

impl App {
    pub fn new(config: AppConfig, config_path: Option<PathBuf>, clipboard: ClipboardWorker) -> Self {
        Self {
            popup: Popup::None,
            config,
            config_path,
            selected: 0,
            guide: None,
            next_guide_id: 1,
            clipboard,
            status_message: None,
            status_message_time: None,
        }
    }

    pub fn connections(&self) -> &[Connection] {
        &self.config.connections
    }

    pub fn selected_connection(&self) -> Option<&Connection> {
        self.config.connections.get(self.selected)
    }

    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    /// Mount the guide for `connection`
    pub fn open_guide(&mut self, connection: Connection) {
        tracing::info!("Opening setup guide for {}", connection.name);
        let id = self.next_guide_id;
        self.next_guide_id += 1;
        self.guide = Some(SetupGuide::new(id, connection, &self.config.stream_url));
        self.popup = Popup::Guide;
    }

    /// Unmount the guide. Pending copy results for it are dropped on arrival.
    pub fn close_guide(&mut self) {
        self.guide = None;
        self.popup = Popup::None;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.popup {
            Popup::Guide => {
                let event = self.guide.as_mut().and_then(|g| g.handle_key(key));
                self.apply_guide_event(event);
                Ok(())
            }
            Popup::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Enter | KeyCode::Char('q')) {
                    self.popup = Popup::None;
                }
                Ok(())
            }
            Popup::None => self.handle_normal_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected + 1 < self.config.connections.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('g') => {
                match self.selected_connection().cloned() {
                    Some(conn) => self.open_guide(conn),
                    None => self.set_status("No connection selected"),
                }
            }
            KeyCode::Char('R') => self.reload_config()?,
            KeyCode::Char('?') | KeyCode::Char('h') => self.popup = Popup::Help,
            _ => {}
        }
        Ok(())
    }

    /// Left click at a terminal cell; `area` is the full frame
    pub fn handle_click(&mut self, area: Rect, column: u16, row: u16) {
        match self.popup {
            Popup::Guide => {
                let event = self.guide.as_ref().and_then(|g| g.handle_click(area, column, row));
                self.apply_guide_event(event);
            }
            Popup::Help => self.popup = Popup::None,
            Popup::None => {}
        }
    }

    fn apply_guide_event(&mut self, event: Option<GuideEvent>) {
        match event {
            Some(GuideEvent::Close) => self.close_guide(),
            Some(GuideEvent::Copy { target, text }) => {
                tracing::debug!("Copy requested for {:?}", target);
                self.clipboard.request(target, text);
            }
            None => {}
        }
    }

    fn reload_config(&mut self) -> Result<()> {
        let Some(path) = self.config_path.clone() else {
            self.set_status("Ad-hoc connection, nothing to reload");
            return Ok(());
        };

        self.config = AppConfig::load_from(&path)?;
        if self.selected >= self.config.connections.len() {
            self.selected = self.config.connections.len().saturating_sub(1);
        }
        self.set_status(format!("Reloaded {} connection(s)", self.config.connections.len()));
        Ok(())
    }

    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Apply finished clipboard writes and advance timers
    pub fn tick_at(&mut self, now: Instant) {
        for outcome in self.clipboard.poll() {
            let applied = self
                .guide
                .as_mut()
                .map(|g| g.finish_copy(outcome.target, &outcome.result, now))
                .unwrap_or(false);
            if !applied {
                tracing::debug!("Dropping copy result for closed guide {}", outcome.target.guide_id);
            }
        }

        if let Some(guide) = self.guide.as_mut() {
            guide.tick(now);
        }

        if let Some(time) = self.status_message_time {
            if now.saturating_duration_since(time) >= STATUS_TIMEOUT {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }
}
