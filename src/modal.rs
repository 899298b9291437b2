//! The setup guide dialog and the popup geometry it is clicked through.
//!
//! The dialog never hides itself. Close requests are handed back to the
//! owner as `GuideEvent::Close`, the owner decides what to unmount.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use std::time::Instant;

use crate::clipboard::{ClipboardError, CopyTarget};
use crate::config::Connection;
use crate::copy::CommandBlock;
use crate::guide::{self, Side, Step};

/// Label drawn in the top-right corner of the panel border
pub const CLOSE_LABEL: &str = " [x] ";

/// What a click landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Backdrop,
    Close,
    Panel,
}

/// Geometry of a popup centered over the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalShell {
    pub panel: Rect,
}

impl ModalShell {
    pub fn for_area(area: Rect) -> Self {
        let panel = centered_rect(
            if area.width < 100 { 95 } else { 80 },
            if area.height < 30 { 95 } else { 85 },
            area,
        );
        Self { panel }
    }

    /// Cells covered by the close label on the top border
    pub fn close_button(&self) -> Rect {
        let width = CLOSE_LABEL.chars().count() as u16;
        Rect {
            x: self.panel.right().saturating_sub(1 + width).max(self.panel.x),
            y: self.panel.y,
            width: width.min(self.panel.width),
            height: 1,
        }
    }

    pub fn hit(&self, column: u16, row: u16) -> Hit {
        let pos = Position::new(column, row);
        if self.close_button().contains(pos) {
            Hit::Close
        } else if self.panel.contains(pos) {
            Hit::Panel
        } else {
            Hit::Backdrop
        }
    }
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Requests the dialog hands to its owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuideEvent {
    Close,
    Copy { target: CopyTarget, text: String },
}

#[derive(Debug, Clone)]
pub struct GuideStep {
    pub step: Step,
    pub block: Option<CommandBlock>,
}

impl GuideStep {
    fn new(step: Step) -> Self {
        let block = step.command.as_deref().map(CommandBlock::new);
        Self { step, block }
    }
}

/// A mounted setup guide for one connection
#[derive(Debug, Clone)]
pub struct SetupGuide {
    id: u64,
    pub connection: Connection,
    pub side: Side,
    pub selected: usize,  // Step index on the current side
    server: Vec<GuideStep>,
    client: Vec<GuideStep>,
}

impl SetupGuide {
    pub fn new(id: u64, connection: Connection, stream_url: &str) -> Self {
        let server = guide::server_steps(&connection)
            .into_iter()
            .map(GuideStep::new)
            .collect();
        let client = guide::client_steps(&connection, stream_url)
            .into_iter()
            .map(GuideStep::new)
            .collect();

        let mut guide = Self {
            id,
            connection,
            side: Side::Server,
            selected: 0,
            server,
            client,
        };
        guide.selected = guide.first_command().unwrap_or(0);
        guide
    }

    pub fn steps(&self, side: Side) -> &[GuideStep] {
        match side {
            Side::Server => &self.server,
            Side::Client => &self.client,
        }
    }

    fn steps_mut(&mut self, side: Side) -> &mut [GuideStep] {
        match side {
            Side::Server => &mut self.server,
            Side::Client => &mut self.client,
        }
    }

    fn first_command(&self) -> Option<usize> {
        self.steps(self.side).iter().position(|s| s.block.is_some())
    }

    pub fn switch_side(&mut self, side: Side) {
        if self.side != side {
            self.side = side;
            self.selected = self.first_command().unwrap_or(0);
        }
    }

    fn move_selection(&mut self, down: bool) {
        let steps = self.steps(self.side);
        let candidates: Vec<usize> = steps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.block.is_some())
            .map(|(i, _)| i)
            .collect();

        let next = if down {
            candidates.iter().copied().find(|&i| i > self.selected)
        } else {
            candidates.iter().rev().copied().find(|&i| i < self.selected)
        };
        if let Some(i) = next {
            self.selected = i;
        }
    }

    /// Copy request for the selected step, if it has a non-empty command.
    /// The step's label is held until the write reports back.
    pub fn copy_selected(&mut self) -> Option<GuideEvent> {
        let (side, selected) = (self.side, self.selected);
        let block = self
            .steps_mut(side)
            .get_mut(selected)?
            .block
            .as_mut()?;
        let text = block.copy_request()?;
        block.copy.request();

        Some(GuideEvent::Copy {
            target: CopyTarget {
                guide_id: self.id,
                side: self.side,
                step: self.selected,
            },
            text,
        })
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<GuideEvent> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Some(GuideEvent::Close),
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Left | KeyCode::Right => {
                self.switch_side(self.side.other());
            }
            KeyCode::Char('s') => self.switch_side(Side::Server),
            KeyCode::Char('l') => self.switch_side(Side::Client),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(true),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(false),
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('c') => {
                return self.copy_selected();
            }
            _ => {}
        }
        None
    }

    /// Left click at a terminal cell, `area` being the full frame
    pub fn handle_click(&self, area: Rect, column: u16, row: u16) -> Option<GuideEvent> {
        match ModalShell::for_area(area).hit(column, row) {
            Hit::Backdrop | Hit::Close => Some(GuideEvent::Close),
            Hit::Panel => None,
        }
    }

    /// Apply a clipboard result. Results for other guides are ignored.
    pub fn finish_copy(&mut self, target: CopyTarget, result: &Result<(), ClipboardError>, now: Instant) -> bool {
        if target.guide_id != self.id {
            return false;
        }
        match self
            .steps_mut(target.side)
            .get_mut(target.step)
            .and_then(|s| s.block.as_mut())
        {
            Some(block) => {
                block.copy.finish(result, now);
                true
            }
            None => false,
        }
    }

    pub fn tick(&mut self, now: Instant) {
        for step in self.server.iter_mut().chain(self.client.iter_mut()) {
            if let Some(block) = step.block.as_mut() {
                block.copy.tick(now);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::copy::CopyState;
    use crossterm::event::KeyModifiers;
    use std::time::Duration;

    fn office() -> Connection {
        Connection::new("Office", "10.0.0.5", "10.0.0.9")
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn area() -> Rect {
        Rect::new(0, 0, 120, 40)
    }

    #[test]
    fn test_backdrop_click_closes_once() {
        let guide = SetupGuide::new(1, office(), "u");

        let events: Vec<GuideEvent> = guide.handle_click(area(), 0, 0).into_iter().collect();
        assert_eq!(events, vec![GuideEvent::Close]);
    }

    #[test]
    fn test_click_inside_panel_does_not_close() {
        let guide = SetupGuide::new(1, office(), "u");
        let shell = ModalShell::for_area(area());
        let center = (
            shell.panel.x + shell.panel.width / 2,
            shell.panel.y + shell.panel.height / 2,
        );

        assert_eq!(guide.handle_click(area(), center.0, center.1), None);
        // Corners and borders belong to the panel too
        assert_eq!(guide.handle_click(area(), shell.panel.x, shell.panel.y), None);
        assert_eq!(
            guide.handle_click(area(), shell.panel.right() - 1, shell.panel.bottom() - 1),
            None
        );
    }

    #[test]
    fn test_close_button_hit() {
        let shell = ModalShell::for_area(area());
        let close = shell.close_button();

        assert_eq!(close.y, shell.panel.y);
        assert_eq!(close.right(), shell.panel.right() - 1);
        assert_eq!(shell.hit(close.x, close.y), Hit::Close);
        assert_eq!(shell.hit(close.x, close.y + 1), Hit::Panel);
        assert_eq!(shell.hit(shell.panel.x.saturating_sub(1), close.y), Hit::Backdrop);
    }

    #[test]
    fn test_escape_requests_close() {
        let mut guide = SetupGuide::new(1, office(), "u");
        assert_eq!(guide.handle_key(key(KeyCode::Esc)), Some(GuideEvent::Close));
        assert_eq!(guide.handle_key(key(KeyCode::Char('q'))), Some(GuideEvent::Close));
    }

    #[test]
    fn test_copy_selected_targets_current_step() {
        let mut guide = SetupGuide::new(7, office(), "u");
        guide.handle_key(key(KeyCode::Tab));
        assert_eq!(guide.side, Side::Client);

        let event = guide.handle_key(key(KeyCode::Enter));
        assert_eq!(
            event,
            Some(GuideEvent::Copy {
                target: CopyTarget { guide_id: 7, side: Side::Client, step: 0 },
                text: "nc -zv 10.0.0.5 4713".to_string(),
            })
        );
    }

    #[test]
    fn test_selection_stays_in_bounds() {
        let mut guide = SetupGuide::new(1, office(), "u");
        for _ in 0..10 {
            guide.handle_key(key(KeyCode::Down));
        }
        assert_eq!(guide.selected, 3);

        for _ in 0..10 {
            guide.handle_key(key(KeyCode::Up));
        }
        assert_eq!(guide.selected, 0);
    }

    #[test]
    fn test_switching_side_resets_selection() {
        let mut guide = SetupGuide::new(1, office(), "u");
        guide.handle_key(key(KeyCode::Down));
        guide.handle_key(key(KeyCode::Down));
        guide.handle_key(key(KeyCode::Char('l')));

        assert_eq!(guide.side, Side::Client);
        assert_eq!(guide.selected, 0);
    }

    #[test]
    fn test_finish_copy_for_other_guide_is_ignored() {
        let mut guide = SetupGuide::new(2, office(), "u");
        let stale = CopyTarget { guide_id: 1, side: Side::Server, step: 0 };

        assert!(!guide.finish_copy(stale, &Ok(()), Instant::now()));
        let block = guide.steps(Side::Server)[0].block.as_ref().unwrap();
        assert_eq!(block.copy.state(), CopyState::Idle);
    }

    #[test]
    fn test_recopy_keeps_copied_until_second_write_lands() {
        let t0 = Instant::now();
        let mut guide = SetupGuide::new(4, office(), "u");
        let target = CopyTarget { guide_id: 4, side: Side::Server, step: 0 };
        let state = |g: &SetupGuide| g.steps(Side::Server)[0].block.as_ref().unwrap().copy.state();

        guide.finish_copy(target, &Ok(()), t0);
        let event = guide.handle_key(key(KeyCode::Enter));
        assert!(matches!(event, Some(GuideEvent::Copy { .. })));

        // First window has run out, second write still in flight
        guide.tick(t0 + Duration::from_millis(2000));
        assert_eq!(state(&guide), CopyState::Copied);

        guide.finish_copy(target, &Ok(()), t0 + Duration::from_millis(2050));
        guide.tick(t0 + Duration::from_millis(4049));
        assert_eq!(state(&guide), CopyState::Copied);
        guide.tick(t0 + Duration::from_millis(4050));
        assert_eq!(state(&guide), CopyState::Idle);
    }

    #[test]
    fn test_finish_copy_then_tick_reverts() {
        let t0 = Instant::now();
        let mut guide = SetupGuide::new(3, office(), "u");
        let target = CopyTarget { guide_id: 3, side: Side::Server, step: 3 };

        assert!(guide.finish_copy(target, &Ok(()), t0));
        guide.tick(t0 + Duration::from_millis(1999));
        let state = |g: &SetupGuide| g.steps(Side::Server)[3].block.as_ref().unwrap().copy.state();
        assert_eq!(state(&guide), CopyState::Copied);

        guide.tick(t0 + Duration::from_millis(2000));
        assert_eq!(state(&guide), CopyState::Idle);
    }
}
