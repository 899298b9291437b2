//! Setup guide popup

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::{accent, bg_selected, command, danger, inactive, success, text, text_dim};
use crate::copy::CopyState;
use crate::guide::Side;
use crate::modal::{GuideStep, ModalShell, SetupGuide, CLOSE_LABEL};

pub fn draw_guide(f: &mut Frame, guide: &SetupGuide) {
    let shell = ModalShell::for_area(f.area());
    let popup_area = shell.panel;

    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(Span::styled(
            format!(" 󰓃 Network audio setup: {} ", guide.connection.name),
            Style::default().fg(accent()).add_modifier(Modifier::BOLD),
        ))
        .title(Line::from(Span::styled(CLOSE_LABEL, Style::default().fg(danger()))).right_aligned())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));

    let inner = block.inner(popup_area);
    f.render_widget(block, popup_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),  // Side tabs
            Constraint::Length(2),  // Where to run
            Constraint::Min(3),     // Steps
            Constraint::Length(1),  // Hints
        ])
        .split(inner);

    draw_tabs(f, guide, chunks[0]);
    draw_summary(f, guide, chunks[1]);
    draw_steps(f, guide, chunks[2]);
    draw_hints(f, chunks[3]);
}

fn draw_tabs(f: &mut Frame, guide: &SetupGuide, area: Rect) {
    let mut spans = vec![Span::raw(" ")];

    for side in [Side::Server, Side::Client] {
        let ip = match side {
            Side::Server => &guide.connection.server_ip,
            Side::Client => &guide.connection.client_ip,
        };
        let label = format!(" {} · {} ", side.title(), ip);
        let style = if side == guide.side {
            Style::default().fg(accent()).bg(bg_selected()).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(inactive())
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_summary(f: &mut Frame, guide: &SetupGuide, area: Rect) {
    let conn = &guide.connection;
    let line = match guide.side {
        Side::Server => format!(
            " Run on the server ({}), the machine with the speakers. It will accept audio from {}.",
            conn.server_ip, conn.client_ip
        ),
        Side::Client => format!(
            " Run on the client ({}), the machine sending audio to {}.",
            conn.client_ip, conn.server_ip
        ),
    };

    f.render_widget(
        Paragraph::new(Line::from(Span::styled(line, Style::default().fg(text()))))
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_steps(f: &mut Frame, guide: &SetupGuide, area: Rect) {
    let (rows, selected_end) = step_rows(guide, area.width as usize);

    // Keep the selected step's title, command and description in view
    let scroll = (selected_end + 1).saturating_sub(area.height as usize);

    let content = Paragraph::new(rows).scroll((scroll as u16, 0));
    f.render_widget(content, area);
}

/// Screen rows for the current side, wrapped to `width`, plus the row just
/// past the selected step's command
fn step_rows(guide: &SetupGuide, width: usize) -> (Vec<Line<'static>>, usize) {
    let mut rows: Vec<Line<'static>> = Vec::new();
    let mut selected_end = 0;

    for (i, step) in guide.steps(guide.side).iter().enumerate() {
        let selected = i == guide.selected;
        let has_command = step.block.is_some();

        for (n, line) in step_lines(step, selected).into_iter().enumerate() {
            rows.extend(wrap_line(line, width));
            // Title is line 0, command line 1
            if selected && (n == 0 || (n == 1 && has_command)) {
                selected_end = rows.len();
            }
        }
    }

    (rows, selected_end)
}

/// Split a line into rows of at most `width` cells, keeping span styles
fn wrap_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    if width == 0 || line.width() <= width {
        return vec![line];
    }

    let mut rows = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut used = 0;

    for span in line.spans {
        let style = span.style;
        let content = span.content;
        let mut rest: &str = &content;

        while !rest.is_empty() {
            let room = width - used;
            let split = rest
                .char_indices()
                .nth(room)
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            let (head, tail) = rest.split_at(split);
            used += head.chars().count();
            current.push(Span::styled(head.to_string(), style));
            rest = tail;

            if used == width {
                rows.push(Line::from(std::mem::take(&mut current)));
                used = 0;
            }
        }
    }

    if !current.is_empty() {
        rows.push(Line::from(current));
    }
    rows
}

/// One numbered instruction: title and copy label, command, description, note
pub fn step_lines(step: &GuideStep, selected: bool) -> Vec<Line<'static>> {
    let s = &step.step;
    let mut title = vec![
        Span::styled(format!(" {} ", s.number), Style::default().fg(accent()).add_modifier(Modifier::BOLD)),
        Span::styled(format!(" {}", s.title), Style::default().fg(text()).add_modifier(Modifier::BOLD)),
    ];

    if let Some(block) = &step.block {
        let label_style = match block.copy.state() {
            CopyState::Idle if selected => Style::default().fg(accent()),
            CopyState::Idle => Style::default().fg(text_dim()),
            CopyState::Copied => Style::default().fg(success()).add_modifier(Modifier::BOLD),
            CopyState::Failed => Style::default().fg(danger()).add_modifier(Modifier::BOLD),
        };
        title.push(Span::raw("   "));
        title.push(Span::styled(format!("[{}]", block.copy.label()), label_style));
    }

    let mut lines = vec![Line::from(title)];

    if let Some(block) = &step.block {
        let marker = if selected { "  ▶ " } else { "    " };
        let cmd_style = if selected {
            Style::default().fg(command()).bg(bg_selected())
        } else {
            Style::default().fg(command())
        };
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(accent())),
            Span::styled("$ ", Style::default().fg(text_dim())),
            Span::styled(block.text().to_string(), cmd_style),
        ]));
    }

    lines.push(Line::from(Span::styled(
        format!("    {}", s.description),
        Style::default().fg(text_dim()),
    )));

    if let Some(note) = &s.note {
        lines.push(Line::from(vec![
            Span::styled("    ✓ ", Style::default().fg(success())),
            Span::styled(note.clone(), Style::default().fg(text_dim())),
        ]));
    }

    lines.push(Line::from(""));
    lines
}

fn draw_hints(f: &mut Frame, area: Rect) {
    let hints = [
        ("↑↓", "Select"),
        ("Enter/y", "Copy"),
        ("Tab", "Switch side"),
        ("s/l", "Server/Client"),
        ("Esc", "Close"),
    ];

    let mut spans: Vec<Span> = Vec::new();
    for (i, (key, action)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" │ ", Style::default().fg(text_dim())));
        }
        spans.push(Span::styled(*key, Style::default().fg(accent())));
        spans.push(Span::styled(format!(" {}", action), Style::default().fg(text_dim())));
    }

    f.render_widget(
        Paragraph::new(Line::from(spans)).alignment(ratatui::layout::Alignment::Center),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::CopyTarget;
    use crate::config::Connection;
    use crate::ui::test_utils::TestTerminal;
    use std::time::Instant;

    fn office_guide() -> SetupGuide {
        SetupGuide::new(1, Connection::new("Office", "10.0.0.5", "10.0.0.9"), "http://radio.local/live")
    }

    #[test]
    fn test_server_tab_shows_load_module_command() {
        let guide = office_guide();
        let mut term = TestTerminal::new();

        term.draw_with(|f| draw_guide(f, &guide));

        assert!(term.buffer_contains("auth-ip-acl=127.0.0.1;10.0.0.9"));
        assert!(term.buffer_contains("sudo firewall-cmd --permanent --add-port=4713/tcp"));
        assert!(term.buffer_contains("Network audio setup: Office"));
        assert!(term.buffer_contains("[x]"));
    }

    #[test]
    fn test_client_tab_shows_port_check() {
        let mut guide = office_guide();
        guide.switch_side(Side::Client);
        let mut term = TestTerminal::new();

        term.draw_with(|f| draw_guide(f, &guide));

        assert!(term.buffer_contains("nc -zv 10.0.0.5 4713"));
        assert!(term.buffer_contains("export PULSE_SERVER=tcp:10.0.0.5"));
        assert!(term.buffer_contains("mpv --ao=pulse \"http://radio.local/live\""));
        assert!(!term.buffer_contains("auth-ip-acl"));
    }

    #[test]
    fn test_label_switches_to_copied() {
        let mut guide = office_guide();
        let mut term = TestTerminal::new();

        term.draw_with(|f| draw_guide(f, &guide));
        assert!(!term.buffer_contains("Copied!"));

        let target = CopyTarget { guide_id: 1, side: Side::Server, step: 0 };
        guide.finish_copy(target, &Ok(()), Instant::now());
        term.draw_with(|f| draw_guide(f, &guide));
        assert!(term.buffer_contains("Copied!"));
    }

    #[test]
    fn test_step_lines_layout() {
        let guide = office_guide();
        let step = &guide.steps(Side::Server)[2];
        let lines = step_lines(step, true);

        let rendered: Vec<String> = lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();

        assert_eq!(rendered.len(), 5);
        assert!(rendered[0].contains("3") && rendered[0].contains("Check the open ports"));
        assert_eq!(rendered[1], "  ▶ $ sudo firewall-cmd --list-ports");
        assert!(rendered[3].contains("✓ The output should include 4713/tcp."));
        assert!(rendered[4].is_empty());
    }

    #[test]
    fn test_compact_terminal_does_not_panic() {
        let guide = office_guide();
        let mut term = TestTerminal::compact();
        term.draw_with(|f| draw_guide(f, &guide));
        assert!(term.buffer_contains("Network"));
    }

    fn row_text(row: &Line) -> String {
        row.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_wrap_line_splits_at_width() {
        let line = Line::from(vec![
            Span::raw("    $ "),
            Span::raw("nc -zv 10.0.0.5 4713"),
        ]);

        let rows = wrap_line(line, 10);
        let text: Vec<String> = rows.iter().map(row_text).collect();
        assert_eq!(text, vec!["    $ nc -", "zv 10.0.0.", "5 4713"]);

        let short = wrap_line(Line::from("fits"), 10);
        assert_eq!(short.len(), 1);
    }

    #[test]
    fn test_selected_command_end_counts_wrapped_rows() {
        let mut guide = office_guide();
        guide.selected = 3;

        let (rows, selected_end) = step_rows(&guide, 40);
        let visible: String = rows[..selected_end].iter().map(row_text).collect();

        assert!(rows.iter().all(|r| r.width() <= 40));
        assert!(visible.ends_with("pactl load-module module-native-protocol-tcp auth-ip-acl=127.0.0.1;10.0.0.9"));
    }

    #[test]
    fn test_narrow_terminal_scrolls_to_selected_command() {
        let mut guide = office_guide();
        guide.selected = 3;
        let mut term = TestTerminal::with_size(50, 16);

        term.draw_with(|f| draw_guide(f, &guide));

        assert!(term.buffer_contains("▶ $ pactl"));
        assert!(term.buffer_contains("4  Accept audio from the client"));
    }

    #[test]
    fn test_hints_have_no_trailing_separator() {
        let guide = office_guide();
        let mut term = TestTerminal::new();

        term.draw_with(|f| draw_guide(f, &guide));

        assert!(term.buffer_contains("s/l Server/Client"));
        assert!(term.buffer_contains("Esc Close "));
        assert!(!term.buffer_contains("Close │"));
    }
}
