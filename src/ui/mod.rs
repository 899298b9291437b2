mod guide;
#[cfg(test)]
pub mod test_utils;

use std::sync::OnceLock;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::{App, Popup};
use crate::config::ThemeConfig;
use crate::modal::centered_rect;
use crate::theme::Theme;

// Set once at startup from the config file
static THEME: OnceLock<Theme> = OnceLock::new();

pub fn init_theme(config: &ThemeConfig) {
    if THEME.set(Theme::from_config(config)).is_err() {
        tracing::debug!("Theme already initialized");
    }
}

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

// Helper functions to get theme colors
fn accent() -> Color { theme().accent }
fn inactive() -> Color { theme().inactive }
fn success() -> Color { theme().success }
fn danger() -> Color { theme().danger }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn command() -> Color { theme().command }
fn bg_selected() -> Color { theme().bg_selected }

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(1),  // Info line
            Constraint::Min(4),     // Connections box
            Constraint::Length(1),  // Footer
        ])
        .split(area);

    draw_info_line(f, app, chunks[0]);
    draw_connections_box(f, app, chunks[1]);
    draw_footer(f, chunks[2]);

    // Draw popups on top
    match app.popup {
        Popup::None => {}
        Popup::Guide => {
            if let Some(g) = app.guide.as_ref() {
                guide::draw_guide(f, g);
            }
        }
        Popup::Help => draw_help_popup(f),
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    // Priority: status message > config location
    let line = if let Some(ref status) = app.status_message {
        Line::from(Span::styled(status, Style::default().fg(accent())))
    } else {
        let source = match &app.config_path {
            Some(path) => path.display().to_string(),
            None => "command line".to_string(),
        };
        Line::from(vec![
            Span::styled(
                format!("{} connection(s)", app.connections().len()),
                Style::default().fg(text()),
            ),
            Span::styled(" │ ", Style::default().fg(text_dim())),
            Span::styled(source, Style::default().fg(text_dim())),
        ])
    };

    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_connections_box(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(
            " 󰓃 Connections ",
            Style::default().fg(accent()).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));

    if app.connections().is_empty() {
        let path = app
            .config_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "your config file".to_string());

        let hint = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No connections yet.", Style::default().fg(text()))),
            Line::from(Span::styled(
                format!("Add one to {}:", path),
                Style::default().fg(text_dim()),
            )),
            Line::from(""),
            Line::from(Span::styled("[[connections]]", Style::default().fg(command()))),
            Line::from(Span::styled("name = \"Office\"", Style::default().fg(command()))),
            Line::from(Span::styled("server_ip = \"10.0.0.5\"", Style::default().fg(command()))),
            Line::from(Span::styled("client_ip = \"10.0.0.9\"", Style::default().fg(command()))),
            Line::from(""),
            Line::from(Span::styled("then press R to reload.", Style::default().fg(text_dim()))),
        ])
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false });

        f.render_widget(hint, area);
        return;
    }

    let header = Row::new(vec!["", "Name", "Server (speakers)", "Client (sender)"])
        .style(Style::default().fg(text_dim()).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = app
        .connections()
        .iter()
        .enumerate()
        .map(|(i, conn)| {
            let selected = i == app.selected;
            let style = if selected {
                Style::default().fg(accent()).bg(bg_selected())
            } else {
                Style::default().fg(text())
            };
            Row::new(vec![
                if selected { "▶".to_string() } else { String::new() },
                conn.name.clone(),
                conn.server_ip.clone(),
                conn.client_ip.clone(),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Percentage(34),
            Constraint::Percentage(32),
            Constraint::Percentage(32),
        ],
    )
    .header(header)
    .block(block);

    f.render_widget(table, area);
}

fn draw_footer(f: &mut Frame, area: Rect) {
    let hints: [(&str, &str); 5] = [
        ("↑↓", "Nav"),
        ("Enter", "Setup guide"),
        ("R", "Reload"),
        ("h", "Help"),
        ("q", "Quit"),
    ];

    // Responsive: show fewer hints on narrow terminals
    let max_hints = if area.width < 60 { 3 } else { hints.len() };

    let mut hint_spans: Vec<Span> = Vec::new();
    for (i, (key, action)) in hints.iter().take(max_hints).enumerate() {
        if i > 0 {
            hint_spans.push(Span::styled(" │ ", Style::default().fg(text_dim())));
        }
        hint_spans.push(Span::styled(*key, Style::default().fg(accent())));
        hint_spans.push(Span::styled(format!(" {}", action), Style::default().fg(text_dim())));
    }

    f.render_widget(Paragraph::new(Line::from(hint_spans)).alignment(Alignment::Center), area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 70 },
        if area.height < 30 { 95 } else { 80 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let section = |title: &'static str| {
        Line::from(Span::styled(
            format!("═══ {} ═══", title),
            Style::default().fg(danger()).add_modifier(Modifier::BOLD),
        ))
    };
    let binding = |keys: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<12}", keys), Style::default().fg(accent())),
            Span::raw(what),
        ])
    };

    let help_text = vec![
        section("Connections"),
        binding("↑/↓ j/k", "Move up/down"),
        binding("Enter/g", "Open the setup guide"),
        binding("R", "Reload the config file"),
        Line::from(""),
        section("Setup guide"),
        binding("Tab ←/→", "Switch between server and client steps"),
        binding("↑/↓ j/k", "Select a command"),
        binding("Enter/y/c", "Copy the selected command"),
        binding("Esc/q", "Close (or click outside the dialog)"),
        Line::from(""),
        section("Command line"),
        binding("--list", "Print connections as JSON"),
        binding("--print NAME", "Print the commands for one connection"),
        Line::from(Span::styled(
            "  --name/--server-ip/--client-ip open a guide without a config entry",
            Style::default().fg(text_dim()),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "  Commands are only shown, never run. Copy them into a shell on the right machine.",
            Style::default().fg(text_dim()),
        )),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" 󰋖 pulsepair Help ", Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::testing::MemoryClipboard;
    use crate::clipboard::ClipboardWorker;
    use crate::config::{AppConfig, Connection};
    use crate::ui::test_utils::TestTerminal;

    fn app(connections: Vec<Connection>) -> App {
        let config = AppConfig {
            connections,
            ..AppConfig::default()
        };
        App::new(config, None, ClipboardWorker::new(Box::new(MemoryClipboard::default())))
    }

    #[test]
    fn test_connections_table() {
        let app = app(vec![Connection::new("Office", "10.0.0.5", "10.0.0.9")]);
        let mut term = TestTerminal::new();

        term.draw_with(|f| draw(f, &app));

        assert!(term.buffer_contains("1 connection(s)"));
        assert!(term.buffer_contains("Office"));
        assert!(term.buffer_contains("10.0.0.5"));
        assert!(term.buffer_contains("10.0.0.9"));
    }

    #[test]
    fn test_empty_state_hint() {
        let app = app(Vec::new());
        let mut term = TestTerminal::new();

        term.draw_with(|f| draw(f, &app));

        assert!(term.buffer_contains("No connections yet."));
        assert!(term.buffer_contains("[[connections]]"));
    }

    #[test]
    fn test_guide_popup_drawn_over_list() {
        let mut app = app(vec![Connection::new("Office", "10.0.0.5", "10.0.0.9")]);
        let office = app.connections()[0].clone();
        app.open_guide(office);
        let mut term = TestTerminal::new();

        term.draw_with(|f| draw(f, &app));

        assert!(term.buffer_contains("Network audio setup: Office"));
        assert!(term.buffer_contains("auth-ip-acl=127.0.0.1;10.0.0.9"));
    }

    #[test]
    fn test_help_popup() {
        let mut app = app(Vec::new());
        app.popup = Popup::Help;
        let mut term = TestTerminal::new();

        term.draw_with(|f| draw(f, &app));

        assert!(term.buffer_contains("pulsepair Help"));
        assert!(term.buffer_contains("Copy the selected command"));
    }
}
