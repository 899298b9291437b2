mod app;
mod clipboard;
mod config;
mod copy;
mod guide;
mod modal;
mod theme;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::{App, Popup};
use clipboard::ClipboardWorker;
use config::{AppConfig, Connection};

#[derive(Parser, Debug)]
#[command(name = "pulsepair")]
#[command(version)]
#[command(about = "Step-by-step commands for PulseAudio network audio between two machines")]
struct Args {
    /// Print configured connections as JSON
    #[arg(long)]
    list: bool,

    /// Print the setup commands for a connection and exit
    #[arg(short, long, value_name = "NAME")]
    print: Option<String>,

    /// Name for an ad-hoc connection
    #[arg(long, requires_all = ["server_ip", "client_ip"])]
    name: Option<String>,

    /// Server address for an ad-hoc connection
    #[arg(long, requires = "client_ip")]
    server_ip: Option<String>,

    /// Client address for an ad-hoc connection
    #[arg(long, requires = "server_ip")]
    client_ip: Option<String>,

    /// Use this config file instead of the default
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Args {
    fn adhoc_connection(&self) -> Option<Connection> {
        let server_ip = self.server_ip.clone()?;
        let client_ip = self.client_ip.clone()?;
        let name = self.name.clone().unwrap_or_else(|| format!("{} ↔ {}", server_ip, client_ip));
        Some(Connection::new(name, server_ip, client_ip))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they stay out of the TUI and of --list output
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => Some(path.clone()),
        None => AppConfig::default_path().ok(),
    };
    let config = match &config_path {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::default(),
    };

    // Handle CLI-only commands
    if args.list {
        return print_connections(&config);
    }

    if let Some(name) = &args.print {
        return print_guide(&config, name);
    }

    let adhoc = args.adhoc_connection();
    run_tui(config, config_path, adhoc).await
}

fn print_connections(config: &AppConfig) -> Result<()> {
    let output = serde_json::json!({
        "connections": config.connections,
        "stream_url": config.stream_url,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_guide(config: &AppConfig, name: &str) -> Result<()> {
    let conn = config
        .find(name)
        .with_context(|| format!("No connection named '{}'", name))?;
    print!("{}", guide::render_plain(conn, &config.stream_url));
    Ok(())
}

async fn run_tui(config: AppConfig, config_path: Option<PathBuf>, adhoc: Option<Connection>) -> Result<()> {
    ui::init_theme(&config.theme);

    let mut app = match adhoc {
        Some(conn) => {
            let mut app = App::new(config, None, ClipboardWorker::system());
            app.config.connections.push(conn.clone());
            app.open_guide(conn);
            app
        }
        None => App::new(config, config_path, ClipboardWorker::system()),
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') if app.popup == Popup::None => return Ok(()),
                    KeyCode::Char('c') if key.modifiers.contains(event::KeyModifiers::CONTROL) => {
                        return Ok(())
                    }
                    _ => {
                        // Handle key and catch any errors to prevent crashes
                        if let Err(e) = app.handle_key(key) {
                            app.status_message = Some(format!("Error: {}", e));
                        }
                    }
                },
                Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                    let size = terminal.size()?;
                    let area = Rect::new(0, 0, size.width, size.height);
                    app.handle_click(area, mouse.column, mouse.row);
                }
                _ => {}
            }
        }

        // Let pending clipboard writes land and timers expire
        tokio::task::yield_now().await;
        app.tick();
    }
}
