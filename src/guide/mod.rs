//! Setup instructions for a server/client pair.
//!
//! Everything here is display-only text: IPs are substituted verbatim and
//! nothing is ever executed.

use crate::config::Connection;

/// TCP port PulseAudio's native protocol listens on
pub const PULSE_PORT: u16 = 4713;

/// Which machine a set of steps runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Server,
    Client,
}

impl Side {
    pub fn title(self) -> &'static str {
        match self {
            Side::Server => "Server",
            Side::Client => "Client",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Side::Server => Side::Client,
            Side::Client => Side::Server,
        }
    }
}

/// One numbered instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub number: usize,
    pub title: String,
    pub command: Option<String>,
    pub description: String,
    pub note: Option<String>,  // What correct output looks like
}

impl Step {
    fn new(number: usize, title: &str, command: Option<String>, description: &str) -> Self {
        Self {
            number,
            title: title.to_string(),
            command,
            description: description.to_string(),
            note: None,
        }
    }

    fn with_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }
}

pub fn firewall_open_command() -> String {
    format!("sudo firewall-cmd --permanent --add-port={}/tcp", PULSE_PORT)
}

pub fn firewall_reload_command() -> String {
    "sudo firewall-cmd --reload".to_string()
}

pub fn firewall_list_command() -> String {
    "sudo firewall-cmd --list-ports".to_string()
}

pub fn load_module_command(conn: &Connection) -> String {
    format!(
        "pactl load-module module-native-protocol-tcp auth-ip-acl=127.0.0.1;{}",
        conn.client_ip
    )
}

pub fn port_check_command(conn: &Connection) -> String {
    format!("nc -zv {} {}", conn.server_ip, PULSE_PORT)
}

pub fn pulse_server_command(conn: &Connection) -> String {
    format!("export PULSE_SERVER=tcp:{}", conn.server_ip)
}

pub fn playback_command(stream_url: &str) -> String {
    format!("mpv --ao=pulse \"{}\"", stream_url)
}

/// Steps to run on the machine with the speakers
pub fn server_steps(conn: &Connection) -> Vec<Step> {
    vec![
        Step::new(
            1,
            "Open the PulseAudio port",
            Some(firewall_open_command()),
            "Allows incoming connections on TCP 4713 permanently.",
        ),
        Step::new(
            2,
            "Reload the firewall",
            Some(firewall_reload_command()),
            "Applies the permanent rule to the running firewall.",
        ),
        Step::new(
            3,
            "Check the open ports",
            Some(firewall_list_command()),
            "Lists the ports the firewall currently allows.",
        )
        .with_note("The output should include 4713/tcp."),
        Step::new(
            4,
            "Accept audio from the client",
            Some(load_module_command(conn)),
            &format!(
                "Lets PulseAudio accept streams from localhost and {}.",
                conn.client_ip
            ),
        )
        .with_note(
            "pactl prints a module index on success. The module is gone after a PulseAudio restart.",
        ),
    ]
}

/// Steps to run on the machine sending audio
pub fn client_steps(conn: &Connection, stream_url: &str) -> Vec<Step> {
    vec![
        Step::new(
            1,
            "Check that the server is reachable",
            Some(port_check_command(conn)),
            &format!("Probes port 4713 on {}.", conn.server_ip),
        )
        .with_note("Expect \"succeeded\" or \"open\". A timeout means the server firewall is still closed."),
        Step::new(
            2,
            "Point PulseAudio at the server",
            Some(pulse_server_command(conn)),
            "Applies to programs started from this shell only.",
        ),
        Step::new(
            3,
            "Play something",
            Some(playback_command(stream_url)),
            "Any PulseAudio program works. mpv is a quick way to test.",
        )
        .with_note(&format!("Sound should come out of {}.", conn.server_ip)),
    ]
}

pub fn steps_for(side: Side, conn: &Connection, stream_url: &str) -> Vec<Step> {
    match side {
        Side::Server => server_steps(conn),
        Side::Client => client_steps(conn, stream_url),
    }
}

/// Plain-text version of both step lists
pub fn render_plain(conn: &Connection, stream_url: &str) -> String {
    let mut out = format!(
        "{}: server {} <- client {}\n",
        conn.name, conn.server_ip, conn.client_ip
    );

    for side in [Side::Server, Side::Client] {
        let ip = match side {
            Side::Server => &conn.server_ip,
            Side::Client => &conn.client_ip,
        };
        out.push_str(&format!("\n== {} ({}) ==\n", side.title(), ip));

        for step in steps_for(side, conn, stream_url) {
            out.push_str(&format!("{}. {}\n", step.number, step.title));
            if let Some(cmd) = &step.command {
                out.push_str(&format!("   $ {}\n", cmd));
            }
            out.push_str(&format!("   {}\n", step.description));
            if let Some(note) = &step.note {
                out.push_str(&format!("   ✓ {}\n", note));
            }
        }
    }

    out
}
