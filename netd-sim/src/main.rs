//! Development stand-in for the network daemon
//!
//! Accepts one bridge connection at a time, reads NUL-terminated commands
//! and answers with scripted reply lines.

use netd_shared::{netd, LineDecoder};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding a command prefix that should fail
const FAIL_ENV: &str = "NETD_SIM_FAIL";

const DEFAULT_BIND: &str = "127.0.0.1:7070";

/// Scripted daemon state
#[derive(Debug, Default)]
struct Daemon {
    tethered: Vec<String>,
    tethering_started: bool,
    fail_prefix: Option<String>,
    rx_bytes: u64,
    tx_bytes: u64,
}

impl Daemon {
    fn new(fail_prefix: Option<String>) -> Self {
        Self {
            fail_prefix: fail_prefix.filter(|p| !p.is_empty()),
            ..Default::default()
        }
    }

    /// Reply lines for one command, broadcasts last
    fn handle(&mut self, raw: &str) -> Vec<String> {
        let (seq, command) = split_sequence(raw);
        let reply = |code: u32, reason: &str| match seq {
            Some(seq) => format!("{} {} {}", code, seq, reason),
            None => format!("{} {}", code, reason),
        };

        if let Some(prefix) = &self.fail_prefix {
            if command.starts_with(prefix.as_str()) {
                return vec![reply(netd::COMMAND_FAIL, &format!("{} failed", command))];
            }
        }

        let words: Vec<&str> = command.split_whitespace().collect();
        match words.as_slice() {
            ["tether", "interface", "list", ..] => {
                let mut lines: Vec<String> = self.tethered.iter().map(|i| reply(111, i.as_str())).collect();
                lines.push(reply(netd::COMMAND_OKAY, "Tether interface list completed"));
                lines
            }
            ["tether", "interface", "add", iface] => {
                if !self.tethered.iter().any(|t| t == iface) {
                    self.tethered.push(iface.to_string());
                }
                vec![
                    reply(netd::COMMAND_OKAY, &format!("{} ok", command)),
                    format!("{} Iface added {}", netd::BROADCAST_INTERFACE_CHANGE, iface),
                ]
            }
            ["tether", "interface", "remove", iface] => {
                self.tethered.retain(|t| t != iface);
                vec![reply(netd::COMMAND_OKAY, &format!("{} ok", command))]
            }
            ["tether", "status"] => {
                let state = if self.tethering_started { "started" } else { "stopped" };
                vec![reply(210, &format!("Tethering services {}", state))]
            }
            ["tether", "start", ..] => {
                self.tethering_started = true;
                vec![reply(netd::COMMAND_OKAY, &format!("{} ok", command))]
            }
            ["tether", "stop"] => {
                self.tethering_started = false;
                vec![reply(netd::COMMAND_OKAY, &format!("{} ok", command))]
            }
            ["interface", "readrxcounter", _] => {
                self.rx_bytes += 4096;
                vec![reply(216, &self.rx_bytes.to_string())]
            }
            ["interface", "readtxcounter", _] => {
                self.tx_bytes += 1024;
                vec![reply(216, &self.tx_bytes.to_string())]
            }
            _ => vec![reply(netd::COMMAND_OKAY, &format!("{} ok", command))],
        }
    }
}

/// Split off a leading numeric sequence token, if any
fn split_sequence(raw: &str) -> (Option<&str>, &str) {
    let raw = raw.trim();
    if let Some((first, rest)) = raw.split_once(' ') {
        if !first.is_empty() && first.bytes().all(|b| b.is_ascii_digit()) {
            return (Some(first), rest.trim_start());
        }
    }
    (None, raw)
}

async fn serve(mut socket: TcpStream, daemon: &mut Daemon) -> anyhow::Result<()> {
    let mut decoder = LineDecoder::new();
    let mut buf = vec![0u8; 4096];

    loop {
        let n = socket.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        decoder.extend(&buf[..n]);

        while let Some(command) = decoder.next_line() {
            debug!("[SIM] <- {}", command);
            for line in daemon.handle(&command) {
                debug!("[SIM] -> {}", line);
                socket.write_all(line.as_bytes()).await?;
                socket.write_all(&[0]).await?;
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let bind = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_BIND.to_string());
    let fail_prefix = std::env::var(FAIL_ENV).ok();

    let listener = TcpListener::bind(&bind).await?;
    info!("[SIM] Listening on {}", bind);
    if let Some(prefix) = &fail_prefix {
        info!("[SIM] Commands starting with '{}' will fail", prefix);
    }

    let mut daemon = Daemon::new(fail_prefix);
    loop {
        let (socket, addr) = listener.accept().await?;
        info!("[SIM] Bridge connected: {}", addr);

        match serve(socket, &mut daemon).await {
            Ok(()) => info!("[SIM] Bridge disconnected: {}", addr),
            Err(e) => warn!("[SIM] Connection error from {}: {}", addr, e),
        }
    }
}
