//! Daemon connection with automatic reconnection

use anyhow::{anyhow, Result};
use bytes::Bytes;
use netd_shared::LineDecoder;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::NetdSettings;
use crate::transport::{TransportConnector, TransportStream};

/// Events emitted by the daemon connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Socket is up
    Connected { address: String },
    /// Socket went away; reconnection follows
    Disconnected { reason: String },
    /// One reply line, without its terminator
    Line(String),
    /// A connection attempt failed
    ConnectionFailed { reason: String },
}

/// Reconnection parameters
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Reconnection delay (initial)
    pub reconnect_delay: Duration,
    /// Maximum reconnection delay
    pub max_reconnect_delay: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::from(&NetdSettings::default())
    }
}

impl From<&NetdSettings> for ConnectionConfig {
    fn from(settings: &NetdSettings) -> Self {
        Self {
            reconnect_delay: settings.reconnect_delay(),
            max_reconnect_delay: settings.max_reconnect_delay(),
            connect_timeout: settings.connect_timeout(),
        }
    }
}

/// Persistent connection to the daemon's command socket
///
/// Frames handed to [`send`](Self::send) while the socket is down stay in
/// the outbound channel and go out after the next connect.
pub struct NetdConnection {
    /// Channel to send framed commands to the daemon
    outbound_tx: mpsc::UnboundedSender<Bytes>,
    /// Channel to receive connection events
    event_rx: mpsc::Receiver<ConnectionEvent>,
}

impl NetdConnection {
    /// Create a new connection and start the connection loop
    pub fn new<C: TransportConnector>(connector: C, config: ConnectionConfig) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<Bytes>();
        let (event_tx, event_rx) = mpsc::channel::<ConnectionEvent>(100);

        tokio::spawn(async move {
            connection_loop(connector, config, outbound_rx, event_tx).await;
        });

        Self {
            outbound_tx,
            event_rx,
        }
    }

    /// Queue a framed command for the daemon
    pub fn send(&self, frame: Bytes) -> Result<()> {
        self.outbound_tx
            .send(frame)
            .map_err(|_| anyhow!("Connection closed"))
    }

    /// Receive the next connection event
    pub async fn recv(&mut self) -> Option<ConnectionEvent> {
        self.event_rx.recv().await
    }
}

/// Main connection loop with reconnection logic
async fn connection_loop<C: TransportConnector>(
    connector: C,
    config: ConnectionConfig,
    mut outbound_rx: mpsc::UnboundedReceiver<Bytes>,
    event_tx: mpsc::Sender<ConnectionEvent>,
) {
    let mut reconnect_delay = config.reconnect_delay;
    let address = connector.address();

    loop {
        match timeout(config.connect_timeout, connector.connect()).await {
            Ok(Ok(stream)) => {
                reconnect_delay = config.reconnect_delay;
                info!("[NETD] Connected over {} to {}", connector.name(), address);

                if event_tx
                    .send(ConnectionEvent::Connected {
                        address: address.clone(),
                    })
                    .await
                    .is_err()
                {
                    return;
                }

                let reason = match handle_connection(stream, &mut outbound_rx, &event_tx).await {
                    Ok(()) => return,
                    Err(reason) => reason.to_string(),
                };
                warn!("[NETD] Disconnected: {}", reason);
                if event_tx
                    .send(ConnectionEvent::Disconnected { reason })
                    .await
                    .is_err()
                {
                    return;
                }
            }
            Ok(Err(e)) => {
                debug!("[NETD] Connect to {} failed: {:#}", address, e);
                let reason = format!("{:#}", e);
                if event_tx
                    .send(ConnectionEvent::ConnectionFailed { reason })
                    .await
                    .is_err()
                {
                    return;
                }
            }
            Err(_) => {
                let reason = format!("Timed out connecting to {}", address);
                debug!("[NETD] {}", reason);
                if event_tx
                    .send(ConnectionEvent::ConnectionFailed { reason })
                    .await
                    .is_err()
                {
                    return;
                }
            }
        }

        // Wait before reconnecting
        tokio::time::sleep(reconnect_delay).await;

        // Exponential backoff
        reconnect_delay = std::cmp::min(reconnect_delay * 2, config.max_reconnect_delay);
    }
}

/// Handle an active connection
///
/// Returns `Ok(())` only when the bridge side has gone away.
async fn handle_connection<S: TransportStream>(
    stream: S,
    outbound_rx: &mut mpsc::UnboundedReceiver<Bytes>,
    event_tx: &mpsc::Sender<ConnectionEvent>,
) -> Result<()> {
    let (mut reader, mut writer) = tokio::io::split(stream);

    let mut decoder = LineDecoder::new();
    let mut read_buf = vec![0u8; 4096];

    loop {
        tokio::select! {
            // Send outbound commands
            frame = outbound_rx.recv() => {
                let Some(frame) = frame else {
                    let mut stream = reader.unsplit(writer);
                    let _ = TransportStream::shutdown(&mut stream).await;
                    return Ok(());
                };
                writer.write_all(&frame).await?;
                writer.flush().await?;
            }

            // Read replies
            result = reader.read(&mut read_buf) => {
                match result {
                    Ok(0) => {
                        return Err(anyhow!("Daemon closed connection"));
                    }
                    Ok(n) => {
                        decoder.extend(&read_buf[..n]);

                        // Process all complete lines
                        while let Some(line) = decoder.next_line() {
                            if event_tx.send(ConnectionEvent::Line(line)).await.is_err() {
                                return Ok(());
                            }
                        }
                    }
                    Err(e) => {
                        return Err(anyhow!("Read error: {}", e));
                    }
                }
            }
        }
    }
}
