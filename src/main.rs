mod config;
mod connection;
mod control;
mod engine;
mod properties;
mod transport;

use anyhow::Result;
use config::{BridgeConfig, NetdAddress};
use connection::{ConnectionConfig, ConnectionEvent, NetdConnection};
use control::ControlServer;
use engine::{usb, EngineOutput, NetworkEngine};
use netd_shared::{Dialect, NetworkResult};
use properties::{MemoryPropertyStore, PropertyStore};
use tokio::sync::{broadcast, mpsc};
use transport::{TcpConnector, UnixConnector};

use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = BridgeConfig::load_from_env()?;

    // Initialize tracing; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let store = MemoryPropertyStore::with_values(config.properties.clone());
    let dialect = detect_dialect(&store);

    info!("netd bridge starting");
    info!("  Daemon: {}", config.netd.address);
    info!("  Control: {}", config.control.bind_addr);
    info!("  Dialect: {}", dialect);

    let (request_tx, mut request_rx) = mpsc::channel(100);
    let control = ControlServer::bind(&config.control.bind_addr, request_tx).await?;
    let results = control.results();
    tokio::spawn(control.run());

    let mut netd = connect(&config)?;

    let (output_tx, mut output_rx) = mpsc::unbounded_channel();
    let mut engine = NetworkEngine::new(dialect, Box::new(store), output_tx);

    // Main event loop; the only place the engine is touched
    loop {
        tokio::select! {
            event = netd.recv() => {
                match event {
                    Some(ConnectionEvent::Connected { address }) => {
                        info!("[NETD] Ready on {}", address);
                    }
                    Some(ConnectionEvent::Disconnected { reason }) => {
                        if engine.is_outstanding() {
                            warn!("[NETD] Disconnected with a command awaiting its reply: {}", reason);
                        }
                        engine.on_daemon_disconnected();
                    }
                    Some(ConnectionEvent::ConnectionFailed { reason }) => {
                        error!("[NETD] Connection failed: {}", reason);
                    }
                    Some(ConnectionEvent::Line(line)) => {
                        debug!("[NETD] <- {}", line.replace('\0', "|"));
                        engine.on_daemon_line(&line);
                    }
                    None => {
                        error!("[NETD] Connection task ended");
                        break;
                    }
                }
            }

            Some(request) = request_rx.recv() => {
                match engine.execute(request) {
                    Ok(Some(poller)) => {
                        // Let queued commands and results out before the poll stalls the engine
                        route_outputs(&mut output_rx, &netd, &results);
                        usb::converge(&mut engine, poller).await;
                    }
                    Ok(None) => {}
                    Err(e) => warn!("[ENGINE] Request rejected: {}", e),
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }

        route_outputs(&mut output_rx, &netd, &results);
    }

    Ok(())
}

/// Pick the wire dialect from the platform version property
fn detect_dialect(store: &dyn PropertyStore) -> Dialect {
    store
        .get(properties::BUILD_VERSION_SDK)
        .trim()
        .parse::<u32>()
        .map(Dialect::from_sdk_version)
        .unwrap_or_default()
}

fn connect(config: &BridgeConfig) -> Result<NetdConnection> {
    let settings = ConnectionConfig::from(&config.netd);
    let conn = match NetdAddress::parse(&config.netd.address)? {
        NetdAddress::Unix(path) => NetdConnection::new(UnixConnector::new(path), settings),
        NetdAddress::Tcp(addr) => NetdConnection::new(TcpConnector::new(addr), settings),
    };
    Ok(conn)
}

/// Hand everything the engine emitted to the daemon socket or the control clients
fn route_outputs(
    output_rx: &mut mpsc::UnboundedReceiver<EngineOutput>,
    netd: &NetdConnection,
    results: &broadcast::Sender<NetworkResult>,
) {
    while let Ok(output) = output_rx.try_recv() {
        match output {
            EngineOutput::Command(frame) => {
                if let Err(e) = netd.send(frame) {
                    error!("[NETD] Failed to queue command: {}", e);
                }
            }
            EngineOutput::Result(result) => {
                if results.send(result).is_err() {
                    debug!("[CONTROL] No clients connected, result dropped");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_properties() {
        let store = MemoryPropertyStore::with_values([(properties::BUILD_VERSION_SDK, "19")]);
        assert_eq!(detect_dialect(&store), Dialect::Sequenced);

        let store = MemoryPropertyStore::with_values([(properties::BUILD_VERSION_SDK, "15")]);
        assert_eq!(detect_dialect(&store), Dialect::Legacy);

        assert_eq!(detect_dialect(&MemoryPropertyStore::new()), Dialect::Legacy);
        let store = MemoryPropertyStore::with_values([(properties::BUILD_VERSION_SDK, "jb")]);
        assert_eq!(detect_dialect(&store), Dialect::Legacy);
    }
}
