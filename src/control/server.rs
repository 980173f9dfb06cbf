//! Control channel listener

use anyhow::{Context, Result};
use netd_shared::{NetworkCommand, NetworkResult};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};

use super::session::ControlSession;

/// Results buffered per client before it starts missing them
const RESULT_BUFFER: usize = 256;

/// Accepts control clients, feeding their requests to the engine and
/// broadcasting every result to all of them
pub struct ControlServer {
    listener: TcpListener,
    requests: mpsc::Sender<NetworkCommand>,
    results: broadcast::Sender<NetworkResult>,
}

impl ControlServer {
    /// Bind the listener; requests from every client go to `requests`
    pub async fn bind(addr: &str, requests: mpsc::Sender<NetworkCommand>) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind control channel on {}", addr))?;
        let (results, _) = broadcast::channel(RESULT_BUFFER);

        Ok(Self {
            listener,
            requests,
            results,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Sender used to publish results to every connected client
    pub fn results(&self) -> broadcast::Sender<NetworkResult> {
        self.results.clone()
    }

    /// Accept clients until the listener fails
    pub async fn run(self) {
        match self.listener.local_addr() {
            Ok(addr) => info!("[CONTROL] Listening on {}", addr),
            Err(e) => error!("[CONTROL] Listener has no address: {}", e),
        }

        loop {
            let (stream, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("[CONTROL] Accept failed: {}", e);
                    return;
                }
            };

            let session = ControlSession::new(stream, addr);
            let requests = self.requests.clone();
            let results = self.results.subscribe();
            tokio::spawn(session.run(requests, results));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use netd_shared::codec;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn start() -> (SocketAddr, mpsc::Receiver<NetworkCommand>, broadcast::Sender<NetworkResult>) {
        let (tx, rx) = mpsc::channel(16);
        let server = ControlServer::bind("127.0.0.1:0", tx).await.expect("bind");
        let addr = server.local_addr().expect("addr");
        let results = server.results();
        tokio::spawn(server.run());
        (addr, rx, results)
    }

    async fn read_result(stream: &mut TcpStream) -> NetworkResult {
        let mut buf = BytesMut::new();
        let mut chunk = [0u8; 1024];
        loop {
            if let Some(result) = codec::decode::<NetworkResult>(&mut buf).expect("decode") {
                return result;
            }
            let n = stream.read(&mut chunk).await.expect("read");
            assert!(n > 0, "server closed connection");
            buf.extend_from_slice(&chunk[..n]);
        }
    }

    /// Wait until `count` clients are subscribed to results
    async fn wait_for_clients(results: &broadcast::Sender<NetworkResult>, count: usize) {
        while results.receiver_count() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_requests_reach_engine() {
        let (addr, mut requests, _results) = start().await;
        let mut client = TcpStream::connect(addr).await.expect("connect");

        let encoded = codec::encode(&NetworkCommand::new(3, "setDNS")).expect("encode");
        client.write_all(&encoded).await.expect("write");

        let received = requests.recv().await.expect("request");
        assert_eq!(received.id, 3);
        assert_eq!(received.cmd, "setDNS");
    }

    #[tokio::test]
    async fn test_results_broadcast_to_all_clients() {
        let (addr, _requests, results) = start().await;
        let mut a = TcpStream::connect(addr).await.expect("connect");
        let mut b = TcpStream::connect(addr).await.expect("connect");
        wait_for_clients(&results, 2).await;

        results
            .send(NetworkResult::broadcast("netd-interface-change", "Iface added wlan0"))
            .expect("send");

        for client in [&mut a, &mut b] {
            let result = read_result(client).await;
            assert!(result.broadcast);
            assert_eq!(result.reason, "Iface added wlan0");
        }
    }

    #[tokio::test]
    async fn test_oversized_frame_closes_session() {
        let (addr, _requests, results) = start().await;
        let mut client = TcpStream::connect(addr).await.expect("connect");
        wait_for_clients(&results, 1).await;

        let len = codec::MAX_MESSAGE_SIZE + 1;
        client.write_all(&len.to_be_bytes()).await.expect("write");

        let mut buf = [0u8; 16];
        let n = tokio::time::timeout(Duration::from_secs(5), client.read(&mut buf))
            .await
            .expect("session should close")
            .unwrap_or(0);
        assert_eq!(n, 0);
    }
}
