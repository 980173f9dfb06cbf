//! Individual control client session

use anyhow::{anyhow, Result};
use netd_shared::codec::{self, FrameDecoder};
use netd_shared::{NetworkCommand, NetworkResult};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

/// Active control client session
pub struct ControlSession {
    addr: SocketAddr,
    reader: ReadHalf<TcpStream>,
    writer: WriteHalf<TcpStream>,
    decoder: FrameDecoder<NetworkCommand>,
    read_buf: Vec<u8>,
}

impl ControlSession {
    /// Create a new session from an accepted TCP stream
    pub fn new(stream: TcpStream, addr: SocketAddr) -> Self {
        let (reader, writer) = tokio::io::split(stream);

        Self {
            addr,
            reader,
            writer,
            decoder: FrameDecoder::new(),
            read_buf: vec![0u8; 4096],
        }
    }

    /// Get the remote address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Read the next request from this client
    ///
    /// Returns `Ok(None)` once the client has closed the connection and an
    /// error for undecodable or oversized frames.
    pub async fn recv(&mut self) -> Result<Option<NetworkCommand>> {
        loop {
            // First try to decode from existing buffer
            if let Some(command) = self.decoder.decode_next()? {
                return Ok(Some(command));
            }

            // Read more data
            match self.reader.read(&mut self.read_buf).await {
                Ok(0) => return Ok(None),
                Ok(n) => self.decoder.extend(&self.read_buf[..n]),
                Err(e) => return Err(anyhow!("Read error from {}: {}", self.addr, e)),
            }
        }
    }

    /// Send one result to this client
    pub async fn send(&mut self, result: &NetworkResult) -> Result<()> {
        let encoded = codec::encode(result)?;
        self.writer.write_all(&encoded).await?;
        Ok(())
    }

    /// Forward requests to the engine and results back until the client leaves
    pub async fn run(
        mut self,
        requests: mpsc::Sender<NetworkCommand>,
        mut results: broadcast::Receiver<NetworkResult>,
    ) {
        info!("[CONTROL] Client connected: {}", self.addr);

        loop {
            tokio::select! {
                request = self.recv() => {
                    match request {
                        Ok(Some(command)) => {
                            debug!("[CONTROL] {} -> {} (id={})", self.addr, command.cmd, command.id);
                            if requests.send(command).await.is_err() {
                                break;
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            warn!("[CONTROL] Dropping client {}: {:#}", self.addr, e);
                            break;
                        }
                    }
                }

                result = results.recv() => {
                    match result {
                        Ok(result) => {
                            if let Err(e) = self.send(&result).await {
                                warn!("[CONTROL] Failed to send to {}: {:#}", self.addr, e);
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("[CONTROL] Client {} missed {} results", self.addr, skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        }

        info!("[CONTROL] Client disconnected: {}", self.addr);
    }
}
