//! Unix-domain socket transport, the daemon's native endpoint

use crate::transport::traits::{TransportConnector, TransportStream};
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::UnixStream;

/// Unix stream wrapper implementing TransportStream
pub struct UnixTransportStream {
    inner: UnixStream,
}

impl UnixTransportStream {
    pub fn new(stream: UnixStream) -> Self {
        Self { inner: stream }
    }
}

impl AsyncRead for UnixTransportStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for UnixTransportStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

#[async_trait]
impl TransportStream for UnixTransportStream {
    async fn shutdown(&mut self) -> Result<()> {
        tokio::io::AsyncWriteExt::shutdown(&mut self.inner).await?;
        Ok(())
    }
}

/// Connector for a socket path such as `/dev/socket/netd`
pub struct UnixConnector {
    path: PathBuf,
}

impl UnixConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TransportConnector for UnixConnector {
    type Stream = UnixTransportStream;

    async fn connect(&self) -> Result<Self::Stream> {
        let stream = UnixStream::connect(&self.path)
            .await
            .with_context(|| format!("Failed to connect to {}", self.path.display()))?;
        Ok(UnixTransportStream::new(stream))
    }

    fn name(&self) -> &'static str {
        "Unix"
    }

    fn address(&self) -> String {
        self.path.display().to_string()
    }
}
