//! TCP transport
//!
//! One connection per client. The server keeps the socket open between
//! requests, so a transport is reused for any number of exchanges.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::{error::*, Transport};

/// Bytes shown in trace logs of sent and received chunks
const TRACE_PREFIX: usize = 16;

/// TCP connection to a data logger server
pub struct TcpTransport {
    host: String,
    port: u16,
    peer: Option<SocketAddr>,
    stream: Option<TcpStream>,
    connect_timeout: Duration,
    chunk_size: usize,
}

impl TcpTransport {
    /// Largest chunk one `receive` returns unless configured otherwise
    pub const DEFAULT_CHUNK_SIZE: usize = 1500;

    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            peer: None,
            stream: None,
            connect_timeout: Duration::from_secs(5),
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
        }
    }

    /// Limit for the whole connect attempt, name resolution excluded
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    async fn lookup(&self) -> Result<Vec<SocketAddr>> {
        let target = format!("{}:{}", self.host, self.port);

        let addrs: Vec<SocketAddr> = tokio::net::lookup_host(&target)
            .await
            .map_err(|source| Error::Resolve {
                addr: target.clone(),
                source,
            })?
            .collect();

        if addrs.is_empty() {
            return Err(Error::NoAddress(target));
        }

        Ok(addrs)
    }

    /// First address that accepts the connection, like a dual-stack
    /// `localhost` where only one family is listening
    async fn open(addrs: &[SocketAddr]) -> Result<(TcpStream, SocketAddr)> {
        let mut last_err = None;

        for &addr in addrs {
            debug!("Connecting to {}...", addr);

            match TcpStream::connect(addr).await {
                Ok(stream) => return Ok((stream, addr)),
                Err(e) => {
                    debug!("Connect to {} failed: {}", addr, e);
                    last_err = Some(e);
                }
            }
        }

        Err(match last_err {
            Some(e) => Error::Io(e),
            None => Error::NoAddress(format!("{:?}", addrs)),
        })
    }

    fn stream(&mut self) -> Result<&mut TcpStream> {
        self.stream.as_mut().ok_or(Error::NotConnected)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected(self.remote_addr()));
        }

        let addrs = self.lookup().await?;

        let (stream, peer) = timeout(self.connect_timeout, Self::open(&addrs))
            .await
            .map_err(|_| Error::ConnectTimeout {
                addr: self.remote_addr(),
                after: self.connect_timeout,
            })??;

        // Requests are single small frames
        stream.set_nodelay(true)?;

        debug!("Connected to {}", peer);

        self.peer = Some(peer);
        self.stream = Some(stream);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            debug!("Closing connection to {}", self.remote_addr());

            // The server may already be gone
            let _ = stream.shutdown().await;
        }

        self.peer = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream()?;

        trace!("-> {} bytes: {:02X?}", data.len(), &data[..data.len().min(TRACE_PREFIX)]);

        stream.write_all(data).await?;
        stream.flush().await?;

        Ok(())
    }

    async fn receive(&mut self, read_timeout: Option<Duration>) -> Result<BytesMut> {
        let mut chunk = BytesMut::with_capacity(self.chunk_size);
        let stream = self.stream()?;

        let n = match read_timeout {
            Some(limit) => timeout(limit, stream.read_buf(&mut chunk))
                .await
                .map_err(|_| Error::ReadTimeout(limit))??,
            None => stream.read_buf(&mut chunk).await?,
        };

        if n == 0 {
            debug!("{} closed the connection", self.remote_addr());
            return Err(Error::ConnectionClosed);
        }

        trace!("<- {} bytes: {:02X?}", n, &chunk[..n.min(TRACE_PREFIX)]);

        Ok(chunk)
    }

    fn remote_addr(&self) -> String {
        match self.peer {
            Some(peer) => peer.to_string(),
            None => format!("{}:{}", self.host, self.port),
        }
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!("Connection to {} dropped without disconnect", self.remote_addr());
        }
    }
}
