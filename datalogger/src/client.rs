//! High-level client interface

use std::time::{Duration, Instant};

use bytes::BytesMut;
use chrono::Utc;
use tracing::{debug, info, trace};

use datalogger_core::{
    constants::{DEFAULT_READ_TIMEOUT, DEFAULT_TIMEOUT},
    Request, Timestamp,
};
use datalogger_transport::{TcpTransport, Transport};

use crate::error::{Error, Result};
use crate::stream::RecordStream;
use crate::stress::{Throughput, ThroughputMeter};

/// Data logger client
///
/// One client drives one connection. Query and observe return a
/// [`RecordStream`] that borrows the client until the exchange is over.
///
/// # Examples
///
/// ```no_run
/// use datalogger::Client;
///
/// #[tokio::main]
/// async fn main() -> datalogger::Result<()> {
///     let mut client = Client::new("localhost", 12345);
///
///     client.connect().await?;
///     client.store("SN42", "temp", "0a1b2c").await?;
///
///     client.disconnect().await?;
///     Ok(())
/// }
/// ```
pub struct Client {
    transport: Box<dyn Transport>,
    read_timeout: Option<Duration>,
}

impl Client {
    /// Create a new client (TCP transport)
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let transport = TcpTransport::new(host, port)
            .with_connect_timeout(Duration::from_secs(DEFAULT_TIMEOUT));

        Self::with_transport(Box::new(transport))
    }

    /// Create a client over any transport
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            read_timeout: Some(Duration::from_secs(DEFAULT_READ_TIMEOUT)),
        }
    }

    /// Set how long to wait for result bytes; `None` waits forever
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Server address
    pub fn remote_addr(&self) -> String {
        self.transport.remote_addr()
    }

    /// Connect to server
    pub async fn connect(&mut self) -> Result<()> {
        info!("Connecting to {}...", self.transport.remote_addr());

        self.transport.connect().await?;

        info!("Connected to {}", self.transport.remote_addr());
        Ok(())
    }

    /// Disconnect from server
    pub async fn disconnect(&mut self) -> Result<()> {
        if !self.is_connected() {
            return Ok(());
        }

        info!("Disconnecting from {}...", self.transport.remote_addr());
        self.transport.disconnect().await?;

        info!("Disconnected");
        Ok(())
    }

    /// Store one reading; `hex_data` is the payload in hex
    ///
    /// The server does not acknowledge stores.
    pub async fn store(&mut self, serial: &str, dev_type: &str, hex_data: &str) -> Result<()> {
        let request = Request::store_hex(copy(serial), copy(dev_type), hex_data)?;
        self.send_request(&request).await
    }

    /// Fetch stored records newer than `since`
    pub async fn query_after(
        &mut self,
        serial: &str,
        dev_type: &str,
        since: Timestamp,
    ) -> Result<RecordStream<'_>> {
        let request = Request::query_after(copy(serial), copy(dev_type), since)?;
        self.exchange(&request).await
    }

    /// Fetch records at most `age_secs` old; `0` fetches everything
    pub async fn query_age(
        &mut self,
        serial: &str,
        dev_type: &str,
        age_secs: u64,
    ) -> Result<RecordStream<'_>> {
        let since = Timestamp::since_age(age_secs, Utc::now())?;
        debug!("Age {}s translated to {}", age_secs, since);

        self.query_after(serial, dev_type, since).await
    }

    /// Subscribe to matching records as the server receives them
    pub async fn observe(&mut self, serial: &str, dev_type: &str) -> Result<RecordStream<'_>> {
        let request = Request::observe(copy(serial), copy(dev_type))?;
        self.exchange(&request).await
    }

    /// Flood the server with store requests
    ///
    /// The payload of each request is a 4-byte big-endian counter.
    /// `report` receives a throughput sample about once per second. Runs
    /// until `limit` requests were sent, or forever without a limit.
    ///
    /// Returns the number of requests sent.
    pub async fn stress<F>(
        &mut self,
        serial: &str,
        dev_type: &str,
        limit: Option<u64>,
        mut report: F,
    ) -> Result<u64>
    where
        F: FnMut(Throughput),
    {
        self.ensure_connected()?;

        // Validate identifiers once; only the counter changes per request
        Request::store(copy(serial), copy(dev_type), Vec::new())?;

        info!("Stress testing {} as {}/{}", self.transport.remote_addr(), serial, dev_type);

        let mut meter = ThroughputMeter::new(Instant::now());
        let mut buf = BytesMut::new();
        let mut counter: u32 = 0;

        while limit.map_or(true, |limit| meter.total() < limit) {
            let request = Request::store(copy(serial), copy(dev_type), counter.to_be_bytes().to_vec())?;

            buf.clear();
            request.encode_into(&mut buf);
            self.transport.send(&buf).await?;

            counter = counter.wrapping_add(1);
            if let Some(sample) = meter.tick(Instant::now()) {
                report(sample);
            }
        }

        Ok(meter.total())
    }

    // Helper methods

    fn ensure_connected(&self) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        Ok(())
    }

    async fn send_request(&mut self, request: &Request) -> Result<()> {
        self.ensure_connected()?;

        trace!("Sending: {:?}", request);

        let data = request.encode();
        self.transport.send(&data).await?;

        debug!("Sent {} ({} bytes)", request.action(), data.len());
        Ok(())
    }

    async fn exchange(&mut self, request: &Request) -> Result<RecordStream<'_>> {
        self.send_request(request).await?;
        Ok(RecordStream::new(self.transport.as_mut(), self.read_timeout))
    }
}

fn copy(s: &str) -> bytes::Bytes {
    bytes::Bytes::copy_from_slice(s.as_bytes())
}
