//! Result streams of query and observe exchanges

use std::time::Duration;

use datalogger_core::{Event, Record, StreamDecoder, StreamEnd};
use datalogger_transport::Transport;
use tracing::{debug, trace};

use crate::error::Result;

/// Records returned by the server for one query or observe request
///
/// Borrows the client's transport for the rest of the exchange. The
/// stream is finite: it ends at the sentinel record or when the server
/// closes the connection, and [`end`](Self::end) tells which.
///
/// # Examples
///
/// ```no_run
/// use datalogger::{Client, StreamEnd};
///
/// # async fn run() -> datalogger::Result<()> {
/// let mut client = Client::new("localhost", 12345);
/// client.connect().await?;
///
/// let mut records = client.query_age("*", "temp", 3600).await?;
/// while let Some(record) = records.next().await? {
///     println!("{}", record);
/// }
/// assert!(records.end().is_some());
/// # Ok(())
/// # }
/// ```
pub struct RecordStream<'a> {
    transport: &'a mut dyn Transport,
    decoder: StreamDecoder,
    read_timeout: Option<Duration>,
    end: Option<StreamEnd>,
}

impl<'a> RecordStream<'a> {
    pub(crate) fn new(transport: &'a mut dyn Transport, read_timeout: Option<Duration>) -> Self {
        Self {
            transport,
            decoder: StreamDecoder::new(),
            read_timeout,
            end: None,
        }
    }

    /// Next record, or `None` once the stream has ended
    ///
    /// # Errors
    ///
    /// Framing errors from the decoder and transport failures other than
    /// the server closing the connection. Both end the exchange.
    pub async fn next(&mut self) -> Result<Option<Record>> {
        loop {
            match self.decoder.next_event()? {
                Some(Event::Record(record)) => return Ok(Some(record)),
                Some(Event::End(end)) => {
                    debug!("Record stream ended: {:?}", end);
                    self.end = Some(end);
                    return Ok(None);
                }
                None if self.decoder.is_finished() => return Ok(None),
                None => {}
            }

            match self.transport.receive(self.read_timeout).await {
                Ok(chunk) => {
                    trace!("Feeding {} bytes to decoder", chunk.len());
                    self.decoder.push(&chunk);
                }
                Err(datalogger_transport::Error::ConnectionClosed) => self.decoder.finish(),
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Read the remaining records
    pub async fn collect(mut self) -> Result<(Vec<Record>, StreamEnd)> {
        let mut records = Vec::new();

        while let Some(record) = self.next().await? {
            records.push(record);
        }

        // next() only returns None after recording the end
        let end = self.end.unwrap_or(StreamEnd::Closed);
        Ok((records, end))
    }

    /// How the stream ended, once [`next`](Self::next) returned `None`
    pub fn end(&self) -> Option<StreamEnd> {
        self.end
    }

    /// Records received so far
    pub fn received(&self) -> u64 {
        self.decoder.records()
    }
}
