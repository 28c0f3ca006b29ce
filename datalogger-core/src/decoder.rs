//! Incremental frame decoding
//!
//! Bytes arrive from the transport in arbitrary chunks. [`decode_frame`]
//! inspects a buffer and reports whether a full frame is present without
//! consuming anything; [`StreamDecoder`] owns the accumulation buffer and
//! turns pushed chunks into [`Event`]s.
//!
//! Usage:
//! - Call [`StreamDecoder::push`] with every chunk read from the transport.
//! - Drain [`StreamDecoder::next_event`] until it returns `Ok(None)`.
//! - Call [`StreamDecoder::finish`] once the transport reports end of stream.
//! - Any `Err` is fatal to the session; the buffer alignment is lost.

use std::io::{self, Read};

use bytes::{Buf, BytesMut};
use tracing::{debug, trace};

use crate::{
    constants::{FIELDS_PER_FRAME, MARKER_SIZE, MIN_DECODE_BYTES, START_MARKER},
    error::{Error, Result},
    field::FieldType,
    record::{Record, RecordBuilder},
    tlv,
};

/// Outcome of one decode attempt
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeResult {
    /// A complete frame was found at the start of the buffer
    Frame {
        record: Record,
        /// Bytes the caller should discard
        consumed: usize,
    },

    /// More bytes are required; the buffer must be left untouched
    NeedMore,
}

/// Try to decode one frame from the start of `buf`
///
/// # Errors
///
/// - [`Error::StartMarkerMismatch`] if the buffer doesn't start with `0x5A5A`
/// - [`Error::UnknownFieldType`] for a type code outside the known set
/// - [`Error::FieldLengthMismatch`] for an action or time entry of the wrong size
/// - [`Error::DuplicateField`] if a field type repeats within the frame
///
/// Header problems are reported as soon as the four header bytes are
/// available, without waiting for the value.
pub fn decode_frame(buf: &[u8]) -> Result<DecodeResult> {
    let Some(marker) = tlv::peek_marker(buf) else {
        return Ok(DecodeResult::NeedMore);
    };
    if marker != START_MARKER {
        return Err(Error::StartMarkerMismatch { found: marker });
    }

    let mut builder = RecordBuilder::default();
    let mut offset = MARKER_SIZE;

    for _ in 0..FIELDS_PER_FRAME {
        let Some(header) = tlv::peek_header(&buf[offset..]) else {
            return Ok(DecodeResult::NeedMore);
        };

        let field = FieldType::try_from(header.raw_type)?;
        if let Some(expected) = field.fixed_len() {
            if header.len != expected {
                return Err(Error::FieldLengthMismatch {
                    field,
                    expected,
                    actual: header.len,
                });
            }
        }

        let end = offset + header.entry_len();
        if buf.len() < end {
            return Ok(DecodeResult::NeedMore);
        }

        builder.set(field, &buf[end - header.len..end])?;
        offset = end;
    }

    Ok(DecodeResult::Frame {
        record: builder.finish(),
        consumed: offset,
    })
}

/// Why a record stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The server sent the end-of-results sentinel
    Sentinel,

    /// The server closed the connection on a frame boundary
    Closed,
}

/// Item produced by [`StreamDecoder`]
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Record(Record),
    End(StreamEnd),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Accepting bytes
    Streaming,

    /// Transport reported end of stream; draining what is buffered
    Closing,

    /// End event delivered
    Finished,

    /// A fatal error was returned
    Poisoned,
}

/// Reassembles frames from a chunked byte stream
///
/// One decoder per connection. Not restartable: after the end event or a
/// fatal error it produces nothing more.
///
/// # Examples
///
/// ```
/// use datalogger_core::{Event, Record, StreamDecoder, StreamEnd};
///
/// let mut bytes = Record::new("SN1", "temp", vec![1]).encode().unwrap();
/// bytes.extend_from_slice(&Record::sentinel().encode().unwrap());
///
/// let mut decoder = StreamDecoder::new();
/// let (head, tail) = bytes.split_at(7);
///
/// decoder.push(head);
/// assert_eq!(decoder.next_event().unwrap(), None);
///
/// decoder.push(tail);
/// assert!(matches!(decoder.next_event().unwrap(), Some(Event::Record(_))));
/// assert_eq!(decoder.next_event().unwrap(), Some(Event::End(StreamEnd::Sentinel)));
/// ```
#[derive(Debug)]
pub struct StreamDecoder {
    buffer: BytesMut,
    state: State,
    records: u64,
}

impl StreamDecoder {
    /// Default buffer capacity
    pub const DEFAULT_CAPACITY: usize = 4096;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            state: State::Streaming,
            records: 0,
        }
    }

    /// Append bytes received from the transport
    ///
    /// An empty chunk is the transport's end-of-stream signal and has the
    /// same effect as [`finish`](Self::finish). Bytes pushed after the
    /// stream ended are ignored.
    pub fn push(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            self.finish();
            return;
        }

        match self.state {
            State::Streaming => {
                trace!("Buffered {} bytes ({} pending)", chunk.len(), self.buffer.len() + chunk.len());
                self.buffer.extend_from_slice(chunk);
            }
            _ => trace!("Ignoring {} bytes after end of stream", chunk.len()),
        }
    }

    /// Mark the end of the underlying stream
    pub fn finish(&mut self) {
        if self.state == State::Streaming {
            self.state = State::Closing;
        }
    }

    /// Decode the next event from buffered bytes
    ///
    /// Returns `Ok(None)` when more bytes are needed or the stream already
    /// ended.
    ///
    /// # Errors
    ///
    /// Framing errors from [`decode_frame`], [`Error::TruncatedFrame`] if the
    /// stream ended mid-frame, and [`Error::DecoderPoisoned`] on any call
    /// after a fatal error.
    pub fn next_event(&mut self) -> Result<Option<Event>> {
        match self.state {
            State::Finished => return Ok(None),
            State::Poisoned => return Err(Error::DecoderPoisoned),
            State::Streaming | State::Closing => {}
        }

        if self.buffer.len() > MIN_DECODE_BYTES {
            match decode_frame(&self.buffer) {
                Ok(DecodeResult::Frame { record, consumed }) => {
                    self.buffer.advance(consumed);
                    return Ok(Some(self.emit(record)));
                }
                Ok(DecodeResult::NeedMore) => {}
                Err(e) => {
                    debug!("Decoding failed after {} records: {}", self.records, e);
                    self.state = State::Poisoned;
                    return Err(e);
                }
            }
        }

        if self.state != State::Closing {
            return Ok(None);
        }

        if self.buffer.is_empty() {
            debug!("Stream closed after {} records", self.records);
            self.state = State::Finished;
            Ok(Some(Event::End(StreamEnd::Closed)))
        } else {
            let pending = self.buffer.len();
            debug!("Stream closed with {} bytes of a partial frame", pending);
            self.state = State::Poisoned;
            Err(Error::TruncatedFrame { pending })
        }
    }

    /// Push a chunk and collect every event it completes
    pub fn decode(&mut self, chunk: &[u8]) -> Result<Vec<Event>> {
        self.push(chunk);

        let mut events = Vec::new();
        while let Some(event) = self.next_event()? {
            events.push(event);
        }

        Ok(events)
    }

    /// Bytes buffered but not yet decoded
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Records yielded so far, sentinel excluded
    pub fn records(&self) -> u64 {
        self.records
    }

    /// End event delivered; nothing more will be produced
    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    fn emit(&mut self, record: Record) -> Event {
        if record.is_sentinel() {
            debug!(
                "Sentinel received after {} records ({} bytes left unread)",
                self.records,
                self.buffer.len()
            );
            self.state = State::Finished;
            return Event::End(StreamEnd::Sentinel);
        }

        self.records += 1;
        trace!("Decoded {:?}", record);
        Event::Record(record)
    }
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Blocking record iterator over any [`Read`] source
///
/// Yields records until the sentinel or end of input, then `None`.
/// [`end`](Self::end) tells the two apart afterwards.
pub struct RecordReader<R> {
    reader: R,
    decoder: StreamDecoder,
    chunk: Vec<u8>,
    end: Option<StreamEnd>,
}

impl<R: Read> RecordReader<R> {
    /// Read size per call, matching a typical network MTU
    pub const CHUNK_SIZE: usize = 1500;

    pub fn new(reader: R) -> Self {
        Self {
            reader,
            decoder: StreamDecoder::new(),
            chunk: vec![0; Self::CHUNK_SIZE],
            end: None,
        }
    }

    /// How the stream ended, once iteration is over
    pub fn end(&self) -> Option<StreamEnd> {
        self.end
    }

    fn next_record(&mut self) -> Result<Option<Record>> {
        loop {
            match self.decoder.next_event()? {
                Some(Event::Record(record)) => return Ok(Some(record)),
                Some(Event::End(end)) => {
                    self.end = Some(end);
                    return Ok(None);
                }
                None if self.decoder.is_finished() => return Ok(None),
                None => {}
            }

            let n = match self.reader.read(&mut self.chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            self.decoder.push(&self.chunk[..n]);
        }
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
