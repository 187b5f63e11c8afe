use async_stream::try_stream;
use futures::{Stream, StreamExt};
use log::warn;
use reqwest::Response;
use std::pin::Pin;
use std::{
    fmt::{self, Display, Formatter},
    time::Duration,
};
use thiserror::Error;

const FIELD_SEPARATOR: char = ':';
const LINE_FEED: u8 = b'\n';

/// Possible errors that can occur while parsing SSE events
#[derive(Error, Debug)]
pub enum EventError {
    #[error("invalid event format: event contains no data")]
    InvalidFormat,
}

/// Represents a Server-Sent Event (SSE) with its associated fields.
///
/// Each event can contain:
/// - An optional ID
/// - An optional event type
/// - The event data (required)
/// - An optional retry timeout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Unique identifier for the event
    pub id: Option<String>,
    /// Type of the event (defaults to "message" in SSE spec)
    pub event_type: Option<String>,
    /// The event payload
    pub data: String,
    /// Reconnection time in case of connection failure
    pub retry: Option<Duration>,
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Event {{ id: {:?}, event_type: {:?}, data: {}, retry: {:?} }}",
            self.id, self.event_type, self.data, self.retry
        )
    }
}

impl Event {
    /// Creates a new empty Event.
    pub const fn new() -> Self {
        Self {
            id: None,
            event_type: None,
            data: String::new(),
            retry: None,
        }
    }

    /// Creates a data-only event on the default channel.
    pub fn with_data(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Self::new()
        }
    }

    /// Parses an SSE event from a string slice.
    ///
    /// # Arguments
    ///
    /// * `input` - The string slice containing the event's field lines
    ///
    /// # Returns
    ///
    /// Returns `Ok(Event)` if the event contains data, or `Err(EventError)`
    /// if it is empty. A `retry` value that is not a number is ignored.
    pub fn parse(input: &str) -> Result<Self, EventError> {
        let mut event = Self::new();
        let mut data_lines = Vec::new();

        for line in input.lines() {
            if line.is_empty() {
                continue;
            }

            let (field, value) = line.split_once(FIELD_SEPARATOR).unwrap_or((line, ""));
            let value = value.strip_prefix(' ').unwrap_or(value);
            match field {
                "id" => event.id = Some(value.to_string()),
                "event" => event.event_type = Some(value.to_string()),
                "data" => data_lines.push(value),
                "retry" => match value.parse::<u64>() {
                    Ok(ms) => event.retry = Some(Duration::from_millis(ms)),
                    Err(e) => warn!("Ignoring invalid retry value {value:?}: {e}"),
                },
                _ => {} // Comments and unknown fields are ignored
            }
        }

        if data_lines.is_empty() {
            return Err(EventError::InvalidFormat);
        }

        event.data = data_lines.join("\n");
        Ok(event)
    }
}

/// Incremental SSE decoder.
///
/// Bytes are fed in whatever chunks the transport delivers. Incomplete lines
/// stay in a residual byte buffer until their line feed arrives, so a
/// multi-byte UTF-8 sequence split across two chunks decodes intact.
#[derive(Debug, Default)]
pub struct EventDecoder {
    residual: Vec<u8>,
    pending: String,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one chunk and returns every event it completed, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Event> {
        self.residual.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.residual[start..].iter().position(|&b| b == LINE_FEED) {
            let end = start + offset;
            let line = decode_line(&self.residual[start..end]);
            self.push_line(&line, &mut events);
            start = end + 1;
        }
        self.residual.drain(..start);

        events
    }

    /// Flushes whatever is left once the byte stream has ended.
    pub fn finish(&mut self) -> Option<Event> {
        let mut events = Vec::new();
        if !self.residual.is_empty() {
            let line = decode_line(&self.residual);
            self.residual.clear();
            self.push_line(&line, &mut events);
        }
        self.push_line("", &mut events);
        events.pop()
    }

    fn push_line(&mut self, line: &str, events: &mut Vec<Event>) {
        if !line.is_empty() {
            self.pending.push_str(line);
            self.pending.push('\n');
            return;
        }

        if self.pending.is_empty() {
            return;
        }

        // Comment-only blocks carry no data
        if let Ok(event) = Event::parse(&self.pending) {
            events.push(event);
        }
        self.pending.clear();
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Decodes a stream of byte chunks into a stream of SSE events.
pub fn decode_stream<S, B, E>(mut stream: S) -> impl Stream<Item = Result<Event, E>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + Unpin,
    B: AsRef<[u8]> + Send,
    E: Send,
{
    try_stream! {
        let mut decoder = EventDecoder::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for event in decoder.feed(chunk.as_ref()) {
                yield event;
            }
        }

        if let Some(event) = decoder.finish() {
            yield event;
        }
    }
}

/// Extension trait for converting a Response into a Stream of SSE Events.
pub trait EventSourceExt {
    /// Converts the response into a Stream of Events.
    ///
    /// # Returns
    ///
    /// Returns a pinned Stream that yields Result<Event, `reqwest::Error`>
    fn events(self) -> Pin<Box<dyn Stream<Item = Result<Event, reqwest::Error>> + Send>>;
}

impl EventSourceExt for Response {
    fn events(self) -> Pin<Box<dyn Stream<Item = Result<Event, reqwest::Error>> + Send>> {
        Box::pin(decode_stream(self.bytes_stream().boxed()))
    }
}
