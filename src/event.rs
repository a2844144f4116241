use std::fmt;

use crate::types::{HttpMethod, HttpVersion};

// ---------------------------------------------------------------------------
// MessageKind
// ---------------------------------------------------------------------------

/// Whether the message in flight is a request or a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Request,
    Response,
}

// ---------------------------------------------------------------------------
// MessageHead
// ---------------------------------------------------------------------------

/// Facts about a message that are known once its header section is complete.
///
/// Passed to the handler with [`Event::HeadersComplete`] and available from
/// [`Parser::head`](crate::Parser::head) afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHead {
    /// Request or response.
    pub kind: MessageKind,
    /// Request method (requests only).
    pub method: Option<HttpMethod>,
    /// Status code (responses only).
    pub status_code: Option<u16>,
    /// Protocol version from the start line.
    pub version: HttpVersion,
    /// Connection persistence after this message, from the version default
    /// and any `Connection` tokens.
    pub keep_alive: bool,
    /// The connection switches protocols after this message.
    pub upgrade: bool,
    /// The body uses chunked transfer-coding.
    pub chunked: bool,
    /// Declared body length, when framed by `Content-Length`.
    pub content_length: Option<u64>,
}

impl MessageHead {
    pub(crate) fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            method: None,
            status_code: None,
            version: HttpVersion::Http11,
            keep_alive: false,
            upgrade: false,
            chunked: false,
            content_length: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A single parse event, delivered to a [`Handler`] in stream order.
///
/// Fragment events (`Url`, `Status`, `HeaderField`, `HeaderValue`, `Body`)
/// may fire several times for one logical token when its bytes span multiple
/// `execute` calls; concatenate them to recover the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    /// A new message starts.
    MessageBegin,
    /// Part of the request target.
    Url(&'a [u8]),
    /// Part of the response reason phrase.
    Status(&'a [u8]),
    /// Part of a header (or trailer) field name.
    HeaderField(&'a [u8]),
    /// Part of a header (or trailer) field value.
    HeaderValue(&'a [u8]),
    /// The header section ended.
    HeadersComplete(&'a MessageHead),
    /// Part of the (decoded) body.
    Body(&'a [u8]),
    /// The message ended.
    MessageComplete,
    /// A chunk-size line was read; `0` announces the last chunk.
    ChunkHeader(u64),
    /// A chunk (including the last one and its trailers) ended.
    ChunkComplete,
}

impl Event<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::MessageBegin => EventKind::MessageBegin,
            Self::Url(_) => EventKind::Url,
            Self::Status(_) => EventKind::Status,
            Self::HeaderField(_) => EventKind::HeaderField,
            Self::HeaderValue(_) => EventKind::HeaderValue,
            Self::HeadersComplete(_) => EventKind::HeadersComplete,
            Self::Body(_) => EventKind::Body,
            Self::MessageComplete => EventKind::MessageComplete,
            Self::ChunkHeader(_) => EventKind::ChunkHeader,
            Self::ChunkComplete => EventKind::ChunkComplete,
        }
    }
}

/// The event vocabulary without payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MessageBegin,
    Url,
    Status,
    HeaderField,
    HeaderValue,
    HeadersComplete,
    Body,
    MessageComplete,
    ChunkHeader,
    ChunkComplete,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MessageBegin => "on_message_begin",
            Self::Url => "on_url",
            Self::Status => "on_status",
            Self::HeaderField => "on_header_field",
            Self::HeaderValue => "on_header_value",
            Self::HeadersComplete => "on_headers_complete",
            Self::Body => "on_body",
            Self::MessageComplete => "on_message_complete",
            Self::ChunkHeader => "on_chunk_header",
            Self::ChunkComplete => "on_chunk_complete",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// A handler's answer to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Control {
    /// Keep parsing.
    #[default]
    Continue,
    /// Treat the message as having no body. Only honoured for
    /// [`Event::HeadersComplete`] (e.g. the response to a `HEAD` request);
    /// elsewhere it behaves like `Continue`.
    SkipBody,
    /// Stop `execute` and set the `Paused` status until
    /// [`Parser::resume`](crate::Parser::resume).
    Pause,
    /// Stop `execute` and set
    /// [`ParseError::CallbackAborted`](crate::ParseError::CallbackAborted).
    Stop,
}

/// Receiver of parse events.
pub trait Handler {
    fn on_event(&mut self, event: Event<'_>) -> Control;
}

impl<H: Handler + ?Sized> Handler for &mut H {
    fn on_event(&mut self, event: Event<'_>) -> Control {
        (**self).on_event(event)
    }
}
