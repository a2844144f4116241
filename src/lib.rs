//! # httpframe
//!
//! An **incremental, allocation-minimal HTTP/1.x message parser** implemented
//! as a byte-driven state machine, usable both as a Rust library and as a CLI
//! tool.
//!
//! The parser accepts requests, responses, or either (auto-detected per
//! message). Input can arrive in arbitrarily sized pieces; the parser reports
//! what it finds through [`Event`]s pointing into the caller's buffer instead
//! of building the message itself. It follows **RFC 9112** framing rules:
//! `Content-Length`, chunked transfer-coding with trailers, bodies delimited
//! by connection close, keep-alive, and protocol upgrades.
//!
//! ## Quick start: one-shot parsing
//!
//! ```rust
//! use httpframe::parse_request;
//!
//! let raw = b"GET /hello HTTP/1.1\r\nHost: example.com\r\n\r\n";
//! let request = parse_request(raw).expect("valid request");
//! assert_eq!(request.method.as_str(), "GET");
//! assert_eq!(request.url, "/hello");
//! ```
//!
//! ## Quick start: incremental parsing
//!
//! ```rust
//! use httpframe::{MessageCollector, Parser, ParserKind};
//!
//! let mut parser = Parser::new(ParserKind::Response);
//! let mut collector = MessageCollector::new();
//!
//! let first = b"HTTP/1.1 200 OK\r\nContent-Le";
//! let second = b"ngth: 2\r\n\r\nhi";
//! assert_eq!(parser.execute(&mut collector, first), first.len());
//! assert_eq!(parser.execute(&mut collector, second), second.len());
//!
//! let messages = collector.into_messages();
//! assert_eq!(messages[0].body(), Some(&b"hi"[..]));
//! ```

mod chars;
mod error;
mod event;
mod message;
mod output;
mod parser;
mod settings;
mod status;
mod types;

// Re-export public API.
pub use error::ParseError;
pub use event::{Control, Event, EventKind, Handler, MessageHead, MessageKind};
pub use message::MessageCollector;
pub use output::{format_debug, format_headers_only, format_json};
pub use parser::{Parser, ParserConfig, ParserKind};
pub use settings::Callbacks;
pub use status::canonical_reason;
pub use types::{Header, HttpMessage, HttpMethod, HttpRequest, HttpResponse, HttpVersion};

/// Parse every message in `data`, treating the end of `data` as the end of
/// the stream.
///
/// Pipelined messages are returned in order. A response body delimited by
/// connection close runs to the end of `data`. After an upgrade the remaining
/// bytes belong to another protocol and are ignored.
///
/// # Errors
///
/// Returns the [`ParseError`] that stopped the parser, or
/// [`ParseError::InvalidEofState`] if `data` holds no complete message.
pub fn parse_messages(
    kind: ParserKind,
    data: &[u8],
    config: ParserConfig,
) -> Result<Vec<HttpMessage>, ParseError> {
    let mut parser = Parser::with_config(kind, config);
    let mut collector = MessageCollector::new();

    parser.execute(&mut collector, data);
    if !parser.is_upgraded() {
        parser.execute(&mut collector, &[]);
    }
    if let Some(error) = parser.error() {
        return Err(error);
    }

    let messages = collector.into_messages();
    if messages.is_empty() {
        return Err(ParseError::InvalidEofState);
    }
    Ok(messages)
}

/// Parse a **complete** HTTP request from a byte slice in one call.
///
/// This is a convenience wrapper around [`Parser`] and
/// [`MessageCollector`]. For incremental / streaming use-cases, create a
/// `Parser` directly.
///
/// # Errors
///
/// Returns [`ParseError`] if the data is malformed or incomplete.
pub fn parse_request(data: &[u8]) -> Result<HttpRequest, ParseError> {
    parse_request_with_config(data, ParserConfig::default())
}

/// Parse a **complete** HTTP request using custom [`ParserConfig`] limits.
///
/// # Errors
///
/// Returns [`ParseError`] if the data is malformed, incomplete, or
/// exceeds the configured limits.
pub fn parse_request_with_config(
    data: &[u8],
    config: ParserConfig,
) -> Result<HttpRequest, ParseError> {
    parse_messages(ParserKind::Request, data, config)?
        .into_iter()
        .find_map(|message| match message {
            HttpMessage::Request(request) => Some(request),
            HttpMessage::Response(_) => None,
        })
        .ok_or(ParseError::InvalidEofState)
}

/// Parse a **complete** HTTP response from a byte slice in one call.
///
/// # Errors
///
/// Returns [`ParseError`] if the data is malformed or incomplete.
pub fn parse_response(data: &[u8]) -> Result<HttpResponse, ParseError> {
    parse_messages(ParserKind::Response, data, ParserConfig::default())?
        .into_iter()
        .find_map(|message| match message {
            HttpMessage::Response(response) => Some(response),
            HttpMessage::Request(_) => None,
        })
        .ok_or(ParseError::InvalidEofState)
}
