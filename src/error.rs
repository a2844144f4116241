use thiserror::Error;

use crate::event::EventKind;

/// Errors that stop the parser.
///
/// Once [`Parser::execute`](crate::Parser::execute) reports one of these the
/// status is sticky: the parser makes no further progress until it is
/// re-initialized (or, for [`ParseError::Paused`], resumed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The method is not a token or not a known HTTP method.
    #[error("invalid HTTP method")]
    InvalidMethod,
    /// The request target is empty, too long, or contains a forbidden byte.
    #[error("invalid request URL")]
    InvalidUrl,
    /// The version is not `HTTP/1.0` or `HTTP/1.1`.
    #[error("invalid HTTP version")]
    InvalidVersion,
    /// The status code is not three digits in 100..=999, or the reason
    /// phrase contains a control character.
    #[error("invalid HTTP status")]
    InvalidStatus,
    /// A header name contains a non-token byte.
    #[error("invalid character in header name")]
    InvalidHeaderToken,
    /// A header value contains a control character.
    #[error("invalid character in header value")]
    InvalidHeaderValue,
    /// Obsolete line folding was found while it is disallowed.
    #[error("obsolete header line folding is not allowed")]
    HeaderFolding,
    /// A configured size limit on the header section was exceeded.
    #[error("header section exceeds the configured limit")]
    HeaderTooLarge,
    /// The number of header fields exceeds the configured maximum.
    #[error("number of headers exceeds maximum")]
    TooManyHeaders,
    /// A CR was expected.
    #[error("CR character expected")]
    CrExpected,
    /// A LF was expected.
    #[error("LF character expected")]
    LfExpected,
    /// `Content-Length` is not a decimal number, or repeats disagree.
    #[error("invalid Content-Length")]
    InvalidContentLength,
    /// `Content-Length` does not fit in 64 bits.
    #[error("Content-Length overflows 64 bits")]
    ContentLengthOverflow,
    /// A chunk-size line is malformed.
    #[error("invalid chunk size line")]
    InvalidChunkSize,
    /// A chunk size does not fit in 64 bits.
    #[error("chunk size overflows 64 bits")]
    ChunkSizeOverflow,
    /// `chunked` is not the final transfer-coding.
    #[error("invalid Transfer-Encoding")]
    InvalidTransferEncoding,
    /// Both `Transfer-Encoding` and `Content-Length` were sent.
    #[error("both Transfer-Encoding and Content-Length present")]
    AmbiguousFraming,
    /// The body exceeds the configured maximum size.
    #[error("body exceeds maximum allowed size")]
    BodyTooLarge,
    /// The stream ended in the middle of a message.
    #[error("stream ended at an unexpected time")]
    InvalidEofState,
    /// Data arrived after a message that closes the connection.
    #[error("data received after completed connection: close message")]
    ClosedConnection,
    /// The parser reached a state it should never be in.
    #[error("encountered unexpected internal state")]
    InvalidInternalState,
    /// The parser is paused.
    #[error("parser is paused")]
    Paused,
    /// A handler answered [`Control::Stop`](crate::Control::Stop).
    #[error("the {0} callback requested stop")]
    CallbackAborted(EventKind),
}

impl ParseError {
    /// `true` when a handler stopped parsing rather than the input being
    /// malformed.
    pub fn is_callback_abort(&self) -> bool {
        matches!(self, Self::CallbackAborted(_))
    }

    /// `true` for the resumable `Paused` status.
    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused)
    }
}
