use tracing::{debug, trace};

use crate::chars::{hex_value, is_field_content_byte, is_ows, is_tchar, is_url_char};
use crate::error::ParseError;
use crate::event::{Control, Event, Handler, MessageHead, MessageKind};
use crate::status::forbids_body;
use crate::types::{HttpMethod, HttpVersion};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Limits and strictness toggles for the HTTP parser.
///
/// All sizes are in bytes unless stated otherwise.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Maximum length of the request target (default: 8 192).
    pub max_url_len: usize,
    /// Maximum length of a single header field name (default: 256).
    pub max_header_name_len: usize,
    /// Maximum length of a single header field value (default: 8 192).
    pub max_header_value_len: usize,
    /// Maximum number of header fields, trailers included (default: 128).
    pub max_headers_count: usize,
    /// Maximum size of the header section: start line plus headers, and
    /// likewise each chunk-size line and the trailer section
    /// (default: 80 KiB, `None` for no bound).
    pub max_header_size: Option<usize>,
    /// Maximum declared or decoded body size (default: no bound).
    pub max_body_size: Option<u64>,
    /// Accept obsolete line folding in header values, collapsing each fold
    /// into a single SP (default: `false`, folds are rejected).
    pub allow_obs_fold: bool,
    /// Accept `Transfer-Encoding` together with `Content-Length`; the
    /// transfer-coding then decides the framing (default: `false`, the
    /// combination is rejected as ambiguous).
    pub allow_chunked_with_content_length: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_url_len: 8_192,
            max_header_name_len: 256,
            max_header_value_len: 8_192,
            max_headers_count: 128,
            max_header_size: Some(80 * 1024),
            max_body_size: None,
            allow_obs_fold: false,
            allow_chunked_with_content_length: false,
        }
    }
}

/// Which messages a [`Parser`] accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserKind {
    Request,
    Response,
    /// Decide per message: `HTTP/` starts a response, anything else a request.
    Both,
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    // ---- Between messages ----
    MessageStart,
    Dead,

    // ---- Start line ----
    Detect,
    Method,
    Url,
    ReqVersion,
    ResVersion,
    ResStatus,
    ResReason,
    LineLf,

    // ---- Header / trailer section ----
    HeaderFieldStart,
    HeaderName,
    HeaderValueStart,
    HeaderValue,
    FoldWs,
    HeadersAlmostDone,

    // ---- Identity body ----
    Body,
    BodyUntilClose,

    // ---- Chunked transfer encoding ----
    ChunkSizeStart,
    ChunkSize,
    ChunkSizeWs,
    ChunkExt,
    ChunkSizeLf,
    ChunkData,
    ChunkDataCr,
    ChunkDataLf,

    // ---- Done ----
    MessageDone,
    Upgraded,
}

impl State {
    /// States whose bytes count against `max_header_size`.
    fn in_head(self) -> bool {
        !matches!(
            self,
            Self::MessageStart
                | Self::Dead
                | Self::Body
                | Self::BodyUntilClose
                | Self::ChunkData
                | Self::ChunkDataCr
                | Self::ChunkDataLf
                | Self::MessageDone
                | Self::Upgraded
        )
    }
}

/// Headers whose values decide framing or connection handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderKind {
    Other,
    ContentLength,
    TransferEncoding,
    Connection,
    Upgrade,
}

impl HeaderKind {
    fn classify(name: &[u8]) -> Self {
        if name.eq_ignore_ascii_case(b"content-length") {
            Self::ContentLength
        } else if name.eq_ignore_ascii_case(b"transfer-encoding") {
            Self::TransferEncoding
        } else if name.eq_ignore_ascii_case(b"connection") {
            Self::Connection
        } else if name.eq_ignore_ascii_case(b"upgrade") {
            Self::Upgrade
        } else {
            Self::Other
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Flags {
    transfer_encoding: bool,
    chunked: bool,
    connection_close: bool,
    connection_keep_alive: bool,
    connection_upgrade: bool,
    upgrade_header: bool,
    trailing: bool,
}

/// Where and why `execute` stopped early.
struct Halt {
    consumed: usize,
    error: ParseError,
}

impl Halt {
    fn at(consumed: usize, error: ParseError) -> Self {
        Self { consumed, error }
    }
}

const RESPONSE_PREFIX: &[u8] = b"HTTP/";

/// Deliver `event`, turning `Pause`/`Stop` answers into a [`Halt`] that
/// reports `at` bytes consumed.
fn notify<H: Handler + ?Sized>(
    handler: &mut H,
    event: Event<'_>,
    at: usize,
) -> Result<Control, Halt> {
    let kind = event.kind();
    match handler.on_event(event) {
        Control::Pause => Err(Halt::at(at, ParseError::Paused)),
        Control::Stop => Err(Halt::at(at, ParseError::CallbackAborted(kind))),
        control => Ok(control),
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// An incremental, state-machine-based HTTP/1.x message parser.
///
/// The parser never buffers the message: it reports the start line, header
/// fields and body through [`Event`]s as bytes arrive, in whatever pieces
/// the caller hands over. Only the few bytes that decide framing are copied
/// into owned scratch buffers.
///
/// # Usage
///
/// ```rust
/// use httpframe::{Control, Event, Handler, Parser, ParserKind};
///
/// #[derive(Default)]
/// struct BodyLen(usize);
///
/// impl Handler for BodyLen {
///     fn on_event(&mut self, event: Event<'_>) -> Control {
///         if let Event::Body(data) = event {
///             self.0 += data.len();
///         }
///         Control::Continue
///     }
/// }
///
/// let raw = b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
/// let mut parser = Parser::new(ParserKind::Request);
/// let mut handler = BodyLen::default();
///
/// assert_eq!(parser.execute(&mut handler, raw), raw.len());
/// assert!(parser.error().is_none());
/// assert_eq!(handler.0, 5);
/// ```
#[derive(Debug)]
pub struct Parser {
    kind: ParserKind,
    config: ParserConfig,
    state: State,
    error: Option<ParseError>,
    bytes_consumed: usize,

    // Facts about the message in flight
    head: MessageHead,
    head_complete: bool,
    flags: Flags,
    content_length: Option<u64>,
    eof_framed: bool,

    // Counters
    remaining: u64,
    body_total: u64,
    header_bytes: usize,
    headers_count: usize,
    token_len: usize,
    status_code: u16,
    status_digits: u8,

    // Current header field
    header_pending: bool,
    header_kind: HeaderKind,

    // Scratch buffers for tokens that span calls
    method_buf: Vec<u8>,
    version_buf: Vec<u8>,
    name_buf: Vec<u8>,
    value_buf: Vec<u8>,
    pending_ws: Vec<u8>,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new(kind: ParserKind) -> Self {
        Self::with_config(kind, ParserConfig::default())
    }

    /// Create a new parser with custom limits and strictness.
    pub fn with_config(kind: ParserKind, config: ParserConfig) -> Self {
        Self {
            kind,
            config,
            state: State::MessageStart,
            error: None,
            bytes_consumed: 0,
            head: MessageHead::new(initial_kind(kind)),
            head_complete: false,
            flags: Flags::default(),
            content_length: None,
            eof_framed: false,
            remaining: 0,
            body_total: 0,
            header_bytes: 0,
            headers_count: 0,
            token_len: 0,
            status_code: 0,
            status_digits: 0,
            header_pending: false,
            header_kind: HeaderKind::Other,
            method_buf: Vec::with_capacity(HttpMethod::MAX_LEN),
            version_buf: Vec::with_capacity(HttpVersion::LEN),
            name_buf: Vec::with_capacity(32),
            value_buf: Vec::with_capacity(32),
            pending_ws: Vec::new(),
        }
    }

    /// Reset all state and switch to parsing `kind` messages.
    ///
    /// This is the only way to clear a sticky error other than `Paused`.
    pub fn initialize(&mut self, kind: ParserKind) {
        self.kind = kind;
        self.state = State::MessageStart;
        self.error = None;
        self.bytes_consumed = 0;
        self.clear_message();
    }

    /// Reset the parser, keeping its kind and configuration.
    pub fn reset(&mut self) {
        self.initialize(self.kind);
    }

    /// Feed a slice of bytes into the parser, reporting events to `handler`.
    ///
    /// Returns the number of bytes consumed. That is `data.len()` unless
    /// parsing stopped early:
    ///
    /// - on a malformed byte (the count is its offset) or a handler answering
    ///   `Pause`/`Stop`; [`Parser::error`] then holds the reason;
    /// - after an accepted upgrade, where the count is the end of the header
    ///   block and the rest belongs to the new protocol.
    ///
    /// An empty `data` signals end of stream. It completes a body delimited
    /// by connection close and is an [`ParseError::InvalidEofState`] error in
    /// the middle of any other message.
    ///
    /// While an error is set, nothing is consumed.
    pub fn execute<H: Handler + ?Sized>(&mut self, handler: &mut H, data: &[u8]) -> usize {
        if self.error.is_some() {
            return 0;
        }

        let result = if data.is_empty() {
            self.finish_stream(handler)
        } else {
            self.run(handler, data)
        };

        let consumed = match result {
            Ok(consumed) => consumed,
            Err(Halt { consumed, error }) => {
                debug!(%error, consumed, "HTTP parsing stopped");
                self.error = Some(error);
                consumed
            }
        };
        self.bytes_consumed += consumed;
        consumed
    }

    // ----- main loop ------------------------------------------------------

    fn run<H: Handler + ?Sized>(&mut self, handler: &mut H, data: &[u8]) -> Result<usize, Halt> {
        let mut counted = None;
        let result = self.scan(handler, data, &mut counted);
        if let Err(halt) = &result {
            // A byte left unconsumed is counted again when it is fed back.
            if counted == Some(halt.consumed) {
                self.header_bytes = self.header_bytes.saturating_sub(1);
            }
        }
        result
    }

    /// `counted` is the offset of the last byte charged to `header_bytes`.
    fn scan<H: Handler + ?Sized>(
        &mut self,
        handler: &mut H,
        data: &[u8],
        counted: &mut Option<usize>,
    ) -> Result<usize, Halt> {
        let len = data.len();
        // Start of the token fragment not yet reported in this call.
        let mut mark: Option<usize> = None;
        // Start of a run of whitespace inside a header value.
        let mut ws_start: Option<usize> = None;
        let mut i = 0;

        while i < len {
            // ----- Zero-width and bulk paths -----
            match self.state {
                State::Upgraded => return Ok(i),
                State::MessageDone => {
                    self.complete_message(handler, i)?;
                    continue;
                }
                State::Body => {
                    let n = ((len - i) as u64).min(self.remaining) as usize;
                    self.remaining -= n as u64;
                    if self.remaining == 0 {
                        self.state = State::MessageDone;
                    }
                    let start = i;
                    i += n;
                    notify(handler, Event::Body(&data[start..i]), i)?;
                    continue;
                }
                State::ChunkData => {
                    let n = ((len - i) as u64).min(self.remaining) as usize;
                    self.remaining -= n as u64;
                    if self.remaining == 0 {
                        self.state = State::ChunkDataCr;
                    }
                    let start = i;
                    i += n;
                    notify(handler, Event::Body(&data[start..i]), i)?;
                    continue;
                }
                State::BodyUntilClose => {
                    self.count_body((len - i) as u64)
                        .map_err(|e| Halt::at(i, e))?;
                    let start = i;
                    i = len;
                    notify(handler, Event::Body(&data[start..]), len)?;
                    continue;
                }
                _ => {}
            }

            // ----- Byte-by-byte path -----
            let byte = data[i];

            if self.state.in_head() {
                self.header_bytes += 1;
                *counted = Some(i);
                if self
                    .config
                    .max_header_size
                    .is_some_and(|limit| self.header_bytes > limit)
                {
                    return Err(Halt::at(i, ParseError::HeaderTooLarge));
                }
            }

            match self.state {
                // ===================== BETWEEN MESSAGES =====================
                State::MessageStart => {
                    if byte != b'\r' && byte != b'\n' {
                        self.begin_message();
                        notify(handler, Event::MessageBegin, i)?;
                        // Re-examine this byte in the first start-line state.
                        continue;
                    }
                }

                State::Dead => {
                    if byte != b'\r' && byte != b'\n' {
                        return Err(Halt::at(i, ParseError::ClosedConnection));
                    }
                }

                // ===================== START LINE =====================
                State::Detect => {
                    let n = self.method_buf.len();
                    if RESPONSE_PREFIX.get(n) == Some(&byte) {
                        self.method_buf.push(byte);
                        if self.method_buf.len() == RESPONSE_PREFIX.len() {
                            self.head.kind = MessageKind::Response;
                            std::mem::swap(&mut self.version_buf, &mut self.method_buf);
                            self.state = State::ResVersion;
                        }
                    } else {
                        self.head.kind = MessageKind::Request;
                        self.state = State::Method;
                        self.method_byte(byte).map_err(|e| Halt::at(i, e))?;
                    }
                }

                State::Method => {
                    self.method_byte(byte).map_err(|e| Halt::at(i, e))?;
                }

                State::Url => {
                    if byte == b' ' {
                        match mark.take() {
                            Some(m) => {
                                notify(handler, Event::Url(&data[m..i]), i)?;
                            }
                            None if self.token_len == 0 => {
                                return Err(Halt::at(i, ParseError::InvalidUrl));
                            }
                            None => {}
                        }
                        self.state = State::ReqVersion;
                    } else if is_url_char(byte) {
                        self.token_len += 1;
                        if self.token_len > self.config.max_url_len {
                            return Err(Halt::at(i, ParseError::InvalidUrl));
                        }
                        mark.get_or_insert(i);
                    } else {
                        return Err(Halt::at(i, ParseError::InvalidUrl));
                    }
                }

                State::ReqVersion => {
                    if byte == b'\r' {
                        self.head.version =
                            HttpVersion::from_bytes(&self.version_buf).map_err(|e| Halt::at(i, e))?;
                        self.state = State::LineLf;
                    } else {
                        self.version_byte(byte).map_err(|e| Halt::at(i, e))?;
                    }
                }

                State::ResVersion => {
                    if byte == b' ' {
                        self.head.version =
                            HttpVersion::from_bytes(&self.version_buf).map_err(|e| Halt::at(i, e))?;
                        self.state = State::ResStatus;
                    } else {
                        self.version_byte(byte).map_err(|e| Halt::at(i, e))?;
                    }
                }

                State::ResStatus => {
                    if byte.is_ascii_digit() && self.status_digits < 3 {
                        self.status_code = self.status_code * 10 + u16::from(byte - b'0');
                        self.status_digits += 1;
                    } else if self.status_digits == 3
                        && self.status_code >= 100
                        && (byte == b' ' || byte == b'\r')
                    {
                        self.head.status_code = Some(self.status_code);
                        self.state = if byte == b' ' {
                            State::ResReason
                        } else {
                            State::LineLf
                        };
                    } else {
                        return Err(Halt::at(i, ParseError::InvalidStatus));
                    }
                }

                State::ResReason => {
                    if byte == b'\r' {
                        if let Some(m) = mark.take() {
                            notify(handler, Event::Status(&data[m..i]), i)?;
                        }
                        self.state = State::LineLf;
                    } else if is_field_content_byte(byte) {
                        mark.get_or_insert(i);
                    } else {
                        return Err(Halt::at(i, ParseError::InvalidStatus));
                    }
                }

                State::LineLf => {
                    if byte == b'\n' {
                        self.state = State::HeaderFieldStart;
                    } else {
                        return Err(Halt::at(i, ParseError::LfExpected));
                    }
                }

                // ===================== HEADERS =====================
                State::HeaderFieldStart => {
                    if byte == b'\r' {
                        self.finish_header().map_err(|e| Halt::at(i, e))?;
                        self.state = State::HeadersAlmostDone;
                    } else if is_ows(byte) {
                        // obs-fold: continuation of the previous value.
                        if !self.header_pending {
                            return Err(Halt::at(i, ParseError::InvalidHeaderToken));
                        }
                        if !self.config.allow_obs_fold {
                            return Err(Halt::at(i, ParseError::HeaderFolding));
                        }
                        self.state = State::FoldWs;
                    } else if is_tchar(byte) {
                        self.finish_header().map_err(|e| Halt::at(i, e))?;
                        self.headers_count += 1;
                        if self.headers_count > self.config.max_headers_count {
                            return Err(Halt::at(i, ParseError::TooManyHeaders));
                        }
                        self.name_buf.clear();
                        self.name_buf.push(byte);
                        self.token_len = 1;
                        mark = Some(i);
                        self.state = State::HeaderName;
                    } else {
                        return Err(Halt::at(i, ParseError::InvalidHeaderToken));
                    }
                }

                State::HeaderName => {
                    if byte == b':' {
                        if let Some(m) = mark.take() {
                            notify(handler, Event::HeaderField(&data[m..i]), i)?;
                        }
                        self.header_kind = if self.flags.trailing {
                            HeaderKind::Other
                        } else {
                            HeaderKind::classify(&self.name_buf)
                        };
                        self.value_buf.clear();
                        self.pending_ws.clear();
                        self.token_len = 0;
                        self.header_pending = true;
                        self.state = State::HeaderValueStart;
                    } else if is_tchar(byte) {
                        self.token_len += 1;
                        if self.token_len > self.config.max_header_name_len {
                            return Err(Halt::at(i, ParseError::HeaderTooLarge));
                        }
                        self.name_buf.push(byte);
                        mark.get_or_insert(i);
                    } else {
                        return Err(Halt::at(i, ParseError::InvalidHeaderToken));
                    }
                }

                State::HeaderValueStart => {
                    if is_ows(byte) {
                        // Skip optional whitespace before the value.
                    } else if byte == b'\r' {
                        // Empty value: still reported, so field/value pairs
                        // stay aligned for consumers.
                        self.state = State::LineLf;
                        notify(handler, Event::HeaderValue(b""), i + 1)?;
                    } else if is_field_content_byte(byte) {
                        self.value_byte(byte).map_err(|e| Halt::at(i, e))?;
                        mark = Some(i);
                        ws_start = None;
                        self.state = State::HeaderValue;
                    } else {
                        return Err(Halt::at(i, ParseError::InvalidHeaderValue));
                    }
                }

                State::HeaderValue => {
                    if byte == b'\r' {
                        // Trailing OWS is not part of the value.
                        let end = ws_start.take().unwrap_or(i);
                        self.pending_ws.clear();
                        self.state = State::LineLf;
                        if let Some(m) = mark.take() {
                            if m < end {
                                notify(handler, Event::HeaderValue(&data[m..end]), i + 1)?;
                            }
                        }
                    } else if is_ows(byte) {
                        self.value_byte(byte).map_err(|e| Halt::at(i, e))?;
                        mark.get_or_insert(i);
                        ws_start.get_or_insert(i);
                    } else if is_field_content_byte(byte) {
                        if !self.pending_ws.is_empty() {
                            // Whitespace held back at the end of the last call
                            // turned out to be interior.
                            if let Some(m) = mark.take() {
                                self.pending_ws.extend_from_slice(&data[m..i]);
                            }
                            // Swapped out for the borrow, then back in to reuse its capacity.
                            let ws = std::mem::take(&mut self.pending_ws);
                            let result = notify(handler, Event::HeaderValue(&ws), i);
                            self.pending_ws = ws;
                            self.pending_ws.clear();
                            result?;
                        }
                        self.value_byte(byte).map_err(|e| Halt::at(i, e))?;
                        mark.get_or_insert(i);
                        ws_start = None;
                    } else {
                        return Err(Halt::at(i, ParseError::InvalidHeaderValue));
                    }
                }

                State::FoldWs => {
                    if is_ows(byte) {
                        // Skip the rest of the fold.
                    } else if byte == b'\r' {
                        self.state = State::LineLf;
                    } else if is_field_content_byte(byte) {
                        self.state = State::HeaderValue;
                        if self.token_len > 0 {
                            self.value_byte(b' ').map_err(|e| Halt::at(i, e))?;
                            notify(handler, Event::HeaderValue(b" "), i)?;
                        }
                        self.value_byte(byte).map_err(|e| Halt::at(i, e))?;
                        mark = Some(i);
                        ws_start = None;
                    } else {
                        return Err(Halt::at(i, ParseError::InvalidHeaderValue));
                    }
                }

                State::HeadersAlmostDone => {
                    if byte != b'\n' {
                        return Err(Halt::at(i, ParseError::LfExpected));
                    }
                    if self.flags.trailing {
                        self.state = State::MessageDone;
                        notify(handler, Event::ChunkComplete, i + 1)?;
                    } else {
                        self.headers_done(handler, i)?;
                    }
                }

                // ===================== CHUNKED ENCODING =====================
                State::ChunkSizeStart => match hex_value(byte) {
                    Some(digit) => {
                        self.remaining = u64::from(digit);
                        self.state = State::ChunkSize;
                    }
                    None => return Err(Halt::at(i, ParseError::InvalidChunkSize)),
                },

                State::ChunkSize => {
                    if let Some(digit) = hex_value(byte) {
                        self.remaining = self
                            .remaining
                            .checked_mul(16)
                            .and_then(|n| n.checked_add(u64::from(digit)))
                            .ok_or_else(|| Halt::at(i, ParseError::ChunkSizeOverflow))?;
                    } else if is_ows(byte) {
                        self.state = State::ChunkSizeWs;
                    } else if byte == b';' {
                        self.state = State::ChunkExt;
                    } else if byte == b'\r' {
                        self.state = State::ChunkSizeLf;
                    } else {
                        return Err(Halt::at(i, ParseError::InvalidChunkSize));
                    }
                }

                State::ChunkSizeWs => {
                    if is_ows(byte) {
                        // BWS before extensions or CRLF.
                    } else if byte == b';' {
                        self.state = State::ChunkExt;
                    } else if byte == b'\r' {
                        self.state = State::ChunkSizeLf;
                    } else {
                        return Err(Halt::at(i, ParseError::InvalidChunkSize));
                    }
                }

                State::ChunkExt => {
                    // Extensions are ignored, but must still be field content.
                    if byte == b'\r' {
                        self.state = State::ChunkSizeLf;
                    } else if !is_field_content_byte(byte) {
                        return Err(Halt::at(i, ParseError::InvalidChunkSize));
                    }
                }

                State::ChunkSizeLf => {
                    if byte != b'\n' {
                        return Err(Halt::at(i, ParseError::LfExpected));
                    }
                    let size = self.remaining;
                    self.count_body(size).map_err(|e| Halt::at(i, e))?;
                    self.header_bytes = 0;
                    if size == 0 {
                        // Last chunk → trailer section.
                        self.flags.trailing = true;
                        self.header_pending = false;
                        self.state = State::HeaderFieldStart;
                    } else {
                        self.state = State::ChunkData;
                    }
                    trace!(size, "chunk header");
                    notify(handler, Event::ChunkHeader(size), i + 1)?;
                }

                State::ChunkDataCr => {
                    if byte == b'\r' {
                        self.state = State::ChunkDataLf;
                    } else {
                        return Err(Halt::at(i, ParseError::CrExpected));
                    }
                }

                State::ChunkDataLf => {
                    if byte != b'\n' {
                        return Err(Halt::at(i, ParseError::LfExpected));
                    }
                    self.header_bytes = 0;
                    self.state = State::ChunkSizeStart;
                    notify(handler, Event::ChunkComplete, i + 1)?;
                }

                // Handled by the zero-width and bulk paths above.
                State::Body
                | State::BodyUntilClose
                | State::ChunkData
                | State::MessageDone
                | State::Upgraded => {
                    return Err(Halt::at(i, ParseError::InvalidInternalState));
                }
            }

            i += 1;
        }

        // ----- Report token fragments cut off by the end of the buffer -----
        match self.state {
            State::Url => {
                if let Some(m) = mark {
                    notify(handler, Event::Url(&data[m..]), len)?;
                }
            }
            State::ResReason => {
                if let Some(m) = mark {
                    notify(handler, Event::Status(&data[m..]), len)?;
                }
            }
            State::HeaderName => {
                if let Some(m) = mark {
                    notify(handler, Event::HeaderField(&data[m..]), len)?;
                }
            }
            State::HeaderValue => {
                // Trailing whitespace is held back until we know whether the
                // value continues.
                let end = ws_start.unwrap_or(len);
                if let Some(w) = ws_start {
                    self.pending_ws.extend_from_slice(&data[w..]);
                }
                if let Some(m) = mark {
                    if m < end {
                        notify(handler, Event::HeaderValue(&data[m..end]), len)?;
                    }
                }
            }
            State::MessageDone => self.complete_message(handler, len)?,
            _ => {}
        }

        Ok(len)
    }

    /// Handle end of stream.
    fn finish_stream<H: Handler + ?Sized>(&mut self, handler: &mut H) -> Result<usize, Halt> {
        match self.state {
            State::MessageStart | State::Dead | State::Upgraded => Ok(0),
            State::MessageDone => {
                self.complete_message(handler, 0)?;
                Ok(0)
            }
            State::BodyUntilClose => {
                self.state = State::Dead;
                trace!(body = self.body_total, "message complete at end of stream");
                notify(handler, Event::MessageComplete, 0)?;
                Ok(0)
            }
            _ => Err(Halt::at(0, ParseError::InvalidEofState)),
        }
    }

    // ----- helpers --------------------------------------------------------

    /// Forget everything about the previous message.
    fn clear_message(&mut self) {
        self.head = MessageHead::new(initial_kind(self.kind));
        self.head_complete = false;
        self.flags = Flags::default();
        self.content_length = None;
        self.eof_framed = false;
        self.remaining = 0;
        self.body_total = 0;
        self.header_bytes = 0;
        self.headers_count = 0;
        self.token_len = 0;
        self.status_code = 0;
        self.status_digits = 0;
        self.header_pending = false;
        self.header_kind = HeaderKind::Other;
        self.method_buf.clear();
        self.version_buf.clear();
        self.name_buf.clear();
        self.value_buf.clear();
        self.pending_ws.clear();
    }

    fn begin_message(&mut self) {
        self.clear_message();
        self.state = match self.kind {
            ParserKind::Request => State::Method,
            ParserKind::Response => State::ResVersion,
            ParserKind::Both => State::Detect,
        };
    }

    fn method_byte(&mut self, byte: u8) -> Result<(), ParseError> {
        if byte == b' ' {
            self.head.method = Some(HttpMethod::from_bytes(&self.method_buf)?);
            self.token_len = 0;
            self.state = State::Url;
        } else if is_tchar(byte) && self.method_buf.len() < HttpMethod::MAX_LEN {
            self.method_buf.push(byte);
        } else {
            return Err(ParseError::InvalidMethod);
        }
        Ok(())
    }

    fn version_byte(&mut self, byte: u8) -> Result<(), ParseError> {
        if (is_tchar(byte) || byte == b'/') && self.version_buf.len() < HttpVersion::LEN {
            self.version_buf.push(byte);
            Ok(())
        } else {
            Err(ParseError::InvalidVersion)
        }
    }

    /// Account for one byte of the current header value.
    fn value_byte(&mut self, byte: u8) -> Result<(), ParseError> {
        self.token_len += 1;
        if self.token_len > self.config.max_header_value_len {
            return Err(ParseError::HeaderTooLarge);
        }
        if self.header_kind != HeaderKind::Other {
            self.value_buf.push(byte);
        }
        Ok(())
    }

    fn count_body(&mut self, n: u64) -> Result<(), ParseError> {
        self.body_total = self.body_total.saturating_add(n);
        match self.config.max_body_size {
            Some(max) if self.body_total > max => Err(ParseError::BodyTooLarge),
            _ => Ok(()),
        }
    }

    /// Apply the semantics of the header that just ended, if it is one that
    /// decides framing or connection handling.
    fn finish_header(&mut self) -> Result<(), ParseError> {
        if !self.header_pending {
            return Ok(());
        }
        self.header_pending = false;

        let value = self.value_buf.trim_ascii();
        match self.header_kind {
            HeaderKind::Other => {}
            HeaderKind::ContentLength => {
                let length = parse_content_length(value)?;
                // RFC 9112 §6.3: repeated values must agree.
                if self.content_length.is_some_and(|prev| prev != length) {
                    return Err(ParseError::InvalidContentLength);
                }
                if self.config.max_body_size.is_some_and(|max| length > max) {
                    return Err(ParseError::BodyTooLarge);
                }
                self.content_length = Some(length);
            }
            HeaderKind::TransferEncoding => {
                // Nothing may follow `chunked`, not even in a later field.
                if self.flags.chunked {
                    return Err(ParseError::InvalidTransferEncoding);
                }
                self.flags.transfer_encoding = true;
                let mut codings = value
                    .split(|&b| b == b',')
                    .map(<[u8]>::trim_ascii)
                    .filter(|c| !c.is_empty())
                    .peekable();
                let mut last_chunked = false;
                while let Some(coding) = codings.next() {
                    let chunked = coding.eq_ignore_ascii_case(b"chunked");
                    if chunked && codings.peek().is_some() {
                        return Err(ParseError::InvalidTransferEncoding);
                    }
                    last_chunked = chunked;
                }
                self.flags.chunked = last_chunked;
            }
            HeaderKind::Connection => {
                for token in value.split(|&b| b == b',').map(<[u8]>::trim_ascii) {
                    if token.eq_ignore_ascii_case(b"close") {
                        self.flags.connection_close = true;
                    } else if token.eq_ignore_ascii_case(b"keep-alive") {
                        self.flags.connection_keep_alive = true;
                    } else if token.eq_ignore_ascii_case(b"upgrade") {
                        self.flags.connection_upgrade = true;
                    }
                }
            }
            HeaderKind::Upgrade => self.flags.upgrade_header = true,
        }
        Ok(())
    }

    /// Decide framing once the header section ended at the LF at `i`.
    fn headers_done<H: Handler + ?Sized>(&mut self, handler: &mut H, i: usize) -> Result<(), Halt> {
        let flags = self.flags;
        let kind = self.head.kind;

        // RFC 9112 §6.1: a message with both is a request-smuggling risk.
        if flags.transfer_encoding
            && self.content_length.is_some()
            && !self.config.allow_chunked_with_content_length
        {
            return Err(Halt::at(i, ParseError::AmbiguousFraming));
        }
        if flags.transfer_encoding && !flags.chunked && kind == MessageKind::Request {
            return Err(Halt::at(i, ParseError::InvalidTransferEncoding));
        }

        self.head.keep_alive = match self.head.version {
            HttpVersion::Http11 => !flags.connection_close,
            HttpVersion::Http10 => flags.connection_keep_alive && !flags.connection_close,
        };
        let upgrade_requested = flags.upgrade_header && flags.connection_upgrade;
        self.head.upgrade = match kind {
            MessageKind::Request => {
                upgrade_requested || self.head.method == Some(HttpMethod::CONNECT)
            }
            MessageKind::Response => upgrade_requested && self.head.status_code == Some(101),
        };
        self.head.chunked = flags.transfer_encoding && flags.chunked;
        self.head.content_length = if flags.transfer_encoding {
            None
        } else {
            self.content_length
        };
        self.head_complete = true;
        self.header_bytes = 0;

        let bodyless =
            kind == MessageKind::Response && self.head.status_code.is_some_and(forbids_body);
        self.state = if self.head.upgrade || bodyless {
            State::MessageDone
        } else if self.head.chunked {
            State::ChunkSizeStart
        } else if flags.transfer_encoding {
            State::BodyUntilClose
        } else {
            match self.head.content_length {
                Some(0) => State::MessageDone,
                Some(length) => {
                    self.remaining = length;
                    self.body_total = length;
                    State::Body
                }
                None if kind == MessageKind::Response => State::BodyUntilClose,
                None => State::MessageDone,
            }
        };
        self.eof_framed = self.state == State::BodyUntilClose;

        trace!(
            kind = ?kind,
            version = %self.head.version,
            keep_alive = self.head.keep_alive,
            upgrade = self.head.upgrade,
            chunked = self.head.chunked,
            content_length = ?self.head.content_length,
            "headers complete"
        );

        let control = notify(handler, Event::HeadersComplete(&self.head), i + 1)?;
        if control == Control::SkipBody && !self.head.upgrade {
            self.state = State::MessageDone;
            self.eof_framed = false;
        }
        Ok(())
    }

    /// Fire `MessageComplete` and re-arm for the next message.
    fn complete_message<H: Handler + ?Sized>(&mut self, handler: &mut H, at: usize) -> Result<(), Halt> {
        self.state = if self.head.upgrade {
            debug!("connection upgraded, parser stops consuming");
            State::Upgraded
        } else if self.should_keep_alive() {
            State::MessageStart
        } else {
            State::Dead
        };
        trace!(body = self.body_total, next = ?self.state, "message complete");
        notify(handler, Event::MessageComplete, at)?;
        Ok(())
    }

    // ----- public query ---------------------------------------------------

    /// The sticky error status, if parsing stopped.
    pub fn error(&self) -> Option<ParseError> {
        self.error
    }

    /// Pause the parser from outside a callback; `execute` consumes nothing
    /// until [`Parser::resume`].
    pub fn pause(&mut self) {
        if self.error.is_none() {
            self.error = Some(ParseError::Paused);
        }
    }

    /// Clear the `Paused` status. Other errors stay.
    pub fn resume(&mut self) {
        if self.error == Some(ParseError::Paused) {
            self.error = None;
        }
    }

    pub fn is_paused(&self) -> bool {
        self.error == Some(ParseError::Paused)
    }

    /// The configured kind.
    pub fn kind(&self) -> ParserKind {
        self.kind
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Facts about the current (or most recently completed) message, once
    /// its header section is complete.
    pub fn head(&self) -> Option<&MessageHead> {
        self.head_complete.then_some(&self.head)
    }

    pub fn message_kind(&self) -> Option<MessageKind> {
        self.head().map(|h| h.kind)
    }

    pub fn http_version(&self) -> Option<HttpVersion> {
        self.head().map(|h| h.version)
    }

    pub fn method(&self) -> Option<HttpMethod> {
        self.head().and_then(|h| h.method)
    }

    pub fn status_code(&self) -> Option<u16> {
        self.head().and_then(|h| h.status_code)
    }

    /// Connection persistence from the HTTP version and `Connection` tokens.
    pub fn keep_alive(&self) -> bool {
        self.head().is_some_and(|h| h.keep_alive)
    }

    /// The body of the current message ends only when the connection closes.
    pub fn needs_eof(&self) -> bool {
        self.eof_framed
    }

    /// Whether another message may follow on this connection: `keep_alive`
    /// unless the body is delimited by connection close.
    pub fn should_keep_alive(&self) -> bool {
        self.keep_alive() && !self.needs_eof()
    }

    /// The current message requests a protocol switch.
    pub fn is_upgrade(&self) -> bool {
        self.head().is_some_and(|h| h.upgrade)
    }

    /// The parser handed the connection over to another protocol and will
    /// not consume further bytes.
    pub fn is_upgraded(&self) -> bool {
        self.state == State::Upgraded
    }

    pub fn is_chunked(&self) -> bool {
        self.head().is_some_and(|h| h.chunked)
    }

    pub fn content_length(&self) -> Option<u64> {
        self.head().and_then(|h| h.content_length)
    }

    /// Total number of bytes consumed across all `execute` calls.
    pub fn bytes_consumed(&self) -> usize {
        self.bytes_consumed
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(ParserKind::Both)
    }
}

fn initial_kind(kind: ParserKind) -> MessageKind {
    match kind {
        ParserKind::Response => MessageKind::Response,
        ParserKind::Request | ParserKind::Both => MessageKind::Request,
    }
}

/// Decimal `Content-Length` with an overflow check on every digit.
fn parse_content_length(value: &[u8]) -> Result<u64, ParseError> {
    if value.is_empty() {
        return Err(ParseError::InvalidContentLength);
    }
    value.iter().try_fold(0u64, |acc, &b| {
        if !b.is_ascii_digit() {
            return Err(ParseError::InvalidContentLength);
        }
        acc.checked_mul(10)
            .and_then(|n| n.checked_add(u64::from(b - b'0')))
            .ok_or(ParseError::ContentLengthOverflow)
    })
}

// ---------------------------------------------------------------------------
// Tests (unit)
// ---------------------------------------------------------------------------
