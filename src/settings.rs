use crate::event::{Control, Event, EventKind, Handler, MessageHead};

type NotifyCallback<'a> = Box<dyn FnMut() -> Control + 'a>;
type DataCallback<'a> = Box<dyn FnMut(&[u8]) -> Control + 'a>;
type HeadersCallback<'a> = Box<dyn FnMut(&MessageHead) -> Control + 'a>;
type ChunkHeaderCallback<'a> = Box<dyn FnMut(u64) -> Control + 'a>;

/// A [`Handler`] built from optional per-event closures.
///
/// Events without a registered closure are skipped as if answered with
/// [`Control::Continue`].
///
/// ```rust
/// use httpframe::{Callbacks, Control, Parser, ParserKind};
///
/// let mut url = Vec::new();
/// let mut callbacks = Callbacks::new().on_url(|data| {
///     url.extend_from_slice(data);
///     Control::Continue
/// });
///
/// let mut parser = Parser::new(ParserKind::Request);
/// parser.execute(&mut callbacks, b"GET /index.html HTTP/1.1\r\n\r\n");
/// drop(callbacks);
/// assert_eq!(url, b"/index.html");
/// ```
#[derive(Default)]
pub struct Callbacks<'a> {
    on_message_begin: Option<NotifyCallback<'a>>,
    on_url: Option<DataCallback<'a>>,
    on_status: Option<DataCallback<'a>>,
    on_header_field: Option<DataCallback<'a>>,
    on_header_value: Option<DataCallback<'a>>,
    on_headers_complete: Option<HeadersCallback<'a>>,
    on_body: Option<DataCallback<'a>>,
    on_message_complete: Option<NotifyCallback<'a>>,
    on_chunk_header: Option<ChunkHeaderCallback<'a>>,
    on_chunk_complete: Option<NotifyCallback<'a>>,
}

impl<'a> Callbacks<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_message_begin(mut self, f: impl FnMut() -> Control + 'a) -> Self {
        self.on_message_begin = Some(Box::new(f));
        self
    }

    pub fn on_url(mut self, f: impl FnMut(&[u8]) -> Control + 'a) -> Self {
        self.on_url = Some(Box::new(f));
        self
    }

    pub fn on_status(mut self, f: impl FnMut(&[u8]) -> Control + 'a) -> Self {
        self.on_status = Some(Box::new(f));
        self
    }

    pub fn on_header_field(mut self, f: impl FnMut(&[u8]) -> Control + 'a) -> Self {
        self.on_header_field = Some(Box::new(f));
        self
    }

    pub fn on_header_value(mut self, f: impl FnMut(&[u8]) -> Control + 'a) -> Self {
        self.on_header_value = Some(Box::new(f));
        self
    }

    /// Answer with [`Control::SkipBody`] to treat the message as bodyless.
    pub fn on_headers_complete(mut self, f: impl FnMut(&MessageHead) -> Control + 'a) -> Self {
        self.on_headers_complete = Some(Box::new(f));
        self
    }

    pub fn on_body(mut self, f: impl FnMut(&[u8]) -> Control + 'a) -> Self {
        self.on_body = Some(Box::new(f));
        self
    }

    pub fn on_message_complete(mut self, f: impl FnMut() -> Control + 'a) -> Self {
        self.on_message_complete = Some(Box::new(f));
        self
    }

    pub fn on_chunk_header(mut self, f: impl FnMut(u64) -> Control + 'a) -> Self {
        self.on_chunk_header = Some(Box::new(f));
        self
    }

    pub fn on_chunk_complete(mut self, f: impl FnMut() -> Control + 'a) -> Self {
        self.on_chunk_complete = Some(Box::new(f));
        self
    }

    /// Whether a closure is registered for `kind`.
    pub fn is_registered(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::MessageBegin => self.on_message_begin.is_some(),
            EventKind::Url => self.on_url.is_some(),
            EventKind::Status => self.on_status.is_some(),
            EventKind::HeaderField => self.on_header_field.is_some(),
            EventKind::HeaderValue => self.on_header_value.is_some(),
            EventKind::HeadersComplete => self.on_headers_complete.is_some(),
            EventKind::Body => self.on_body.is_some(),
            EventKind::MessageComplete => self.on_message_complete.is_some(),
            EventKind::ChunkHeader => self.on_chunk_header.is_some(),
            EventKind::ChunkComplete => self.on_chunk_complete.is_some(),
        }
    }
}

fn notify(slot: &mut Option<NotifyCallback<'_>>) -> Control {
    slot.as_mut().map_or(Control::Continue, |f| f())
}

fn data(slot: &mut Option<DataCallback<'_>>, bytes: &[u8]) -> Control {
    slot.as_mut().map_or(Control::Continue, |f| f(bytes))
}

impl Handler for Callbacks<'_> {
    fn on_event(&mut self, event: Event<'_>) -> Control {
        match event {
            Event::MessageBegin => notify(&mut self.on_message_begin),
            Event::Url(bytes) => data(&mut self.on_url, bytes),
            Event::Status(bytes) => data(&mut self.on_status, bytes),
            Event::HeaderField(bytes) => data(&mut self.on_header_field, bytes),
            Event::HeaderValue(bytes) => data(&mut self.on_header_value, bytes),
            Event::HeadersComplete(head) => self
                .on_headers_complete
                .as_mut()
                .map_or(Control::Continue, |f| f(head)),
            Event::Body(bytes) => data(&mut self.on_body, bytes),
            Event::MessageComplete => notify(&mut self.on_message_complete),
            Event::ChunkHeader(size) => self
                .on_chunk_header
                .as_mut()
                .map_or(Control::Continue, |f| f(size)),
            Event::ChunkComplete => notify(&mut self.on_chunk_complete),
        }
    }
}
