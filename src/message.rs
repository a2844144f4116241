use crate::event::{Control, Event, Handler, MessageHead, MessageKind};
use crate::types::{Header, HttpMessage, HttpRequest, HttpResponse};

/// A [`Handler`] that assembles complete [`HttpMessage`]s from the event
/// stream.
///
/// Fragments are concatenated per token; header names and values are
/// converted to strings lossily. Fields arriving after `HeadersComplete`
/// are trailers.
#[derive(Debug, Default)]
pub struct MessageCollector {
    messages: Vec<HttpMessage>,
    current: Option<Partial>,
}

/// Pieces of the message in flight.
#[derive(Debug, Default)]
struct Partial {
    url: Vec<u8>,
    reason: Vec<u8>,
    name: Vec<u8>,
    value: Vec<u8>,
    has_field: bool,
    in_value: bool,
    headers: Vec<Header>,
    trailers: Vec<Header>,
    head: Option<MessageHead>,
    body: Vec<u8>,
}

impl Partial {
    fn push_field(&mut self) {
        if !self.has_field {
            return;
        }
        let header = Header {
            name: String::from_utf8_lossy(&self.name).into_owned(),
            value: String::from_utf8_lossy(&self.value).into_owned(),
        };
        if self.head.is_some() {
            self.trailers.push(header);
        } else {
            self.headers.push(header);
        }
        self.name.clear();
        self.value.clear();
        self.has_field = false;
        self.in_value = false;
    }

    fn finish(mut self) -> Option<HttpMessage> {
        self.push_field();
        let head = self.head?;
        let body = (!self.body.is_empty()).then_some(self.body);

        let message = match head.kind {
            MessageKind::Request => HttpMessage::Request(HttpRequest {
                method: head.method?,
                url: String::from_utf8_lossy(&self.url).into_owned(),
                version: head.version,
                headers: self.headers,
                trailers: self.trailers,
                body,
                keep_alive: head.keep_alive,
                upgrade: head.upgrade,
            }),
            MessageKind::Response => HttpMessage::Response(HttpResponse {
                status: head.status_code?,
                reason: String::from_utf8_lossy(&self.reason).into_owned(),
                version: head.version,
                headers: self.headers,
                trailers: self.trailers,
                body,
                keep_alive: head.keep_alive,
                upgrade: head.upgrade,
            }),
        };
        Some(message)
    }
}

impl MessageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages completed so far.
    pub fn messages(&self) -> &[HttpMessage] {
        &self.messages
    }

    /// Take the completed messages, leaving any message in flight alone.
    pub fn take_messages(&mut self) -> Vec<HttpMessage> {
        std::mem::take(&mut self.messages)
    }

    pub fn into_messages(self) -> Vec<HttpMessage> {
        self.messages
    }

    /// A message has begun but not completed.
    pub fn in_progress(&self) -> bool {
        self.current.is_some()
    }
}

impl Handler for MessageCollector {
    fn on_event(&mut self, event: Event<'_>) -> Control {
        if let Event::MessageBegin = event {
            self.current = Some(Partial::default());
            return Control::Continue;
        }
        if let Event::MessageComplete = event {
            if let Some(message) = self.current.take().and_then(Partial::finish) {
                self.messages.push(message);
            }
            return Control::Continue;
        }

        let Some(partial) = self.current.as_mut() else {
            return Control::Continue;
        };
        match event {
            Event::Url(data) => partial.url.extend_from_slice(data),
            Event::Status(data) => partial.reason.extend_from_slice(data),
            Event::HeaderField(data) => {
                if partial.in_value {
                    partial.push_field();
                }
                partial.name.extend_from_slice(data);
                partial.has_field = true;
            }
            Event::HeaderValue(data) => {
                partial.value.extend_from_slice(data);
                partial.in_value = true;
            }
            Event::HeadersComplete(head) => {
                partial.push_field();
                partial.head = Some(head.clone());
            }
            Event::Body(data) => partial.body.extend_from_slice(data),
            _ => {}
        }
        Control::Continue
    }
}
