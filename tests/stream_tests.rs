use httpframe::{
    Callbacks, Control, Event, EventKind, Handler, HttpMethod, HttpVersion, MessageHead,
    MessageKind, ParseError, Parser, ParserConfig, ParserKind,
};

// =========================================================================
// Recording handler
// =========================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Rec {
    Begin,
    Url(Vec<u8>),
    Status(Vec<u8>),
    Field(Vec<u8>),
    Value(Vec<u8>),
    HeadersDone(MessageHead),
    Body(Vec<u8>),
    Complete,
    ChunkHeader(u64),
    ChunkComplete,
}

#[derive(Debug, Default)]
struct Recorder {
    events: Vec<Rec>,
    /// Answer `Pause` the next time each of these kinds fires.
    pause_on: Vec<EventKind>,
    stop_on: Option<EventKind>,
    skip_body: bool,
}

impl Handler for Recorder {
    fn on_event(&mut self, event: Event<'_>) -> Control {
        let kind = event.kind();
        self.events.push(match event {
            Event::MessageBegin => Rec::Begin,
            Event::Url(d) => Rec::Url(d.to_vec()),
            Event::Status(d) => Rec::Status(d.to_vec()),
            Event::HeaderField(d) => Rec::Field(d.to_vec()),
            Event::HeaderValue(d) => Rec::Value(d.to_vec()),
            Event::HeadersComplete(head) => Rec::HeadersDone(head.clone()),
            Event::Body(d) => Rec::Body(d.to_vec()),
            Event::MessageComplete => Rec::Complete,
            Event::ChunkHeader(size) => Rec::ChunkHeader(size),
            Event::ChunkComplete => Rec::ChunkComplete,
        });

        if self.stop_on == Some(kind) {
            return Control::Stop;
        }
        if let Some(pos) = self.pause_on.iter().position(|k| *k == kind) {
            self.pause_on.remove(pos);
            return Control::Pause;
        }
        if self.skip_body && kind == EventKind::HeadersComplete {
            return Control::SkipBody;
        }
        Control::Continue
    }
}

/// Merge adjacent fragments of the same token.
fn coalesce(events: &[Rec]) -> Vec<Rec> {
    let mut out: Vec<Rec> = Vec::with_capacity(events.len());
    for event in events {
        match (out.last_mut(), event) {
            (Some(Rec::Url(a)), Rec::Url(b))
            | (Some(Rec::Status(a)), Rec::Status(b))
            | (Some(Rec::Field(a)), Rec::Field(b))
            | (Some(Rec::Value(a)), Rec::Value(b))
            | (Some(Rec::Body(a)), Rec::Body(b)) => a.extend_from_slice(b),
            _ => out.push(event.clone()),
        }
    }
    out
}

fn run_whole(kind: ParserKind, config: &ParserConfig, raw: &[u8]) -> Vec<Rec> {
    let mut parser = Parser::with_config(kind, config.clone());
    let mut rec = Recorder::default();
    assert_eq!(parser.execute(&mut rec, raw), raw.len());
    assert_eq!(parser.error(), None);
    rec.events
}

fn headers_of(events: &[Rec]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for event in coalesce(events) {
        match event {
            Rec::Field(name) => pairs.push((String::from_utf8(name).unwrap(), String::new())),
            Rec::Value(value) => {
                let last = pairs.last_mut().expect("value after a field");
                last.1 = String::from_utf8(value).unwrap();
            }
            _ => {}
        }
    }
    pairs
}

fn body_of(events: &[Rec]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            Rec::Body(d) => Some(d.as_slice()),
            _ => None,
        })
        .flatten()
        .copied()
        .collect()
}

const CHUNKED_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\n\
    Content-Type: text/plain\r\n\
    Transfer-Encoding: chunked\r\n\r\n\
    4\r\nWiki\r\n\
    5\r\npedia\r\n\
    E\r\n in\r\n\r\nchunks.\r\n\
    0\r\n\r\n";

// =========================================================================
// Byte-boundary invariance
// =========================================================================

#[test]
fn every_split_point_yields_the_same_events() {
    let fold = ParserConfig {
        allow_obs_fold: true,
        ..ParserConfig::default()
    };
    let cases: [(ParserKind, ParserConfig, &[u8]); 4] = [
        (
            ParserKind::Request,
            ParserConfig::default(),
            b"POST /submit?q=1 HTTP/1.1\r\nHost: example.com\r\nX-Spaced:  a  b  \r\nX-Empty:\r\nContent-Length: 11\r\n\r\nhello world",
        ),
        (ParserKind::Response, ParserConfig::default(), CHUNKED_RESPONSE),
        (
            ParserKind::Both,
            fold,
            b"GET / HTTP/1.1\r\nX-Long: one\r\n  two \r\n\r\nHTTP/1.1 404 Not Found\r\nContent-Length: 3\r\n\r\nnopGET /again HTTP/1.1\r\n\r\n",
        ),
        (
            ParserKind::Request,
            ParserConfig::default(),
            b"PUT /t HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n3;name=val\r\nabc\r\n0\r\nExpires: never \r\nX-Sum:\r\n\r\n",
        ),
    ];

    for (kind, config, raw) in cases {
        let expected = coalesce(&run_whole(kind, &config, raw));

        for split in 1..raw.len() {
            let mut parser = Parser::with_config(kind, config.clone());
            let mut rec = Recorder::default();
            let (first, second) = raw.split_at(split);
            assert_eq!(parser.execute(&mut rec, first), first.len(), "split {split}");
            assert_eq!(parser.execute(&mut rec, second), second.len(), "split {split}");
            assert_eq!(coalesce(&rec.events), expected, "split {split}");
        }

        let mut parser = Parser::with_config(kind, config.clone());
        let mut rec = Recorder::default();
        for byte in raw.chunks(1) {
            assert_eq!(parser.execute(&mut rec, byte), 1);
        }
        assert_eq!(coalesce(&rec.events), expected, "byte at a time");
        assert_eq!(parser.bytes_consumed(), raw.len());
    }
}

// =========================================================================
// Reconstruction & conservation
// =========================================================================

#[test]
fn headers_are_reconstructed_from_fragments() {
    let raw = b"GET /index.html HTTP/1.1\r\nHost:  example.com \r\nAccept: */*\r\nX-Empty:\r\n\r\n";
    let mut parser = Parser::new(ParserKind::Request);
    let mut rec = Recorder::default();
    for piece in raw.chunks(3) {
        parser.execute(&mut rec, piece);
    }

    assert_eq!(
        headers_of(&rec.events),
        vec![
            ("Host".to_string(), "example.com".to_string()),
            ("Accept".to_string(), "*/*".to_string()),
            ("X-Empty".to_string(), String::new()),
        ]
    );
    let coalesced = coalesce(&rec.events);
    assert_eq!(coalesced[0], Rec::Begin);
    assert_eq!(coalesced[1], Rec::Url(b"/index.html".to_vec()));
    assert_eq!(coalesced.last(), Some(&Rec::Complete));
}

#[test]
fn empty_value_is_still_reported() {
    let events = run_whole(
        ParserKind::Request,
        &ParserConfig::default(),
        b"GET / HTTP/1.1\r\nX-Empty:   \r\n\r\n",
    );
    assert!(events.contains(&Rec::Value(Vec::new())));
}

#[test]
fn body_length_is_conserved() {
    let body: Vec<u8> = (0..=255u8).cycle().take(5_000).collect();
    let mut raw = format!("POST /upload HTTP/1.1\r\nContent-Length: {}\r\n\r\n", body.len()).into_bytes();
    raw.extend_from_slice(&body);

    let mut parser = Parser::new(ParserKind::Request);
    let mut rec = Recorder::default();
    for piece in raw.chunks(97) {
        assert_eq!(parser.execute(&mut rec, piece), piece.len());
    }
    assert_eq!(body_of(&rec.events), body);
    assert_eq!(rec.events.last(), Some(&Rec::Complete));
}

#[test]
fn chunked_body_events_in_order() {
    let events = coalesce(&run_whole(
        ParserKind::Response,
        &ParserConfig::default(),
        CHUNKED_RESPONSE,
    ));
    let after_headers: Vec<Rec> = events
        .iter()
        .skip_while(|e| !matches!(e, Rec::HeadersDone(_)))
        .skip(1)
        .cloned()
        .collect();

    assert_eq!(
        after_headers,
        vec![
            Rec::ChunkHeader(4),
            Rec::Body(b"Wiki".to_vec()),
            Rec::ChunkComplete,
            Rec::ChunkHeader(5),
            Rec::Body(b"pedia".to_vec()),
            Rec::ChunkComplete,
            Rec::ChunkHeader(14),
            Rec::Body(b" in\r\n\r\nchunks.".to_vec()),
            Rec::ChunkComplete,
            Rec::ChunkHeader(0),
            Rec::ChunkComplete,
            Rec::Complete,
        ]
    );
    assert_eq!(body_of(&events), b"Wikipedia in\r\n\r\nchunks.");
}

#[test]
fn wikipedia_chunks_decode() {
    let raw = b"POST /wiki HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";
    let mut parser = Parser::new(ParserKind::Request);
    let mut rec = Recorder::default();
    let (head, chunks) = raw.split_at(raw.len() - 24);
    parser.execute(&mut rec, head);
    assert!(parser.is_chunked());
    assert!(!rec.events.contains(&Rec::Complete));

    assert_eq!(parser.execute(&mut rec, chunks), chunks.len());
    assert_eq!(body_of(&rec.events), b"Wikipedia");
    assert_eq!(rec.events.last(), Some(&Rec::Complete));
}

#[test]
fn trailers_follow_the_last_chunk() {
    let raw = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n2\r\nok\r\n0\r\nContent-MD5: abc\r\n\r\n";
    let events = coalesce(&run_whole(ParserKind::Request, &ParserConfig::default(), raw));
    let last_chunk = events
        .iter()
        .position(|e| *e == Rec::ChunkHeader(0))
        .expect("last chunk");
    assert_eq!(
        &events[last_chunk..],
        &[
            Rec::ChunkHeader(0),
            Rec::Field(b"Content-MD5".to_vec()),
            Rec::Value(b"abc".to_vec()),
            Rec::ChunkComplete,
            Rec::Complete,
        ]
    );
}

// =========================================================================
// Message facts
// =========================================================================

#[test]
fn head_facts_for_a_request() {
    let raw = b"DELETE /item/7 HTTP/1.0\r\nConnection: keep-alive\r\nContent-Length: 0\r\n\r\n";
    let mut parser = Parser::new(ParserKind::Request);
    let mut rec = Recorder::default();
    parser.execute(&mut rec, raw);

    let head = parser.head().expect("headers complete");
    assert_eq!(head.kind, MessageKind::Request);
    assert_eq!(parser.method(), Some(HttpMethod::DELETE));
    assert_eq!(parser.http_version(), Some(HttpVersion::Http10));
    assert_eq!(parser.content_length(), Some(0));
    assert!(parser.keep_alive());
    assert!(parser.should_keep_alive());
    assert!(!parser.is_chunked());
    assert!(!parser.is_upgrade());
    assert_eq!(parser.status_code(), None);
}

#[test]
fn response_keep_alive_depends_on_version() {
    let mut parser = Parser::new(ParserKind::Response);
    let mut rec = Recorder::default();
    parser.execute(&mut rec, b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");
    assert!(parser.should_keep_alive());

    let mut parser = Parser::new(ParserKind::Response);
    parser.execute(&mut rec, b"HTTP/1.0 200 OK\r\nContent-Length: 0\r\n\r\n");
    assert!(!parser.should_keep_alive());
    assert_eq!(parser.execute(&mut rec, b"HTTP/1.0 200 OK\r\n"), 0);
    assert_eq!(parser.error(), Some(ParseError::ClosedConnection));
}

#[test]
fn bare_status_line_keep_alive_flag() {
    let mut rec = Recorder::default();
    let mut parser = Parser::new(ParserKind::Response);
    parser.execute(&mut rec, b"HTTP/1.1 200 OK\r\n\r\n");
    assert!(parser.keep_alive());

    let mut parser = Parser::new(ParserKind::Response);
    parser.execute(&mut rec, b"HTTP/1.0 200 OK\r\n\r\n");
    assert!(!parser.keep_alive());
}

#[test]
fn body_until_close_needs_eof() {
    let mut parser = Parser::new(ParserKind::Response);
    let mut rec = Recorder::default();
    parser.execute(&mut rec, b"HTTP/1.1 200 OK\r\n\r\npart one ");
    assert!(parser.needs_eof());
    assert!(parser.keep_alive());
    assert!(!parser.should_keep_alive());
    parser.execute(&mut rec, b"part two");
    assert!(!rec.events.contains(&Rec::Complete));

    assert_eq!(parser.execute(&mut rec, &[]), 0);
    assert_eq!(parser.error(), None);
    assert_eq!(body_of(&rec.events), b"part one part two");
    assert_eq!(rec.events.last(), Some(&Rec::Complete));
}

#[test]
fn eof_mid_message_is_an_error() {
    let mut parser = Parser::new(ParserKind::Request);
    let mut rec = Recorder::default();
    parser.execute(&mut rec, b"GET / HTTP/1.1\r\nHost: h");
    assert_eq!(parser.execute(&mut rec, &[]), 0);
    assert_eq!(parser.error(), Some(ParseError::InvalidEofState));
}

#[test]
fn eof_between_messages_is_fine() {
    let mut parser = Parser::new(ParserKind::Both);
    let mut rec = Recorder::default();
    assert_eq!(parser.execute(&mut rec, &[]), 0);
    parser.execute(&mut rec, b"GET / HTTP/1.1\r\n\r\n");
    assert_eq!(parser.execute(&mut rec, &[]), 0);
    assert_eq!(parser.error(), None);
}

// =========================================================================
// Errors & offsets
// =========================================================================

#[test]
fn control_byte_in_method_stops_at_its_offset() {
    let mut parser = Parser::new(ParserKind::Request);
    let mut rec = Recorder::default();
    assert_eq!(parser.execute(&mut rec, b"GE\x01T / HTTP/1.1\r\n\r\n"), 2);
    assert_eq!(parser.error(), Some(ParseError::InvalidMethod));
    assert_eq!(rec.events, vec![Rec::Begin]);

    // The error is sticky.
    assert_eq!(parser.execute(&mut rec, b"GET / HTTP/1.1\r\n\r\n"), 0);
    assert_eq!(rec.events.len(), 1);
}

#[test]
fn content_length_overflow() {
    let mut parser = Parser::new(ParserKind::Request);
    let mut rec = Recorder::default();
    parser.execute(
        &mut rec,
        b"POST / HTTP/1.1\r\nContent-Length: 18446744073709551616\r\n\r\n",
    );
    assert_eq!(parser.error(), Some(ParseError::ContentLengthOverflow));
}

#[test]
fn chunk_size_overflow() {
    let mut parser = Parser::new(ParserKind::Request);
    let mut rec = Recorder::default();
    parser.execute(
        &mut rec,
        b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n1FFFFFFFFFFFFFFFF\r\n",
    );
    assert_eq!(parser.error(), Some(ParseError::ChunkSizeOverflow));
}

#[test]
fn ambiguous_framing_stops_at_header_end() {
    let raw = b"POST / HTTP/1.1\r\nContent-Length: 3\r\nTransfer-Encoding: chunked\r\n\r\nabc";
    let mut parser = Parser::new(ParserKind::Request);
    let mut rec = Recorder::default();
    let consumed = parser.execute(&mut rec, raw);
    assert_eq!(parser.error(), Some(ParseError::AmbiguousFraming));
    assert_eq!(consumed, raw.len() - 4);
    assert!(!rec.events.iter().any(|e| matches!(e, Rec::HeadersDone(_))));
}

#[test]
fn errors_render_readable_messages() {
    assert_eq!(ParseError::InvalidMethod.to_string(), "invalid HTTP method");
    assert_eq!(
        ParseError::CallbackAborted(EventKind::Body).to_string(),
        "the on_body callback requested stop"
    );
}

// =========================================================================
// Upgrade
// =========================================================================

#[test]
fn upgrade_stops_at_end_of_head() {
    let head = b"GET /chat HTTP/1.1\r\nHost: h\r\nUpgrade: websocket\r\nConnection: keep-alive, Upgrade\r\n\r\n";
    let mut raw = head.to_vec();
    raw.extend_from_slice(b"\x81\x05hello");

    let mut parser = Parser::new(ParserKind::Request);
    let mut rec = Recorder::default();
    assert_eq!(parser.execute(&mut rec, &raw), head.len());
    assert_eq!(parser.error(), None);
    assert!(parser.is_upgrade());
    assert!(parser.is_upgraded());
    assert_eq!(rec.events.last(), Some(&Rec::Complete));

    // The rest belongs to the new protocol.
    assert_eq!(parser.execute(&mut rec, &raw[head.len()..]), 0);
    assert_eq!(parser.error(), None);
}

#[test]
fn upgrade_header_alone_is_not_an_upgrade() {
    let raw = b"GET / HTTP/1.1\r\nUpgrade: h2c\r\n\r\n";
    let mut parser = Parser::new(ParserKind::Request);
    let mut rec = Recorder::default();
    assert_eq!(parser.execute(&mut rec, raw), raw.len());
    assert!(!parser.is_upgrade());
    assert!(!parser.is_upgraded());
}

// =========================================================================
// Pause, stop, skip body
// =========================================================================

#[test]
fn pause_and_resume_on_headers_complete() {
    let raw = b"POST /p HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
    let expected = run_whole(ParserKind::Request, &ParserConfig::default(), raw);

    let mut parser = Parser::new(ParserKind::Request);
    let mut rec = Recorder {
        pause_on: vec![EventKind::HeadersComplete],
        ..Recorder::default()
    };
    let consumed = parser.execute(&mut rec, raw);
    assert_eq!(consumed, raw.len() - 5);
    assert!(parser.is_paused());
    assert_eq!(parser.execute(&mut rec, &raw[consumed..]), 0);

    parser.resume();
    assert_eq!(parser.execute(&mut rec, &raw[consumed..]), 5);
    assert_eq!(parser.error(), None);
    assert_eq!(rec.events, expected);
}

#[test]
fn pause_mid_stream_loses_nothing() {
    let raw = b"GET /a HTTP/1.1\r\nHost: x\r\n\r\nGET /b HTTP/1.1\r\nHost: y\r\n\r\n";
    let expected = run_whole(ParserKind::Request, &ParserConfig::default(), raw);

    let mut parser = Parser::new(ParserKind::Request);
    let mut rec = Recorder {
        pause_on: vec![EventKind::Url, EventKind::HeaderValue, EventKind::MessageComplete],
        ..Recorder::default()
    };
    let mut offset = 0;
    while offset < raw.len() {
        offset += parser.execute(&mut rec, &raw[offset..]);
        parser.resume();
    }
    assert_eq!(parser.error(), None);
    assert_eq!(rec.events, expected);
}

#[test]
fn pause_does_not_recount_header_bytes() {
    let raw = b"GET /abc HTTP/1.1\r\nHost: h\r\nX-Fold: a  b\r\n\r\n";
    let config = ParserConfig {
        max_header_size: Some(raw.len()),
        ..ParserConfig::default()
    };
    let expected = run_whole(ParserKind::Request, &config, raw);

    let mut parser = Parser::with_config(ParserKind::Request, config);
    let mut rec = Recorder {
        pause_on: vec![
            EventKind::Url,
            EventKind::HeaderField,
            EventKind::HeaderValue,
            EventKind::HeaderField,
            EventKind::HeaderValue,
        ],
        ..Recorder::default()
    };
    let mut offset = 0;
    while offset < raw.len() {
        offset += parser.execute(&mut rec, &raw[offset..]);
        assert_ne!(parser.error(), Some(ParseError::HeaderTooLarge));
        parser.resume();
    }
    assert_eq!(parser.error(), None);
    assert_eq!(rec.events, expected);
}

#[test]
fn external_pause_blocks_until_resume() {
    let mut parser = Parser::new(ParserKind::Request);
    let mut rec = Recorder::default();
    let raw = b"GET / HTTP/1.1\r\n\r\n";
    parser.pause();
    assert_eq!(parser.execute(&mut rec, raw), 0);
    assert!(rec.events.is_empty());
    parser.resume();
    assert_eq!(parser.execute(&mut rec, raw), raw.len());
}

#[test]
fn stop_reports_callback_abort() {
    let mut parser = Parser::new(ParserKind::Request);
    let mut rec = Recorder {
        stop_on: Some(EventKind::Url),
        ..Recorder::default()
    };
    assert_eq!(parser.execute(&mut rec, b"GET /x HTTP/1.1\r\n\r\n"), 6);
    let error = parser.error().expect("stopped");
    assert!(error.is_callback_abort());
    assert_eq!(error, ParseError::CallbackAborted(EventKind::Url));

    // Resume only clears a pause.
    parser.resume();
    assert_eq!(parser.error(), Some(error));
    parser.initialize(ParserKind::Request);
    assert_eq!(parser.error(), None);
}

#[test]
fn skip_body_for_head_response() {
    let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 1234\r\n\r\nHTTP/1.1 204 No Content\r\n\r\n";
    let mut parser = Parser::new(ParserKind::Response);
    let mut rec = Recorder {
        skip_body: true,
        ..Recorder::default()
    };
    assert_eq!(parser.execute(&mut rec, raw), raw.len());
    assert_eq!(parser.error(), None);
    assert!(body_of(&rec.events).is_empty());
    assert_eq!(rec.events.iter().filter(|e| **e == Rec::Complete).count(), 2);
}

// =========================================================================
// Callbacks registration record
// =========================================================================

#[test]
fn callbacks_drive_the_parser() {
    let mut url = Vec::new();
    let mut body = Vec::new();
    let mut completed = 0;
    let mut callbacks = Callbacks::new()
        .on_url(|d| {
            url.extend_from_slice(d);
            Control::Continue
        })
        .on_body(|d| {
            body.extend_from_slice(d);
            Control::Continue
        })
        .on_message_complete(|| {
            completed += 1;
            Control::Continue
        });
    assert!(callbacks.is_registered(EventKind::Body));
    assert!(!callbacks.is_registered(EventKind::HeaderField));

    let raw = b"PATCH /doc HTTP/1.1\r\nContent-Length: 4\r\n\r\ndiff";
    let mut parser = Parser::new(ParserKind::Request);
    for piece in raw.chunks(5) {
        parser.execute(&mut callbacks, piece);
    }
    drop(callbacks);

    assert_eq!(url, b"/doc");
    assert_eq!(body, b"diff");
    assert_eq!(completed, 1);
}
