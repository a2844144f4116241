use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::ParseError;
use crate::status::canonical_reason;

// ---------------------------------------------------------------------------
// HttpMethod
// ---------------------------------------------------------------------------

/// HTTP request methods recognized by the parser: RFC 9110, WebDAV, CalDAV,
/// Subversion and UPnP extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    GET,
    HEAD,
    POST,
    PUT,
    DELETE,
    CONNECT,
    OPTIONS,
    TRACE,
    PATCH,
    PURGE,
    // WebDAV
    COPY,
    LOCK,
    MKCOL,
    MOVE,
    PROPFIND,
    PROPPATCH,
    SEARCH,
    UNLOCK,
    REPORT,
    BATCH,
    // Subversion
    MKACTIVITY,
    CHECKOUT,
    MERGE,
    // UPnP
    MSEARCH,
    NOTIFY,
    SUBSCRIBE,
    UNSUBSCRIBE,
    // CalDAV
    MKCALENDAR,
}

impl HttpMethod {
    /// Longest method name, used to bound the method scratch buffer.
    pub(crate) const MAX_LEN: usize = 11;

    /// Parse an HTTP method from a byte slice.
    ///
    /// Returns an error if the bytes do not match a known method.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        let method = match bytes {
            b"GET" => Self::GET,
            b"HEAD" => Self::HEAD,
            b"POST" => Self::POST,
            b"PUT" => Self::PUT,
            b"DELETE" => Self::DELETE,
            b"CONNECT" => Self::CONNECT,
            b"OPTIONS" => Self::OPTIONS,
            b"TRACE" => Self::TRACE,
            b"PATCH" => Self::PATCH,
            b"PURGE" => Self::PURGE,
            b"COPY" => Self::COPY,
            b"LOCK" => Self::LOCK,
            b"MKCOL" => Self::MKCOL,
            b"MOVE" => Self::MOVE,
            b"PROPFIND" => Self::PROPFIND,
            b"PROPPATCH" => Self::PROPPATCH,
            b"SEARCH" => Self::SEARCH,
            b"UNLOCK" => Self::UNLOCK,
            b"REPORT" => Self::REPORT,
            b"BATCH" => Self::BATCH,
            b"MKACTIVITY" => Self::MKACTIVITY,
            b"CHECKOUT" => Self::CHECKOUT,
            b"MERGE" => Self::MERGE,
            b"M-SEARCH" => Self::MSEARCH,
            b"NOTIFY" => Self::NOTIFY,
            b"SUBSCRIBE" => Self::SUBSCRIBE,
            b"UNSUBSCRIBE" => Self::UNSUBSCRIBE,
            b"MKCALENDAR" => Self::MKCALENDAR,
            _ => return Err(ParseError::InvalidMethod),
        };
        Ok(method)
    }

    /// Return the method as a static string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GET => "GET",
            Self::HEAD => "HEAD",
            Self::POST => "POST",
            Self::PUT => "PUT",
            Self::DELETE => "DELETE",
            Self::CONNECT => "CONNECT",
            Self::OPTIONS => "OPTIONS",
            Self::TRACE => "TRACE",
            Self::PATCH => "PATCH",
            Self::PURGE => "PURGE",
            Self::COPY => "COPY",
            Self::LOCK => "LOCK",
            Self::MKCOL => "MKCOL",
            Self::MOVE => "MOVE",
            Self::PROPFIND => "PROPFIND",
            Self::PROPPATCH => "PROPPATCH",
            Self::SEARCH => "SEARCH",
            Self::UNLOCK => "UNLOCK",
            Self::REPORT => "REPORT",
            Self::BATCH => "BATCH",
            Self::MKACTIVITY => "MKACTIVITY",
            Self::CHECKOUT => "CHECKOUT",
            Self::MERGE => "MERGE",
            Self::MSEARCH => "M-SEARCH",
            Self::NOTIFY => "NOTIFY",
            Self::SUBSCRIBE => "SUBSCRIBE",
            Self::UNSUBSCRIBE => "UNSUBSCRIBE",
            Self::MKCALENDAR => "MKCALENDAR",
        }
    }

    /// Methods that are read-only by definition.
    pub fn is_safe(&self) -> bool {
        matches!(
            self,
            Self::GET
                | Self::HEAD
                | Self::OPTIONS
                | Self::TRACE
                | Self::PROPFIND
                | Self::REPORT
                | Self::SEARCH
                | Self::BATCH
        )
    }

    /// Methods whose repeated application has the same effect as one.
    pub fn is_idempotent(&self) -> bool {
        self.is_safe()
            || matches!(
                self,
                Self::PUT | Self::DELETE | Self::PROPPATCH | Self::MKCOL | Self::MKCALENDAR
            )
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for HttpMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// HttpVersion
// ---------------------------------------------------------------------------

/// HTTP protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpVersion {
    /// HTTP/1.0
    Http10,
    /// HTTP/1.1
    Http11,
}

impl HttpVersion {
    /// Length of `HTTP/1.x`.
    pub(crate) const LEN: usize = 8;

    /// Parse an HTTP version from a byte slice (e.g. `b"HTTP/1.1"`).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        match bytes {
            b"HTTP/1.0" => Ok(Self::Http10),
            b"HTTP/1.1" => Ok(Self::Http11),
            _ => Err(ParseError::InvalidVersion),
        }
    }

    /// Return the version as a static string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http10 => "HTTP/1.0",
            Self::Http11 => "HTTP/1.1",
        }
    }

    pub fn major(&self) -> u8 {
        1
    }

    pub fn minor(&self) -> u8 {
        match self {
            Self::Http10 => 0,
            Self::Http11 => 1,
        }
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for HttpVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// A single HTTP header (or trailer) field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Header field name (original casing preserved).
    pub name: String,
    /// Header field value (leading/trailing OWS trimmed, folds collapsed).
    pub value: String,
}

fn find_header<'h>(headers: &'h [Header], name: &str) -> Option<&'h str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

fn find_headers<'h>(headers: &'h [Header], name: &str) -> Vec<&'h str> {
    headers
        .iter()
        .filter(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
        .collect()
}

/// Serialize body bytes as a UTF-8 string (lossy) for JSON output.
fn serialize_body<S: Serializer>(body: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
    match body {
        None => s.serialize_none(),
        Some(bytes) => s.serialize_str(&String::from_utf8_lossy(bytes)),
    }
}

// ---------------------------------------------------------------------------
// HttpRequest / HttpResponse
// ---------------------------------------------------------------------------

/// A fully parsed HTTP request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpRequest {
    /// The request method.
    pub method: HttpMethod,
    /// The request target.
    pub url: String,
    /// The HTTP version.
    pub version: HttpVersion,
    /// The header fields, in arrival order.
    pub headers: Vec<Header>,
    /// Trailer fields sent after a chunked body.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trailers: Vec<Header>,
    /// The optional request body.
    #[serde(serialize_with = "serialize_body")]
    pub body: Option<Vec<u8>>,
    /// The connection stays open after this request.
    pub keep_alive: bool,
    /// The connection switches protocols after this request.
    pub upgrade: bool,
}

/// A fully parsed HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpResponse {
    /// The status code.
    pub status: u16,
    /// The reason phrase as sent (may be empty).
    pub reason: String,
    /// The HTTP version.
    pub version: HttpVersion,
    /// The header fields, in arrival order.
    pub headers: Vec<Header>,
    /// Trailer fields sent after a chunked body.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trailers: Vec<Header>,
    /// The optional response body.
    #[serde(serialize_with = "serialize_body")]
    pub body: Option<Vec<u8>>,
    /// The connection stays open after this response.
    pub keep_alive: bool,
    /// The connection switches protocols after this response.
    pub upgrade: bool,
}

impl HttpResponse {
    /// Standard reason phrase for this status code.
    pub fn canonical_reason(&self) -> Option<&'static str> {
        canonical_reason(self.status)
    }
}

macro_rules! message_accessors {
    ($ty:ty) => {
        impl $ty {
            /// Return the body as a UTF-8 `&str` if it is valid UTF-8.
            pub fn body_as_str(&self) -> Option<&str> {
                self.body.as_ref().and_then(|b| std::str::from_utf8(b).ok())
            }

            /// Return the body as a lossy UTF-8 string (always succeeds).
            pub fn body_as_lossy_string(&self) -> Option<String> {
                self.body
                    .as_ref()
                    .map(|b| String::from_utf8_lossy(b).into_owned())
            }

            /// Return the raw body bytes.
            pub fn body_bytes(&self) -> Option<&[u8]> {
                self.body.as_deref()
            }

            /// Look up the first header value by name (case-insensitive).
            pub fn header_value(&self, name: &str) -> Option<&str> {
                find_header(&self.headers, name)
            }

            /// Return all values for headers matching `name` (case-insensitive).
            pub fn header_values(&self, name: &str) -> Vec<&str> {
                find_headers(&self.headers, name)
            }

            /// Look up the first trailer value by name (case-insensitive).
            pub fn trailer_value(&self, name: &str) -> Option<&str> {
                find_header(&self.trailers, name)
            }

            /// Parse the `Content-Length` header, if present and valid.
            pub fn content_length(&self) -> Option<u64> {
                self.header_value("content-length")
                    .and_then(|v| v.trim().parse().ok())
            }

            /// Return `true` if the `Transfer-Encoding` header contains `chunked`.
            pub fn is_chunked(&self) -> bool {
                self.header_value("transfer-encoding")
                    .map(|v| v.to_ascii_lowercase().contains("chunked"))
                    .unwrap_or(false)
            }
        }
    };
}

message_accessors!(HttpRequest);
message_accessors!(HttpResponse);

// ---------------------------------------------------------------------------
// HttpMessage
// ---------------------------------------------------------------------------

/// A parsed request or response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HttpMessage {
    Request(HttpRequest),
    Response(HttpResponse),
}

impl HttpMessage {
    pub fn version(&self) -> HttpVersion {
        match self {
            Self::Request(r) => r.version,
            Self::Response(r) => r.version,
        }
    }

    pub fn headers(&self) -> &[Header] {
        match self {
            Self::Request(r) => &r.headers,
            Self::Response(r) => &r.headers,
        }
    }

    pub fn trailers(&self) -> &[Header] {
        match self {
            Self::Request(r) => &r.trailers,
            Self::Response(r) => &r.trailers,
        }
    }

    pub fn body(&self) -> Option<&[u8]> {
        match self {
            Self::Request(r) => r.body_bytes(),
            Self::Response(r) => r.body_bytes(),
        }
    }

    pub fn keep_alive(&self) -> bool {
        match self {
            Self::Request(r) => r.keep_alive,
            Self::Response(r) => r.keep_alive,
        }
    }

    pub fn as_request(&self) -> Option<&HttpRequest> {
        match self {
            Self::Request(r) => Some(r),
            Self::Response(_) => None,
        }
    }

    pub fn as_response(&self) -> Option<&HttpResponse> {
        match self {
            Self::Request(_) => None,
            Self::Response(r) => Some(r),
        }
    }
}
