use std::fmt::Write as _;

use crate::types::{Header, HttpMessage};

/// Serialize an [`HttpMessage`] to a JSON string.
///
/// When `pretty` is `true` the output is indented for readability.
pub fn format_json(message: &HttpMessage, pretty: bool) -> String {
    let result = if pretty {
        serde_json::to_string_pretty(message)
    } else {
        serde_json::to_string(message)
    };
    result.unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

/// Render an [`HttpMessage`] in a human-readable debug format.
pub fn format_debug(message: &HttpMessage) -> String {
    let mut out = String::with_capacity(256);

    match message {
        HttpMessage::Request(request) => {
            out.push_str("=== HTTP Request ===\n");
            let _ = writeln!(out, "Method:  {}", request.method);
            let _ = writeln!(out, "URL:     {}", request.url);
            let _ = writeln!(out, "Version: {}", request.version);
        }
        HttpMessage::Response(response) => {
            out.push_str("=== HTTP Response ===\n");
            match response.canonical_reason() {
                Some(canonical) if canonical != response.reason => {
                    let _ = writeln!(
                        out,
                        "Status:  {} {} (standard: {canonical})",
                        response.status, response.reason
                    );
                }
                _ => {
                    let _ = writeln!(out, "Status:  {} {}", response.status, response.reason);
                }
            }
            let _ = writeln!(out, "Version: {}", response.version);
        }
    }

    let _ = writeln!(out, "Keep-Alive: {}", message.keep_alive());
    if let Some(request) = message.as_request().filter(|r| r.upgrade) {
        let _ = writeln!(out, "Upgrade: requested by {}", request.method);
    } else if message.as_response().is_some_and(|r| r.upgrade) {
        out.push_str("Upgrade: accepted\n");
    }

    push_fields(&mut out, "Headers", message.headers());

    match message.body() {
        Some(body) => {
            let _ = writeln!(out, "\n--- Body ({} bytes) ---", body.len());
            match std::str::from_utf8(body) {
                Ok(s) => out.push_str(s),
                Err(_) => {
                    let _ = write!(out, "<binary data: {} bytes>", body.len());
                }
            }
            out.push('\n');
        }
        None => {
            out.push_str("\n--- No Body ---\n");
        }
    }

    if !message.trailers().is_empty() {
        push_fields(&mut out, "Trailers", message.trailers());
    }

    out.push_str("====================\n");
    out
}

fn push_fields(out: &mut String, title: &str, fields: &[Header]) {
    let _ = writeln!(out, "\n--- {title} ({}) ---", fields.len());
    for field in fields {
        let _ = writeln!(out, "  {}: {}", field.name, field.value);
    }
}

/// Render only the start line and headers (no body).
pub fn format_headers_only(message: &HttpMessage) -> String {
    let headers = message.headers();
    let mut out = String::with_capacity(64 + headers.len() * 40);

    match message {
        HttpMessage::Request(request) => {
            let _ = writeln!(out, "{} {} {}", request.method, request.url, request.version);
        }
        HttpMessage::Response(response) => {
            let _ = writeln!(
                out,
                "{} {} {}",
                response.version, response.status, response.reason
            );
        }
    }

    for header in headers {
        let _ = writeln!(out, "{}: {}", header.name, header.value);
    }

    out
}
