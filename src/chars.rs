//! Byte classification tables (RFC 9110 / RFC 9112).
//!
//! Every table is a 256-entry constant built at compile time, so lookups are
//! a single index and the tables can be shared by any number of parsers.

/// `tchar` – characters allowed in HTTP tokens (method, header names).
///
/// ```text
/// tchar = "!" / "#" / "$" / "%" / "&" / "'" / "*" / "+" / "-" / "." /
///         "^" / "_" / "`" / "|" / "~" / DIGIT / ALPHA
/// ```
static TOKEN: [bool; 256] = token_table();

/// Bytes allowed in a request target: visible ASCII plus obs-text.
static URL: [bool; 256] = url_table();

/// Bytes permitted inside a header field value, reason phrase or chunk
/// extension: `SP / HTAB / VCHAR / obs-text`.
static FIELD_CONTENT: [bool; 256] = field_content_table();

/// Hex digit values; `0xFF` marks a non-hex byte.
static HEX: [u8; 256] = hex_table();

const fn token_table() -> [bool; 256] {
    let mut table = [false; 256];
    let mut i = 0;
    while i < 256 {
        let b = i as u8;
        table[i] = matches!(
            b,
            b'!' | b'#'
                | b'$'
                | b'%'
                | b'&'
                | b'\''
                | b'*'
                | b'+'
                | b'-'
                | b'.'
                | b'^'
                | b'_'
                | b'`'
                | b'|'
                | b'~'
                | b'0'..=b'9'
                | b'a'..=b'z'
                | b'A'..=b'Z'
        );
        i += 1;
    }
    table
}

const fn url_table() -> [bool; 256] {
    let mut table = [false; 256];
    let mut i = 0;
    while i < 256 {
        let b = i as u8;
        table[i] = b > b' ' && b != 0x7F;
        i += 1;
    }
    table
}

const fn field_content_table() -> [bool; 256] {
    let mut table = [false; 256];
    let mut i = 0;
    while i < 256 {
        let b = i as u8;
        table[i] = b == b' ' || b == b'\t' || (b >= 0x21 && b <= 0x7E) || b >= 0x80;
        i += 1;
    }
    table
}

const fn hex_table() -> [u8; 256] {
    let mut table = [0xFF; 256];
    let mut i = 0;
    while i < 256 {
        let b = i as u8;
        table[i] = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => 0xFF,
        };
        i += 1;
    }
    table
}

#[inline]
pub(crate) fn is_tchar(b: u8) -> bool {
    TOKEN[b as usize]
}

#[inline]
pub(crate) fn is_url_char(b: u8) -> bool {
    URL[b as usize]
}

#[inline]
pub(crate) fn is_field_content_byte(b: u8) -> bool {
    FIELD_CONTENT[b as usize]
}

#[inline]
pub(crate) fn is_ows(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Value of a hexadecimal digit, or `None` for any other byte.
#[inline]
pub(crate) fn hex_value(b: u8) -> Option<u8> {
    match HEX[b as usize] {
        0xFF => None,
        v => Some(v),
    }
}
