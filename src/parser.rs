use memchr::memmem;
use tracing::{debug, info, warn};

use crate::error::ParseError;
use crate::headers::dispatch;
use crate::host::check_host;
use crate::list::{is_ws, trim_end, trim_start};
use crate::types::{ConnectionToken, HttpMethod, HttpVersion, Request};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Per-listener settings consulted while parsing a request head.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Accept HTTP/1.1. When `false`, 1.1 requests are handled as 1.0
    /// (default: `true`).
    pub allow_http11: bool,
    /// Largest POST body in KiB; `0` means unlimited (default: 0).
    pub max_request_size_kb: u64,
    /// Log every raw request head at debug level (default: `false`).
    pub log_request_header: bool,
    /// Log the raw request head when it is rejected (default: `false`).
    pub log_request_header_on_error: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            allow_http11: true,
            max_request_size_kb: 0,
            log_request_header: false,
            log_request_header_on_error: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse status
// ---------------------------------------------------------------------------

/// Outcome of [`Parser::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadStatus {
    /// The head is valid and no body follows.
    Complete,
    /// The head is valid and a body of this many bytes must be read.
    ReadBody(u64),
    /// The head was rejected; see [`Parser::http_status`].
    Failed,
}

// ---------------------------------------------------------------------------
// End-of-header detection
// ---------------------------------------------------------------------------

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Returns `true` once `buf` holds the blank line that closes a request head.
///
/// Meant to be polled as bytes arrive. The usual case, a buffer that ends
/// exactly at the terminator, is checked before scanning the whole buffer.
pub fn header_complete(buf: &[u8]) -> bool {
    buf.ends_with(HEAD_TERMINATOR) || memmem::find(buf, HEAD_TERMINATOR).is_some()
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Request-parsing state of one connection.
///
/// Holds the configuration, counts requests seen on the connection, and
/// keeps the outputs of the most recent [`parse`](Parser::parse) call.
///
/// ```rust
/// use reqhead::{HeadStatus, Parser};
///
/// let mut parser = Parser::new();
/// let status = parser.parse(b"POST /upload HTTP/1.1\r\nHost: example.com\r\nContent-Length: 5\r\n\r\n");
///
/// assert_eq!(status, HeadStatus::ReadBody(5));
/// assert_eq!(parser.http_status(), 0);
/// assert!(parser.keep_alive());
/// ```
#[derive(Debug)]
pub struct Parser {
    config: ParserConfig,
    request_count: usize,
    http_status: u16,
    keep_alive: bool,
    request: Option<Request>,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    /// Create a new parser with custom settings.
    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            request_count: 0,
            http_status: 0,
            keep_alive: false,
            request: None,
        }
    }

    /// Clear the outputs of the previous request so the connection can be
    /// reused. The request counter is kept.
    pub fn reset(&mut self) {
        self.http_status = 0;
        self.keep_alive = false;
        self.request = None;
    }

    /// Parse one request head from `raw`.
    ///
    /// On failure the status code is available from
    /// [`http_status`](Parser::http_status) and the connection should be
    /// handled according to [`keep_alive`](Parser::keep_alive).
    pub fn parse(&mut self, raw: &[u8]) -> HeadStatus {
        self.try_parse(raw).unwrap_or(HeadStatus::Failed)
    }

    /// Like [`parse`](Parser::parse), returning the rejection reason.
    ///
    /// # Errors
    ///
    /// Returns the [`ParseError`] that rejected the request. `http_status`
    /// and `keep_alive` are updated before returning.
    pub fn try_parse(&mut self, raw: &[u8]) -> Result<HeadStatus, ParseError> {
        self.reset();
        self.request_count += 1;

        if self.config.log_request_header {
            debug!(
                request_len = raw.len(),
                request = %String::from_utf8_lossy(raw),
                "request header"
            );
        }

        // On a reused connection a CRLF may be left over after a POST body.
        let skipped = if self.request_count > 1 && raw.starts_with(b"\r\n") {
            2
        } else {
            0
        };

        let result = self.parse_head(&raw[skipped..], skipped);
        if let Err(err) = &result {
            self.http_status = err.status();
            if err.forces_close() {
                self.keep_alive = false;
            }
            debug!(status = self.http_status, error = %err, "rejecting request");
            if self.config.log_request_header_on_error {
                info!(request = %String::from_utf8_lossy(raw), "request-header");
            }
        }
        result
    }

    fn parse_head(&mut self, data: &[u8], skipped: usize) -> Result<HeadStatus, ParseError> {
        let (request, line_end) = parse_request_line(data, self.config.allow_http11)?;
        let request = self.request.insert(request);

        let head_end = parse_headers(data, line_end, request)?;
        request.header_len = head_end + skipped;

        self.keep_alive = match request.version {
            HttpVersion::Http11 => request.connection_token() != ConnectionToken::Close,
            HttpVersion::Http10 => request.connection_token() == ConnectionToken::KeepAlive,
        };

        post_parse(request, &self.config)
    }

    // ----- public query ---------------------------------------------------

    /// Status to answer with; `0` while the request is acceptable.
    pub fn http_status(&self) -> u16 {
        self.http_status
    }

    /// Whether the connection may serve another request after this one.
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// The request parsed by the last call, if its request line was valid.
    ///
    /// After a failure this holds whatever was collected before the
    /// offending byte.
    pub fn request(&self) -> Option<&Request> {
        self.request.as_ref()
    }

    /// Take ownership of the parsed request.
    pub fn take_request(&mut self) -> Option<Request> {
        self.request.take()
    }

    /// Number of requests parsed on this connection.
    pub fn request_count(&self) -> usize {
        self.request_count
    }

    /// Set how many requests this connection has already served, for a
    /// context created part-way through a connection.
    pub fn set_request_count(&mut self, count: usize) {
        self.request_count = count;
    }

    /// The active configuration.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Request line
// ---------------------------------------------------------------------------

/// Tokenize `<method> SP <uri> SP <protocol> CRLF`.
///
/// Returns the request (no headers yet) and the offset just past the CRLF.
fn parse_request_line(data: &[u8], allow_http11: bool) -> Result<(Request, usize), ParseError> {
    let mut spaces = [0usize; 2];
    let mut seen = 0;

    let mut i = 0;
    let line_end = loop {
        match data.get(i) {
            None => return Err(ParseError::IncompleteRequestLine),
            Some(b'\r') if data.get(i + 1) == Some(&b'\n') => break i,
            Some(b' ') => {
                if seen == spaces.len() {
                    return Err(ParseError::OverlongRequestLine);
                }
                spaces[seen] = i;
                seen += 1;
            }
            Some(_) => {}
        }
        i += 1;
    };

    if seen != spaces.len() {
        return Err(ParseError::IncompleteRequestLine);
    }

    let method = &data[..spaces[0]];
    let uri = &data[spaces[0] + 1..spaces[1]];
    let proto = &data[spaces[1] + 1..line_end];
    if method.is_empty() || uri.is_empty() || proto.is_empty() {
        return Err(ParseError::IncompleteRequestLine);
    }

    let method = HttpMethod::from_bytes(method)?;
    let version = match HttpVersion::from_bytes(proto)? {
        HttpVersion::Http11 if !allow_http11 => HttpVersion::Http10,
        v => v,
    };

    let working = strip_authority(uri);
    if let Some(&bad) = working.iter().find(|&&b| !is_uri_char(b)) {
        return Err(ParseError::InvalidUriCharacter(bad));
    }

    let request = Request::new(
        method,
        working.to_vec(),
        uri.to_vec(),
        version,
        data[..line_end].to_vec(),
    );
    Ok((request, line_end + 2))
}

/// `http://host/path` becomes `/path`; without a path the URI is kept.
fn strip_authority(uri: &[u8]) -> &[u8] {
    uri.strip_prefix(b"http://")
        .and_then(|rest| memchr::memchr(b'/', rest).map(|slash| &rest[slash..]))
        .unwrap_or(uri)
}

/// RFC 2396 URI characters, plus `#` and the `[` `]` of IPv6 literals.
///
/// ```text
/// reserved = ";" | "/" | "?" | ":" | "@" | "&" | "=" | "+" | "$" | ","
/// mark     = "-" | "_" | "." | "!" | "~" | "*" | "'" | "(" | ")"
/// escaped  = "%" hex hex
/// ```
#[inline]
fn is_uri_char(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b';' | b'/'
                | b'?'
                | b':'
                | b'@'
                | b'&'
                | b'='
                | b'+'
                | b'$'
                | b','
                | b'-'
                | b'_'
                | b'.'
                | b'!'
                | b'~'
                | b'*'
                | b'\''
                | b'('
                | b')'
                | b'%'
                | b'#'
                | b'['
                | b']'
        )
}

// ---------------------------------------------------------------------------
// Header fields
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Key,
    Value,
}

/// Tokenize header fields from `start` through the blank line, handing
/// each completed field to the dispatcher.
///
/// Returns the offset just past the blank line.
fn parse_headers(data: &[u8], start: usize, request: &mut Request) -> Result<usize, ParseError> {
    let mut tokens = Vec::new();

    let mut mode = Mode::Key;
    let mut line_start = start;
    let mut key_end = start;
    let mut value_start = start;
    let mut folding = false;

    let mut i = start;
    while i < data.len() {
        let b = data[i];
        match mode {
            Mode::Key => match b {
                b':' => {
                    if i == line_start {
                        return Err(ParseError::InvalidKeyCharacter(b));
                    }
                    key_end = i;
                    value_start = i + 1;
                    mode = Mode::Value;
                }
                b' ' | b'\t' if i == line_start => {
                    // obs-fold: continues the previous field's value
                    folding = true;
                    value_start = i;
                    mode = Mode::Value;
                }
                b' ' | b'\t' => {
                    key_end = i;
                    let colon = i + 1 + data[i + 1..].iter().take_while(|&&c| is_ws(c)).count();
                    if data.get(colon) != Some(&b':') {
                        return Err(ParseError::WhitespaceInKey);
                    }
                    i = colon;
                    value_start = i + 1;
                    mode = Mode::Value;
                }
                b'\r' => {
                    if data.get(i + 1) != Some(&b'\n') {
                        return Err(ParseError::CrWithoutLf);
                    }
                    if i != line_start {
                        return Err(ParseError::MissingColon);
                    }
                    return Ok(i + 2);
                }
                _ if is_separator(b) => return Err(ParseError::InvalidKeyCharacter(b)),
                _ if b.is_ascii_control() => return Err(ParseError::ControlCharacterInKey(b)),
                _ => {}
            },
            Mode::Value => {
                if b == b'\r' {
                    if data.get(i + 1) != Some(&b'\n') {
                        return Err(ParseError::CrWithoutLf);
                    }

                    let value = trim_end(trim_start(&data[value_start..i]));
                    if folding {
                        let Some(previous) = request.headers.last_mut() else {
                            return Err(ParseError::FoldBeforeAnyKey);
                        };
                        previous.value.extend_from_slice(value);
                    } else if !value.is_empty() {
                        dispatch(request, &data[line_start..key_end], value, &mut tokens)?;
                    }

                    i += 2;
                    line_start = i;
                    folding = false;
                    mode = Mode::Key;
                    continue;
                }
            }
        }
        i += 1;
    }

    Err(ParseError::IncompleteHeaders)
}

/// RFC 2616 `separators`, minus SP and HT which are handled by the caller.
#[inline]
fn is_separator(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')'
            | b'<'
            | b'>'
            | b'@'
            | b','
            | b';'
            | b'\\'
            | b'"'
            | b'/'
            | b'['
            | b']'
            | b'?'
            | b'='
            | b'{'
            | b'}'
    )
}

// ---------------------------------------------------------------------------
// Post-parse policy
// ---------------------------------------------------------------------------

/// Checks that need the whole head: Host requirements and POST framing.
fn post_parse(request: &Request, config: &ParserConfig) -> Result<HeadStatus, ParseError> {
    // RFC 2616, 14.23
    if request.version == HttpVersion::Http11 && request.host().is_none_or(<[u8]>::is_empty) {
        return Err(ParseError::MissingHost);
    }

    check_host(request.host())?;

    if request.method != HttpMethod::POST {
        return Ok(HeadStatus::Complete);
    }

    if request.content_type().is_none() {
        warn!("POST request, but content-type not set");
    }

    let Some(length) = request.content_length() else {
        return Err(ParseError::LengthRequired);
    };

    if length > isize::MAX as u64 {
        return Err(ParseError::PayloadTooLarge(length));
    }

    // the limit is in KiB
    if config.max_request_size_kb != 0 && (length >> 10) > config.max_request_size_kb {
        return Err(ParseError::PayloadTooLarge(length));
    }

    if length == 0 {
        Ok(HeadStatus::Complete)
    } else {
        Ok(HeadStatus::ReadBody(length))
    }
}

// ---------------------------------------------------------------------------
// Tests (unit)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_char_accepts_allowed_set() {
        for &b in b"azAZ09;/?:@&=+$,-_.!~*'()%#[]" {
            assert!(is_uri_char(b), "expected URI char for byte 0x{b:02X}");
        }
    }

    #[test]
    fn uri_char_rejects_others() {
        for &b in b" \t\r\n\"<>\\^`{|}\x00\x7f\x80" {
            assert!(!is_uri_char(b), "expected non-URI char for byte 0x{b:02X}");
        }
    }

    #[test]
    fn separators() {
        for &b in b"()<>@,;\\\"/[]?={}" {
            assert!(is_separator(b), "expected separator for byte 0x{b:02X}");
        }
        for &b in b"aZ09-_.!~*'" {
            assert!(!is_separator(b), "expected token byte 0x{b:02X}");
        }
    }

    #[test]
    fn strip_authority_variants() {
        assert_eq!(strip_authority(b"http://example.com/a/b"), b"/a/b");
        assert_eq!(strip_authority(b"http://example.com"), b"http://example.com");
        assert_eq!(strip_authority(b"/plain"), b"/plain");
        assert_eq!(strip_authority(b"https://example.com/x"), b"https://example.com/x");
    }

    #[test]
    fn request_line_offsets() {
        let data = b"GET /x HTTP/1.0\r\nHost: h\r\n\r\n";
        let (req, end) = parse_request_line(data, true).unwrap();
        assert_eq!(end, 17);
        assert_eq!(req.request_line, b"GET /x HTTP/1.0");
        assert_eq!(req.version, HttpVersion::Http10);
    }

    #[test]
    fn detector_tail_and_scan() {
        assert!(header_complete(b"GET / HTTP/1.0\r\n\r\n"));
        assert!(header_complete(b"GET / HTTP/1.0\r\n\r\nbody"));
        assert!(!header_complete(b"GET / HTTP/1.0\r\n"));
        assert!(!header_complete(b"\r\n\r"));
        assert!(!header_complete(b""));
    }
}
