//! # reqhead
//!
//! The request-ingestion core of an HTTP/1.x server: turns one buffered
//! request head into a validated [`Request`], or rejects it with the status
//! code the server should answer with.
//!
//! Covered here: the request line, header fields (including obsolete line
//! folding), the headers the server acts on (`Connection`,
//! `Content-Length`, `Content-Type`, `Expect`, `Host`, `If-Modified-Since`,
//! `If-None-Match`, `Range`), `Host` syntax, keep-alive, and POST framing
//! limits. Reading the body, chunked decoding and producing a response are
//! left to the caller.
//!
//! ## Quick start: one-shot parsing
//!
//! ```rust
//! use reqhead::parse_request;
//!
//! let raw = b"GET /hello HTTP/1.1\r\nHost: example.com\r\n\r\n";
//! let request = parse_request(raw).expect("valid request");
//! assert_eq!(request.method.as_str(), "GET");
//! assert_eq!(request.uri, b"/hello");
//! assert_eq!(request.host(), Some(&b"example.com"[..]));
//! ```
//!
//! ## Quick start: per-connection parsing
//!
//! ```rust
//! use reqhead::{header_complete, HeadStatus, Parser};
//!
//! let mut parser = Parser::new();
//! let mut buf = Vec::new();
//!
//! buf.extend_from_slice(b"GET / HTTP/1.0\r\n");
//! assert!(!header_complete(&buf));
//!
//! buf.extend_from_slice(b"Connection: keep-alive\r\n\r\n");
//! assert!(header_complete(&buf));
//!
//! assert_eq!(parser.parse(&buf), HeadStatus::Complete);
//! assert!(parser.keep_alive());
//! ```

mod error;
mod headers;
mod host;
mod list;
mod output;
mod parser;
mod types;

// Re-export public API.
pub use error::ParseError;
pub use host::{check_host, is_valid_host};
pub use list::split_value;
pub use output::{format_debug, format_head, format_json};
pub use parser::{HeadStatus, Parser, ParserConfig, header_complete};
pub use types::{ConnectionToken, Header, HttpMethod, HttpVersion, Request};

/// Parse a **complete** request head from a byte slice in one call.
///
/// This is a convenience wrapper around [`Parser`]. A server handling a
/// connection should keep a `Parser` per connection instead.
///
/// # Errors
///
/// Returns [`ParseError`] if the head is malformed or violates the
/// framing rules.
pub fn parse_request(data: &[u8]) -> Result<Request, ParseError> {
    parse_request_with_config(data, ParserConfig::default())
}

/// Parse a **complete** request head using a custom [`ParserConfig`].
///
/// # Errors
///
/// Returns [`ParseError`] if the head is malformed, violates the framing
/// rules, or exceeds the configured limits.
pub fn parse_request_with_config(
    data: &[u8],
    config: ParserConfig,
) -> Result<Request, ParseError> {
    let mut parser = Parser::with_config(config);
    parser.try_parse(data)?;
    parser.take_request().ok_or(ParseError::IncompleteRequestLine)
}
