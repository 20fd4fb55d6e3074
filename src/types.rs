use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::ParseError;

// ---------------------------------------------------------------------------
// HttpMethod
// ---------------------------------------------------------------------------

/// Request methods the server accepts, including the WebDAV/DeltaV set.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    GET,
    POST,
    HEAD,
    OPTIONS,
    PROPFIND,
    MKCOL,
    PUT,
    DELETE,
    COPY,
    MOVE,
    PROPPATCH,
    REPORT,
    CHECKOUT,
    CHECKIN,
    VERSION_CONTROL,
    UNCHECKOUT,
    MKACTIVITY,
    MERGE,
    LOCK,
    UNLOCK,
    LABEL,
    CONNECT,
    TRACE,
    PATCH,
}

impl HttpMethod {
    /// Parse an HTTP method from a byte slice. Matching is case-sensitive.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        match bytes {
            b"GET" => Ok(Self::GET),
            b"POST" => Ok(Self::POST),
            b"HEAD" => Ok(Self::HEAD),
            b"OPTIONS" => Ok(Self::OPTIONS),
            b"PROPFIND" => Ok(Self::PROPFIND),
            b"MKCOL" => Ok(Self::MKCOL),
            b"PUT" => Ok(Self::PUT),
            b"DELETE" => Ok(Self::DELETE),
            b"COPY" => Ok(Self::COPY),
            b"MOVE" => Ok(Self::MOVE),
            b"PROPPATCH" => Ok(Self::PROPPATCH),
            b"REPORT" => Ok(Self::REPORT),
            b"CHECKOUT" => Ok(Self::CHECKOUT),
            b"CHECKIN" => Ok(Self::CHECKIN),
            b"VERSION-CONTROL" => Ok(Self::VERSION_CONTROL),
            b"UNCHECKOUT" => Ok(Self::UNCHECKOUT),
            b"MKACTIVITY" => Ok(Self::MKACTIVITY),
            b"MERGE" => Ok(Self::MERGE),
            b"LOCK" => Ok(Self::LOCK),
            b"UNLOCK" => Ok(Self::UNLOCK),
            b"LABEL" => Ok(Self::LABEL),
            b"CONNECT" => Ok(Self::CONNECT),
            b"TRACE" => Ok(Self::TRACE),
            b"PATCH" => Ok(Self::PATCH),
            _ => Err(ParseError::UnknownMethod(
                String::from_utf8_lossy(bytes).into_owned(),
            )),
        }
    }

    /// Return the method as a static string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GET => "GET",
            Self::POST => "POST",
            Self::HEAD => "HEAD",
            Self::OPTIONS => "OPTIONS",
            Self::PROPFIND => "PROPFIND",
            Self::MKCOL => "MKCOL",
            Self::PUT => "PUT",
            Self::DELETE => "DELETE",
            Self::COPY => "COPY",
            Self::MOVE => "MOVE",
            Self::PROPPATCH => "PROPPATCH",
            Self::REPORT => "REPORT",
            Self::CHECKOUT => "CHECKOUT",
            Self::CHECKIN => "CHECKIN",
            Self::VERSION_CONTROL => "VERSION-CONTROL",
            Self::UNCHECKOUT => "UNCHECKOUT",
            Self::MKACTIVITY => "MKACTIVITY",
            Self::MERGE => "MERGE",
            Self::LOCK => "LOCK",
            Self::UNLOCK => "UNLOCK",
            Self::LABEL => "LABEL",
            Self::CONNECT => "CONNECT",
            Self::TRACE => "TRACE",
            Self::PATCH => "PATCH",
        }
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
    /// Parse the protocol token of a request line.
    ///
    /// Anything not starting with `HTTP/1.` is an unknown protocol; an
    /// `HTTP/1.` token other than `HTTP/1.0` or `HTTP/1.1` is an
    /// unsupported version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        match bytes {
            b"HTTP/1.0" => Ok(Self::Http10),
            b"HTTP/1.1" => Ok(Self::Http11),
            _ if bytes.starts_with(b"HTTP/1.") => Err(ParseError::UnsupportedVersion(
                String::from_utf8_lossy(bytes).into_owned(),
            )),
            _ => Err(ParseError::UnknownProtocol(
                String::from_utf8_lossy(bytes).into_owned(),
            )),
        }
    }

    /// Return the version as a static string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http10 => "HTTP/1.0",
            Self::Http11 => "HTTP/1.1",
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
// ConnectionToken
// ---------------------------------------------------------------------------

/// What the `Connection` header asked for, if anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionToken {
    #[default]
    Unset,
    KeepAlive,
    Close,
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// A single header field.
///
/// Both parts are raw bytes: obs-text in values is kept as sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Field name, original casing, no surrounding whitespace.
    #[serde(serialize_with = "serialize_lossy")]
    pub name: Vec<u8>,
    /// Field value with surrounding SP/HTAB removed; folded continuation
    /// lines are appended verbatim.
    #[serde(serialize_with = "serialize_lossy")]
    pub value: Vec<u8>,
}

impl Header {
    /// Case-insensitive name comparison.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.as_bytes())
    }
}

/// Serialize raw bytes as a UTF-8 string (lossy) for JSON output.
fn serialize_lossy<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&String::from_utf8_lossy(bytes))
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Fields derived from well-known headers while they are tokenized.
///
/// Header-valued entries hold the index of the header in the collection, so
/// a folded continuation appended after dispatch shows up here as well.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Metadata {
    pub content_length: Option<u64>,
    pub content_type: Option<usize>,
    pub host: Option<usize>,
    pub if_modified_since: Option<usize>,
    pub if_none_match: Option<usize>,
    /// Header index; the value after the `bytes=` prefix is exposed.
    pub range: Option<usize>,
    pub connection: ConnectionToken,
}

pub(crate) const RANGE_PREFIX: &[u8] = b"bytes=";

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A parsed request head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The request method.
    pub method: HttpMethod,
    /// Working URI; the `http://authority` prefix of an absolute URI is removed.
    pub uri: Vec<u8>,
    /// URI exactly as it appeared in the request line.
    pub original_uri: Vec<u8>,
    /// Protocol version, after any administrative downgrade to 1.0.
    pub version: HttpVersion,
    /// The request line without its CRLF.
    pub request_line: Vec<u8>,
    /// All non-empty header fields, in arrival order, duplicates kept.
    pub headers: Vec<Header>,
    /// Bytes consumed through the blank line that ends the head.
    pub header_len: usize,
    pub(crate) meta: Metadata,
}

impl Request {
    pub(crate) fn new(
        method: HttpMethod,
        uri: Vec<u8>,
        original_uri: Vec<u8>,
        version: HttpVersion,
        request_line: Vec<u8>,
    ) -> Self {
        Self {
            method,
            uri,
            original_uri,
            version,
            request_line,
            headers: Vec::new(),
            header_len: 0,
            meta: Metadata::default(),
        }
    }

    /// The URI as UTF-8, if it is valid UTF-8. Always true for accepted URIs.
    pub fn uri_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.uri).ok()
    }

    /// Look up the first header value by name (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|h| h.is(name))
            .map(|h| h.value.as_slice())
    }

    /// Return all values for headers matching `name` (case-insensitive).
    pub fn header_values(&self, name: &str) -> Vec<&[u8]> {
        self.headers
            .iter()
            .filter(|h| h.is(name))
            .map(|h| h.value.as_slice())
            .collect()
    }

    /// Value of the first valid `Content-Length` header.
    pub fn content_length(&self) -> Option<u64> {
        self.meta.content_length
    }

    /// Value of the first `Content-Type` header.
    pub fn content_type(&self) -> Option<&[u8]> {
        self.indexed(self.meta.content_type)
    }

    /// Value of the first `Host` header.
    pub fn host(&self) -> Option<&[u8]> {
        self.indexed(self.meta.host)
    }

    /// Value of the first `If-Modified-Since` header.
    pub fn if_modified_since(&self) -> Option<&[u8]> {
        self.indexed(self.meta.if_modified_since)
    }

    /// Value of the first `If-None-Match` header.
    pub fn if_none_match(&self) -> Option<&[u8]> {
        self.indexed(self.meta.if_none_match)
    }

    /// The byte-range set of the first well-formed `Range` header, without
    /// the `bytes=` prefix.
    pub fn range(&self) -> Option<&[u8]> {
        self.indexed(self.meta.range)
            .and_then(|v| v.get(RANGE_PREFIX.len()..))
    }

    /// Result of scanning the `Connection` header tokens.
    pub fn connection_token(&self) -> ConnectionToken {
        self.meta.connection
    }

    fn indexed(&self, index: Option<usize>) -> Option<&[u8]> {
        index
            .and_then(|i| self.headers.get(i))
            .map(|h| h.value.as_slice())
    }
}

impl Serialize for Request {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let lossy = |v: Option<&[u8]>| v.map(|b| String::from_utf8_lossy(b).into_owned());

        let mut st = serializer.serialize_struct("Request", 12)?;
        st.serialize_field("method", &self.method)?;
        st.serialize_field("uri", &String::from_utf8_lossy(&self.uri))?;
        st.serialize_field("original_uri", &String::from_utf8_lossy(&self.original_uri))?;
        st.serialize_field("version", &self.version)?;
        st.serialize_field("headers", &self.headers)?;
        st.serialize_field("content_length", &self.content_length())?;
        st.serialize_field("content_type", &lossy(self.content_type()))?;
        st.serialize_field("host", &lossy(self.host()))?;
        st.serialize_field("if_modified_since", &lossy(self.if_modified_since()))?;
        st.serialize_field("if_none_match", &lossy(self.if_none_match()))?;
        st.serialize_field("range", &lossy(self.range()))?;
        st.serialize_field("connection", &self.connection_token())?;
        st.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_token_classification() {
        assert_eq!(HttpVersion::from_bytes(b"HTTP/1.1"), Ok(HttpVersion::Http11));
        assert!(matches!(
            HttpVersion::from_bytes(b"HTTP/1.2"),
            Err(ParseError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            HttpVersion::from_bytes(b"HTTP/1.10"),
            Err(ParseError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            HttpVersion::from_bytes(b"HTTP/2.0"),
            Err(ParseError::UnknownProtocol(_))
        ));
    }

    #[test]
    fn method_names_round_trip_through_as_str() {
        let m = HttpMethod::from_bytes(b"VERSION-CONTROL").unwrap();
        assert_eq!(m, HttpMethod::VERSION_CONTROL);
        assert_eq!(m.as_str(), "VERSION-CONTROL");
        assert!(HttpMethod::from_bytes(b"get").is_err());
    }

    #[test]
    fn range_accessor_strips_prefix() {
        let mut req = Request::new(
            HttpMethod::GET,
            b"/".to_vec(),
            b"/".to_vec(),
            HttpVersion::Http11,
            b"GET / HTTP/1.1".to_vec(),
        );
        req.headers.push(Header {
            name: b"Range".to_vec(),
            value: b"bytes=0-99".to_vec(),
        });
        req.meta.range = Some(0);
        assert_eq!(req.range(), Some(&b"0-99"[..]));
    }
}
