//! Interpretation of the headers the server acts on while parsing.

use std::cmp::Ordering;

use memchr::memchr;

use crate::error::ParseError;
use crate::list::split_value;
use crate::types::{ConnectionToken, Header, RANGE_PREFIX, Request};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KnownHeader {
    Connection,
    ContentLength,
    ContentType,
    Expect,
    Host,
    IfModifiedSince,
    IfNoneMatch,
    Range,
}

/// Sorted case-insensitively so lookups can binary search.
const KNOWN_HEADERS: [(&str, KnownHeader); 8] = [
    ("Connection", KnownHeader::Connection),
    ("Content-Length", KnownHeader::ContentLength),
    ("Content-Type", KnownHeader::ContentType),
    ("Expect", KnownHeader::Expect),
    ("Host", KnownHeader::Host),
    ("If-Modified-Since", KnownHeader::IfModifiedSince),
    ("If-None-Match", KnownHeader::IfNoneMatch),
    ("Range", KnownHeader::Range),
];

impl KnownHeader {
    fn lookup(name: &[u8]) -> Option<Self> {
        KNOWN_HEADERS
            .binary_search_by(|(known, _)| cmp_ignore_ascii_case(known.as_bytes(), name))
            .ok()
            .map(|i| KNOWN_HEADERS[i].1)
    }
}

fn cmp_ignore_ascii_case(a: &[u8], b: &[u8]) -> Ordering {
    a.iter()
        .map(u8::to_ascii_lowercase)
        .cmp(b.iter().map(u8::to_ascii_lowercase))
}

/// Record a completed header field on `request`.
///
/// The field is always appended to the header collection, including when
/// it is rejected. `tokens` is scratch space for splitting list values.
pub(crate) fn dispatch<'a>(
    request: &mut Request,
    name: &'a [u8],
    value: &'a [u8],
    tokens: &mut Vec<&'a [u8]>,
) -> Result<(), ParseError> {
    let index = request.headers.len();
    request.headers.push(Header {
        name: name.to_vec(),
        value: value.to_vec(),
    });

    let Some(known) = KnownHeader::lookup(name) else {
        return Ok(());
    };

    let meta = &mut request.meta;
    match known {
        KnownHeader::Connection => {
            split_value(value, tokens);
            for token in tokens.iter() {
                if token.eq_ignore_ascii_case(b"keep-alive") {
                    meta.connection = ConnectionToken::KeepAlive;
                    break;
                }
                if token.eq_ignore_ascii_case(b"close") {
                    meta.connection = ConnectionToken::Close;
                    break;
                }
            }
        }
        KnownHeader::ContentLength => {
            let length = parse_content_length(value)?;
            // Two different lengths leave the body boundary ambiguous.
            if meta.content_length.is_some_and(|seen| seen != length) {
                return Err(ParseError::MalformedContentLength(
                    "multiple differing Content-Length values".into(),
                ));
            }
            meta.content_length = Some(length);
        }
        KnownHeader::ContentType => {
            meta.content_type.get_or_insert(index);
        }
        KnownHeader::Expect => return Err(ParseError::ExpectationFailed),
        KnownHeader::Host => {
            meta.host.get_or_insert(index);
        }
        KnownHeader::IfModifiedSince => {
            meta.if_modified_since.get_or_insert(index);
        }
        KnownHeader::IfNoneMatch => {
            meta.if_none_match.get_or_insert(index);
        }
        KnownHeader::Range => {
            // bytes=<first>-<last>; anything else is ignored
            if let Some(set) = value.strip_prefix(RANGE_PREFIX) {
                if memchr(b'-', set).is_some() {
                    meta.range.get_or_insert(index);
                }
            }
        }
    }

    Ok(())
}

/// Digits only; no sign, no whitespace, must fit in a `u64`.
fn parse_content_length(value: &[u8]) -> Result<u64, ParseError> {
    let malformed = || ParseError::MalformedContentLength(String::from_utf8_lossy(value).into_owned());

    if value.is_empty() || !value.iter().all(u8::is_ascii_digit) {
        return Err(malformed());
    }

    value.iter().try_fold(0u64, |acc, &d| {
        acc.checked_mul(10)
            .and_then(|acc| acc.checked_add(u64::from(d - b'0')))
            .ok_or_else(malformed)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HttpMethod, HttpVersion};

    fn request() -> Request {
        Request::new(
            HttpMethod::GET,
            b"/".to_vec(),
            b"/".to_vec(),
            HttpVersion::Http11,
            b"GET / HTTP/1.1".to_vec(),
        )
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(KnownHeader::lookup(b"content-length"), Some(KnownHeader::ContentLength));
        assert_eq!(KnownHeader::lookup(b"HOST"), Some(KnownHeader::Host));
        assert_eq!(KnownHeader::lookup(b"if-none-match"), Some(KnownHeader::IfNoneMatch));
        assert_eq!(KnownHeader::lookup(b"X-Forwarded-For"), None);
        assert_eq!(KnownHeader::lookup(b"Content"), None);
    }

    #[test]
    fn table_is_sorted() {
        assert!(KNOWN_HEADERS.windows(2).all(|w| {
            cmp_ignore_ascii_case(w[0].0.as_bytes(), w[1].0.as_bytes()) == Ordering::Less
        }));
    }

    #[test]
    fn content_length_values() {
        assert_eq!(parse_content_length(b"0"), Ok(0));
        assert_eq!(parse_content_length(b"18446744073709551615"), Ok(u64::MAX));
        assert!(parse_content_length(b"18446744073709551616").is_err());
        assert!(parse_content_length(b"12a3").is_err());
        assert!(parse_content_length(b"-1").is_err());
        assert!(parse_content_length(b"+1").is_err());
    }

    #[test]
    fn connection_first_recognized_token_wins() {
        let mut req = request();
        let mut tokens = Vec::new();
        dispatch(&mut req, b"Connection", b"Upgrade, close, keep-alive", &mut tokens).unwrap();
        assert_eq!(req.connection_token(), ConnectionToken::Close);
    }

    #[test]
    fn first_host_wins_but_all_are_kept() {
        let mut req = request();
        let mut tokens = Vec::new();
        dispatch(&mut req, b"Host", b"a.example", &mut tokens).unwrap();
        dispatch(&mut req, b"host", b"b.example", &mut tokens).unwrap();
        assert_eq!(req.host(), Some(&b"a.example"[..]));
        assert_eq!(req.headers.len(), 2);
    }

    #[test]
    fn expect_is_recorded_then_rejected() {
        let mut req = request();
        let mut tokens = Vec::new();
        let err = dispatch(&mut req, b"Expect", b"100-continue", &mut tokens).unwrap_err();
        assert_eq!(err, ParseError::ExpectationFailed);
        assert_eq!(req.headers.len(), 1);
    }

    #[test]
    fn range_needs_prefix_and_dash() {
        let mut req = request();
        let mut tokens = Vec::new();
        dispatch(&mut req, b"Range", b"items=0-1", &mut tokens).unwrap();
        dispatch(&mut req, b"Range", b"bytes=5", &mut tokens).unwrap();
        assert_eq!(req.range(), None);
        dispatch(&mut req, b"Range", b"bytes=-500", &mut tokens).unwrap();
        assert_eq!(req.range(), Some(&b"-500"[..]));
    }

    #[test]
    fn repeated_content_length_must_agree() {
        let mut req = request();
        let mut tokens = Vec::new();
        dispatch(&mut req, b"Content-Length", b"5", &mut tokens).unwrap();
        dispatch(&mut req, b"Content-Length", b"5", &mut tokens).unwrap();
        assert!(matches!(
            dispatch(&mut req, b"Content-Length", b"6", &mut tokens),
            Err(ParseError::MalformedContentLength(_))
        ));
    }
}
