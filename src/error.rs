use std::fmt;

/// Reasons a request head is rejected.
///
/// Every variant is terminal for the current request. [`ParseError::status`]
/// gives the HTTP status the caller should answer with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No CRLF-terminated request line with exactly two spaces.
    IncompleteRequestLine,
    /// A third space appeared in the request line.
    OverlongRequestLine,
    /// The method is not in the supported set.
    UnknownMethod(String),
    /// `HTTP/1.x` with a minor version other than 0 or 1.
    UnsupportedVersion(String),
    /// The protocol token does not start with `HTTP/1.`.
    UnknownProtocol(String),
    /// A byte outside the allowed URI character set.
    InvalidUriCharacter(u8),
    /// A separator character inside a header key.
    InvalidKeyCharacter(u8),
    /// A control character inside a header key.
    ControlCharacterInKey(u8),
    /// Whitespace between key bytes, or something other than `:` after it.
    WhitespaceInKey,
    /// A header line with a key but no `:`.
    MissingColon,
    /// A CR that is not followed by LF.
    CrWithoutLf,
    /// A folded continuation line before any header was seen.
    FoldBeforeAnyKey,
    /// The input ended before the blank line closing the header block.
    IncompleteHeaders,
    /// `Content-Length` is not a plain decimal number that fits in a `u64`.
    MalformedContentLength(String),
    /// An `Expect` header was sent; 100-continue is not supported.
    ExpectationFailed,
    /// HTTP/1.1 request without a `Host` header.
    MissingHost,
    /// The `Host` header is not a valid hostname, IPv4 or IPv6 authority.
    InvalidHostname(String),
    /// POST without `Content-Length`.
    LengthRequired,
    /// POST body larger than the platform or configured limit.
    PayloadTooLarge(u64),
}

impl ParseError {
    /// HTTP status code to answer with.
    pub fn status(&self) -> u16 {
        match self {
            Self::UnknownMethod(_) => 501,
            Self::UnsupportedVersion(_) => 505,
            Self::ExpectationFailed => 417,
            Self::LengthRequired => 411,
            Self::PayloadTooLarge(_) => 413,
            _ => 400,
        }
    }

    /// Whether the connection must be closed after answering.
    ///
    /// Framing errors leave the byte stream in an unknown state. For the
    /// others the keep-alive decision made so far stands.
    pub fn forces_close(&self) -> bool {
        !matches!(
            self,
            Self::UnsupportedVersion(_)
                | Self::ExpectationFailed
                | Self::LengthRequired
                | Self::PayloadTooLarge(_)
        )
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncompleteRequestLine => write!(f, "incomplete request line"),
            Self::OverlongRequestLine => write!(f, "overlong request line"),
            Self::UnknownMethod(m) => write!(f, "unknown http-method: '{m}'"),
            Self::UnsupportedVersion(v) => write!(f, "unknown HTTP version: '{v}'"),
            Self::UnknownProtocol(p) => write!(f, "unknown protocol: '{p}'"),
            Self::InvalidUriCharacter(b) => write!(f, "invalid character in URI: 0x{b:02X}"),
            Self::InvalidKeyCharacter(b) => write!(f, "invalid character in key: 0x{b:02X}"),
            Self::ControlCharacterInKey(b) => write!(f, "CTL character in key: 0x{b:02X}"),
            Self::WhitespaceInKey => write!(f, "WS character in key"),
            Self::MissingColon => write!(f, "header line without ':'"),
            Self::CrWithoutLf => write!(f, "CR without LF"),
            Self::FoldBeforeAnyKey => write!(f, "WS at the start of first header line"),
            Self::IncompleteHeaders => write!(f, "header section is not terminated"),
            Self::MalformedContentLength(v) => write!(f, "content-length broken: '{v}'"),
            Self::ExpectationFailed => write!(f, "Expect header is not supported"),
            Self::MissingHost => write!(f, "HTTP/1.1 but Host missing"),
            Self::InvalidHostname(h) => write!(f, "invalid hostname: '{h}'"),
            Self::LengthRequired => write!(f, "POST request, but content-length missing"),
            Self::PayloadTooLarge(n) => write!(f, "request-size too long: {n}"),
        }
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(ParseError::IncompleteRequestLine.status(), 400);
        assert_eq!(ParseError::UnknownMethod("FOO".into()).status(), 501);
        assert_eq!(ParseError::UnsupportedVersion("HTTP/1.2".into()).status(), 505);
        assert_eq!(ParseError::ExpectationFailed.status(), 417);
        assert_eq!(ParseError::LengthRequired.status(), 411);
        assert_eq!(ParseError::PayloadTooLarge(1).status(), 413);
        assert_eq!(ParseError::InvalidHostname("-x".into()).status(), 400);
    }

    #[test]
    fn framing_errors_close_the_connection() {
        assert!(ParseError::CrWithoutLf.forces_close());
        assert!(ParseError::MissingHost.forces_close());
        assert!(ParseError::UnknownMethod("FOO".into()).forces_close());
        assert!(!ParseError::LengthRequired.forces_close());
        assert!(!ParseError::PayloadTooLarge(1 << 40).forces_close());
        assert!(!ParseError::ExpectationFailed.forces_close());
    }
}
