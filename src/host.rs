//! `Host` header validation.
//!
//! ```text
//! hostport    = host [ ":" port ]
//! host        = hostname | IPv4address | IPv6address
//! hostname    = *( domainlabel "." ) toplabel [ "." ]
//! domainlabel = alphanum | alphanum *( alphanum | "-" ) alphanum
//! toplabel    = alpha | alpha *( alphanum | "-" ) alphanum
//! IPv4address = 1*digit "." 1*digit "." 1*digit "." 1*digit
//! IPv6address = "[" *( HEXDIG | ":" ) "]"
//! port        = *digit
//! ```
//!
//! Purely syntactic: nothing is resolved or canonicalized.

use memchr::memchr;

use crate::error::ParseError;

/// Validate an optional `Host` value.
///
/// A missing header is accepted here; whether HTTP/1.1 requires one is
/// decided by the caller.
pub fn check_host(host: Option<&[u8]>) -> Result<(), ParseError> {
    match host {
        Some(h) if !is_valid_host(h) => Err(ParseError::InvalidHostname(
            String::from_utf8_lossy(h).into_owned(),
        )),
        _ => Ok(()),
    }
}

/// Whether `host` is a hostname, IPv4 address or bracketed IPv6 address,
/// optionally followed by `:port`.
pub fn is_valid_host(host: &[u8]) -> bool {
    if host.first() == Some(&b'[') {
        return is_valid_ipv6_authority(&host[1..]);
    }

    let name = match memchr(b':', host) {
        Some(colon) => {
            if !host[colon + 1..].iter().all(u8::is_ascii_digit) {
                return false;
            }
            &host[..colon]
        }
        None => host,
    };

    !name.is_empty() && is_valid_hostname(name)
}

/// `rest` is everything after the opening bracket.
fn is_valid_ipv6_authority(rest: &[u8]) -> bool {
    let Some(close) = memchr(b']', rest) else {
        return false;
    };

    let mut colons = 0;
    for &b in &rest[..close] {
        if b == b':' {
            colons += 1;
            if colons > 7 {
                return false;
            }
        } else if !b.is_ascii_hexdigit() {
            return false;
        }
    }

    match rest[close + 1..].split_first() {
        Some((&b':', port)) => port.iter().all(u8::is_ascii_digit),
        _ => true,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Stage {
    TopLabel,
    DomainLabel,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Numeric {
    Unknown,
    No,
    Yes,
}

/// Hostname or dotted-quad check, scanning labels right to left.
///
/// The rightmost label decides whether the whole name is numeric: a top
/// label starting with a digit switches every remaining label to digits
/// only, and then exactly four labels are required.
fn is_valid_hostname(host: &[u8]) -> bool {
    let last = host.len() - 1;

    let mut stage = Stage::TopLabel;
    let mut numeric = Numeric::Unknown;
    let mut label_len = 0usize;
    let mut dots = 0usize;

    for (i, &c) in host.iter().enumerate().rev() {
        match stage {
            Stage::TopLabel => {
                if c == b'.' {
                    // A single trailing dot is allowed.
                    if i == last {
                        if i == 0 {
                            return false;
                        }
                        continue;
                    }
                    if label_len == 0 {
                        return false;
                    }

                    let first = host[i + 1];
                    if numeric == Numeric::No {
                        if !first.is_ascii_alphabetic() {
                            return false;
                        }
                    } else if first.is_ascii_digit() {
                        numeric = Numeric::Yes;
                    } else {
                        numeric = Numeric::No;
                    }

                    stage = Stage::DomainLabel;
                    label_len = 0;
                    dots += 1;
                } else if i == 0 {
                    if !c.is_ascii_alphabetic() {
                        return false;
                    }
                    label_len += 1;
                } else {
                    if c != b'-' && !c.is_ascii_alphanumeric() {
                        return false;
                    }
                    if numeric == Numeric::Unknown && !c.is_ascii_digit() {
                        numeric = Numeric::No;
                    }
                    label_len += 1;
                }
            }
            Stage::DomainLabel if numeric == Numeric::Yes => {
                if c == b'.' {
                    if label_len == 0 {
                        return false;
                    }
                    label_len = 0;
                    dots += 1;
                } else if !c.is_ascii_digit() {
                    return false;
                } else {
                    label_len += 1;
                }
            }
            Stage::DomainLabel => {
                if c == b'.' {
                    // no empty labels, no label starting with '-'
                    if label_len == 0 || host[i + 1] == b'-' {
                        return false;
                    }
                    label_len = 0;
                    dots += 1;
                } else if i == 0 {
                    if !c.is_ascii_alphanumeric() {
                        return false;
                    }
                    label_len += 1;
                } else {
                    if c != b'-' && !c.is_ascii_alphanumeric() {
                        return false;
                    }
                    label_len += 1;
                }
            }
        }
    }

    if numeric == Numeric::Yes && dots != 3 {
        return false;
    }

    label_len != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostnames() {
        assert!(is_valid_host(b"example.com"));
        assert!(is_valid_host(b"localhost"));
        assert!(is_valid_host(b"www.example-site.co.uk"));
        assert!(is_valid_host(b"1st.example.com"));
        assert!(is_valid_host(b"example.com."));
        assert!(!is_valid_host(b"-example.com"));
        assert!(!is_valid_host(b"example.-com"));
        assert!(!is_valid_host(b"foo.-bar.com"));
        assert!(!is_valid_host(b"example..com"));
        assert!(!is_valid_host(b".example.com"));
        assert!(!is_valid_host(b"exa_mple.com"));
        assert!(!is_valid_host(b"example.1com"));
        assert!(!is_valid_host(b"."));
    }

    #[test]
    fn ipv4() {
        assert!(is_valid_host(b"1.2.3.4"));
        assert!(is_valid_host(b"192.168.0.1:8080"));
        assert!(!is_valid_host(b"1.2.3"));
        assert!(!is_valid_host(b"1.2.3.4.5"));
        assert!(!is_valid_host(b"1.2.x.4"));
        assert!(!is_valid_host(b"123"));
        assert!(!is_valid_host(b"example.123"));
    }

    #[test]
    fn ports() {
        assert!(is_valid_host(b"example.com:80"));
        assert!(is_valid_host(b"example.com:"));
        assert!(!is_valid_host(b"example.com:8o"));
        assert!(!is_valid_host(b":80"));
        assert!(!is_valid_host(b""));
    }

    #[test]
    fn ipv6() {
        assert!(is_valid_host(b"[::1]"));
        assert!(is_valid_host(b"[::1]:80"));
        assert!(is_valid_host(b"[2001:db8:0:0:0:0:2:1]"));
        assert!(!is_valid_host(b"[::1"));
        assert!(!is_valid_host(b"[::g]"));
        assert!(!is_valid_host(b"[1:2:3:4:5:6:7:8:9]"));
        assert!(!is_valid_host(b"[::1]:http"));
    }

    #[test]
    fn absent_host_is_accepted() {
        assert_eq!(check_host(None), Ok(()));
        assert!(matches!(
            check_host(Some(&b"a..b"[..])),
            Err(ParseError::InvalidHostname(_))
        ));
    }
}
