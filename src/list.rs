//! Comma-separated header value lists (`Connection: keep-alive, Upgrade`).

use memchr::memchr;

/// Split `value` on `,` into `tokens`, trimming SP/HTAB around each token.
///
/// `tokens` is cleared first and can be reused between calls. A trailing
/// empty fragment (`a,` or `a, `) is skipped; empty fragments in the middle
/// (`a,,b`) come through as empty tokens. Token contents are not validated.
pub fn split_value<'a>(value: &'a [u8], tokens: &mut Vec<&'a [u8]>) {
    tokens.clear();

    let mut rest = value;
    loop {
        rest = trim_start(rest);
        if rest.is_empty() {
            break;
        }
        match memchr(b',', rest) {
            Some(comma) => {
                tokens.push(trim_end(&rest[..comma]));
                rest = &rest[comma + 1..];
            }
            None => {
                tokens.push(trim_end(rest));
                break;
            }
        }
    }
}

#[inline]
pub(crate) fn is_ws(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

pub(crate) fn trim_start(mut s: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = s {
        if !is_ws(*first) {
            break;
        }
        s = rest;
    }
    s
}

pub(crate) fn trim_end(mut s: &[u8]) -> &[u8] {
    while let [rest @ .., last] = s {
        if !is_ws(*last) {
            break;
        }
        s = rest;
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(value: &[u8]) -> Vec<&[u8]> {
        let mut tokens = Vec::new();
        split_value(value, &mut tokens);
        tokens
    }

    #[test]
    fn trims_each_token() {
        assert_eq!(split(b"a, b ,c"), vec![&b"a"[..], b"b", b"c"]);
        assert_eq!(split(b"\tkeep-alive ,\tUpgrade\t"), vec![&b"keep-alive"[..], b"Upgrade"]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(split(b"").is_empty());
        assert!(split(b"  \t ").is_empty());
    }

    #[test]
    fn trailing_comma_is_skipped() {
        assert_eq!(split(b"a,"), vec![&b"a"[..]]);
        assert_eq!(split(b"a, \t"), vec![&b"a"[..]]);
    }

    #[test]
    fn inner_empty_fragment_is_kept() {
        assert_eq!(split(b"a,,b"), vec![&b"a"[..], b"", b"b"]);
    }

    #[test]
    fn scratch_is_cleared_between_calls() {
        let mut tokens = Vec::new();
        split_value(b"x, y", &mut tokens);
        split_value(b"z", &mut tokens);
        assert_eq!(tokens, vec![&b"z"[..]]);
    }
}
