use proptest::prelude::*;
use reqhead::{header_complete, is_valid_host, parse_request, split_value};

fn label_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z]([a-z0-9-]{0,10}[a-z0-9])?").expect("valid label regex")
}

proptest! {
    #[test]
    fn alphabetic_hostnames_are_valid(labels in proptest::collection::vec(label_strategy(), 1..5), port in proptest::option::of(any::<u16>())) {
        let mut host = labels.join(".");
        if let Some(port) = port {
            host.push_str(&format!(":{port}"));
        }
        prop_assert!(is_valid_host(host.as_bytes()), "rejected {}", host);
    }

    #[test]
    fn dotted_quads_are_valid(octets in any::<[u8; 4]>()) {
        let host = format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3]);
        prop_assert!(is_valid_host(host.as_bytes()));
    }

    #[test]
    fn three_part_numbers_are_invalid(a in any::<u8>(), b in any::<u8>(), c in any::<u8>()) {
        let host = format!("{a}.{b}.{c}");
        prop_assert!(!is_valid_host(host.as_bytes()));
    }

    #[test]
    fn leading_hyphen_is_invalid(labels in proptest::collection::vec(label_strategy(), 1..4)) {
        let host = format!("-{}", labels.join("."));
        prop_assert!(!is_valid_host(host.as_bytes()));
    }

    #[test]
    fn split_recovers_tokens(tokens in proptest::collection::vec("[a-z-]{1,8}", 0..6), pad in "[ \t]{0,2}") {
        let joined = tokens
            .iter()
            .map(|t| format!("{pad}{t}{pad}"))
            .collect::<Vec<_>>()
            .join(",");
        let mut out = Vec::new();
        split_value(joined.as_bytes(), &mut out);
        let expected: Vec<&[u8]> = tokens.iter().map(|t| t.as_bytes()).collect();
        prop_assert_eq!(out, expected);
    }

    #[test]
    fn request_line_fields_round_trip(path in "/[a-zA-Z0-9._~-]{0,20}", minor in 0u8..=1) {
        let raw = format!("GET {path} HTTP/1.{minor}\r\nHost: example.com\r\n\r\n");
        let req = parse_request(raw.as_bytes()).expect("valid request");
        prop_assert_eq!(req.uri, path.as_bytes());
        prop_assert_eq!(req.version.as_str(), format!("HTTP/1.{minor}"));
    }

    #[test]
    fn detector_finds_terminator_anywhere(prefix in "[a-zA-Z :/]{0,20}", suffix in proptest::collection::vec(any::<u8>(), 0..20)) {
        let mut buf = prefix.into_bytes();
        buf.extend_from_slice(b"\r\n\r\n");
        buf.extend_from_slice(&suffix);
        prop_assert!(header_complete(&buf));
    }
}
