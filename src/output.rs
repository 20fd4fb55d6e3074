use crate::types::Request;

/// Serialize a [`Request`] to a JSON string.
///
/// When `pretty` is `true` the output is indented for readability.
pub fn format_json(request: &Request, pretty: bool) -> String {
    if pretty {
        serde_json::to_string_pretty(request).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    } else {
        serde_json::to_string(request).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}

/// Render a [`Request`] in a human-readable debug format.
pub fn format_debug(request: &Request) -> String {
    let mut out = String::with_capacity(256);

    out.push_str("=== HTTP Request ===\n");
    out.push_str(&format!("Method:  {}\n", request.method));
    out.push_str(&format!("URI:     {}\n", String::from_utf8_lossy(&request.uri)));
    if request.original_uri != request.uri {
        out.push_str(&format!(
            "Orig:    {}\n",
            String::from_utf8_lossy(&request.original_uri)
        ));
    }
    out.push_str(&format!("Version: {}\n", request.version));

    out.push_str(&format!("\n--- Headers ({}) ---\n", request.headers.len()));
    for header in &request.headers {
        out.push_str(&format!(
            "  {}: {}\n",
            String::from_utf8_lossy(&header.name),
            String::from_utf8_lossy(&header.value)
        ));
    }

    out.push_str("\n--- Derived ---\n");
    out.push_str(&format!("  connection:     {:?}\n", request.connection_token()));
    match request.content_length() {
        Some(n) => out.push_str(&format!("  content-length: {n}\n")),
        None => out.push_str("  content-length: -\n"),
    }
    for (label, value) in [
        ("content-type", request.content_type()),
        ("host", request.host()),
        ("if-mod-since", request.if_modified_since()),
        ("if-none-match", request.if_none_match()),
        ("range", request.range()),
    ] {
        if let Some(v) = value {
            out.push_str(&format!("  {label:<15} {}\n", String::from_utf8_lossy(v)));
        }
    }

    out.push_str("====================\n");
    out
}

/// Render only the request line and headers, one per line.
pub fn format_head(request: &Request) -> String {
    let mut out = String::with_capacity(64 + request.headers.len() * 40);

    out.push_str(&format!(
        "{} {} {}\n",
        request.method,
        String::from_utf8_lossy(&request.uri),
        request.version
    ));

    for header in &request.headers {
        out.push_str(&format!(
            "{}: {}\n",
            String::from_utf8_lossy(&header.name),
            String::from_utf8_lossy(&header.value)
        ));
    }

    out
}
