/// HTML-escape a string for element text or a double-quoted attribute
///
/// Escapes: & < > "
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Quote a string as a JSON string literal, including the surrounding quotes.
///
/// `</` is broken up so the value cannot close the script block it lives in.
pub fn json_string(s: &str) -> String {
    serde_json::Value::String(s.to_string())
        .to_string()
        .replace("</", "<\\/")
}
