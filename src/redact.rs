//! Redaction of text bound for logs.
//!
//! Error messages can carry text from the OS or from the prompt layer.
//! Anything that looks like `password=...` or an IPv4 address is masked
//! before it is recorded.

use std::sync::OnceLock;

use regex::Regex;

fn password_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(pass(?:word|phrase)?|pwd)=\S*").expect("static regex")
    })
}

fn ipv4_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b").expect("static regex")
    })
}

/// Mask password assignments and IPv4 addresses in `text`.
pub fn sanitize_log(text: &str) -> String {
    let masked = password_pattern().replace_all(text, "$1=[REDACTED]");
    ipv4_pattern()
        .replace_all(&masked, "[IP_REDACTED]")
        .into_owned()
}
