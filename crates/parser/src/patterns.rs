use once_cell::sync::Lazy;
use regex::Regex;

use tokenprobe_core::Findings;

// 20-64 hex chars standing alone; runs longer than 64 do not match at all
static HEX_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Fa-f0-9]{20,64})\b").unwrap());

// `"sodu": "1,234"` / `"sodu"=1234` as found in inline JSON and scripts
static SODU_FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)"sodu"\s*[:=]\s*["']?([0-9,\.]+)["']?"#).unwrap());

// Visible text such as "Số dư: 12.500" or "Xu 300"
static SODU_TEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:số\s*dư|sodu|xu)[^\d]{0,10}([0-9\.,]{2,})").unwrap());

/// Scan arbitrary HTML or JSON text for a balance and token candidates.
pub fn find_sodu_and_tokens(text: &str) -> Findings {
    if text.is_empty() {
        return Findings::default();
    }

    Findings {
        sodu: find_sodu(text),
        hex_like: find_hex_tokens(text),
    }
}

/// Structured field first; the free-text pattern only when that misses.
pub fn find_sodu(text: &str) -> Option<String> {
    SODU_FIELD_RE
        .captures(text)
        .or_else(|| SODU_TEXT_RE.captures(text))
        .and_then(|cap| cap.get(1).map(|m| m.as_str().to_string()))
}

/// Every hex-like token in order of appearance, duplicates included.
pub fn find_hex_tokens(text: &str) -> Vec<String> {
    HEX_TOKEN_RE
        .captures_iter(text)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect()
}
