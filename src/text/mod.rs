//! Text helpers for scan content and display labels

use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_CONTENT_CHARS: usize = 10_000;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]{1,128}$").expect("identifier pattern is valid")
});

/// Check scan content before it is sent. Returns the trimmed content.
pub fn validate_content(content: &str) -> Result<&str, String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err("Paste a message to scan.".to_string());
    }

    let chars = trimmed.chars().count();
    if chars > MAX_CONTENT_CHARS {
        return Err(format!(
            "Message is too long ({} characters). The limit is 10,000.",
            chars
        ));
    }

    Ok(trimmed)
}

/// Scan and card ids are placed directly into request paths.
pub fn is_safe_identifier(id: &str) -> bool {
    IDENTIFIER.is_match(id)
}

/// `"bank_kyc_fraud"` -> `"bank kyc fraud"`
pub fn humanize_scam_type(scam_type: &str) -> String {
    scam_type.replace('_', " ")
}

/// Short single-line preview for log output
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();

    if flat.chars().count() > max_chars {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}
