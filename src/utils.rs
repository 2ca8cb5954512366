// src/utils.rs
use anyhow::{Context, Result};
use url::Url;

/// Extract the registrable host from a posting URL, lowercased, without a
/// leading "www." so selector cache entries hit for both forms.
pub fn domain_from_url(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw).with_context(|| format!("Invalid URL: {}", raw))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("URL has no host: {}", raw))?
        .to_lowercase();

    Ok(host.trim_start_matches("www.").to_string())
}

/// Collapse scraped text into single-spaced lines
pub fn clean_text(text: &str) -> String {
    text.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Shorten text to a provenance excerpt without splitting a word
pub fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max_chars).collect();
    match truncated.rfind(' ') {
        Some(idx) if idx > 0 => format!("{}…", &truncated[..idx]),
        _ => format!("{}…", truncated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_from_url() {
        assert_eq!(
            domain_from_url("https://www.example.com/jobs/123").unwrap(),
            "example.com"
        );
        assert_eq!(
            domain_from_url("https://careers.acme.io/listing?id=9").unwrap(),
            "careers.acme.io"
        );
        assert!(domain_from_url("not a url").is_err());
    }

    #[test]
    fn test_clean_text_collapses_whitespace() {
        let raw = "  Senior Engineer\n\n   Remote \t ok  ";
        assert_eq!(clean_text(raw), "Senior Engineer Remote ok");
    }

    #[test]
    fn test_excerpt_respects_word_boundary() {
        let text = "We are looking for a senior backend engineer";
        let short = excerpt(text, 20);
        assert!(short.ends_with('…'));
        assert!(short.len() <= 24);
        assert!(!short.contains("backend"));
    }

    #[test]
    fn test_excerpt_returns_short_text_unchanged() {
        assert_eq!(excerpt("short", 100), "short");
    }
}
