//! Common utilities and helper functions
//!
//! Text normalization shared by the signup registry and the draw engine.

use regex::Regex;
use std::sync::OnceLock;

/// Trim and collapse internal whitespace runs to a single space
pub fn normalize_whitespace(text: &str) -> String {
    static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();

    let re = WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("Invalid regex pattern"));

    re.replace_all(text.trim(), " ").to_string()
}

/// Identity key for a display name: whitespace-collapsed and lowercased
///
/// Two names with the same key are the same artist for de-duplication.
pub fn normalize_name(name: &str) -> String {
    normalize_whitespace(name).to_lowercase()
}

/// Quote a single CSV field, doubling embedded quotes
pub fn quote_csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  hello   world  "), "hello world");
        assert_eq!(normalize_whitespace("hello\n\tworld"), "hello world");
        assert_eq!(normalize_whitespace("   "), "");
    }

    #[test]
    fn test_normalize_name_is_case_and_space_insensitive() {
        assert_eq!(normalize_name("  DJ  NAME "), normalize_name("dj name"));
        assert_ne!(normalize_name("dj name"), normalize_name("djname"));
    }

    #[test]
    fn test_quote_csv_field() {
        assert_eq!(quote_csv_field("plain"), "\"plain\"");
        assert_eq!(quote_csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(quote_csv_field("a,b"), "\"a,b\"");
    }
}
