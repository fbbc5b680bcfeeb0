//! Token classification predicates

use std::fmt;
use std::sync::Arc;

/// Decides whether a token belongs to a filter
#[derive(Clone)]
pub enum TokenMatcher {
    /// Token equals the text
    Exactly(String),
    /// Token starts with the prefix
    StartsWith(String),
    /// Token contains at least one of the characters
    ContainsAny(Vec<char>),
    /// First character is a hexadecimal digit
    HexLeading,
    /// Arbitrary predicate
    Custom(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl TokenMatcher {
    pub fn exactly(text: impl Into<String>) -> Self {
        TokenMatcher::Exactly(text.into())
    }

    pub fn starts_with(prefix: impl Into<String>) -> Self {
        TokenMatcher::StartsWith(prefix.into())
    }

    pub fn contains_any(chars: &[char]) -> Self {
        TokenMatcher::ContainsAny(chars.to_vec())
    }

    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        TokenMatcher::Custom(Arc::new(predicate))
    }

    pub fn matches(&self, token: &str) -> bool {
        match self {
            TokenMatcher::Exactly(text) => token == text,
            TokenMatcher::StartsWith(prefix) => token.starts_with(prefix.as_str()),
            TokenMatcher::ContainsAny(chars) => token.contains(chars.as_slice()),
            TokenMatcher::HexLeading => token
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_hexdigit()),
            TokenMatcher::Custom(predicate) => predicate(token),
        }
    }
}

impl fmt::Debug for TokenMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenMatcher::Exactly(text) => f.debug_tuple("Exactly").field(text).finish(),
            TokenMatcher::StartsWith(prefix) => f.debug_tuple("StartsWith").field(prefix).finish(),
            TokenMatcher::ContainsAny(chars) => f.debug_tuple("ContainsAny").field(chars).finish(),
            TokenMatcher::HexLeading => f.write_str("HexLeading"),
            TokenMatcher::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly() {
        let m = TokenMatcher::exactly("OK");
        assert!(m.matches("OK"));
        assert!(!m.matches("OK!"));
        assert!(!m.matches("ok"));
    }

    #[test]
    fn test_starts_with() {
        let m = TokenMatcher::starts_with(":");
        assert!(m.matches(":0000000000"));
        assert!(!m.matches("0:"));
    }

    #[test]
    fn test_contains_any() {
        let m = TokenMatcher::contains_any(&['+', '-']);
        assert!(m.matches("+"));
        assert!(m.matches("-"));
        assert!(m.matches("x+y"));
        assert!(!m.matches("OK"));
    }

    #[test]
    fn test_hex_leading() {
        let m = TokenMatcher::HexLeading;
        for token in ["0", "7F", "ffff", "A1", "Dead"] {
            assert!(m.matches(token), "{token}");
        }
        for token in ["", "OK", "W", ":1", "?q0", "+"] {
            assert!(!m.matches(token), "{token}");
        }
    }

    #[test]
    fn test_custom() {
        let m = TokenMatcher::custom(|t| t.len() == 3);
        assert!(m.matches("abc"));
        assert!(!m.matches("ab"));
        assert_eq!(format!("{:?}", m), "Custom(..)");
    }
}
