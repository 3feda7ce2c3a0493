//! Slug derivation and validation for blog post URLs.

use regex::Regex;

lazy_static::lazy_static! {
    /// Valid slug pattern: lowercase letters, numbers, and hyphens
    static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
    static ref DISALLOWED: Regex = Regex::new(r"[^a-z0-9\s-]").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref HYPHENS: Regex = Regex::new(r"-+").unwrap();
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_REGEX.is_match(slug)
}

/// `"Hello, World! 2024"` becomes `"hello-world-2024"`.
pub fn generate_slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = DISALLOWED.replace_all(&lowered, "");
    let hyphenated = WHITESPACE.replace_all(stripped.trim(), "-");
    let collapsed = HYPHENS.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_slug_strips_punctuation() {
        assert_eq!(generate_slug("Hello, World! 2024"), "hello-world-2024");
    }

    #[test]
    fn test_generate_slug_collapses_separators() {
        assert_eq!(generate_slug("  Loans  --  for   SMEs "), "loans-for-smes");
        assert_eq!(generate_slug("-Leading and trailing-"), "leading-and-trailing");
        assert_eq!(generate_slug("Tabs\tand\nnewlines"), "tabs-and-newlines");
    }

    #[test]
    fn test_generate_slug_drops_non_ascii() {
        assert_eq!(generate_slug("Café Crème"), "caf-crme");
        assert_eq!(generate_slug("!!!"), "");
    }

    #[test]
    fn test_generated_slugs_are_valid() {
        for title in ["Hello, World! 2024", "Debt: 5 tips", "A -- B"] {
            assert!(is_valid_slug(&generate_slug(title)), "{}", title);
        }
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("business-loans-101"));
        assert!(!is_valid_slug("Business-Loans"));
        assert!(!is_valid_slug("double--hyphen"));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug(""));
    }
}
