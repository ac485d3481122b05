//! Extracts the set of blob keys referenced by rendered content.

use std::collections::HashSet;

use regex::Regex;

/// Scans rendered content for embedded asset URLs.
///
/// A reference is the public base URL followed by a key token, terminated by
/// whitespace, a quote character, or an HTML/markdown delimiter. The scanner
/// is pure and total: content without a single prefix occurrence yields the
/// empty set.
#[derive(Debug, Clone)]
pub struct ReferenceScanner {
    pattern: Regex,
}

impl ReferenceScanner {
    /// Compiles a scanner for the given public base URL.
    #[must_use]
    pub fn new(public_base_url: &str) -> Self {
        let prefix = regex::escape(public_base_url.trim_end_matches('/'));
        let pattern = Regex::new(&format!(r#"{prefix}/([^\s"'`<>()]+)"#))
            .expect("escaped prefix always forms a valid pattern");
        Self { pattern }
    }

    /// Returns the set of blob keys referenced in `content`.
    ///
    /// Duplicate references collapse; set semantics.
    #[must_use]
    pub fn referenced_keys(&self, content: &str) -> HashSet<String> {
        self.pattern
            .captures_iter(content)
            .map(|captures| captures[1].to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://cdn.example.com/media";

    #[test]
    fn test_extracts_keys_from_html() {
        let scanner = ReferenceScanner::new(BASE);
        let content = r#"<p>hello</p><img src="https://cdn.example.com/media/community/a.png"> and
            <img src='https://cdn.example.com/media/community/b.jpg'/>"#;

        let keys = scanner.referenced_keys(content);
        assert_eq!(keys.len(), 2);
        assert!(keys.contains("community/a.png"));
        assert!(keys.contains("community/b.jpg"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let scanner = ReferenceScanner::new(BASE);
        let url = format!("{BASE}/community/a.png");
        let content = format!("{url} {url} {url}");

        assert_eq!(scanner.referenced_keys(&content).len(), 1);
    }

    #[test]
    fn test_no_prefix_yields_empty_set() {
        let scanner = ReferenceScanner::new(BASE);
        assert!(scanner.referenced_keys("no images here").is_empty());
        assert!(scanner.referenced_keys("").is_empty());
        assert!(
            scanner
                .referenced_keys("https://other.example.com/media/x.png")
                .is_empty()
        );
    }

    #[test]
    fn test_trailing_slash_on_base_is_ignored() {
        let scanner = ReferenceScanner::new("https://cdn.example.com/media/");
        let keys = scanner.referenced_keys("https://cdn.example.com/media/notice/n.png");
        assert!(keys.contains("notice/n.png"));
    }

    #[test]
    fn test_key_terminates_at_quote_and_whitespace() {
        let scanner = ReferenceScanner::new(BASE);
        let content = format!(r#"src="{BASE}/community/a.png" plus {BASE}/community/b.png end"#);

        let keys = scanner.referenced_keys(&content);
        assert!(keys.contains("community/a.png"));
        assert!(keys.contains("community/b.png"));
    }

    #[test]
    fn test_base_with_regex_metacharacters() {
        // Metacharacters in the base URL must match literally, not as regex.
        let scanner = ReferenceScanner::new("https://cdn.example.com/media+v2");
        let keys = scanner.referenced_keys("see https://cdn.example.com/media+v2/k.png");
        assert!(keys.contains("k.png"));
        assert!(
            scanner
                .referenced_keys("see https://cdn.example.com/mediaXv2/k.png")
                .is_empty()
        );
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    // Property: scanning is total - arbitrary content never panics and
    // produces keys only when the prefix occurs.
    proptest! {
        #[test]
        fn prop_scanner_is_total(content in ".*") {
            let scanner = ReferenceScanner::new("https://cdn.example.com/media");
            let keys = scanner.referenced_keys(&content);
            if !content.contains("https://cdn.example.com/media/") {
                prop_assert!(keys.is_empty());
            }
        }
    }

    // Property: a verbatim embedded URL is always found.
    proptest! {
        #[test]
        fn prop_embedded_url_is_found(key in "[a-z]{1,10}/[a-z0-9-]{1,20}\\.png") {
            let scanner = ReferenceScanner::new("https://cdn.example.com/media");
            let content = format!("before https://cdn.example.com/media/{key} after");
            let keys = scanner.referenced_keys(&content);
            prop_assert!(keys.contains(&key));
        }
    }
}
