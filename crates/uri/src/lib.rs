//! URI reference utilities.
//!
//! This crate implements the small slice of RFC 3986 a JSON Schema engine
//! needs: splitting a URI reference into components, resolving a reference
//! against a base URI (including dot-segment removal), and classifying
//! fragments as JSON Pointers or plain anchor names.
//!
//! # Example
//!
//! ```
//! use json_schema_uri::Uri;
//!
//! let base = Uri::parse("https://example.com/schemas/root.json");
//! let resolved = base.resolve(&Uri::parse("other.json#/a/b"));
//! assert_eq!(resolved.to_string(), "https://example.com/schemas/other.json#/a/b");
//! ```

use std::fmt;

/// A parsed URI reference.
///
/// All components are kept verbatim; no percent-decoding is performed. The
/// `fragment` is stored without its leading `#`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Uri {
    pub scheme: Option<String>,
    pub authority: Option<String>,
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl Uri {
    /// Parse a URI reference into its five components.
    ///
    /// Parsing is lenient: any string produces a `Uri`. Invalid input simply
    /// ends up in the `path` component.
    ///
    /// # Example
    ///
    /// ```
    /// use json_schema_uri::Uri;
    ///
    /// let uri = Uri::parse("https://example.com/a/b?x=1#frag");
    /// assert_eq!(uri.scheme.as_deref(), Some("https"));
    /// assert_eq!(uri.authority.as_deref(), Some("example.com"));
    /// assert_eq!(uri.path, "/a/b");
    /// assert_eq!(uri.query.as_deref(), Some("x=1"));
    /// assert_eq!(uri.fragment.as_deref(), Some("frag"));
    /// ```
    pub fn parse(input: &str) -> Uri {
        let mut rest = input;
        let mut uri = Uri::default();

        if let Some(pos) = rest.find('#') {
            uri.fragment = Some(rest[pos + 1..].to_string());
            rest = &rest[..pos];
        }
        if let Some(pos) = rest.find('?') {
            uri.query = Some(rest[pos + 1..].to_string());
            rest = &rest[..pos];
        }
        if let Some(pos) = rest.find(':') {
            let candidate = &rest[..pos];
            if is_scheme(candidate) {
                uri.scheme = Some(candidate.to_string());
                rest = &rest[pos + 1..];
            }
        }
        if let Some(after) = rest.strip_prefix("//") {
            match after.find('/') {
                Some(pos) => {
                    uri.authority = Some(after[..pos].to_string());
                    rest = &after[pos..];
                }
                None => {
                    uri.authority = Some(after.to_string());
                    rest = "";
                }
            }
        }
        uri.path = rest.to_string();
        uri
    }

    /// True when the reference carries a scheme.
    pub fn is_absolute(&self) -> bool {
        self.scheme.is_some()
    }

    /// Returns this URI with the fragment removed.
    ///
    /// # Example
    ///
    /// ```
    /// use json_schema_uri::Uri;
    ///
    /// let uri = Uri::parse("https://example.com/a#frag");
    /// assert_eq!(uri.without_fragment().to_string(), "https://example.com/a");
    /// ```
    pub fn without_fragment(&self) -> Uri {
        Uri {
            fragment: None,
            ..self.clone()
        }
    }

    /// True when the reference is only a fragment (`#...` or empty).
    pub fn is_fragment_only(&self) -> bool {
        self.scheme.is_none()
            && self.authority.is_none()
            && self.path.is_empty()
            && self.query.is_none()
    }

    /// Resolve `reference` against `self` per RFC 3986 §5.3.
    ///
    /// # Example
    ///
    /// ```
    /// use json_schema_uri::Uri;
    ///
    /// let base = Uri::parse("https://example.com/a/b/c");
    /// assert_eq!(base.resolve(&Uri::parse("d")).to_string(), "https://example.com/a/b/d");
    /// assert_eq!(base.resolve(&Uri::parse("../d")).to_string(), "https://example.com/a/d");
    /// assert_eq!(base.resolve(&Uri::parse("/d")).to_string(), "https://example.com/d");
    /// assert_eq!(base.resolve(&Uri::parse("#x")).to_string(), "https://example.com/a/b/c#x");
    /// ```
    pub fn resolve(&self, reference: &Uri) -> Uri {
        if reference.scheme.is_some() {
            return Uri {
                scheme: reference.scheme.clone(),
                authority: reference.authority.clone(),
                path: remove_dot_segments(&reference.path),
                query: reference.query.clone(),
                fragment: reference.fragment.clone(),
            };
        }
        if reference.authority.is_some() {
            return Uri {
                scheme: self.scheme.clone(),
                authority: reference.authority.clone(),
                path: remove_dot_segments(&reference.path),
                query: reference.query.clone(),
                fragment: reference.fragment.clone(),
            };
        }
        if reference.path.is_empty() {
            return Uri {
                scheme: self.scheme.clone(),
                authority: self.authority.clone(),
                path: self.path.clone(),
                query: reference
                    .query
                    .clone()
                    .or_else(|| self.query.clone()),
                fragment: reference.fragment.clone(),
            };
        }
        let path = if reference.path.starts_with('/') {
            remove_dot_segments(&reference.path)
        } else {
            remove_dot_segments(&merge_paths(self, &reference.path))
        };
        Uri {
            scheme: self.scheme.clone(),
            authority: self.authority.clone(),
            path,
            query: reference.query.clone(),
            fragment: reference.fragment.clone(),
        }
    }

    /// Parse-and-resolve convenience: resolve a reference string against `self`.
    pub fn join(&self, reference: &str) -> Uri {
        self.resolve(&Uri::parse(reference))
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scheme) = &self.scheme {
            write!(f, "{}:", scheme)?;
        }
        if let Some(authority) = &self.authority {
            write!(f, "//{}", authority)?;
        }
        write!(f, "{}", self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{}", query)?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{}", fragment)?;
        }
        Ok(())
    }
}

fn is_scheme(s: &str) -> bool {
    let mut bytes = s.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'.')
}

/// RFC 3986 §5.3 path merge.
fn merge_paths(base: &Uri, reference_path: &str) -> String {
    if base.authority.is_some() && base.path.is_empty() {
        let mut out = String::with_capacity(reference_path.len() + 1);
        out.push('/');
        out.push_str(reference_path);
        return out;
    }
    match base.path.rfind('/') {
        Some(pos) => {
            let mut out = base.path[..pos + 1].to_string();
            out.push_str(reference_path);
            out
        }
        None => reference_path.to_string(),
    }
}

/// RFC 3986 §5.2.4 dot-segment removal.
pub fn remove_dot_segments(path: &str) -> String {
    let mut input = path.to_string();
    let mut output = String::with_capacity(path.len());

    while !input.is_empty() {
        if input.starts_with("../") {
            input.drain(..3);
        } else if input.starts_with("./") {
            input.drain(..2);
        } else if input.starts_with("/./") {
            input.replace_range(..3, "/");
        } else if input == "/." {
            input = "/".to_string();
        } else if input.starts_with("/../") {
            input.replace_range(..4, "/");
            truncate_last_segment(&mut output);
        } else if input == "/.." {
            input = "/".to_string();
            truncate_last_segment(&mut output);
        } else if input == "." || input == ".." {
            input.clear();
        } else {
            // Move the first segment (with its leading slash, if any) to output
            let start = usize::from(input.starts_with('/'));
            let end = match input[start..].find('/') {
                Some(pos) => start + pos,
                None => input.len(),
            };
            output.push_str(&input[..end]);
            input.drain(..end);
        }
    }
    output
}

fn truncate_last_segment(output: &mut String) {
    match output.rfind('/') {
        Some(pos) => output.truncate(pos),
        None => output.clear(),
    }
}

/// Check a fragment against the plain-anchor grammar
/// (`^[A-Za-z_][-A-Za-z0-9._]*$`).
///
/// Fragments that do not match are treated as JSON Pointers by the engine.
///
/// # Example
///
/// ```
/// use json_schema_uri::is_anchor_name;
///
/// assert!(is_anchor_name("node"));
/// assert!(is_anchor_name("_a-b.c"));
/// assert!(!is_anchor_name(""));
/// assert!(!is_anchor_name("/a/b"));
/// assert!(!is_anchor_name("1abc"));
/// ```
pub fn is_anchor_name(fragment: &str) -> bool {
    let mut bytes = fragment.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let uri = Uri::parse("https://user@example.com:8080/a/b?q=1#frag");
        assert_eq!(uri.scheme.as_deref(), Some("https"));
        assert_eq!(uri.authority.as_deref(), Some("user@example.com:8080"));
        assert_eq!(uri.path, "/a/b");
        assert_eq!(uri.query.as_deref(), Some("q=1"));
        assert_eq!(uri.fragment.as_deref(), Some("frag"));
    }

    #[test]
    fn test_parse_relative() {
        let uri = Uri::parse("a/b#x");
        assert!(uri.scheme.is_none());
        assert!(uri.authority.is_none());
        assert_eq!(uri.path, "a/b");
        assert_eq!(uri.fragment.as_deref(), Some("x"));
    }

    #[test]
    fn test_parse_fragment_only() {
        let uri = Uri::parse("#/a/b");
        assert!(uri.is_fragment_only());
        assert_eq!(uri.fragment.as_deref(), Some("/a/b"));

        let empty = Uri::parse("#");
        assert!(empty.is_fragment_only());
        assert_eq!(empty.fragment.as_deref(), Some(""));
    }

    #[test]
    fn test_parse_urn() {
        let uri = Uri::parse("urn:example:schema");
        assert_eq!(uri.scheme.as_deref(), Some("urn"));
        assert!(uri.authority.is_none());
        assert_eq!(uri.path, "example:schema");
    }

    #[test]
    fn test_colon_in_path_is_not_scheme() {
        // A colon after a non-scheme prefix stays in the path
        let uri = Uri::parse("./a:b");
        assert!(uri.scheme.is_none());
        assert_eq!(uri.path, "./a:b");
    }

    #[test]
    fn test_display_roundtrip() {
        for s in [
            "https://example.com/a/b?q=1#frag",
            "urn:example:schema",
            "a/b",
            "#/a/b",
            "https://example.com",
            "//example.com/x",
        ] {
            assert_eq!(Uri::parse(s).to_string(), s, "roundtrip for {:?}", s);
        }
    }

    #[test]
    fn test_resolve_rfc3986_examples() {
        // RFC 3986 §5.4.1 normal examples
        let base = Uri::parse("http://a/b/c/d;p?q");
        let cases = [
            ("g", "http://a/b/c/g"),
            ("./g", "http://a/b/c/g"),
            ("g/", "http://a/b/c/g/"),
            ("/g", "http://a/g"),
            ("//g", "http://g"),
            ("#s", "http://a/b/c/d;p?q#s"),
            ("g#s", "http://a/b/c/g#s"),
            ("../g", "http://a/b/g"),
            ("../../g", "http://a/g"),
            ("", "http://a/b/c/d;p?q"),
        ];
        for (reference, expected) in cases {
            assert_eq!(
                base.join(reference).to_string(),
                expected,
                "resolving {:?}",
                reference
            );
        }
    }

    #[test]
    fn test_resolve_absolute_reference_wins() {
        let base = Uri::parse("https://example.com/root.json");
        let resolved = base.join("urn:other:thing");
        assert_eq!(resolved.to_string(), "urn:other:thing");
    }

    #[test]
    fn test_remove_dot_segments() {
        assert_eq!(remove_dot_segments("/a/b/c/./../../g"), "/a/g");
        assert_eq!(remove_dot_segments("mid/content=5/../6"), "mid/6");
        assert_eq!(remove_dot_segments("/a/../.."), "/");
        assert_eq!(remove_dot_segments("/a/b/.."), "/a/");
    }

    #[test]
    fn test_without_fragment() {
        let uri = Uri::parse("https://example.com/a#x");
        assert_eq!(uri.without_fragment().to_string(), "https://example.com/a");
    }

    #[test]
    fn test_anchor_names() {
        assert!(is_anchor_name("foo"));
        assert!(is_anchor_name("_foo"));
        assert!(is_anchor_name("a-b.c_d9"));
        assert!(!is_anchor_name(""));
        assert!(!is_anchor_name("9a"));
        assert!(!is_anchor_name("-a"));
        assert!(!is_anchor_name("/a/b"));
        assert!(!is_anchor_name("a b"));
    }
}
