//! JSON Pointer paths (RFC 6901) used for instance locations, schema
//! locations, and evaluation paths.

use std::fmt;

/// Escape a pointer token: `~` becomes `~0`, `/` becomes `~1`.
pub fn escape_token(token: &str) -> String {
    if !token.contains('~') && !token.contains('/') {
        return token.to_string();
    }
    // Order matters: ~ must be escaped before /
    token.replace('~', "~0").replace('/', "~1")
}

/// Unescape a pointer token: `~1` becomes `/`, then `~0` becomes `~`.
pub fn unescape_token(token: &str) -> String {
    if !token.contains('~') {
        return token.to_string();
    }
    token.replace("~1", "/").replace("~0", "~")
}

/// An immutable JSON Pointer. Extension returns a new pointer, so sibling
/// evaluation branches never share mutable path state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Pointer {
    tokens: Vec<String>,
}

impl Pointer {
    /// The root pointer (empty string form).
    pub fn root() -> Self {
        Pointer::default()
    }

    /// Parse a pointer string (`""` or `"/a/b"`).
    ///
    /// # Example
    ///
    /// ```
    /// use json_schema::pointer::Pointer;
    ///
    /// assert!(Pointer::parse("").is_root());
    /// assert_eq!(Pointer::parse("/a~0b/c~1d").tokens(), &["a~b", "c/d"]);
    /// ```
    pub fn parse(pointer: &str) -> Pointer {
        if pointer.is_empty() {
            return Pointer::root();
        }
        Pointer {
            tokens: pointer[1..].split('/').map(unescape_token).collect(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Returns a new pointer with `token` appended.
    pub fn push(&self, token: impl Into<String>) -> Pointer {
        let mut tokens = self.tokens.clone();
        tokens.push(token.into());
        Pointer { tokens }
    }

    /// Returns a new pointer with an array index appended.
    pub fn push_index(&self, index: usize) -> Pointer {
        self.push(index.to_string())
    }

    /// The last token, if any.
    pub fn last(&self) -> Option<&str> {
        self.tokens.last().map(String::as_str)
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "/{}", escape_token(token))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root() {
        assert_eq!(Pointer::root().to_string(), "");
        assert!(Pointer::root().is_root());
    }

    #[test]
    fn test_push_and_format() {
        let p = Pointer::root().push("properties").push("a/b").push_index(3);
        assert_eq!(p.to_string(), "/properties/a~1b/3");
        assert_eq!(p.last(), Some("3"));
    }

    #[test]
    fn test_parse_roundtrip() {
        for s in ["", "/a", "/a/b", "/a~0b/c~1d", "/0/1"] {
            assert_eq!(Pointer::parse(s).to_string(), s, "roundtrip {:?}", s);
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape_token("a~b/c"), "a~0b~1c");
        assert_eq!(unescape_token("a~0b~1c"), "a~b/c");
    }
}
