//! Section paths.

use std::fmt;

/// Path identifying the configuration subtree a cell is bound to.
///
/// Segments are separated by `.` or `:` (`"server.http"` and `"server:http"`
/// address the same subtree). The empty key addresses the whole tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionKey(String);

impl SectionKey {
    /// Create a section key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as written.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the non-empty path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(['.', ':']).filter(|s| !s.is_empty())
    }

    /// Whether the key addresses the whole tree.
    pub fn is_root(&self) -> bool {
        self.segments().next().is_none()
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SectionKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for SectionKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&String> for SectionKey {
    fn from(key: &String) -> Self {
        Self(key.clone())
    }
}

impl From<&SectionKey> for SectionKey {
    fn from(key: &SectionKey) -> Self {
        key.clone()
    }
}

impl AsRef<str> for SectionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments() {
        let key = SectionKey::from("server.http:tls");
        assert_eq!(key.segments().collect::<Vec<_>>(), vec!["server", "http", "tls"]);
        assert!(!key.is_root());
    }

    #[test]
    fn test_root() {
        assert!(SectionKey::from("").is_root());
        assert!(SectionKey::from(".").is_root());
    }

    #[test]
    fn test_display() {
        assert_eq!(SectionKey::from("Feature").to_string(), "Feature");
    }
}
