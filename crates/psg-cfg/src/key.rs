//! Fully-qualified key construction and key patterns.

/// Separator between key segments: `OBJECT-STAR-DISTANCE`.
pub const SEPARATOR: char = '-';

/// Joins a prefix and a relative key. An empty side contributes nothing, so a
/// field with an empty name is keyed by its model prefix alone (`OBJECT`).
pub fn join(prefix: &str, rel: &str) -> String {
    match (prefix.is_empty(), rel.is_empty()) {
        (true, _) => rel.to_string(),
        (_, true) => prefix.to_string(),
        _ => format!("{prefix}{SEPARATOR}{rel}"),
    }
}

/// Strips `prefix` from `key`, returning the remainder relative to it.
///
/// `strip("OBJECT", "OBJECT")` is `Some("")`; `strip("OBJECT",
/// "OBJECTIVE")` is `None`.
pub fn strip<'a>(prefix: &str, key: &'a str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(key);
    }
    let rest = key.strip_prefix(prefix)?;
    if rest.is_empty() {
        return Some(rest);
    }
    rest.strip_prefix(SEPARATOR)
}

/// A key, or family of keys, a field reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPattern {
    Exact(String),
    /// `prefix` followed by a decimal index, e.g. `LAYER-` matches `LAYER-1`.
    Indexed(String),
}

impl KeyPattern {
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Exact(k) => k == key,
            Self::Indexed(p) => index_of(p, key).is_some(),
        }
    }

    pub fn qualify(&self, prefix: &str) -> KeyPattern {
        match self {
            Self::Exact(k) => Self::Exact(join(prefix, k)),
            Self::Indexed(p) => Self::Indexed(join(prefix, p)),
        }
    }

    /// Whether some key could be matched by both patterns.
    pub fn overlaps(&self, other: &KeyPattern) -> bool {
        match (self, other) {
            (Self::Exact(a), Self::Exact(b)) => a == b,
            (Self::Indexed(p), Self::Exact(k)) | (Self::Exact(k), Self::Indexed(p)) => {
                index_of(p, k).is_some()
            }
            (Self::Indexed(a), Self::Indexed(b)) => a == b,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Exact(k) => k.clone(),
            Self::Indexed(p) => format!("{p}<n>"),
        }
    }
}

/// Index of `key` under an indexed prefix.
pub fn index_of(prefix: &str, key: &str) -> Option<usize> {
    let rest = key.strip_prefix(prefix)?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_skips_empty_segments() {
        assert_eq!(join("OBJECT", "NAME"), "OBJECT-NAME");
        assert_eq!(join("OBJECT", ""), "OBJECT");
        assert_eq!(join("", "NAME"), "NAME");
    }

    #[test]
    fn strip_respects_segment_boundary() {
        assert_eq!(strip("OBJECT", "OBJECT"), Some(""));
        assert_eq!(strip("OBJECT", "OBJECT-STAR-TYPE"), Some("STAR-TYPE"));
        assert_eq!(strip("OBJECT", "OBJECTIVE"), None);
        assert_eq!(strip("STAR", "GEOMETRY"), None);
    }

    #[test]
    fn indexed_patterns() {
        let p = KeyPattern::Indexed("LAYER-".into());
        assert!(p.matches("LAYER-12"));
        assert!(!p.matches("LAYER-"));
        assert!(!p.matches("LAYERS"));
        assert!(!p.matches("LAYER-1a"));
        assert!(p.overlaps(&KeyPattern::Exact("LAYER-3".into())));
        assert!(!p.overlaps(&KeyPattern::Exact("LAYERS-MOLECULES".into())));
        assert_eq!(
            p.qualify("ATMOSPHERE"),
            KeyPattern::Indexed("ATMOSPHERE-LAYER-".into())
        );
        assert_eq!(index_of("LAYER-", "LAYER-07"), Some(7));
    }
}
