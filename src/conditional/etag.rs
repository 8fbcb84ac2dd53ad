/// An entity tag as defined by RFC 7232: an opaque quoted string with
/// an optional `W/` weakness prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTag {
    weak: bool,
    opaque: String,
}

impl EntityTag {
    pub fn strong(opaque: impl Into<String>) -> Self {
        Self {
            weak: false,
            opaque: opaque.into(),
        }
    }

    pub fn weak(opaque: impl Into<String>) -> Self {
        Self {
            weak: true,
            opaque: opaque.into(),
        }
    }

    /// Parse one tag. Accepts `"v1"`, `W/"v1"`, and (leniently) a bare
    /// token without quotes.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw == "*" {
            return None;
        }
        let (weak, rest) = match raw.strip_prefix("W/").or_else(|| raw.strip_prefix("w/")) {
            Some(rest) => (true, rest.trim()),
            None => (false, raw),
        };
        let opaque = if rest.len() >= 2 && rest.starts_with('"') && rest.ends_with('"') {
            &rest[1..rest.len() - 1]
        } else {
            rest
        };
        if opaque.is_empty() {
            return None;
        }
        Some(Self {
            weak,
            opaque: opaque.to_string(),
        })
    }

    pub fn is_weak(&self) -> bool {
        self.weak
    }

    pub fn opaque(&self) -> &str {
        &self.opaque
    }

    /// Strong comparison: both tags strong and opaque values equal.
    pub fn strong_eq(&self, other: &EntityTag) -> bool {
        !self.weak && !other.weak && self.opaque == other.opaque
    }

    /// Weak comparison: opaque values equal, weakness ignored on either
    /// side.
    pub fn weak_eq(&self, other: &EntityTag) -> bool {
        self.opaque == other.opaque
    }
}

impl std::fmt::Display for EntityTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.weak {
            write!(f, "W/\"{}\"", self.opaque)
        } else {
            write!(f, "\"{}\"", self.opaque)
        }
    }
}

/// A parsed `If-Match` / `If-None-Match` header: either the wildcard or
/// a list of tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagSet {
    Wildcard,
    Tags(Vec<EntityTag>),
}

impl TagSet {
    pub fn parse(header: &str) -> Self {
        if header.trim() == "*" {
            return TagSet::Wildcard;
        }
        let tags = header
            .split(',')
            .filter_map(EntityTag::parse)
            .collect::<Vec<_>>();
        TagSet::Tags(tags)
    }

    /// Whether any listed tag strongly matches. The wildcard matches
    /// any existing representation.
    pub fn strong_match(&self, etag: Option<&EntityTag>) -> bool {
        match self {
            TagSet::Wildcard => etag.is_some(),
            TagSet::Tags(tags) => match etag {
                Some(current) => tags.iter().any(|tag| tag.strong_eq(current)),
                None => false,
            },
        }
    }

    /// Whether any listed tag weakly matches; `resource_exists` feeds
    /// the wildcard case for requests against absent representations.
    pub fn weak_match(&self, etag: Option<&EntityTag>, resource_exists: bool) -> bool {
        match self {
            TagSet::Wildcard => resource_exists,
            TagSet::Tags(tags) => match etag {
                Some(current) => tags.iter().any(|tag| tag.weak_eq(current)),
                None => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        let strong = EntityTag::parse("\"v1\"").unwrap();
        assert!(!strong.is_weak());
        assert_eq!(strong.opaque(), "v1");

        let weak = EntityTag::parse("W/\"v1\"").unwrap();
        assert!(weak.is_weak());
        assert_eq!(weak.opaque(), "v1");

        let bare = EntityTag::parse("v1").unwrap();
        assert_eq!(bare.opaque(), "v1");

        assert!(EntityTag::parse("").is_none());
        assert!(EntityTag::parse("*").is_none());
    }

    #[test]
    fn test_strong_compare_rejects_weak() {
        let strong = EntityTag::strong("v1");
        let weak = EntityTag::weak("v1");

        assert!(strong.strong_eq(&EntityTag::strong("v1")));
        assert!(!strong.strong_eq(&weak));
        assert!(!weak.strong_eq(&weak));
    }

    #[test]
    fn test_weak_compare_ignores_weakness() {
        let strong = EntityTag::strong("v1");
        let weak = EntityTag::weak("v1");

        assert!(weak.weak_eq(&strong));
        assert!(strong.weak_eq(&weak));
        assert!(!strong.weak_eq(&EntityTag::strong("v2")));
    }

    #[test]
    fn test_tag_set_list_matching() {
        let set = TagSet::parse("\"a\", W/\"b\"");
        assert!(set.strong_match(Some(&EntityTag::strong("a"))));
        assert!(!set.strong_match(Some(&EntityTag::strong("b"))));
        assert!(set.weak_match(Some(&EntityTag::strong("b")), true));
        assert!(!set.strong_match(None));
    }

    #[test]
    fn test_wildcard_matching() {
        let set = TagSet::parse("*");
        assert_eq!(set, TagSet::Wildcard);
        assert!(set.strong_match(Some(&EntityTag::strong("anything"))));
        assert!(!set.strong_match(None));
        assert!(set.weak_match(None, true));
        assert!(!set.weak_match(None, false));
    }

    #[test]
    fn test_display_round_trip() {
        assert_eq!(EntityTag::strong("v1").to_string(), "\"v1\"");
        assert_eq!(EntityTag::weak("v1").to_string(), "W/\"v1\"");
    }
}
