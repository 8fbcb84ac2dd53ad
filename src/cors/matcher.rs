use std::collections::HashSet;

/// A subdomain wildcard pattern, split once at registration.
///
/// `https://*.example.com` becomes scheme `https://` plus domain suffix
/// `.example.com`; a candidate origin matches when it carries the same
/// scheme, ends with the suffix, and has at least one subdomain label
/// in between.
#[derive(Debug, Clone, PartialEq, Eq)]
struct WildcardPattern {
    scheme: String,
    suffix: String,
}

impl WildcardPattern {
    /// Split a `scheme://*.domain` pattern; anything not of that shape
    /// is not a wildcard.
    fn parse(pattern: &str) -> Option<Self> {
        let star = pattern.find("*.")?;
        let scheme = &pattern[..star];
        if !scheme.ends_with("://") {
            return None;
        }
        let domain = &pattern[star + 1..];
        if domain.len() <= 1 {
            return None;
        }
        Some(Self {
            scheme: scheme.to_string(),
            suffix: domain.to_string(),
        })
    }

    fn matches(&self, origin: &str) -> bool {
        let host = match origin.strip_prefix(&self.scheme) {
            Some(host) => host,
            None => return false,
        };
        let label = match host.strip_suffix(&self.suffix) {
            Some(label) => label,
            None => return false,
        };
        // The bare domain is not covered, and the subdomain part must
        // be real labels, not path or authority junk.
        !label.is_empty() && !label.contains('/') && !label.contains('@')
    }
}

/// Origin allow-list with exact entries and `scheme://*.domain`
/// subdomain wildcards. Comparison is byte-exact on scheme, host, and
/// port, so `http` vs `https` and differing ports never match.
#[derive(Debug, Clone, Default)]
pub struct OriginMatcher {
    exact: HashSet<String>,
    wildcards: Vec<WildcardPattern>,
}

impl OriginMatcher {
    pub fn new() -> Self {
        Self {
            exact: HashSet::new(),
            wildcards: Vec::new(),
        }
    }

    pub fn from_origins<S: AsRef<str>>(origins: &[S]) -> Self {
        let mut matcher = Self::new();
        for origin in origins {
            matcher.add_origin(origin.as_ref());
        }
        matcher
    }

    /// Register one origin, exact or wildcard. A pattern that looks
    /// like a wildcard but fails to split is kept as an exact entry so
    /// a typo fails closed.
    pub fn add_origin(&mut self, origin: &str) {
        let origin = origin.trim();
        if origin.is_empty() {
            return;
        }
        match WildcardPattern::parse(origin) {
            Some(pattern) => self.wildcards.push(pattern),
            None => {
                self.exact.insert(origin.to_string());
            }
        }
    }

    /// Whether a request origin is admitted by any registered entry.
    pub fn is_allowed(&self, origin: &str) -> bool {
        let origin = origin.trim();
        if self.exact.contains(origin) {
            return true;
        }
        self.wildcards.iter().any(|pattern| pattern.matches(origin))
    }

    pub fn count(&self) -> usize {
        self.exact.len() + self.wildcards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.wildcards.is_empty()
    }
}
