use serde::{Deserialize, Serialize};

/// HTTP method over the closed set the machine knows how to dispatch,
/// plus a catch-all for anything else the adapter hands us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Unknown,
}

impl Method {
    /// Parse a method token as received on the wire. Matching is
    /// case-sensitive per RFC 7231; anything outside the known set maps
    /// to `Unknown`.
    pub fn parse(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "PATCH" => Method::Patch,
            "DELETE" => Method::Delete,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            _ => Method::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Unknown => "UNKNOWN",
        }
    }

    /// Whether the method belongs to the known set (everything except
    /// the catch-all).
    pub fn is_known(&self) -> bool {
        !matches!(self, Method::Unknown)
    }

    /// Safe methods per RFC 7231: request cacheability and conditional
    /// `304` handling key off this.
    pub fn is_safe(&self) -> bool {
        matches!(self, Method::Get | Method::Head)
    }

    /// All known methods, in the fixed order used for auto-detection.
    pub fn known() -> &'static [Method] {
        &[
            Method::Get,
            Method::Post,
            Method::Put,
            Method::Patch,
            Method::Delete,
            Method::Head,
            Method::Options,
        ]
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_methods() {
        assert_eq!(Method::parse("GET"), Method::Get);
        assert_eq!(Method::parse("POST"), Method::Post);
        assert_eq!(Method::parse("OPTIONS"), Method::Options);
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert_eq!(Method::parse("get"), Method::Unknown);
        assert_eq!(Method::parse("Get"), Method::Unknown);
    }

    #[test]
    fn test_unknown_catch_all() {
        let brew = Method::parse("BREW");
        assert_eq!(brew, Method::Unknown);
        assert!(!brew.is_known());
    }

    #[test]
    fn test_safe_methods() {
        assert!(Method::Get.is_safe());
        assert!(Method::Head.is_safe());
        assert!(!Method::Post.is_safe());
        assert!(!Method::Delete.is_safe());
    }
}
