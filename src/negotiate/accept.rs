use serde::{Deserialize, Serialize};

/// A concrete media type offered by a renderer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaType {
    main: String,
    sub: String,
}

impl MediaType {
    pub fn new(main: impl Into<String>, sub: impl Into<String>) -> Self {
        Self {
            main: main.into().to_ascii_lowercase(),
            sub: sub.into().to_ascii_lowercase(),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let essence = value.split(';').next()?.trim();
        let (main, sub) = essence.split_once('/')?;
        if main.is_empty() || sub.is_empty() {
            return None;
        }
        Some(Self::new(main, sub))
    }

    pub fn json() -> Self {
        Self::new("application", "json")
    }

    pub fn html() -> Self {
        Self::new("text", "html")
    }

    pub fn plain_text() -> Self {
        Self::new("text", "plain")
    }

    pub fn main_type(&self) -> &str {
        &self.main
    }

    pub fn sub_type(&self) -> &str {
        &self.sub
    }

    pub fn essence(&self) -> String {
        format!("{}/{}", self.main, self.sub)
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.main, self.sub)
    }
}

/// One parsed `Accept` entry. Quality is kept in thousandths so sorting
/// never touches floating-point comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRange {
    pub main: String,
    pub sub: String,
    pub quality: u16,
    pub params: Vec<(String, String)>,
    /// Position in the header; the tiebreak for equal quality.
    pub source_order: usize,
}

impl MediaRange {
    pub fn is_full_wildcard(&self) -> bool {
        self.main == "*" && self.sub == "*"
    }

    pub fn is_partial_wildcard(&self) -> bool {
        self.main != "*" && self.sub == "*"
    }

    pub fn matches_exactly(&self, offered: &MediaType) -> bool {
        self.main == offered.main_type() && self.sub == offered.sub_type()
    }
}

/// Parse an `Accept` header into ranges ordered by quality descending,
/// ties broken by source order. Unparseable entries are skipped;
/// `q=0` entries are kept (they disqualify their type downstream).
pub fn parse_accept(header: &str) -> Vec<MediaRange> {
    let mut ranges: Vec<MediaRange> = Vec::new();

    for (source_order, entry) in header.split(',').enumerate() {
        let mut parts = entry.split(';');
        let essence = match parts.next() {
            Some(essence) => essence.trim(),
            None => continue,
        };
        let (main, sub) = match essence.split_once('/') {
            Some((main, sub)) if !main.is_empty() && !sub.is_empty() => {
                (main.trim().to_ascii_lowercase(), sub.trim().to_ascii_lowercase())
            }
            _ => continue,
        };

        let mut quality: u16 = 1000;
        let mut params = Vec::new();
        for raw_param in parts {
            let (key, value) = match raw_param.split_once('=') {
                Some((key, value)) => (key.trim().to_ascii_lowercase(), value.trim()),
                None => continue,
            };
            if key == "q" {
                quality = parse_quality(value);
            } else {
                params.push((key, value.to_string()));
            }
        }

        ranges.push(MediaRange {
            main,
            sub,
            quality,
            params,
            source_order,
        });
    }

    // Stable sort: equal quality keeps source order.
    ranges.sort_by(|a, b| b.quality.cmp(&a.quality));
    ranges
}

/// Quality value in thousandths, clamped to [0, 1000]. Malformed
/// values read as 1.0 per the lenient-parse posture.
fn parse_quality(raw: &str) -> u16 {
    match raw.parse::<f32>() {
        Ok(q) if q <= 0.0 => 0,
        Ok(q) if q >= 1.0 => 1000,
        Ok(q) => (q * 1000.0).round() as u16,
        Err(_) => 1000,
    }
}

/// Pick the offered type the client prefers.
///
/// A missing header accepts anything (first offer wins). Each range in
/// preference order matches an offer exactly; the full wildcard takes
/// the first offer. Partial wildcards such as `text/*` never match.
pub fn negotiate(accept: Option<&str>, offered: &[MediaType]) -> Option<MediaType> {
    if offered.is_empty() {
        return None;
    }
    let header = match accept {
        Some(header) if !header.trim().is_empty() => header,
        _ => return offered.first().cloned(),
    };

    for range in parse_accept(header) {
        if range.quality == 0 {
            continue;
        }
        if range.is_full_wildcard() {
            return offered.first().cloned();
        }
        if range.is_partial_wildcard() {
            continue;
        }
        if let Some(hit) = offered.iter().find(|offer| range.matches_exactly(offer)) {
            return Some(hit.clone());
        }
    }

    None
}
