use crate::error::{Result, WebError};
use crate::http::PathParams;

/// One segment of a compiled path template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Must equal the request segment exactly.
    Literal(String),
    /// Binds exactly one request segment under the given name.
    Param(String),
}

/// A path template compiled once at registration.
///
/// Grammar: segments separated by `/`, each either a literal or a single
/// `{name}` parameter matching one segment (no slashes, no regex). `/`
/// is the root. Trailing slash is significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
    /// Trailing-slash templates match only trailing-slash paths.
    trailing_slash: bool,
}

impl PathTemplate {
    pub fn compile(raw: &str) -> Result<Self> {
        if !raw.starts_with('/') {
            return Err(WebError::Registration(format!(
                "path template must start with '/': {}",
                raw
            )));
        }

        let trailing_slash = raw.len() > 1 && raw.ends_with('/');
        let trimmed = raw.trim_start_matches('/').trim_end_matches('/');

        let mut segments = Vec::new();
        if !trimmed.is_empty() {
            for part in trimmed.split('/') {
                segments.push(Self::compile_segment(raw, part)?);
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
            trailing_slash,
        })
    }

    fn compile_segment(raw: &str, part: &str) -> Result<Segment> {
        if part.is_empty() {
            return Err(WebError::Registration(format!(
                "empty segment in path template: {}",
                raw
            )));
        }
        if part.starts_with('{') && part.ends_with('}') {
            let name = &part[1..part.len() - 1];
            if name.is_empty() {
                return Err(WebError::Registration(format!(
                    "empty parameter name in path template: {}",
                    raw
                )));
            }
            if name.contains('{') || name.contains('}') {
                return Err(WebError::Registration(format!(
                    "malformed parameter in path template: {}",
                    raw
                )));
            }
            return Ok(Segment::Param(name.to_string()));
        }
        if part.contains('{') || part.contains('}') {
            return Err(WebError::Registration(format!(
                "braces inside literal segment: {}",
                raw
            )));
        }
        Ok(Segment::Literal(part.to_string()))
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Parameter names in template order.
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Param(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Count of literal segments; the tiebreak that prefers literals
    /// over parameters at the same position falls out of ordering
    /// candidates by this.
    pub fn literal_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| matches!(segment, Segment::Literal(_)))
            .count()
    }

    /// Match a request path. Exact in segment count and literal
    /// equality; each parameter binds one segment.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        if !path.starts_with('/') {
            return None;
        }

        let path_trailing = path.len() > 1 && path.ends_with('/');
        if path_trailing != self.trailing_slash {
            return None;
        }

        let trimmed = path.trim_start_matches('/').trim_end_matches('/');
        let parts: Vec<&str> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('/').collect()
        };

        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::new();
        for (segment, part) in self.segments.iter().zip(parts.iter()) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), (*part).to_string());
                }
            }
        }

        Some(params)
    }

    /// Structural equality ignoring parameter names: `/users/{id}` and
    /// `/users/{uid}` collide in the route table.
    pub fn segments_equal(&self, other: &PathTemplate) -> bool {
        if self.trailing_slash != other.trailing_slash
            || self.segments.len() != other.segments.len()
        {
            return false;
        }
        self.segments
            .iter()
            .zip(other.segments.iter())
            .all(|(a, b)| match (a, b) {
                (Segment::Literal(x), Segment::Literal(y)) => x == y,
                (Segment::Param(_), Segment::Param(_)) => true,
                _ => false,
            })
    }

    /// Prefix this template under a mount point; used by sub-router
    /// composition.
    pub fn prefixed(&self, prefix: &str) -> Result<Self> {
        let prefix = prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return Ok(self.clone());
        }
        let combined = if self.raw == "/" {
            prefix.to_string()
        } else {
            format!("{}{}", prefix, self.raw)
        };
        Self::compile(&combined)
    }
}

impl std::fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
