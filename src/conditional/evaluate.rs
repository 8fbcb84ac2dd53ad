use chrono::{DateTime, Utc};

use super::etag::{EntityTag, TagSet};
use super::httpdate::{parse_http_date, truncate_to_seconds};
use crate::http::Request;

/// Outcome of evaluating the conditional headers against the current
/// resource state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalOutcome {
    /// No precondition blocks the request.
    Proceed,
    /// A cache validator matched on a safe method.
    NotModified,
    /// A precondition failed.
    PreconditionFailed,
}

/// Resource state the dedicated `etag` / `last_modified` providers
/// computed after `resource_exists` succeeded.
#[derive(Debug, Clone, Default)]
pub struct ResourceState {
    pub etag: Option<EntityTag>,
    pub last_modified: Option<DateTime<Utc>>,
    pub exists: bool,
}

/// Evaluate RFC 7232 preconditions in canonical order; the first rule
/// that fires wins.
///
/// Order: `If-Match` (strong compare), `If-Unmodified-Since`,
/// `If-None-Match` (weak compare; `304` for safe methods, `412`
/// otherwise), `If-Modified-Since` (safe methods only). Malformed dates
/// disable the carrying precondition rather than erroring.
pub fn evaluate(request: &Request, resource: &ResourceState) -> ConditionalOutcome {
    let headers = request.headers();

    if let Some(raw) = headers.get("if-match") {
        let set = TagSet::parse(raw);
        if !set.strong_match(resource.etag.as_ref()) {
            return ConditionalOutcome::PreconditionFailed;
        }
    }

    if let Some(raw) = headers.get("if-unmodified-since") {
        if let Some(limit) = parse_http_date(raw) {
            if let Some(modified) = resource.last_modified {
                if truncate_to_seconds(modified) > limit {
                    return ConditionalOutcome::PreconditionFailed;
                }
            }
        }
    }

    if let Some(raw) = headers.get("if-none-match") {
        let set = TagSet::parse(raw);
        if set.weak_match(resource.etag.as_ref(), resource.exists) {
            return if request.method().is_safe() {
                ConditionalOutcome::NotModified
            } else {
                ConditionalOutcome::PreconditionFailed
            };
        }
    }

    if request.method().is_safe() {
        if let Some(raw) = headers.get("if-modified-since") {
            if let Some(limit) = parse_http_date(raw) {
                if let Some(modified) = resource.last_modified {
                    if truncate_to_seconds(modified) <= limit {
                        return ConditionalOutcome::NotModified;
                    }
                }
            }
        }
    }

    ConditionalOutcome::Proceed
}
