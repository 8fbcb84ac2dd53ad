// # Conditional Requests
//
// RFC 7232 precondition evaluation. Entity tags compare strongly for
// `If-Match` and weakly for `If-None-Match`; dates parse IMF-fixdate
// with the obsolete formats tolerated; a malformed date silently
// disables its precondition.

pub mod etag;
pub mod evaluate;
pub mod httpdate;

pub use etag::{EntityTag, TagSet};
pub use evaluate::{evaluate, ConditionalOutcome, ResourceState};
pub use httpdate::{format_http_date, parse_http_date, truncate_to_seconds};
