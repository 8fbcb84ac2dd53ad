/// The ordered decision points of the request machine. Every request
/// visits a prefix of this order, up to and including its halting
/// point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionPoint {
    RouteExists,
    ServiceAvailable,
    KnownMethod,
    UriTooLong,
    MethodAllowed,
    MalformedRequest,
    Authorized,
    Forbidden,
    ContentHeadersValid,
    ResourceExists,
    Conditional,
    ContentTypesProvided,
    ContentTypesAccepted,
    ExecuteAndRender,
}

impl DecisionPoint {
    /// Canonical order.
    pub const ORDER: [DecisionPoint; 14] = [
        DecisionPoint::RouteExists,
        DecisionPoint::ServiceAvailable,
        DecisionPoint::KnownMethod,
        DecisionPoint::UriTooLong,
        DecisionPoint::MethodAllowed,
        DecisionPoint::MalformedRequest,
        DecisionPoint::Authorized,
        DecisionPoint::Forbidden,
        DecisionPoint::ContentHeadersValid,
        DecisionPoint::ResourceExists,
        DecisionPoint::Conditional,
        DecisionPoint::ContentTypesProvided,
        DecisionPoint::ContentTypesAccepted,
        DecisionPoint::ExecuteAndRender,
    ];

    /// The provider name that overrides this point's default.
    pub fn name(&self) -> &'static str {
        match self {
            DecisionPoint::RouteExists => "route_exists",
            DecisionPoint::ServiceAvailable => "service_available",
            DecisionPoint::KnownMethod => "known_method",
            DecisionPoint::UriTooLong => "uri_too_long",
            DecisionPoint::MethodAllowed => "method_allowed",
            DecisionPoint::MalformedRequest => "malformed_request",
            DecisionPoint::Authorized => "authorized",
            DecisionPoint::Forbidden => "forbidden",
            DecisionPoint::ContentHeadersValid => "content_headers_valid",
            DecisionPoint::ResourceExists => "resource_exists",
            DecisionPoint::Conditional => "conditional",
            DecisionPoint::ContentTypesProvided => "content_types_provided",
            DecisionPoint::ContentTypesAccepted => "content_types_accepted",
            DecisionPoint::ExecuteAndRender => "execute_and_render",
        }
    }

    pub fn index(&self) -> usize {
        Self::ORDER
            .iter()
            .position(|point| point == self)
            .unwrap_or(usize::MAX)
    }
}

/// Which decision points a request visited, in order. Exposed for
/// observability and pinned by the prefix invariant tests.
#[derive(Debug, Clone, Default)]
pub struct MachineTrace {
    visited: Vec<DecisionPoint>,
}

impl MachineTrace {
    pub fn new() -> Self {
        Self {
            visited: Vec::new(),
        }
    }

    pub fn visit(&mut self, point: DecisionPoint) {
        self.visited.push(point);
    }

    pub fn visited(&self) -> &[DecisionPoint] {
        &self.visited
    }

    pub fn last(&self) -> Option<DecisionPoint> {
        self.visited.last().copied()
    }

    /// Whether the visited sequence is a prefix of the canonical order.
    pub fn is_order_prefix(&self) -> bool {
        self.visited
            .iter()
            .zip(DecisionPoint::ORDER.iter())
            .all(|(visited, expected)| visited == expected)
            && self.visited.len() <= DecisionPoint::ORDER.len()
    }
}
