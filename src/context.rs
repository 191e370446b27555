//! # Request Context
//!
//! The narrow surface the binding layer needs from a host router. Anything that can read
//! path segments, query parameters and a request body, and write exactly one response,
//! can drive an [`Intercepted`](crate::intercept::Intercepted) endpoint.
//!
//! The trait is object safe: binders run against `&dyn RequestContext` so a binder plan
//! does not depend on the concrete host type.

use http::StatusCode;
use serde_json::Value;

/// Body of an incoming request as the host has it.
#[derive(Debug, Clone, Copy)]
pub enum RequestBody<'a> {
    /// The host already parsed the body as JSON
    Json(&'a Value),
    /// Raw bytes, decoded on demand
    Raw(&'a [u8]),
    /// No body was sent
    Missing,
}

impl RequestBody<'_> {
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, RequestBody::Missing)
    }
}

/// Abstract request context consumed from the host router.
pub trait RequestContext {
    /// Named path segment, if the matched route declares it.
    fn path_param(&self, name: &str) -> Option<&str>;

    /// Named query parameter (last occurrence wins).
    fn query_param(&self, name: &str) -> Option<&str>;

    /// The request body.
    fn body(&self) -> RequestBody<'_>;

    /// Write a status-only response with an empty body.
    fn write_status(&mut self, status: StatusCode);

    /// Write a plain-text response.
    fn write_text(&mut self, status: StatusCode, body: String);

    /// Write a JSON response.
    fn write_json(&mut self, status: StatusCode, body: Value);

    /// Stop further processing of this request.
    fn abort(&mut self);

    /// Whether [`abort`](RequestContext::abort) has been called.
    fn is_aborted(&self) -> bool;
}
