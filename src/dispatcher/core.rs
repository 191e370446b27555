//! Request parts, responses and the [`RequestContext`] built from them.
//!
//! Parameter and header storage uses `SmallVec` so common requests do not allocate for
//! their key/value lists.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use crate::context::{RequestBody, RequestContext};
use crate::ids::RequestId;
use http::{Method, StatusCode};
use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, warn};

/// Maximum number of path/query parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated parameter storage.
///
/// Names are `Arc<str>` since they come from the static route table; values are
/// per-request data.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Stack-allocated header storage.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// The parts of an inbound request a handler can see.
#[derive(Debug, Clone, Default)]
pub struct RequestParts {
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Request path
    pub path: String,
    /// Path parameters extracted by the router
    pub path_params: ParamVec,
    /// Query string parameters
    pub query_params: ParamVec,
    /// HTTP headers
    pub headers: HeaderVec,
    /// Request body parsed as JSON (if present)
    pub body: Option<Value>,
}

impl RequestParts {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_path_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.path_params.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_query_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query_params.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Get a path parameter by name
    ///
    /// Uses "last write wins" semantics: with duplicate names at different path depths,
    /// returns the last occurrence.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name (last occurrence wins)
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Body of a handler response.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResponseBody {
    #[default]
    Empty,
    Text(String),
    Json(Value),
}

/// Response produced for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    /// HTTP response headers
    pub headers: HeaderVec,
    pub body: ResponseBody,
}

impl HandlerResponse {
    /// Create a new response with the given status, headers, and body
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: ResponseBody) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Status-only response
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self::new(status, HeaderVec::new(), ResponseBody::Empty)
    }

    /// JSON response with a content-type header
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self::new(status, headers, ResponseBody::Json(body))
    }

    /// Plain-text response with a content-type header
    #[must_use]
    pub fn text(status: u16, body: String) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((
            Arc::from("content-type"),
            "text/plain; charset=utf-8".to_string(),
        ));
        Self::new(status, headers, ResponseBody::Text(body))
    }

    /// Create an error response
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::text(status, message.to_string())
    }

    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Body rendered as the bytes sent on the wire.
    #[must_use]
    pub fn body_bytes(&self) -> Vec<u8> {
        match &self.body {
            ResponseBody::Empty => Vec::new(),
            ResponseBody::Text(text) => text.as_bytes().to_vec(),
            ResponseBody::Json(value) => serde_json::to_vec(value).unwrap_or_default(),
        }
    }
}

/// [`RequestContext`] backed by [`RequestParts`].
///
/// Holds at most one response. Writes after [`abort`](RequestContext::abort) are
/// dropped.
#[derive(Debug)]
pub struct DispatchContext {
    request_id: RequestId,
    handler_name: String,
    parts: RequestParts,
    response: Option<HandlerResponse>,
    aborted: bool,
}

impl DispatchContext {
    #[must_use]
    pub fn new(request_id: RequestId, handler_name: impl Into<String>, parts: RequestParts) -> Self {
        Self {
            request_id,
            handler_name: handler_name.into(),
            parts,
            response: None,
            aborted: false,
        }
    }

    /// Context with a fresh request id and no handler name.
    #[must_use]
    pub fn from_parts(parts: RequestParts) -> Self {
        Self::new(RequestId::new(), "", parts)
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[must_use]
    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }

    #[must_use]
    pub fn parts(&self) -> &RequestParts {
        &self.parts
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.get_header(name)
    }

    /// Response written so far, if any.
    #[must_use]
    pub fn response(&self) -> Option<&HandlerResponse> {
        self.response.as_ref()
    }

    /// The single response for this request.
    ///
    /// A context nobody wrote to yields `500`.
    #[must_use]
    pub fn into_response(self) -> HandlerResponse {
        match self.response {
            Some(response) => response,
            None => {
                warn!(
                    request_id = %self.request_id,
                    handler_name = %self.handler_name,
                    "No response written for request"
                );
                HandlerResponse::error(500, "no response written")
            }
        }
    }

    fn set_response(&mut self, response: HandlerResponse) {
        if self.aborted {
            debug!(
                request_id = %self.request_id,
                status = response.status,
                "Dropping response written after abort"
            );
            return;
        }
        self.response = Some(response);
    }
}

impl RequestContext for DispatchContext {
    fn path_param(&self, name: &str) -> Option<&str> {
        self.parts.get_path_param(name)
    }

    fn query_param(&self, name: &str) -> Option<&str> {
        self.parts.get_query_param(name)
    }

    fn body(&self) -> RequestBody<'_> {
        match &self.parts.body {
            Some(value) => RequestBody::Json(value),
            None => RequestBody::Missing,
        }
    }

    fn write_status(&mut self, status: StatusCode) {
        self.set_response(HandlerResponse::empty(status.as_u16()));
    }

    fn write_text(&mut self, status: StatusCode, body: String) {
        self.set_response(HandlerResponse::text(status.as_u16(), body));
    }

    fn write_json(&mut self, status: StatusCode, body: Value) {
        self.set_response(HandlerResponse::json(status.as_u16(), body));
    }

    fn abort(&mut self) {
        self.aborted = true;
    }

    fn is_aborted(&self) -> bool {
        self.aborted
    }
}
