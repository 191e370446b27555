#![allow(dead_code)]

use brrtbind::context::{RequestBody, RequestContext};
use http::StatusCode;
use serde_json::Value;

/// One write made through the context.
#[derive(Debug, Clone, PartialEq)]
pub enum Written {
    Status(StatusCode),
    Text(StatusCode, String),
    Json(StatusCode, Value),
}

impl Written {
    pub fn status(&self) -> u16 {
        match self {
            Written::Status(s) | Written::Text(s, _) | Written::Json(s, _) => s.as_u16(),
        }
    }

    /// Body as it would go on the wire.
    pub fn body(&self) -> String {
        match self {
            Written::Status(_) => String::new(),
            Written::Text(_, text) => text.clone(),
            Written::Json(_, value) => value.to_string(),
        }
    }
}

/// In-memory request context that records every write.
#[derive(Debug, Default)]
pub struct MockContext {
    path: Vec<(String, String)>,
    query: Vec<(String, String)>,
    json: Option<Value>,
    raw: Option<Vec<u8>>,
    pub writes: Vec<Written>,
    pub aborted: bool,
}

impl MockContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, name: &str, value: &str) -> Self {
        self.path.push((name.to_string(), value.to_string()));
        self
    }

    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn json_body(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    pub fn raw_body(mut self, body: &[u8]) -> Self {
        self.raw = Some(body.to_vec());
        self
    }

    /// The single response written; panics unless exactly one write happened.
    pub fn response(&self) -> &Written {
        assert_eq!(
            self.writes.len(),
            1,
            "expected exactly one response, got {:?}",
            self.writes
        );
        &self.writes[0]
    }
}

impl RequestContext for MockContext {
    fn path_param(&self, name: &str) -> Option<&str> {
        self.path
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn body(&self) -> RequestBody<'_> {
        match (&self.json, &self.raw) {
            (Some(value), _) => RequestBody::Json(value),
            (None, Some(raw)) => RequestBody::Raw(raw),
            (None, None) => RequestBody::Missing,
        }
    }

    fn write_status(&mut self, status: StatusCode) {
        self.writes.push(Written::Status(status));
    }

    fn write_text(&mut self, status: StatusCode, body: String) {
        self.writes.push(Written::Text(status, body));
    }

    fn write_json(&mut self, status: StatusCode, body: Value) {
        self.writes.push(Written::Json(status, body));
    }

    fn abort(&mut self) {
        self.aborted = true;
    }

    fn is_aborted(&self) -> bool {
        self.aborted
    }
}
