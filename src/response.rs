//! # Response Translation
//!
//! Turns a handler's return value into one of three wire forms and writes it through the
//! [`RequestContext`].
//!
//! - text values are written as plain text
//! - absent optionals are written as status only (never JSON `null`)
//! - absent sequences are written as `[]` (never JSON `null`)
//! - everything else is JSON-encoded

use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;

use crate::context::RequestContext;
use crate::error::HandlerError;

/// Wire representation chosen for a handler's return value.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Status line only, empty body
    Empty,
    /// Plain-text body
    Text(String),
    /// JSON body
    Json(Value),
}

impl Reply {
    /// Write this reply with `status`.
    pub fn write_to(self, ctx: &mut dyn RequestContext, status: StatusCode) {
        match self {
            Reply::Empty => ctx.write_status(status),
            Reply::Text(text) => ctx.write_text(status, text),
            Reply::Json(body) => ctx.write_json(status, body),
        }
    }
}

/// Write `err` as a text response with its mapped status and abort the request.
pub fn write_error(ctx: &mut dyn RequestContext, err: &HandlerError) {
    ctx.write_text(err.status(), err.message().to_string());
    ctx.abort();
}

/// JSON-encode any serializable value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Json<T>(pub T);

/// A value a handler may return as its response.
pub trait Responder {
    /// `true` for types that never carry a body, so the handler declared no response.
    const EMPTY: bool = false;

    /// Wire form of a present value.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the value cannot be serialized.
    fn into_reply(self) -> Result<Reply, HandlerError>;

    /// Wire form when the value is absent (`None`).
    fn absent() -> Reply
    where
        Self: Sized,
    {
        Reply::Empty
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Reply, HandlerError> {
    serde_json::to_value(value).map(Reply::Json).map_err(|err| {
        HandlerError::internal(format!("failed to serialize response: {err}")).with_source(err)
    })
}

impl Responder for Reply {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(self)
    }
}

impl Responder for () {
    const EMPTY: bool = true;

    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(Reply::Empty)
    }
}

impl Responder for String {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(Reply::Text(self))
    }
}

impl Responder for &'static str {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(Reply::Text(self.to_string()))
    }
}

impl Responder for Cow<'static, str> {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(Reply::Text(self.into_owned()))
    }
}

impl Responder for Value {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(Reply::Json(self))
    }
}

impl<T: Serialize> Responder for Json<T> {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        to_json(&self.0)
    }
}

impl<T: Serialize> Responder for Vec<T> {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        to_json(&self)
    }

    fn absent() -> Reply {
        Reply::Json(Value::Array(Vec::new()))
    }
}

impl<T: Responder> Responder for Box<T> {
    const EMPTY: bool = T::EMPTY;

    fn into_reply(self) -> Result<Reply, HandlerError> {
        (*self).into_reply()
    }

    fn absent() -> Reply {
        T::absent()
    }
}

impl<T: Responder> Responder for Option<T> {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        match self {
            Some(value) => value.into_reply(),
            None => Ok(T::absent()),
        }
    }

    fn absent() -> Reply {
        T::absent()
    }
}
