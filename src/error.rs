//! # Error Module
//!
//! Error types shared by binders, handlers and the intercept adapter.
//!
//! Two families exist:
//!
//! - [`HandlerError`] - per-request failures (bind, validation, handler). Each carries an
//!   [`ErrorKind`] which decides the HTTP status written to the client.
//! - [`RegistrationError`] - fatal problems detected while a handler is being registered.
//!   A route with a registration error is never served.
//!
//! ## Status Mapping
//!
//! | Kind                | Status |
//! |---------------------|--------|
//! | `InvalidParameters` | 400    |
//! | `Internal`          | 500    |

use http::StatusCode;
use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use crate::bind::CoercionError;

/// Message written for parameters that fail coercion.
pub const INVALID_PARAMS_MESSAGE: &str = "invalid params";

/// Closed set of per-request error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request carried parameters that could not be bound
    InvalidParameters,
    /// Anything else
    Internal,
}

impl ErrorKind {
    /// HTTP status for this kind.
    #[must_use]
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::InvalidParameters => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable name used in structured logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidParameters => "invalid_parameters",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error produced while binding a request or returned by a handler.
///
/// The `message` is written verbatim as the response body, so it must not leak
/// internals the client should not see. The optional `source` is kept for logs only.
#[derive(Debug)]
pub struct HandlerError {
    kind: ErrorKind,
    message: Cow<'static, str>,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl HandlerError {
    /// Create an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// The canonical invalid-parameters error (`400 invalid params`).
    #[must_use]
    pub fn invalid_params() -> Self {
        Self::new(ErrorKind::InvalidParameters, INVALID_PARAMS_MESSAGE)
    }

    /// An invalid-parameters error with a custom message.
    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InvalidParameters, message)
    }

    /// An internal error with the given message.
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Attach an underlying cause (logged, never sent to the client).
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    #[must_use]
    pub fn is_invalid_params(&self) -> bool {
        self.kind == ErrorKind::InvalidParameters
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for HandlerError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn StdError + 'static))
    }
}

impl From<CoercionError> for HandlerError {
    fn from(err: CoercionError) -> Self {
        HandlerError::invalid_params().with_source(err)
    }
}

/// Malformed request bodies are the client's fault; the decoder message is kept verbatim.
impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        let message = err.to_string();
        HandlerError::bad_request(message).with_source(err)
    }
}

/// Application errors raised with `anyhow` map to `500`.
///
/// A `HandlerError` wrapped inside the `anyhow::Error` keeps its own kind.
impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<HandlerError>() {
            Ok(inner) => inner,
            Err(err) => HandlerError::internal(err.to_string()),
        }
    }
}

/// Fatal error raised while building a handler descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// A `success` binding that is not an integer in `[100, 999]`
    InvalidSuccessCode {
        /// The declared code, as written
        code: String,
        /// Handler being registered
        handler: String,
    },
    /// More than one `success` binding on the same parameter type
    DuplicateSuccessCode {
        /// The first declared code
        first: String,
        /// The conflicting code
        second: String,
        /// Handler being registered
        handler: String,
    },
    /// A path or query binding with an empty key
    EmptyKey {
        /// Binding source (`path` or `query`)
        source: &'static str,
        /// Field the binding targets
        field: &'static str,
        /// Handler being registered
        handler: String,
    },
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::InvalidSuccessCode { code, handler } => {
                write!(f, "invalid http error code: {code} in func {handler}")
            }
            RegistrationError::DuplicateSuccessCode {
                first,
                second,
                handler,
            } => write!(
                f,
                "duplicate success code: {second} (already declared {first}) in func {handler}"
            ),
            RegistrationError::EmptyKey {
                source,
                field,
                handler,
            } => write!(
                f,
                "empty {source} key on field `{field}` in func {handler}"
            ),
        }
    }
}

impl StdError for RegistrationError {}
