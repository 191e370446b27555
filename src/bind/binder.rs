//! Field binder strategies: one per binding source.
//!
//! A binder is built once at registration and executed for every request. It owns the
//! source key and a plain `fn` accessor to the target field, so it holds no per-request
//! state and is shared freely between coroutines.

use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::coerce::FromParam;
use super::validate::{Validate, ValidatorFn};
use crate::context::{RequestBody, RequestContext};
use crate::error::HandlerError;

/// Accessor from a parameter instance to one of its fields.
pub type FieldSlot<P, T> = fn(&mut P) -> &mut T;

/// Where a binder reads its value from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindSource {
    /// Router path segment
    Path(Arc<str>),
    /// URL query parameter
    Query(Arc<str>),
    /// Whole request body decoded as JSON
    Body,
}

impl fmt::Display for BindSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindSource::Path(key) => write!(f, "path={key}"),
            BindSource::Query(key) => write!(f, "query={key}"),
            BindSource::Body => f.write_str("body=json"),
        }
    }
}

/// A strategy writing one field of `P` from one request source.
pub trait FieldBinder<P>: Send + Sync {
    /// Read the source value and write it into `params`.
    ///
    /// # Errors
    ///
    /// Returns the bind error that aborts the request.
    fn bind(&self, ctx: &dyn RequestContext, params: &mut P) -> Result<(), HandlerError>;

    /// Source this binder reads from.
    fn source(&self) -> &BindSource;

    /// Name of the field this binder writes.
    fn field(&self) -> &'static str;
}

/// Binds a router path segment.
pub struct PathBinder<P, T> {
    source: BindSource,
    key: Arc<str>,
    field: &'static str,
    slot: FieldSlot<P, T>,
}

impl<P, T> PathBinder<P, T> {
    pub fn new(key: &str, field: &'static str, slot: FieldSlot<P, T>) -> Self {
        let key: Arc<str> = Arc::from(key);
        Self {
            source: BindSource::Path(Arc::clone(&key)),
            key,
            field,
            slot,
        }
    }
}

impl<P, T> FieldBinder<P> for PathBinder<P, T>
where
    T: FromParam,
{
    fn bind(&self, ctx: &dyn RequestContext, params: &mut P) -> Result<(), HandlerError> {
        let raw = ctx.path_param(&self.key).unwrap_or_default();
        *(self.slot)(params) = T::from_param(raw)?;
        Ok(())
    }

    fn source(&self) -> &BindSource {
        &self.source
    }

    fn field(&self) -> &'static str {
        self.field
    }
}

/// Binds a URL query parameter.
pub struct QueryBinder<P, T> {
    source: BindSource,
    key: Arc<str>,
    field: &'static str,
    slot: FieldSlot<P, T>,
}

impl<P, T> QueryBinder<P, T> {
    pub fn new(key: &str, field: &'static str, slot: FieldSlot<P, T>) -> Self {
        let key: Arc<str> = Arc::from(key);
        Self {
            source: BindSource::Query(Arc::clone(&key)),
            key,
            field,
            slot,
        }
    }
}

impl<P, T> FieldBinder<P> for QueryBinder<P, T>
where
    T: FromParam,
{
    fn bind(&self, ctx: &dyn RequestContext, params: &mut P) -> Result<(), HandlerError> {
        let raw = ctx.query_param(&self.key).unwrap_or_default();
        *(self.slot)(params) = T::from_param(raw)?;
        Ok(())
    }

    fn source(&self) -> &BindSource {
        &self.source
    }

    fn field(&self) -> &'static str {
        self.field
    }
}

/// Decodes the request body as JSON into a field, optionally validating it.
pub struct BodyBinder<P, T> {
    source: BindSource,
    field: &'static str,
    slot: FieldSlot<P, T>,
    validate: Option<ValidatorFn<T>>,
    _target: PhantomData<fn() -> T>,
}

impl<P, T> BodyBinder<P, T>
where
    T: DeserializeOwned,
{
    pub fn new(field: &'static str, slot: FieldSlot<P, T>) -> Self {
        Self {
            source: BindSource::Body,
            field,
            slot,
            validate: None,
            _target: PhantomData,
        }
    }

    /// Body binder running `validator` after decoding, when one is given.
    pub fn with_validator(
        field: &'static str,
        slot: FieldSlot<P, T>,
        validator: Option<ValidatorFn<T>>,
    ) -> Self {
        Self {
            validate: validator,
            ..Self::new(field, slot)
        }
    }
}

impl<P, T> BodyBinder<P, T>
where
    T: DeserializeOwned + Validate,
{
    /// Body binder that runs [`Validate::validate`] after decoding.
    pub fn validated(field: &'static str, slot: FieldSlot<P, T>) -> Self {
        Self::with_validator(field, slot, Some(<T as Validate>::validate))
    }
}

/// Decode a request body into `T`. A missing body decodes like an empty document.
pub fn decode_body<T: DeserializeOwned>(body: RequestBody<'_>) -> Result<T, HandlerError> {
    let value = match body {
        RequestBody::Json(value) => T::deserialize(value)?,
        RequestBody::Raw(bytes) => serde_json::from_slice(bytes)?,
        RequestBody::Missing => serde_json::from_slice(&[])?,
    };
    Ok(value)
}

impl<P, T> FieldBinder<P> for BodyBinder<P, T>
where
    T: DeserializeOwned,
{
    fn bind(&self, ctx: &dyn RequestContext, params: &mut P) -> Result<(), HandlerError> {
        let value: T = decode_body(ctx.body())?;
        if let Some(validate) = self.validate {
            validate(&value)?;
        }
        *(self.slot)(params) = value;
        Ok(())
    }

    fn source(&self) -> &BindSource {
        &self.source
    }

    fn field(&self) -> &'static str {
        self.field
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_decode_body_from_json_value() {
        #[derive(Deserialize)]
        struct Item {
            name: String,
        }
        let value = json!({"name": "a"});
        let item: Item = decode_body(RequestBody::Json(&value)).unwrap();
        assert_eq!(item.name, "a");
    }

    #[test]
    fn test_decode_body_raw_bytes() {
        let n: Vec<u64> = decode_body(RequestBody::Raw(b"[1,2]")).unwrap();
        assert_eq!(n, vec![1, 2]);
    }

    #[test]
    fn test_decode_missing_body_is_bad_request() {
        let err = decode_body::<Vec<u64>>(RequestBody::Missing).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameters);
        assert!(err.message().contains("EOF"));
    }

    #[test]
    fn test_bind_source_display() {
        assert_eq!(BindSource::Path(Arc::from("id")).to_string(), "path=id");
        assert_eq!(BindSource::Query(Arc::from("q")).to_string(), "query=q");
        assert_eq!(BindSource::Body.to_string(), "body=json");
    }
}
