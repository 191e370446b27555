//! Binder plans: the ordered list of binders for one parameter type.
//!
//! A plan is described by [`BindParams::describe`] (usually generated by
//! `#[derive(BindParams)]`), checked once by [`PlanBuilder::build`], and then executed
//! for every request by [`BinderPlan::bind`].

use http::StatusCode;
use serde::de::DeserializeOwned;

use super::binder::{BindSource, BodyBinder, FieldBinder, FieldSlot, PathBinder, QueryBinder};
use super::coerce::FromParam;
use super::validate::{Validate, ValidatorFn};
use crate::context::RequestContext;
use crate::error::{HandlerError, RegistrationError};

/// A parameter struct whose fields are bound from the request.
///
/// Each request starts from `Self::default()`; fields without a binding keep their
/// default value.
///
/// ```rust
/// use brrtbind::bind::{BindParams, PlanBuilder};
///
/// #[derive(Default)]
/// struct ListPosts {
///     user_id: u64,
///     cursor: Option<String>,
/// }
///
/// impl BindParams for ListPosts {
///     fn describe(plan: &mut PlanBuilder<Self>) {
///         plan.path("user_id", "user_id", |p| &mut p.user_id);
///         plan.query("cursor", "cursor", |p| &mut p.cursor);
///     }
/// }
/// ```
pub trait BindParams: Default + Send + 'static {
    /// Declare this type's bindings, in field declaration order.
    fn describe(plan: &mut PlanBuilder<Self>);
}

/// Context-only handlers bind nothing.
impl BindParams for () {
    fn describe(_plan: &mut PlanBuilder<Self>) {}
}

#[derive(Debug)]
enum Declaration {
    Success(String),
    EmptyKey {
        source: &'static str,
        field: &'static str,
    },
}

/// Collects binding declarations for `P`.
pub struct PlanBuilder<P> {
    binders: Vec<Box<dyn FieldBinder<P>>>,
    declarations: Vec<Declaration>,
}

impl<P: 'static> Default for PlanBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: 'static> PlanBuilder<P> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            binders: Vec::new(),
            declarations: Vec::new(),
        }
    }

    /// Bind `field` from the path segment `key`.
    pub fn path<T>(&mut self, key: &str, field: &'static str, slot: FieldSlot<P, T>) -> &mut Self
    where
        T: FromParam + 'static,
    {
        if key.is_empty() {
            self.declarations.push(Declaration::EmptyKey {
                source: "path",
                field,
            });
        }
        self.binders.push(Box::new(PathBinder::new(key, field, slot)));
        self
    }

    /// Bind `field` from the query parameter `key`.
    pub fn query<T>(&mut self, key: &str, field: &'static str, slot: FieldSlot<P, T>) -> &mut Self
    where
        T: FromParam + 'static,
    {
        if key.is_empty() {
            self.declarations.push(Declaration::EmptyKey {
                source: "query",
                field,
            });
        }
        self.binders.push(Box::new(QueryBinder::new(key, field, slot)));
        self
    }

    /// Bind `field` from the whole request body decoded as JSON.
    pub fn body<T>(&mut self, field: &'static str, slot: FieldSlot<P, T>) -> &mut Self
    where
        T: DeserializeOwned + 'static,
    {
        self.binders.push(Box::new(BodyBinder::new(field, slot)));
        self
    }

    /// Like [`body`](Self::body), running `validator` on the decoded value when present.
    ///
    /// The derive passes the field type's [`Validate`] impl here when it has one.
    pub fn body_with<T>(
        &mut self,
        field: &'static str,
        slot: FieldSlot<P, T>,
        validator: Option<ValidatorFn<T>>,
    ) -> &mut Self
    where
        T: DeserializeOwned + 'static,
    {
        self.binders
            .push(Box::new(BodyBinder::with_validator(field, slot, validator)));
        self
    }

    /// Like [`body`](Self::body), then run [`Validate::validate`] on the decoded value.
    pub fn validated_body<T>(&mut self, field: &'static str, slot: FieldSlot<P, T>) -> &mut Self
    where
        T: DeserializeOwned + Validate + 'static,
    {
        self.binders
            .push(Box::new(BodyBinder::validated(field, slot)));
        self
    }

    /// Declare the success status. Checked when the plan is built.
    pub fn success(&mut self, code: impl ToString) -> &mut Self {
        self.declarations
            .push(Declaration::Success(code.to_string()));
        self
    }

    /// Check all declarations and freeze the plan.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistrationError`] naming `handler` for a malformed or duplicate
    /// success code, or for an empty path/query key.
    pub fn build(self, handler: &str) -> Result<BinderPlan<P>, RegistrationError> {
        let mut success: Option<(String, StatusCode)> = None;

        for declaration in self.declarations {
            match declaration {
                Declaration::EmptyKey { source, field } => {
                    return Err(RegistrationError::EmptyKey {
                        source,
                        field,
                        handler: handler.to_string(),
                    });
                }
                Declaration::Success(code) => {
                    if let Some((first, _)) = &success {
                        return Err(RegistrationError::DuplicateSuccessCode {
                            first: first.clone(),
                            second: code,
                            handler: handler.to_string(),
                        });
                    }
                    let status = parse_success_code(&code).ok_or_else(|| {
                        RegistrationError::InvalidSuccessCode {
                            code: code.clone(),
                            handler: handler.to_string(),
                        }
                    })?;
                    success = Some((code, status));
                }
            }
        }

        Ok(BinderPlan {
            binders: self.binders,
            success: success.map_or(StatusCode::OK, |(_, status)| status),
        })
    }
}

/// Integer in `[100, 999]`, the range `StatusCode` accepts.
fn parse_success_code(code: &str) -> Option<StatusCode> {
    let value: u16 = code.parse().ok()?;
    StatusCode::from_u16(value).ok()
}

/// Frozen, ordered binders for `P` plus the declared success status.
pub struct BinderPlan<P> {
    binders: Vec<Box<dyn FieldBinder<P>>>,
    success: StatusCode,
}

impl<P: BindParams> BinderPlan<P> {
    /// Describe and build the plan for `P`.
    ///
    /// # Errors
    ///
    /// See [`PlanBuilder::build`].
    pub fn for_params(handler: &str) -> Result<Self, RegistrationError> {
        let mut builder = PlanBuilder::new();
        P::describe(&mut builder);
        builder.build(handler)
    }

    /// Produce a fresh parameter instance bound from `ctx`.
    ///
    /// Binders run in declaration order and stop at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first binder error.
    pub fn bind(&self, ctx: &dyn RequestContext) -> Result<P, HandlerError> {
        let mut params = P::default();
        for binder in &self.binders {
            binder.bind(ctx, &mut params).map_err(|err| {
                tracing::debug!(
                    field = binder.field(),
                    source = %binder.source(),
                    error = %err,
                    "Parameter binding failed"
                );
                err
            })?;
        }
        Ok(params)
    }
}

impl<P> BinderPlan<P> {
    /// Status written on success.
    #[must_use]
    pub fn success(&self) -> StatusCode {
        self.success
    }

    /// Binding sources in execution order.
    #[must_use]
    pub fn sources(&self) -> Vec<BindSource> {
        self.binders.iter().map(|b| b.source().clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.binders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.binders.is_empty()
    }
}
