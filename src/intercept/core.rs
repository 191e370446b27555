// intercept core: handler shapes, outcomes and the per-request adapter
use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::any::type_name;
use std::borrow::Cow;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::bind::{BindParams, BindSource, BinderPlan};
use crate::context::RequestContext;
use crate::error::{HandlerError, RegistrationError};
use crate::response::{write_error, Json, Reply, Responder};

/// Result of one handler call, decided by the handler's return type.
#[derive(Debug)]
pub enum Outcome<V = Reply> {
    /// Handler declared no response value
    Empty,
    /// Handler produced a response value
    Value(V),
    /// Handler failed
    Failure(HandlerError),
}

/// Return types a handler may declare.
///
/// - `()` - no returns, always a status-only success
/// - `Result<(), E>` - error only
/// - `R` - response only, for the owned responders (`Json<T>`, `String`, `Vec<T>`, ...)
/// - `Result<R, E>` - response plus error, where `R: Responder`
pub trait IntoOutcome {
    /// Number of declared return values: 0 for `()`, 1 for error-only or response-only,
    /// 2 for response plus error.
    const ARITY: usize;

    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for () {
    const ARITY: usize = 0;

    fn into_outcome(self) -> Outcome {
        Outcome::Empty
    }
}

impl<R, E> IntoOutcome for Result<R, E>
where
    R: Responder,
    E: Into<HandlerError>,
{
    const ARITY: usize = if R::EMPTY { 1 } else { 2 };

    fn into_outcome(self) -> Outcome {
        match self {
            Ok(value) => reply_outcome(value),
            Err(err) => Outcome::Failure(err.into()),
        }
    }
}

fn reply_outcome<R: Responder>(value: R) -> Outcome {
    match value.into_reply() {
        Ok(Reply::Empty) => Outcome::Empty,
        Ok(reply) => Outcome::Value(reply),
        Err(err) => Outcome::Failure(err),
    }
}

macro_rules! response_only {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoOutcome for $ty {
                const ARITY: usize = 1;

                fn into_outcome(self) -> Outcome {
                    reply_outcome(self)
                }
            }
        )*
    };
}

response_only!(Reply, String, &'static str, Cow<'static, str>, Value);

impl<T: Serialize> IntoOutcome for Json<T> {
    const ARITY: usize = 1;

    fn into_outcome(self) -> Outcome {
        reply_outcome(self)
    }
}

impl<T: Serialize> IntoOutcome for Vec<T> {
    const ARITY: usize = 1;

    fn into_outcome(self) -> Outcome {
        reply_outcome(self)
    }
}

impl<T: Responder> IntoOutcome for Option<T> {
    const ARITY: usize = 1;

    fn into_outcome(self) -> Outcome {
        reply_outcome(self)
    }
}

/// Shape marker for `Fn(&C) -> O`.
pub struct ContextOnly;

/// Shape marker for `Fn(&C, P) -> O`.
pub struct WithParams<P>(PhantomData<fn() -> P>);

/// A business handler the adapter knows how to call.
///
/// Implemented for every `Fn(&C) -> O` and `Fn(&C, P) -> O` where `P: BindParams` and
/// `O: IntoOutcome`. Any other function shape does not implement `Handler` and is
/// rejected when the route is compiled.
pub trait Handler<C, S>: Send + Sync + 'static {
    /// Bound parameter struct (`()` for context-only handlers)
    type Params: BindParams;
    /// Declared return type
    type Output: IntoOutcome;
    /// Number of declared inputs (1 or 2)
    const ARITY: usize;

    fn call(&self, ctx: &C, params: Self::Params) -> Self::Output;
}

impl<C, F, O> Handler<C, ContextOnly> for F
where
    F: Fn(&C) -> O + Send + Sync + 'static,
    O: IntoOutcome,
{
    type Params = ();
    type Output = O;
    const ARITY: usize = 1;

    fn call(&self, ctx: &C, _params: ()) -> O {
        self(ctx)
    }
}

impl<C, F, P, O> Handler<C, WithParams<P>> for F
where
    F: Fn(&C, P) -> O + Send + Sync + 'static,
    P: BindParams,
    O: IntoOutcome,
{
    type Params = P;
    type Output = O;
    const ARITY: usize = 2;

    fn call(&self, ctx: &C, params: P) -> O {
        self(ctx, params)
    }
}

/// Immutable description of a registered handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerInfo {
    /// Fully qualified handler name
    pub name: &'static str,
    /// Parameter type name, when the handler takes one
    pub params: Option<&'static str>,
    /// Declared return type name
    pub output: &'static str,
    /// Declared inputs (context included)
    pub input_arity: usize,
    /// Declared return values
    pub output_arity: usize,
    /// Status written on success
    pub success: StatusCode,
    /// Bindings in execution order
    pub bindings: Vec<BindSource>,
}

/// Type-erased handler descriptor for host context `C`.
trait Endpoint<C>: Send + Sync {
    fn handle(&self, ctx: &mut C);
    fn info(&self) -> &HandlerInfo;
}

struct Descriptor<H, S, P> {
    info: HandlerInfo,
    plan: BinderPlan<P>,
    handler: H,
    _shape: PhantomData<fn() -> S>,
}

impl<C, H, S, P> Endpoint<C> for Descriptor<H, S, P>
where
    C: RequestContext + 'static,
    H: Handler<C, S, Params = P>,
    P: BindParams,
{
    fn handle(&self, ctx: &mut C) {
        let params = match self.plan.bind(&*ctx) {
            Ok(params) => params,
            Err(err) => {
                debug!(
                    handler_name = self.info.name,
                    status = err.status().as_u16(),
                    error = %err,
                    "Request rejected before handler"
                );
                write_error(ctx, &err);
                return;
            }
        };

        match self.handler.call(ctx, params).into_outcome() {
            Outcome::Empty => ctx.write_status(self.info.success),
            Outcome::Value(reply) => reply.write_to(ctx, self.info.success),
            Outcome::Failure(err) => {
                if err.status().is_server_error() {
                    error!(
                        handler_name = self.info.name,
                        error_kind = %err.kind(),
                        error = %err,
                        "Handler failed"
                    );
                } else {
                    warn!(
                        handler_name = self.info.name,
                        error_kind = %err.kind(),
                        error = %err,
                        "Handler rejected request"
                    );
                }
                write_error(ctx, &err);
            }
        }
    }

    fn info(&self) -> &HandlerInfo {
        &self.info
    }
}

/// Router-compatible callback produced by [`intercept`].
///
/// Cheap to clone; every clone shares the same descriptor.
pub struct Intercepted<C> {
    endpoint: Arc<dyn Endpoint<C>>,
}

impl<C> Clone for Intercepted<C> {
    fn clone(&self) -> Self {
        Self {
            endpoint: Arc::clone(&self.endpoint),
        }
    }
}

impl<C> std::fmt::Debug for Intercepted<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Intercepted")
            .field("info", self.endpoint.info())
            .finish()
    }
}

impl<C: RequestContext> Intercepted<C> {
    /// Bind, call and respond for one request.
    ///
    /// Writes exactly one response to `ctx`.
    pub fn handle(&self, ctx: &mut C) {
        self.endpoint.handle(ctx);
    }

    /// Descriptor of the wrapped handler.
    #[must_use]
    pub fn info(&self) -> &HandlerInfo {
        self.endpoint.info()
    }

    /// Convert into a plain closure for hosts that store callbacks.
    #[must_use]
    pub fn into_fn(self) -> impl Fn(&mut C) + Send + Sync + Clone + 'static
    where
        C: 'static,
    {
        move |ctx: &mut C| self.handle(ctx)
    }
}

/// Adapt `handler` into a router callback, reporting registration problems.
///
/// The binder plan is built here, once; per request only the binders, the call and
/// the response translation run.
///
/// # Errors
///
/// Returns a [`RegistrationError`] when the parameter type declares a malformed or
/// duplicate success code, or an empty path/query key.
pub fn try_intercept<C, H, S>(handler: H) -> Result<Intercepted<C>, RegistrationError>
where
    C: RequestContext + 'static,
    H: Handler<C, S>,
    S: 'static,
{
    let name = type_name::<H>();
    let plan = BinderPlan::<H::Params>::for_params(name)?;

    let info = HandlerInfo {
        name,
        params: (<H as Handler<C, S>>::ARITY == 2).then(type_name::<H::Params>),
        output: type_name::<H::Output>(),
        input_arity: <H as Handler<C, S>>::ARITY,
        output_arity: <H::Output as IntoOutcome>::ARITY,
        success: plan.success(),
        bindings: plan.sources(),
    };

    info!(
        handler_name = info.name,
        params = info.params.unwrap_or("-"),
        bindings = info.bindings.len(),
        success = info.success.as_u16(),
        "Handler intercepted"
    );

    let descriptor: Descriptor<H, S, H::Params> = Descriptor {
        info,
        plan,
        handler,
        _shape: PhantomData,
    };

    Ok(Intercepted {
        endpoint: Arc::new(descriptor),
    })
}

/// Adapt `handler` into a router callback.
///
/// # Panics
///
/// Panics when registration fails (see [`try_intercept`]). A misconfigured route must
/// stop the service at startup instead of failing on first request.
///
/// # Rejected shapes
///
/// Shapes outside the supported set do not implement [`Handler`] and fail to compile.
///
/// The first parameter must be the request context:
///
/// ```compile_fail
/// use brrtbind::dispatcher::DispatchContext;
/// use brrtbind::{intercept, HandlerError, Intercepted};
///
/// fn lookup(id: u64) -> Result<(), HandlerError> {
///     let _ = id;
///     Ok(())
/// }
///
/// let _endpoint: Intercepted<DispatchContext> = intercept(lookup);
/// ```
///
/// At most one parameter struct follows the context:
///
/// ```compile_fail
/// use brrtbind::dispatcher::DispatchContext;
/// use brrtbind::{intercept, HandlerError, Intercepted};
///
/// fn lookup(_ctx: &DispatchContext, _a: (), _b: ()) -> Result<(), HandlerError> {
///     Ok(())
/// }
///
/// let _endpoint: Intercepted<DispatchContext> = intercept(lookup);
/// ```
///
/// The parameter struct must implement `BindParams`:
///
/// ```compile_fail
/// use brrtbind::dispatcher::DispatchContext;
/// use brrtbind::{intercept, HandlerError, Intercepted};
///
/// fn lookup(_ctx: &DispatchContext, id: u64) -> Result<String, HandlerError> {
///     Ok(id.to_string())
/// }
///
/// let _endpoint: Intercepted<DispatchContext> = intercept(lookup);
/// ```
///
/// The return value must be a responder, a `Result` of one, or `()`:
///
/// ```compile_fail
/// use brrtbind::dispatcher::DispatchContext;
/// use brrtbind::{intercept, Intercepted};
///
/// fn count(_ctx: &DispatchContext) -> u64 {
///     7
/// }
///
/// let _endpoint: Intercepted<DispatchContext> = intercept(count);
/// ```
///
/// and the error type must convert into [`HandlerError`]:
///
/// ```compile_fail
/// use brrtbind::dispatcher::DispatchContext;
/// use brrtbind::{intercept, Intercepted};
///
/// fn read(_ctx: &DispatchContext) -> Result<String, std::io::Error> {
///     Ok(String::new())
/// }
///
/// let _endpoint: Intercepted<DispatchContext> = intercept(read);
/// ```
///
/// The same handler with a supported signature compiles:
///
/// ```
/// use brrtbind::dispatcher::DispatchContext;
/// use brrtbind::{intercept, HandlerError, Intercepted};
///
/// fn read(_ctx: &DispatchContext) -> Result<String, HandlerError> {
///     Ok(String::new())
/// }
///
/// let endpoint: Intercepted<DispatchContext> = intercept(read);
/// assert_eq!(endpoint.info().output_arity, 2);
/// ```
#[must_use]
#[allow(clippy::panic)]
pub fn intercept<C, H, S>(handler: H) -> Intercepted<C>
where
    C: RequestContext + 'static,
    H: Handler<C, S>,
    S: 'static,
{
    match try_intercept(handler) {
        Ok(intercepted) => intercepted,
        Err(err) => {
            error!(error = %err, "Handler registration failed - CRITICAL");
            panic!("{err}");
        }
    }
}
