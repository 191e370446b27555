//! # Intercept Module
//!
//! Adapts a strongly-typed business handler into a router callback.
//!
//! ## Overview
//!
//! A business handler takes the request context and, optionally, a parameter struct,
//! and returns nothing, an error, or a response plus an error:
//!
//! ```rust,ignore
//! fn ping(ctx: &DispatchContext) -> Result<(), HandlerError>;
//! fn whoami(ctx: &DispatchContext) -> Result<String, HandlerError>;
//! fn delete_user(ctx: &DispatchContext, p: DeleteUser) -> Result<(), HandlerError>;
//! fn get_user(ctx: &DispatchContext, p: GetUser) -> Result<Json<User>, HandlerError>;
//! ```
//!
//! [`intercept`] inspects the handler once and returns an [`Intercepted`] callback.
//!
//! ## Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Host as Host Router
//!     participant Endpoint as Intercepted
//!     participant Plan as BinderPlan
//!     participant Handler
//!
//!     Host->>Endpoint: handle(ctx)
//!     Endpoint->>Plan: bind(ctx)
//!     Plan->>Plan: P::default(), run binders in order
//!     alt Bind error
//!         Endpoint-->>Host: 400/500 text body, abort
//!     end
//!     Endpoint->>Handler: call(ctx, params)
//!     Handler-->>Endpoint: Outcome
//!     alt Failure
//!         Endpoint-->>Host: 400/500 text body, abort
//!     else Empty
//!         Endpoint-->>Host: success status
//!     else Value
//!         Endpoint-->>Host: success status + text/JSON body
//!     end
//! ```
//!
//! ## Registration Failures
//!
//! Handler shapes outside the four supported ones do not implement [`Handler`] and fail
//! to compile. Plan problems (malformed `success`, empty keys) are reported by
//! [`try_intercept`]; [`intercept`] panics on them so a broken route stops the service
//! at startup.

mod core;

pub use core::{
    intercept, try_intercept, ContextOnly, Handler, HandlerInfo, Intercepted, IntoOutcome,
    Outcome, WithParams,
};
