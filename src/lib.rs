//! # brrtbind
//!
//! **brrtbind** turns plain, strongly-typed Rust functions into HTTP handlers. A handler
//! declares the parameters it needs as a struct; the crate binds them from the request,
//! calls the function and writes its result back, all without hand-written extraction
//! code in the handler.
//!
//! ## Overview
//!
//! ```rust,ignore
//! use brrtbind::dispatcher::DispatchContext;
//! use brrtbind::{intercept, BindParams, HandlerError, Json};
//!
//! #[derive(Default, BindParams)]
//! struct GetUser {
//!     #[bind(path = "id")]
//!     id: u64,
//! }
//!
//! fn get_user(_ctx: &DispatchContext, p: GetUser) -> Result<Json<User>, HandlerError> {
//!     users::find(p.id).map(Json).ok_or_else(|| HandlerError::bad_request("no such user"))
//! }
//!
//! let endpoint = intercept(get_user);
//! ```
//!
//! ## Architecture
//!
//! - **[`bind`]** - Parameter declarations, coercion and the per-handler binder plan
//! - **[`intercept`](mod@intercept)** - Handler shapes and the registration-time adapter
//! - **[`response`]** - Translation of return values into text, JSON or status-only replies
//! - **[`error`]** - Handler error categories and registration errors
//! - **[`context`]** - The request context a host router implements
//! - **[`dispatcher`]** - A request context over extracted parts and a coroutine runner for one endpoint
//! - **[`logging`]** - Structured `tracing` subscriber setup
//! - **[`runtime_config`]** - Environment-driven runtime settings
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Router as Host Router
//!     participant Worker as CoroutineEndpoint
//!     participant Endpoint as Intercepted
//!     participant Handler
//!
//!     Router->>Worker: call(parts) for the matched route
//!     Worker->>Endpoint: handle(&mut DispatchContext)
//!     Endpoint->>Endpoint: bind path/query/body
//!     Endpoint->>Handler: get_user(ctx, params)
//!     Handler-->>Endpoint: Result<Json<User>, HandlerError>
//!     Endpoint-->>Worker: response written to context
//!     Worker-->>Router: HandlerResponse (reply channel)
//! ```
//!
//! ## Error Mapping
//!
//! | Failure                         | Status | Body                   |
//! |---------------------------------|--------|------------------------|
//! | Path/query value not coercible  | 400    | `invalid params`       |
//! | Body not decodable              | 400    | decoder message        |
//! | Body validation failed          | 400    | validator message      |
//! | Handler returned an error       | 400/500 per [`ErrorKind`] | error message |
//!
//! ## Runtime Considerations
//!
//! [`dispatcher::CoroutineEndpoint`] uses the `may` coroutine runtime. Its stack size is set
//! with `BRRTBIND_STACK_SIZE`; see [`runtime_config`].

#![allow(clippy::module_name_repetitions)]

extern crate self as brrtbind;

pub mod bind;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod intercept;
pub mod logging;
pub mod response;
pub mod runtime_config;

pub use bind::{BindParams, Validate};
pub use brrtbind_macros::BindParams;
pub use context::{RequestBody, RequestContext};
pub use error::{ErrorKind, HandlerError, RegistrationError};
pub use ids::RequestId;
pub use intercept::{intercept, try_intercept, HandlerInfo, Intercepted};
pub use response::{Json, Reply, Responder};
