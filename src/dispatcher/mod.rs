//! # Dispatcher Module
//!
//! A ready-made host for intercepted handlers.
//!
//! [`DispatchContext`] implements [`RequestContext`](crate::context::RequestContext) over
//! [`RequestParts`] a router has already extracted, and collects the single
//! [`HandlerResponse`]. [`CoroutineEndpoint`] runs one endpoint on its own `may`
//! coroutine; the router owns the mapping from routes to endpoints.
//!
//! Stack size comes from [`RuntimeConfig`](crate::runtime_config::RuntimeConfig)
//! (`BRRTBIND_STACK_SIZE`).
//!
//! ```rust,ignore
//! use brrtbind::dispatcher::{CoroutineEndpoint, DispatchContext, RequestParts};
//! use brrtbind::runtime_config::RuntimeConfig;
//! use brrtbind::{intercept, HandlerError};
//! use http::Method;
//!
//! fn ping(_ctx: &DispatchContext) -> Result<&'static str, HandlerError> {
//!     Ok("pong")
//! }
//!
//! let ping = unsafe { CoroutineEndpoint::spawn(intercept(ping), &RuntimeConfig::from_env())? };
//! let resp = ping.call(RequestParts::new(Method::GET, "/ping"));
//! assert_eq!(resp.status, 200);
//! ```
//!
//! ## Error Handling
//!
//! - Handler panics are caught and answered with `500`; the coroutine keeps serving
//! - A coroutine that is gone or dropped the request is answered with `503`

mod core;
mod worker;

pub use core::{
    DispatchContext, HandlerResponse, HeaderVec, ParamVec, RequestParts, ResponseBody,
    MAX_INLINE_HEADERS, MAX_INLINE_PARAMS,
};
pub use worker::CoroutineEndpoint;
