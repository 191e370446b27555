//! One intercepted endpoint served from its own `may` coroutine.

use std::any::Any;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use may::coroutine;
use may::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::core::{DispatchContext, HandlerResponse, RequestParts};
use crate::ids::RequestId;
use crate::intercept::Intercepted;
use crate::runtime_config::RuntimeConfig;

struct Job {
    request_id: RequestId,
    parts: RequestParts,
    reply: mpsc::Sender<HandlerResponse>,
}

/// Handle to an endpoint running on a dedicated coroutine.
///
/// Routing stays with the host: it keeps one handle per matched route and passes the
/// request parts it extracted. Clones share the same coroutine.
#[derive(Clone)]
pub struct CoroutineEndpoint {
    name: Arc<str>,
    jobs: mpsc::Sender<Job>,
}

impl CoroutineEndpoint {
    /// Start a coroutine that serves `endpoint` until every handle is dropped.
    ///
    /// # Safety
    ///
    /// Calls `may::coroutine::Builder::spawn`, which requires a configured `may` runtime
    /// and a stack large enough for the handler (`config.stack_size`).
    ///
    /// # Errors
    ///
    /// Returns the spawn error when the coroutine cannot be started.
    pub unsafe fn spawn(
        endpoint: Intercepted<DispatchContext>,
        config: &RuntimeConfig,
    ) -> io::Result<Self> {
        let name: Arc<str> = Arc::from(endpoint.info().name);
        let (jobs, queue) = mpsc::channel::<Job>();
        let stack_size = config.stack_size;
        let worker_name = Arc::clone(&name);
        let bindings = endpoint.info().bindings.len();

        // SAFETY: upheld by the caller; the closure owns everything it touches.
        let _worker = unsafe {
            coroutine::Builder::new()
                .name(name.to_string())
                .stack_size(stack_size)
                .spawn(move || serve(&worker_name, &endpoint, &queue))
        }
        .inspect_err(|err| {
            error!(handler_name = %name, stack_size, error = %err, "Failed to spawn endpoint coroutine");
        })?;

        info!(handler_name = %name, stack_size, bindings, "Endpoint coroutine started");
        Ok(Self { name, jobs })
    }

    /// Handler name the coroutine serves.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run one request and wait for its response.
    #[must_use]
    pub fn call(&self, parts: RequestParts) -> HandlerResponse {
        self.call_with_request_id(parts, RequestId::new())
    }

    /// Like [`call`](Self::call) with a request id chosen by the caller.
    ///
    /// A coroutine that is gone, or that dropped the request without answering, yields
    /// `503`.
    #[must_use]
    pub fn call_with_request_id(&self, parts: RequestParts, request_id: RequestId) -> HandlerResponse {
        let started = Instant::now();
        let (reply, response) = mpsc::channel();
        let job = Job {
            request_id,
            parts,
            reply,
        };
        if self.jobs.send(job).is_err() {
            error!(request_id = %request_id, handler_name = %self.name, "Endpoint coroutine is gone");
            return self.unavailable();
        }
        match response.recv() {
            Ok(response) => {
                debug!(
                    request_id = %request_id,
                    handler_name = %self.name,
                    status = response.status,
                    latency_us = started.elapsed().as_micros() as u64,
                    "Endpoint replied"
                );
                response
            }
            Err(_) => {
                error!(request_id = %request_id, handler_name = %self.name, "Endpoint dropped the request");
                self.unavailable()
            }
        }
    }

    fn unavailable(&self) -> HandlerResponse {
        HandlerResponse::error(503, &format!("handler '{}' is not responding", self.name))
    }
}

fn serve(name: &Arc<str>, endpoint: &Intercepted<DispatchContext>, queue: &mpsc::Receiver<Job>) {
    for Job {
        request_id,
        parts,
        reply,
    } in queue.iter()
    {
        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut ctx = DispatchContext::new(request_id, &**name, parts);
            endpoint.handle(&mut ctx);
            ctx.into_response()
        }));
        let response = result.unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            error!(request_id = %request_id, handler_name = %name, panic = message, "Handler panicked");
            HandlerResponse::error(500, &format!("handler panicked: {message}"))
        });
        if reply.send(response).is_err() {
            warn!(request_id = %request_id, handler_name = %name, "Caller left before the response");
        }
    }
    debug!(handler_name = %name, "Endpoint coroutine stopped");
}

/// Text carried by a panic payload, for `panic!("literal")` and formatted panics.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
