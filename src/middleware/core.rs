use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::chain::Entry;
use crate::handler::{handler_fn, BoxedHandler, HandlerRequest, HandlerResponse};

/// Before/after hooks around the rest of a chain
pub trait Middleware: Send + Sync {
    /// Runs before the inner handler; returning a response short-circuits it.
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        None
    }
    fn after(&self, _req: &HandlerRequest, _res: &mut HandlerResponse, _latency: Duration) {}
}

/// Wrap a [`Middleware`] as a handler-wrapping chain entry.
///
/// `after` runs for short-circuited responses too.
pub fn layer<M>(mw: Arc<M>) -> Entry
where
    M: Middleware + 'static,
{
    Entry::wraps_handler(move |next: BoxedHandler| {
        let mw = mw.clone();
        handler_fn(move |req: &mut HandlerRequest, res: &mut HandlerResponse| {
            let start = Instant::now();
            match mw.before(req) {
                Some(early) => *res = early,
                None => next.serve(req, res),
            }
            mw.after(req, res, start.elapsed());
        })
    })
}
