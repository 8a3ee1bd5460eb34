//! # Handler Module
//!
//! Request and response envelopes plus the two calling conventions a chain
//! can be composed from:
//!
//! - [`Handler`] objects (`Arc<dyn Handler>`, aliased as [`BoxedHandler`])
//! - plain handler functions ([`HandlerFn`])
//!
//! Middleware that wraps one convention can be applied to the other through
//! [`handler_from_fn`] and [`fn_from_handler`]; the resolution engine relies
//! on these bridges when a chain mixes both kinds.
//!
//! Responses are written incrementally, like a response writer: middleware
//! that runs after the inner handler can append to a body the endpoint has
//! already started.

mod core;

pub use core::{
    fn_from_handler, handler_fn, handler_from_fn, BoxedHandler, Handler, HandlerFn,
    HandlerRequest, HandlerResponse, HeaderVec, MAX_INLINE_HEADERS,
};
