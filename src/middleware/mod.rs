//! # Middleware Module
//!
//! Before/after [`Middleware`] and the built-in observers. [`layer`] turns
//! any implementation into a handler-wrapping chain entry, so it can be
//! passed to `using`, `with` or an endpoint registration like any other
//! middleware.
//!
//! ```rust
//! use std::sync::Arc;
//! use nestmux::middleware::{layer, MetricsMiddleware, TracingMiddleware};
//! use nestmux::Router;
//!
//! let metrics = Arc::new(MetricsMiddleware::new());
//! let router = Router::new();
//! router.using([layer(Arc::new(TracingMiddleware)), metrics.entry()]);
//! ```

mod core;
mod metrics;
mod tracing;

pub use core::{layer, Middleware};
pub use metrics::MetricsMiddleware;
pub use tracing::TracingMiddleware;
