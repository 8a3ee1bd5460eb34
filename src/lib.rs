//! # nestmux
//!
//! **nestmux** is a declarative HTTP route tree that compiles, once, into a
//! flat dispatch table. Routes, nested path scopes and layered middleware are
//! described as a tree; binding walks the tree depth first and turns every
//! endpoint and fallback into one concrete handler.
//!
//! ## Architecture
//!
//! - **[`chain`]** - chain entries and the flattener that merges runs of same-kind middleware
//! - **[`mux`]** - the builder tree ([`Mux`]), the binder and the [`Router`] facade
//! - **[`inject`]** - the resolution engine turning a chain into a handler
//! - **[`router`]** - the radix route table, fallback slots and redirect/OPTIONS/405 handling
//! - **[`handler`]** - request/response types and the two handler calling conventions
//! - **[`envelope`]** - body reading, JSON decoding, panic catching, JSON responses
//! - **[`middleware`]** - before/after middleware, tracing and metrics
//! - **[`static_files`]** - file backends for `serve_files`
//! - **[`runtime_config`]** - router behaviour toggles from code, environment or YAML
//! - **[`logging`]** - `tracing` subscriber setup
//!
//! ## Inheritance
//!
//! ```text
//! router.using(a)                 chain: a
//! ├── router.get("/x", [b, e])    GET /x      a b e
//! ├── router.route("/r", ..)
//! │   ├── r.using(c)
//! │   └── r.get("/y", [e])        GET /r/y    a c e
//! └── router.group(..)
//!     ├── g.using(d)
//!     └── g.get("/z", [e])        GET /z      d e
//! ```
//!
//! A child sees its parent's chain as it was when the child was created;
//! groups start from nothing.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use nestmux::handler::{HandlerRequest, HandlerResponse};
//! use nestmux::inject::{Endpoint, RoutePattern};
//! use nestmux::middleware::{layer, TracingMiddleware};
//! use nestmux::{with_redirect_trailing_slash, Router};
//! use http::Method;
//!
//! let router = Router::with_options([with_redirect_trailing_slash(false)]);
//! router.using([layer(Arc::new(TracingMiddleware))]);
//! router.route("/thing", |thing| {
//!     thing.get(
//!         "/:thingID",
//!         [Endpoint::new("thing", |req: &mut HandlerRequest, res: &mut HandlerResponse| {
//!             let pattern = req.extensions.get::<RoutePattern>().cloned();
//!             res.write(pattern.map(|p| p.0.to_string()).unwrap_or_default().as_bytes());
//!         })
//!         .requires::<RoutePattern>()],
//!     );
//! });
//! router.bind().expect("route tree compiles");
//!
//! let res = router.serve(HandlerRequest::new(Method::GET, "/thing/473"));
//! assert_eq!(res.body_str(), "/thing/:thingID");
//! ```

pub mod chain;
pub mod envelope;
pub mod handler;
pub mod ids;
pub mod inject;
pub mod logging;
pub mod middleware;
pub mod mux;
pub mod router;
pub mod runtime_config;
pub mod static_files;

pub use chain::{Entry, Provider};
pub use ids::RequestId;
pub use mux::{BindError, Mux, Router, Special};
pub use runtime_config::{
    with_handle_method_not_allowed, with_handle_options, with_redirect_fixed_path,
    with_redirect_trailing_slash, RouterConfig, RouterOption,
};
pub use static_files::{FileSource, StaticFiles};
