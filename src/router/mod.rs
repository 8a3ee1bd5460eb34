//! # Router Module
//!
//! The dispatch engine the binder compiles into: a [`RouteTable`] holding
//! `(method, pattern) -> handler` entries in a radix tree, the singleton
//! [`Fallback`] slots, and the request-time behaviour around them.
//!
//! ## Request flow
//!
//! 1. Exact match: path parameters and the route pattern are stored on the
//!    request and the route's handler runs.
//! 2. No match: optional trailing-slash redirect, then optional fixed-path
//!    redirect (cleaned path, case-insensitive lookup). `301` for GET, `307`
//!    for everything else.
//! 3. Automatic OPTIONS replies with an `Allow` header, handing over to the
//!    GlobalOPTIONS slot when one is installed.
//! 4. `405 Method Not Allowed` when the path matches under other methods.
//! 5. Not found.
//!
//! ## Patterns
//!
//! - `/users/:id` or `/users/{id}` - named parameter, one segment
//! - `/static/*filepath` - catch-all, final segment only
//!
//! A trailing slash is significant: `/a` and `/a/` are different routes.
//!
//! ## Example
//!
//! ```rust
//! use nestmux::handler::{handler_fn, HandlerRequest, HandlerResponse};
//! use nestmux::router::RouteTable;
//! use nestmux::RouterConfig;
//! use http::Method;
//!
//! let mut table = RouteTable::new(RouterConfig::default());
//! table
//!     .handle(
//!         Method::GET,
//!         "/pets/:id",
//!         handler_fn(|req: &mut HandlerRequest, res: &mut HandlerResponse| {
//!             let id = req.get_path_param("id").unwrap_or_default().to_string();
//!             res.write(id.as_bytes());
//!         }),
//!     )
//!     .unwrap();
//!
//! let mut req = HandlerRequest::new(Method::GET, "/pets/42");
//! assert_eq!(table.serve(&mut req).body_str(), "42");
//! ```

mod core;
mod radix;

pub(crate) use core::panic_message;
pub use core::{
    Fallback, ParamVec, Recovered, RouteError, RouteTable, FILEPATH_PARAM, MAX_INLINE_PARAMS,
};
