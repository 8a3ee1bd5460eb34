//! # Inject Module
//!
//! The resolution engine: turns the flattened chain collected for a route or
//! fallback slot into a single [`BoxedHandler`](crate::handler::BoxedHandler).
//!
//! The binder never looks inside opaque providers. It hands the chain and a
//! [`BindSite`] to a [`Resolver`]; the default [`Injector`] understands the
//! units built here:
//!
//! - [`value`] - a constant cloned into the request extensions
//! - [`Step`] - intermediate unit declaring what it requires and provides;
//!   returning [`Flow::Halt`] ends the chain
//! - [`Endpoint`] - the terminal unit, declaring what it requires
//!
//! Requirements are checked front to back at bind time, so a chain asking for
//! a value nothing earlier provides fails the bind instead of failing on
//! the first request. [`RoutePattern`] is always available; [`Recovered`] is
//! available to chains bound to the panic handler slot.
//!
//! Middleware entries of either calling convention are applied in chain
//! order, first entry outermost.
//!
//! ```rust
//! use nestmux::inject::{value, BindSite, Endpoint, Injector, Resolver};
//! use nestmux::handler::{HandlerRequest, HandlerResponse};
//! use nestmux::chain;
//! use http::Method;
//!
//! #[derive(Clone)]
//! struct Greeting(&'static str);
//!
//! let entries = chain![
//!     value(Greeting("hello")),
//!     Endpoint::new("greet", |req: &mut HandlerRequest, res: &mut HandlerResponse| {
//!         let g = req.extensions.get::<Greeting>().map(|g| g.0).unwrap_or_default();
//!         res.write(g.as_bytes());
//!     })
//!     .requires::<Greeting>(),
//! ];
//! let handler = Injector
//!     .resolve(&entries, &BindSite::route(Method::GET, "/hi"))
//!     .unwrap();
//!
//! let mut req = HandlerRequest::new(Method::GET, "/hi");
//! let mut res = HandlerResponse::default();
//! handler.serve(&mut req, &mut res);
//! assert_eq!(res.body_str(), "hello");
//! ```

mod core;
mod units;

pub use crate::router::Recovered;
pub use core::{BindSite, BindTarget, Injector, ResolveError, Resolver};
pub use units::{value, Endpoint, Flow, RoutePattern, Step};
