//! # Mux Module
//!
//! The declarative route tree and its one-shot compilation.
//!
//! ## Building
//!
//! A [`Router`] is the root of a tree of [`Mux`] nodes. Every node has a path
//! fragment and a chain of [`Entry`](crate::chain::Entry) values:
//!
//! - [`Mux::using`] appends to the node's own chain
//! - [`Mux::with`] branches off a child with extra entries
//! - [`Mux::route`] opens a child at a longer path
//! - [`Mux::group`] opens a child that starts from an empty chain
//! - [`Mux::get`] and friends register endpoints
//! - [`Mux::not_found`], [`Mux::method_not_allowed`], [`Mux::global_options`],
//!   [`Mux::panic_handler`] and [`Mux::serve_files`] register fallbacks
//!
//! A child captures its parent's chain when it is created. Entries added to
//! the parent later only reach children created after them.
//!
//! ## Binding
//!
//! [`Router::bind`] walks the tree depth first, children before their parent,
//! concatenating fragments into full paths and chains into full chains. Each
//! endpoint and fallback chain is handed to the [`Resolver`](crate::inject::Resolver)
//! and the result registered in a [`RouteTable`](crate::router::RouteTable).
//! For each fallback slot the first registration in that order wins.
//!
//! ```rust
//! use nestmux::inject::Endpoint;
//! use nestmux::handler::{HandlerRequest, HandlerResponse};
//! use nestmux::Router;
//! use http::Method;
//!
//! let router = Router::new();
//! router.route("/pets", |pets| {
//!     pets.get(
//!         "/:id",
//!         [Endpoint::new("show", |req: &mut HandlerRequest, res: &mut HandlerResponse| {
//!             let id = req.get_path_param("id").unwrap_or_default().to_string();
//!             res.write(id.as_bytes());
//!         })],
//!     );
//! });
//! router.bind().unwrap();
//!
//! let res = router.serve(HandlerRequest::new(Method::GET, "/pets/9"));
//! assert_eq!(res.body_str(), "9");
//! ```

mod bind;
mod core;
mod facade;
mod node;
#[cfg(test)]
mod tests;

pub use bind::BindError;
pub use core::Mux;
pub use facade::Router;
pub use node::Special;
