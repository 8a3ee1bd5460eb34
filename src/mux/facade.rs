use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::ops::Deref;
use std::sync::Arc;

use super::bind::{bind, BindError};
use super::core::Mux;
use super::node::Tree;
use crate::handler::{HandlerRequest, HandlerResponse};
use crate::inject::{Injector, Resolver};
use crate::router::RouteTable;
use crate::runtime_config::{RouterConfig, RouterOption};

/// Root of a route tree plus its compiled table
///
/// Derefs to the root [`Mux`] for building. The tree is compiled at most
/// once, either explicitly with [`Router::bind`] or by the first request.
pub struct Router {
    root: Mux,
    config: RouterConfig,
    resolver: Arc<dyn Resolver>,
    table: OnceCell<Arc<RouteTable>>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    /// Start from the defaults and apply `options` in order.
    pub fn with_options<I>(options: I) -> Self
    where
        I: IntoIterator<Item = RouterOption>,
    {
        let mut config = RouterConfig::default();
        for option in options {
            config.apply(option);
        }
        Self::with_config(config)
    }

    #[must_use]
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            root: Mux::root(Arc::new(Mutex::new(Tree::new()))),
            config,
            resolver: Arc::new(Injector),
            table: OnceCell::new(),
        }
    }

    /// Replace the resolution engine used when binding.
    #[must_use]
    pub fn with_resolver<R>(mut self, resolver: R) -> Self
    where
        R: Resolver + 'static,
    {
        self.resolver = Arc::new(resolver);
        self
    }

    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Compile the tree now.
    ///
    /// Only the first successful call does any work. Concurrent callers wait
    /// for it and never see a partial table; a failed attempt leaves the
    /// router unbound.
    pub fn bind(&self) -> Result<(), BindError> {
        self.table.get_or_try_init(|| self.compile()).map(|_| ())
    }

    fn compile(&self) -> Result<Arc<RouteTable>, BindError> {
        let mut tree = self.root.tree().lock();
        let table = bind(&tree, self.resolver.as_ref(), self.config)?;
        tree.seal();
        Ok(Arc::new(table))
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.table.get().is_some()
    }

    /// The compiled table, once bound
    #[must_use]
    pub fn table(&self) -> Option<&Arc<RouteTable>> {
        self.table.get()
    }

    /// Serve one request, binding first if needed.
    ///
    /// # Panics
    ///
    /// Panics when the implicit bind fails: a router whose tree does not
    /// compile must not serve traffic.
    pub fn serve(&self, mut req: HandlerRequest) -> HandlerResponse {
        let table = match self.table.get_or_try_init(|| self.compile()) {
            Ok(table) => table,
            Err(e) => panic!("{e}"),
        };
        table.serve(&mut req)
    }

    /// [`serve`](Router::serve) for `http` crate types.
    pub fn serve_http(&self, req: http::Request<Vec<u8>>) -> http::Response<Vec<u8>> {
        self.serve(HandlerRequest::from_http(req)).into_http()
    }
}

impl Deref for Router {
    type Target = Mux;

    fn deref(&self) -> &Mux {
        &self.root
    }
}
