use http::Method;
use std::fmt;
use tracing::{debug, error, info};

use super::node::{Inherit, Kind, NodeId, Special, Tree, ROOT};
use crate::chain::Entry;
use crate::inject::{BindSite, ResolveError, Resolver};
use crate::router::{Fallback, RouteError, RouteTable};
use crate::runtime_config::RouterConfig;

/// Why compiling the route tree failed
#[derive(Debug)]
pub enum BindError {
    /// An endpoint chain did not resolve
    Route {
        method: Method,
        path: String,
        source: ResolveError,
    },
    /// A fallback chain did not resolve
    Fallback {
        kind: Fallback,
        source: ResolveError,
    },
    /// The route table refused a registration
    Table(RouteError),
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::Route {
                method,
                path,
                source,
            } => write!(f, "bind router {method} {path}: {source}"),
            BindError::Fallback { kind, source } => write!(f, "bind {kind}: {source}"),
            BindError::Table(source) => write!(f, "register route: {source}"),
        }
    }
}

impl std::error::Error for BindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BindError::Route { source, .. } | BindError::Fallback { source, .. } => Some(source),
            BindError::Table(source) => Some(source),
        }
    }
}

impl From<RouteError> for BindError {
    fn from(e: RouteError) -> Self {
        BindError::Table(e)
    }
}

struct Binder<'a> {
    tree: &'a Tree,
    resolver: &'a dyn Resolver,
    table: RouteTable,
}

/// Compile the whole tree into a fresh route table.
///
/// Depth first: a node's children are registered before the node itself, so
/// a nested fallback claims its slot before an enclosing one. The first
/// failure aborts the walk and the partial table is dropped.
pub(crate) fn bind(
    tree: &Tree,
    resolver: &dyn Resolver,
    config: RouterConfig,
) -> Result<RouteTable, BindError> {
    let mut binder = Binder {
        tree,
        resolver,
        table: RouteTable::new(config),
    };
    if let Err(e) = binder.visit(ROOT, "", &[]) {
        error!(error = %e, "Route tree bind failed");
        return Err(e);
    }

    let routes = binder.table.routes();
    let routes_summary: Vec<String> = routes
        .iter()
        .take(10)
        .map(|(method, pattern)| format!("{method} {pattern}"))
        .collect();
    info!(
        routes_count = routes.len(),
        nodes_count = tree.len(),
        routes_summary = ?routes_summary,
        "Routing table compiled"
    );
    Ok(binder.table)
}

impl Binder<'_> {
    fn visit(&mut self, id: NodeId, path: &str, inherited: &[Entry]) -> Result<(), BindError> {
        let tree = self.tree;
        let node = tree.node(id);
        let path = format!("{path}{}", node.fragment);

        for &child in &node.children {
            let child_chain: Vec<Entry> = match tree.node(child).inherit {
                Inherit::Reset => Vec::new(),
                Inherit::Prefix(n) => inherited.iter().chain(&node.own[..n]).cloned().collect(),
            };
            self.visit(child, &path, &child_chain)?;
        }

        let chain = || -> Vec<Entry> { inherited.iter().chain(&node.own).cloned().collect() };

        match &node.kind {
            Kind::Container => Ok(()),
            Kind::Special(Special::ServeFiles(source)) => {
                self.table.serve_files(&path, source.clone())?;
                debug!(path = %path, "Static files registered");
                Ok(())
            }
            Kind::Special(special) => {
                let Some(kind) = special.fallback() else {
                    return Ok(());
                };
                if self.table.is_set(kind) {
                    debug!(kind = %kind, path = %path, "Fallback already claimed, skipping");
                    return Ok(());
                }
                let handler = self
                    .resolver
                    .resolve(&chain(), &BindSite::fallback(kind, path.as_str()))
                    .map_err(|source| BindError::Fallback { kind, source })?;
                self.table.set_fallback(kind, handler);
                debug!(kind = %kind, path = %path, "Fallback registered");
                Ok(())
            }
            Kind::Endpoint(method) => {
                let handler = self
                    .resolver
                    .resolve(&chain(), &BindSite::route(method.clone(), path.as_str()))
                    .map_err(|source| BindError::Route {
                        method: method.clone(),
                        path: path.clone(),
                        source,
                    })?;
                self.table.handle(method.clone(), &path, handler)?;
                debug!(method = %method, path = %path, "Route registered");
                Ok(())
            }
        }
    }
}
