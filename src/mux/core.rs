use http::Method;
use parking_lot::Mutex;
use std::sync::Arc;

use super::node::{Kind, NodeId, Special, Tree, ROOT};
use crate::chain::{flatten, Entry};
use crate::static_files::FileSource;

/// Handle to one node of a route tree
///
/// Cloning a `Mux` clones the handle, not the node. Every builder call
/// appends to the shared tree; children capture their parent's chain as it
/// is at the moment they are created.
///
/// All builder calls panic once the owning [`Router`](super::Router) is bound.
#[derive(Clone)]
pub struct Mux {
    tree: Arc<Mutex<Tree>>,
    id: NodeId,
}

fn collect<I>(entries: I) -> Vec<Entry>
where
    I: IntoIterator,
    I::Item: Into<Entry>,
{
    flatten(entries.into_iter().map(Into::into))
}

impl Mux {
    pub(crate) fn root(tree: Arc<Mutex<Tree>>) -> Self {
        Self { tree, id: ROOT }
    }

    pub(crate) fn tree(&self) -> &Arc<Mutex<Tree>> {
        &self.tree
    }

    fn child(&self, fragment: &str, kind: Kind, own: Vec<Entry>, group: bool) -> Mux {
        let id = self
            .tree
            .lock()
            .add_child(self.id, fragment, kind, own, group);
        Mux {
            tree: self.tree.clone(),
            id,
        }
    }

    /// Append middleware and providers to this node's chain.
    ///
    /// Only children created after this call see the new entries.
    pub fn using<I>(&self, entries: I)
    where
        I: IntoIterator,
        I::Item: Into<Entry>,
    {
        let entries = collect(entries);
        self.tree.lock().extend_own(self.id, entries);
    }

    /// Branch off a child that adds `entries` to the current chain.
    ///
    /// The receiver is unchanged; routes added to the branch stay on the branch.
    #[must_use]
    pub fn with<I>(&self, entries: I) -> Mux
    where
        I: IntoIterator,
        I::Item: Into<Entry>,
    {
        self.child("", Kind::Container, collect(entries), false)
    }

    /// Register sub-routes under `fragment`.
    pub fn route<F>(&self, fragment: &str, f: F)
    where
        F: FnOnce(&Mux),
    {
        let sub = self.child(fragment, Kind::Container, Vec::new(), false);
        f(&sub);
    }

    /// Register sub-routes at the current path that do not inherit any chain.
    pub fn group<F>(&self, f: F)
    where
        F: FnOnce(&Mux),
    {
        let sub = self.child("", Kind::Container, Vec::new(), true);
        f(&sub);
    }

    /// Register an endpoint for `method` at the current path plus `fragment`.
    pub fn method<I>(&self, method: Method, fragment: &str, entries: I)
    where
        I: IntoIterator,
        I::Item: Into<Entry>,
    {
        let _ = self.child(fragment, Kind::Endpoint(method), collect(entries), false);
    }

    pub fn get<I>(&self, fragment: &str, entries: I)
    where
        I: IntoIterator,
        I::Item: Into<Entry>,
    {
        self.method(Method::GET, fragment, entries);
    }

    pub fn head<I>(&self, fragment: &str, entries: I)
    where
        I: IntoIterator,
        I::Item: Into<Entry>,
    {
        self.method(Method::HEAD, fragment, entries);
    }

    pub fn post<I>(&self, fragment: &str, entries: I)
    where
        I: IntoIterator,
        I::Item: Into<Entry>,
    {
        self.method(Method::POST, fragment, entries);
    }

    pub fn put<I>(&self, fragment: &str, entries: I)
    where
        I: IntoIterator,
        I::Item: Into<Entry>,
    {
        self.method(Method::PUT, fragment, entries);
    }

    pub fn patch<I>(&self, fragment: &str, entries: I)
    where
        I: IntoIterator,
        I::Item: Into<Entry>,
    {
        self.method(Method::PATCH, fragment, entries);
    }

    pub fn delete<I>(&self, fragment: &str, entries: I)
    where
        I: IntoIterator,
        I::Item: Into<Entry>,
    {
        self.method(Method::DELETE, fragment, entries);
    }

    pub fn options<I>(&self, fragment: &str, entries: I)
    where
        I: IntoIterator,
        I::Item: Into<Entry>,
    {
        self.method(Method::OPTIONS, fragment, entries);
    }

    fn special<I>(&self, special: Special, entries: I)
    where
        I: IntoIterator,
        I::Item: Into<Entry>,
    {
        let _ = self.child("", Kind::Special(special), collect(entries), false);
    }

    /// Handler for automatic OPTIONS replies. The `Allow` header is already set.
    ///
    /// Only the first registration in traversal order counts.
    pub fn global_options<I>(&self, entries: I)
    where
        I: IntoIterator,
        I::Item: Into<Entry>,
    {
        self.special(Special::GlobalOptions, entries);
    }

    /// Handler for requests no route matches. Only the first registration counts.
    pub fn not_found<I>(&self, entries: I)
    where
        I: IntoIterator,
        I::Item: Into<Entry>,
    {
        self.special(Special::NotFound, entries);
    }

    /// Handler for paths that only match under other methods; runs with the
    /// `Allow` header set. Only the first registration counts.
    pub fn method_not_allowed<I>(&self, entries: I)
    where
        I: IntoIterator,
        I::Item: Into<Entry>,
    {
        self.special(Special::MethodNotAllowed, entries);
    }

    /// Handler that finishes the response of a panicking handler.
    ///
    /// The panic message is available as [`Recovered`](crate::inject::Recovered).
    /// Only the first registration counts.
    pub fn panic_handler<I>(&self, entries: I)
    where
        I: IntoIterator,
        I::Item: Into<Entry>,
    {
        self.special(Special::PanicHandler, entries);
    }

    /// Serve files from `source` at the current path plus `fragment`, which
    /// must end in `/*filepath`. No middleware is applied.
    pub fn serve_files<S>(&self, fragment: &str, source: S)
    where
        S: FileSource + 'static,
    {
        let source: Arc<dyn FileSource> = Arc::new(source);
        let _ = self.child(
            fragment,
            Kind::Special(Special::ServeFiles(source)),
            Vec::new(),
            false,
        );
    }
}
