use http::Method;
use std::fmt;
use std::sync::Arc;

use crate::chain::Entry;
use crate::router::Fallback;
use crate::static_files::FileSource;

pub(crate) type NodeId = usize;

pub(crate) const ROOT: NodeId = 0;

/// Singleton registrations a node can stand for
#[derive(Clone)]
pub enum Special {
    GlobalOptions,
    NotFound,
    MethodNotAllowed,
    PanicHandler,
    /// Static files at the node's path; no chain is applied
    ServeFiles(Arc<dyn FileSource>),
}

impl Special {
    /// Route table slot this registration claims; `None` for file serving
    #[must_use]
    pub fn fallback(&self) -> Option<Fallback> {
        match self {
            Special::GlobalOptions => Some(Fallback::GlobalOptions),
            Special::NotFound => Some(Fallback::NotFound),
            Special::MethodNotAllowed => Some(Fallback::MethodNotAllowed),
            Special::PanicHandler => Some(Fallback::Panic),
            Special::ServeFiles(_) => None,
        }
    }
}

impl fmt::Debug for Special {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fallback() {
            Some(slot) => write!(f, "{slot}"),
            None => f.write_str("ServeFiles"),
        }
    }
}

/// What a node registers when bound
#[derive(Debug, Clone)]
pub(crate) enum Kind {
    Container,
    Endpoint(Method),
    Special(Special),
}

/// How much of the parent's chain a node sees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Inherit {
    /// Nothing (root and groups)
    Reset,
    /// The parent's inherited chain plus its first `n` own entries
    Prefix(usize),
}

pub(crate) struct Node {
    pub fragment: String,
    pub own: Vec<Entry>,
    pub kind: Kind,
    pub inherit: Inherit,
    pub children: Vec<NodeId>,
}

/// Arena holding every node of one router
pub(crate) struct Tree {
    nodes: Vec<Node>,
    sealed: bool,
}

impl Tree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                fragment: String::new(),
                own: Vec::new(),
                kind: Kind::Container,
                inherit: Inherit::Reset,
                children: Vec::new(),
            }],
            sealed: false,
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Append a child to `parent`, snapshotting the parent's chain length now.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        fragment: &str,
        kind: Kind,
        own: Vec<Entry>,
        group: bool,
    ) -> NodeId {
        self.ensure_open();
        let inherit = if group {
            Inherit::Reset
        } else {
            Inherit::Prefix(self.nodes[parent].own.len())
        };
        let id = self.nodes.len();
        self.nodes.push(Node {
            fragment: fragment.to_string(),
            own,
            kind,
            inherit,
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn extend_own(&mut self, id: NodeId, entries: Vec<Entry>) {
        self.ensure_open();
        self.nodes[id].own.extend(entries);
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }

    fn ensure_open(&self) {
        if self.sealed {
            panic!("route tree modified after the router was bound");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Provider;

    fn entry() -> Entry {
        Provider::new("x", ()).into()
    }

    #[test]
    fn test_children_snapshot_parent_chain_length() {
        let mut tree = Tree::new();
        tree.extend_own(ROOT, vec![entry()]);
        let first = tree.add_child(ROOT, "/a", Kind::Endpoint(Method::GET), Vec::new(), false);
        tree.extend_own(ROOT, vec![entry(), entry()]);
        let second = tree.add_child(ROOT, "/b", Kind::Container, Vec::new(), false);
        let group = tree.add_child(ROOT, "", Kind::Container, Vec::new(), true);

        assert_eq!(tree.node(first).inherit, Inherit::Prefix(1));
        assert_eq!(tree.node(second).inherit, Inherit::Prefix(3));
        assert_eq!(tree.node(group).inherit, Inherit::Reset);
        assert_eq!(tree.node(ROOT).children, vec![first, second, group]);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    #[should_panic(expected = "route tree modified after the router was bound")]
    fn test_sealed_tree_rejects_changes() {
        let mut tree = Tree::new();
        tree.seal();
        tree.extend_own(ROOT, vec![entry()]);
    }

    #[test]
    fn test_special_slots() {
        assert_eq!(Special::NotFound.fallback(), Some(Fallback::NotFound));
        assert_eq!(Special::PanicHandler.fallback(), Some(Fallback::Panic));
        let files = Special::ServeFiles(Arc::new(crate::static_files::StaticFiles::new(".")));
        assert_eq!(files.fallback(), None);
        assert_eq!(format!("{files:?}"), "ServeFiles");
    }
}
