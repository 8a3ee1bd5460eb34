//! Radix tree for route matching
//!
//! Paths are split on `/` and stored one segment per node:
//! - static segments (e.g. `users`) match exactly
//! - parameter segments (`:id` or `{id}`) match any non-empty segment
//! - a trailing catch-all (`*filepath`) matches the rest of the path
//!
//! Lookup tries static children first, then parameter children, then the
//! catch-all, backtracking on failure. A trailing slash is a segment of its
//! own (the empty one), so `/a` and `/a/` are different routes.

use http::Method;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use super::core::{ParamVec, RouteError};
use crate::handler::BoxedHandler;

/// A registered route: its full pattern and compiled handler
#[derive(Clone)]
pub(crate) struct Route {
    pub pattern: Arc<str>,
    pub handler: BoxedHandler,
}

enum Segment<'a> {
    Static(&'a str),
    Param(&'a str),
    CatchAll(&'a str),
}

fn classify(segment: &str) -> Segment<'_> {
    if let Some(name) = segment.strip_prefix(':') {
        Segment::Param(name)
    } else if let Some(name) = segment.strip_prefix('*') {
        Segment::CatchAll(name)
    } else if segment.starts_with('{') && segment.ends_with('}') && segment.len() >= 2 {
        Segment::Param(&segment[1..segment.len() - 1])
    } else {
        Segment::Static(segment)
    }
}

/// Split a path into segments; `/` is `[""]` and `/a/` is `["a", ""]`.
pub(crate) fn split(path: &str) -> Vec<&str> {
    path.strip_prefix('/').unwrap_or(path).split('/').collect()
}

/// Split a request path, then percent-decode each segment.
///
/// Splitting first keeps an encoded `/` (`%2F`) inside its segment. A segment
/// that does not decode to UTF-8 is matched as sent.
fn split_decoded(path: &str) -> Vec<Cow<'_, str>> {
    split(path)
        .into_iter()
        .map(|segment| urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment)))
        .collect()
}

#[derive(Clone)]
struct RadixNode {
    /// The path segment this node represents (without leading /)
    segment: Cow<'static, str>,
    /// Routes terminating at this node, per HTTP method
    routes: HashMap<Method, Route>,
    /// Parameter name if this is a parameter node
    param_name: Option<Arc<str>>,
    /// Static children
    children: Vec<RadixNode>,
    /// Parameter children; several names may share a position
    param_children: Vec<RadixNode>,
    /// Catch-all child, always terminal
    catch_all: Option<Box<RadixNode>>,
}

impl RadixNode {
    fn new(segment: Cow<'static, str>) -> Self {
        Self {
            segment,
            routes: HashMap::new(),
            param_name: None,
            children: Vec::new(),
            param_children: Vec::new(),
            catch_all: None,
        }
    }

    fn new_param(name: &str) -> Self {
        let mut node = Self::new(Cow::Borrowed(""));
        node.param_name = Some(Arc::from(name));
        node
    }

    fn insert(&mut self, segments: &[&str], method: Method, route: Route) -> Result<(), RouteError> {
        let Some((&segment, remaining)) = segments.split_first() else {
            if self.routes.contains_key(&method) {
                return Err(RouteError::DuplicateRoute {
                    method,
                    pattern: route.pattern.to_string(),
                });
            }
            self.routes.insert(method, route);
            return Ok(());
        };

        match classify(segment) {
            Segment::Param(name) => {
                if name.is_empty() {
                    return Err(invalid(&route, "empty parameter name"));
                }
                if let Some(child) = self
                    .param_children
                    .iter_mut()
                    .find(|c| c.param_name.as_deref() == Some(name))
                {
                    return child.insert(remaining, method, route);
                }
                let mut child = RadixNode::new_param(name);
                child.insert(remaining, method, route)?;
                self.param_children.push(child);
                Ok(())
            }
            Segment::CatchAll(name) => {
                if name.is_empty() {
                    return Err(invalid(&route, "empty catch-all name"));
                }
                if !remaining.is_empty() {
                    return Err(invalid(&route, "catch-all must be the final segment"));
                }
                match &mut self.catch_all {
                    Some(child) if child.param_name.as_deref() == Some(name) => {
                        child.insert(remaining, method, route)
                    }
                    Some(_) => Err(invalid(&route, "conflicting catch-all name")),
                    None => {
                        let mut child = RadixNode::new_param(name);
                        child.insert(remaining, method, route)?;
                        self.catch_all = Some(Box::new(child));
                        Ok(())
                    }
                }
            }
            Segment::Static(segment) => {
                if let Some(child) = self.children.iter_mut().find(|c| c.segment == segment) {
                    return child.insert(remaining, method, route);
                }
                let mut child = RadixNode::new(Cow::Owned(segment.to_string()));
                child.insert(remaining, method, route)?;
                self.children.push(child);
                Ok(())
            }
        }
    }

    fn search(&self, segments: &[&str], method: &Method, params: &mut ParamVec) -> Option<&Route> {
        let Some((&segment, remaining)) = segments.split_first() else {
            return self.routes.get(method);
        };

        for child in &self.children {
            if child.segment == segment {
                if let Some(route) = child.search(remaining, method, params) {
                    return Some(route);
                }
            }
        }

        if !segment.is_empty() {
            for param_child in &self.param_children {
                if let Some(name) = &param_child.param_name {
                    let mark = params.len();
                    params.push((Arc::clone(name), segment.to_string()));
                    if let Some(route) = param_child.search(remaining, method, params) {
                        return Some(route);
                    }
                    // Backtrack
                    params.truncate(mark);
                }
            }
        }

        if let Some(catch_all) = &self.catch_all {
            if let (Some(route), Some(name)) = (catch_all.routes.get(method), &catch_all.param_name) {
                params.push((Arc::clone(name), format!("/{}", segments.join("/"))));
                return Some(route);
            }
        }

        None
    }

    /// Like `search` but static segments compare case-insensitively; collects
    /// the corrected segments into `out`.
    fn search_ci(&self, segments: &[&str], method: &Method, out: &mut Vec<String>) -> bool {
        let Some((&segment, remaining)) = segments.split_first() else {
            return self.routes.contains_key(method);
        };

        for child in &self.children {
            if child.segment.eq_ignore_ascii_case(segment) {
                out.push(child.segment.to_string());
                if child.search_ci(remaining, method, out) {
                    return true;
                }
                out.pop();
            }
        }

        if !segment.is_empty() {
            for param_child in &self.param_children {
                out.push(segment.to_string());
                if param_child.search_ci(remaining, method, out) {
                    return true;
                }
                out.pop();
            }
        }

        if let Some(catch_all) = &self.catch_all {
            if catch_all.routes.contains_key(method) {
                out.extend(segments.iter().map(|s| s.to_string()));
                return true;
            }
        }

        false
    }

    fn collect(&self, out: &mut Vec<(Method, Arc<str>)>) {
        for (method, route) in &self.routes {
            out.push((method.clone(), Arc::clone(&route.pattern)));
        }
        for child in self
            .children
            .iter()
            .chain(self.param_children.iter())
            .chain(self.catch_all.as_deref())
        {
            child.collect(out);
        }
    }
}

fn invalid(route: &Route, reason: &'static str) -> RouteError {
    RouteError::InvalidPattern {
        pattern: route.pattern.to_string(),
        reason,
    }
}

/// Radix tree-based route storage
///
/// Insertion and lookup are O(k) in the number of path segments, independent
/// of how many routes are registered.
#[derive(Clone)]
pub(crate) struct RadixRouter {
    root: RadixNode,
    /// Methods with at least one route, in registration order
    methods: Vec<Method>,
}

impl RadixRouter {
    pub fn new() -> Self {
        Self {
            root: RadixNode::new(Cow::Borrowed("")),
            methods: Vec::new(),
        }
    }

    pub fn insert(&mut self, method: Method, pattern: &str, handler: BoxedHandler) -> Result<(), RouteError> {
        if !pattern.starts_with('/') {
            return Err(RouteError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "path must begin with '/'",
            });
        }
        let route = Route {
            pattern: Arc::from(pattern),
            handler,
        };
        self.root.insert(&split(pattern), method.clone(), route)?;
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
        Ok(())
    }

    /// Look up a request path; segments are matched percent-decoded.
    pub fn route(&self, method: &Method, path: &str) -> Option<(Route, ParamVec)> {
        let decoded = split_decoded(path);
        let segments: Vec<&str> = decoded.iter().map(AsRef::as_ref).collect();
        let mut params = ParamVec::new();
        let route = self.root.search(&segments, method, &mut params)?;
        Some((route.clone(), params))
    }

    /// Case-insensitive lookup returning the path with the registered casing.
    pub fn find_case_insensitive(
        &self,
        method: &Method,
        path: &str,
        fix_trailing_slash: bool,
    ) -> Option<String> {
        let lookup = |p: &str| {
            let mut out = Vec::new();
            self.root
                .search_ci(&split(p), method, &mut out)
                .then(|| format!("/{}", out.join("/")))
        };
        lookup(path).or_else(|| {
            if fix_trailing_slash {
                lookup(&toggle_trailing_slash(path))
            } else {
                None
            }
        })
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn routes(&self) -> Vec<(Method, Arc<str>)> {
        let mut out = Vec::new();
        self.root.collect(&mut out);
        out
    }
}

/// `/a/` becomes `/a` and `/a` becomes `/a/`.
pub(crate) fn toggle_trailing_slash(path: &str) -> String {
    match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => format!("{path}/"),
    }
}

/// Remove `.`, `..` and repeated slashes, keeping a trailing slash.
pub(crate) fn clean_path(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            s => stack.push(s),
        }
    }
    let mut cleaned = format!("/{}", stack.join("/"));
    let trailing = path.ends_with('/') || path.ends_with("/.") || path.ends_with("/..");
    if trailing && cleaned.len() > 1 {
        cleaned.push('/');
    }
    cleaned
}
