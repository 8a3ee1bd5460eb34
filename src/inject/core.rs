use http::Method;
use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::units::{Flow, RoutePattern, Unit};
use crate::chain::{Entry, FnMiddleware, HandlerMiddleware};
use crate::handler::{
    fn_from_handler, handler_fn, handler_from_fn, BoxedHandler, HandlerFn, HandlerRequest,
    HandlerResponse,
};
use crate::router::{Fallback, Recovered};

/// What a compiled chain is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindTarget {
    Route(Method),
    Fallback(Fallback),
}

/// Where a chain is being compiled: the target plus the full path pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindSite {
    pub target: BindTarget,
    pub path: String,
}

impl BindSite {
    pub fn route(method: Method, path: impl Into<String>) -> Self {
        Self {
            target: BindTarget::Route(method),
            path: path.into(),
        }
    }

    pub fn fallback(kind: Fallback, path: impl Into<String>) -> Self {
        Self {
            target: BindTarget::Fallback(kind),
            path: path.into(),
        }
    }
}

impl fmt::Display for BindSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            BindTarget::Route(method) => write!(f, "{method} {}", self.path),
            BindTarget::Fallback(kind) => write!(f, "{kind}"),
        }
    }
}

/// Chain resolution failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// An opaque provider this resolver does not understand
    UnsupportedProvider { provider: String },
    /// A unit requires a value nothing before it provides
    Unsatisfied {
        provider: String,
        missing: &'static str,
    },
    /// Entries follow the endpoint
    EndpointNotLast { endpoint: String },
    /// The chain never reaches an endpoint
    MissingEndpoint,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::UnsupportedProvider { provider } => {
                write!(f, "provider '{provider}' is not supported")
            }
            ResolveError::Unsatisfied { provider, missing } => write!(
                f,
                "'{provider}' requires {missing}, which nothing earlier in the chain provides"
            ),
            ResolveError::EndpointNotLast { endpoint } => {
                write!(f, "endpoint '{endpoint}' must be the last entry of the chain")
            }
            ResolveError::MissingEndpoint => f.write_str("chain has no endpoint"),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Turns a flattened chain into one handler
pub trait Resolver: Send + Sync {
    fn resolve(&self, chain: &[Entry], site: &BindSite) -> Result<BoxedHandler, ResolveError>;
}

/// Default resolver for the units built by [`value`](super::value),
/// [`Step`](super::Step) and [`Endpoint`](super::Endpoint)
#[derive(Debug, Default, Clone, Copy)]
pub struct Injector;

enum Layer<'a> {
    Handler(&'a HandlerMiddleware),
    HandlerFn(&'a FnMiddleware),
    Unit(&'a Unit),
}

impl Injector {
    fn validate<'a>(
        chain: &'a [Entry],
        site: &BindSite,
    ) -> Result<(Vec<Layer<'a>>, HandlerFn), ResolveError> {
        let mut available: HashSet<TypeId> = HashSet::new();
        available.insert(TypeId::of::<RoutePattern>());
        if site.target == BindTarget::Fallback(Fallback::Panic) {
            available.insert(TypeId::of::<Recovered>());
        }

        let mut layers = Vec::with_capacity(chain.len());
        let mut endpoint: Option<(&str, HandlerFn)> = None;

        for entry in chain {
            if let Some((name, _)) = &endpoint {
                return Err(ResolveError::EndpointNotLast {
                    endpoint: (*name).to_string(),
                });
            }
            match entry {
                Entry::WrapsHandler(mw) => layers.push(Layer::Handler(mw)),
                Entry::WrapsHandlerFn(mw) => layers.push(Layer::HandlerFn(mw)),
                Entry::Opaque(provider) => {
                    let unit = provider.downcast_ref::<Unit>().ok_or_else(|| {
                        ResolveError::UnsupportedProvider {
                            provider: provider.name().to_string(),
                        }
                    })?;
                    let unsatisfied = |missing: &'static str| ResolveError::Unsatisfied {
                        provider: provider.name().to_string(),
                        missing,
                    };
                    match unit {
                        Unit::Value { ty, .. } => {
                            available.insert(ty.id);
                            layers.push(Layer::Unit(unit));
                        }
                        Unit::Step {
                            requires, provides, ..
                        } => {
                            if let Some(t) = requires.iter().find(|t| !available.contains(&t.id)) {
                                return Err(unsatisfied(t.name));
                            }
                            available.extend(provides.iter().map(|t| t.id));
                            layers.push(Layer::Unit(unit));
                        }
                        Unit::Endpoint { requires, run } => {
                            if let Some(t) = requires.iter().find(|t| !available.contains(&t.id)) {
                                return Err(unsatisfied(t.name));
                            }
                            endpoint = Some((provider.name(), run.clone()));
                        }
                    }
                }
            }
        }

        match endpoint {
            Some((_, run)) => Ok((layers, run)),
            None => Err(ResolveError::MissingEndpoint),
        }
    }
}

impl Resolver for Injector {
    fn resolve(&self, chain: &[Entry], site: &BindSite) -> Result<BoxedHandler, ResolveError> {
        let (layers, endpoint) = Self::validate(chain, site)?;

        let mut handler = handler_from_fn(endpoint);
        for layer in layers.into_iter().rev() {
            let next = handler;
            handler = match layer {
                Layer::Handler(mw) => mw(next),
                Layer::HandlerFn(mw) => handler_from_fn(mw(fn_from_handler(next))),
                Layer::Unit(Unit::Value { insert, .. }) => {
                    let insert = insert.clone();
                    handler_fn(move |req: &mut HandlerRequest, res: &mut HandlerResponse| {
                        insert(&mut req.extensions);
                        next.serve(req, res);
                    })
                }
                Layer::Unit(Unit::Step { run, .. }) => {
                    let run = run.clone();
                    handler_fn(move |req: &mut HandlerRequest, res: &mut HandlerResponse| {
                        if run(req, res) == Flow::Continue {
                            next.serve(req, res);
                        }
                    })
                }
                // validate never yields the endpoint as a layer
                Layer::Unit(Unit::Endpoint { .. }) => next,
            };
        }

        let pattern: Arc<str> = Arc::from(site.path.as_str());
        Ok(handler_fn(
            move |req: &mut HandlerRequest, res: &mut HandlerResponse| {
                req.route_pattern = Some(pattern.clone());
                req.extensions.insert(RoutePattern(pattern.clone()));
                handler.serve(req, res);
            },
        ))
    }
}
