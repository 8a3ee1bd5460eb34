use std::any::{type_name, Any, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::chain::{Entry, Provider};
use crate::handler::{HandlerFn, HandlerRequest, HandlerResponse};

/// Full path pattern of the site a chain was compiled for (e.g. `/thing/:thingID`)
///
/// Always available to every unit of a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern(pub Arc<str>);

impl RoutePattern {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Whether a [`Step`] lets the rest of the chain run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Halt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TypeTag {
    pub id: TypeId,
    pub name: &'static str,
}

impl TypeTag {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }
}

type Insert = Arc<dyn Fn(&mut http::Extensions) + Send + Sync>;
type StepFn = Arc<dyn Fn(&mut HandlerRequest, &mut HandlerResponse) -> Flow + Send + Sync>;

/// Payload carried by the providers this module hands out
pub(crate) enum Unit {
    Value {
        ty: TypeTag,
        insert: Insert,
    },
    Step {
        requires: Vec<TypeTag>,
        provides: Vec<TypeTag>,
        run: StepFn,
    },
    Endpoint {
        requires: Vec<TypeTag>,
        run: HandlerFn,
    },
}

/// A constant made available to everything after it in the chain.
///
/// Each request receives its own clone through the request extensions.
pub fn value<T>(v: T) -> Provider
where
    T: Clone + Send + Sync + 'static,
{
    let insert: Insert = Arc::new(move |ext: &mut http::Extensions| {
        ext.insert(v.clone());
    });
    Provider::new(
        format!("value<{}>", type_name::<T>()),
        Unit::Value {
            ty: TypeTag::of::<T>(),
            insert,
        },
    )
}

/// An intermediate unit: may read what earlier units provided, add values of
/// its own, write to the response and stop the chain.
pub struct Step {
    name: Cow<'static, str>,
    requires: Vec<TypeTag>,
    provides: Vec<TypeTag>,
    run: StepFn,
}

impl Step {
    pub fn new<F>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(&mut HandlerRequest, &mut HandlerResponse) -> Flow + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            requires: Vec::new(),
            provides: Vec::new(),
            run: Arc::new(f),
        }
    }

    /// Declare that a `T` must be in the request extensions when this step runs
    #[must_use]
    pub fn requires<T: Any>(mut self) -> Self {
        self.requires.push(TypeTag::of::<T>());
        self
    }

    /// Declare that this step inserts a `T` before continuing
    #[must_use]
    pub fn provides<T: Any>(mut self) -> Self {
        self.provides.push(TypeTag::of::<T>());
        self
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("requires", &names(&self.requires))
            .field("provides", &names(&self.provides))
            .finish()
    }
}

impl From<Step> for Provider {
    fn from(step: Step) -> Self {
        Provider::new(
            step.name,
            Unit::Step {
                requires: step.requires,
                provides: step.provides,
                run: step.run,
            },
        )
    }
}

impl From<Step> for Entry {
    fn from(step: Step) -> Self {
        Entry::Opaque(step.into())
    }
}

/// The terminal unit of a chain
pub struct Endpoint {
    name: Cow<'static, str>,
    requires: Vec<TypeTag>,
    run: HandlerFn,
}

impl Endpoint {
    pub fn new<F>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(&mut HandlerRequest, &mut HandlerResponse) + Send + Sync + 'static,
    {
        Self::from_fn(name, Arc::new(f))
    }

    pub fn from_fn(name: impl Into<Cow<'static, str>>, run: HandlerFn) -> Self {
        Self {
            name: name.into(),
            requires: Vec::new(),
            run,
        }
    }

    #[must_use]
    pub fn requires<T: Any>(mut self) -> Self {
        self.requires.push(TypeTag::of::<T>());
        self
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("requires", &names(&self.requires))
            .finish()
    }
}

impl From<Endpoint> for Provider {
    fn from(endpoint: Endpoint) -> Self {
        Provider::new(
            endpoint.name,
            Unit::Endpoint {
                requires: endpoint.requires,
                run: endpoint.run,
            },
        )
    }
}

impl From<Endpoint> for Entry {
    fn from(endpoint: Endpoint) -> Self {
        Entry::Opaque(endpoint.into())
    }
}

fn names(tags: &[TypeTag]) -> Vec<&'static str> {
    tags.iter().map(|t| t.name).collect()
}
