//! # Chain Module
//!
//! A chain is the ordered list of units applied around an endpoint. Every
//! unit is one of three kinds:
//!
//! - [`Entry::WrapsHandler`] - middleware taking and returning a [`BoxedHandler`]
//! - [`Entry::WrapsHandlerFn`] - middleware taking and returning a [`HandlerFn`]
//! - [`Entry::Opaque`] - a [`Provider`] value only the resolution engine understands
//!
//! [`flatten`] pre-composes every maximal run of same-kind middleware into a
//! single wrapper. Opaque providers keep their position and split runs, so two
//! runs of the same kind on either side of a provider stay separate.
//!
//! ```rust
//! use nestmux::chain::{flatten, Entry};
//! use nestmux::inject;
//!
//! let noop = || Entry::wraps_handler(|next| next);
//! let flat = flatten(vec![noop(), noop(), inject::value(1u32).into(), noop()]);
//! assert_eq!(flat.len(), 3);
//! ```

use crate::handler::{BoxedHandler, HandlerFn};
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Middleware over handler objects
pub type HandlerMiddleware = Arc<dyn Fn(BoxedHandler) -> BoxedHandler + Send + Sync>;

/// Middleware over handler functions
pub type FnMiddleware = Arc<dyn Fn(HandlerFn) -> HandlerFn + Send + Sync>;

/// An uninterpreted provider value
///
/// The builder and binder only carry providers along in order; the resolution
/// engine decides what the payload means.
#[derive(Clone)]
pub struct Provider {
    name: Cow<'static, str>,
    payload: Arc<dyn Any + Send + Sync>,
}

impl Provider {
    pub fn new<T>(name: impl Into<Cow<'static, str>>, payload: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            name: name.into(),
            payload: Arc::new(payload),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Provider").field(&self.name).finish()
    }
}

/// One unit of a chain
#[derive(Clone)]
pub enum Entry {
    WrapsHandler(HandlerMiddleware),
    WrapsHandlerFn(FnMiddleware),
    Opaque(Provider),
}

impl Entry {
    pub fn wraps_handler<F>(f: F) -> Self
    where
        F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
    {
        Entry::WrapsHandler(Arc::new(f))
    }

    pub fn wraps_handler_fn<F>(f: F) -> Self
    where
        F: Fn(HandlerFn) -> HandlerFn + Send + Sync + 'static,
    {
        Entry::WrapsHandlerFn(Arc::new(f))
    }

    /// Provider carried by an opaque entry
    #[must_use]
    pub fn provider(&self) -> Option<&Provider> {
        match self {
            Entry::Opaque(p) => Some(p),
            _ => None,
        }
    }
}

impl From<Provider> for Entry {
    fn from(p: Provider) -> Self {
        Entry::Opaque(p)
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::WrapsHandler(_) => f.write_str("WrapsHandler"),
            Entry::WrapsHandlerFn(_) => f.write_str("WrapsHandlerFn"),
            Entry::Opaque(p) => write!(f, "Opaque({})", p.name()),
        }
    }
}

/// Build a `Vec<Entry>` from values of mixed entry types.
///
/// ```rust
/// use nestmux::{chain, inject, Entry};
///
/// let entries = chain![Entry::wraps_handler(|next| next), inject::value("x".to_string())];
/// assert_eq!(entries.len(), 2);
/// ```
#[macro_export]
macro_rules! chain {
    ($($entry:expr),* $(,)?) => {
        ::std::vec![$($crate::chain::Entry::from($entry)),*]
    };
}

enum Run {
    Empty,
    Handler(Vec<HandlerMiddleware>),
    HandlerFn(Vec<FnMiddleware>),
}

impl Run {
    fn flush_into(&mut self, out: &mut Vec<Entry>) {
        match std::mem::replace(self, Run::Empty) {
            Run::Empty => {}
            Run::Handler(mut layers) => {
                if layers.len() == 1 {
                    out.extend(layers.pop().map(Entry::WrapsHandler));
                } else {
                    out.push(Entry::WrapsHandler(compose_handler(layers)));
                }
            }
            Run::HandlerFn(mut layers) => {
                if layers.len() == 1 {
                    out.extend(layers.pop().map(Entry::WrapsHandlerFn));
                } else {
                    out.push(Entry::WrapsHandlerFn(compose_handler_fn(layers)));
                }
            }
        }
    }
}

/// First layer ends up outermost, exactly as if applied one by one.
fn compose_handler(layers: Vec<HandlerMiddleware>) -> HandlerMiddleware {
    Arc::new(move |next: BoxedHandler| {
        layers
            .iter()
            .rev()
            .fold(next, |inner, layer| layer(inner))
    })
}

fn compose_handler_fn(layers: Vec<FnMiddleware>) -> FnMiddleware {
    Arc::new(move |next: HandlerFn| {
        layers
            .iter()
            .rev()
            .fold(next, |inner, layer| layer(inner))
    })
}

/// Merge consecutive same-kind middleware into single wrappers.
///
/// Total over any input; the relative order of everything is preserved.
pub fn flatten<I>(entries: I) -> Vec<Entry>
where
    I: IntoIterator<Item = Entry>,
{
    let entries = entries.into_iter();
    let mut out = Vec::with_capacity(entries.size_hint().0);
    let mut run = Run::Empty;
    for entry in entries {
        match (entry, &mut run) {
            (Entry::WrapsHandler(mw), Run::Handler(layers)) => layers.push(mw),
            (Entry::WrapsHandlerFn(mw), Run::HandlerFn(layers)) => layers.push(mw),
            (Entry::WrapsHandler(mw), run) => {
                run.flush_into(&mut out);
                *run = Run::Handler(vec![mw]);
            }
            (Entry::WrapsHandlerFn(mw), run) => {
                run.flush_into(&mut out);
                *run = Run::HandlerFn(vec![mw]);
            }
            (opaque @ Entry::Opaque(_), run) => {
                run.flush_into(&mut out);
                out.push(opaque);
            }
        }
    }
    run.flush_into(&mut out);
    out
}
