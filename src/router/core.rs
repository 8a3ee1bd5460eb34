//! Route table core - the compiled dispatch table and its request path.

use http::Method;
use smallvec::SmallVec;
use std::any::Any;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::radix::{clean_path, toggle_trailing_slash, RadixRouter};
use crate::handler::{handler_fn, BoxedHandler, HandlerRequest, HandlerResponse};
use crate::runtime_config::RouterConfig;
use crate::static_files::FileSource;

/// Maximum number of path/query parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage.
///
/// Names are `Arc<str>` shared with the route tree; values are per-request.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Name of the catch-all parameter a file server route must end with
pub const FILEPATH_PARAM: &str = "filepath";

/// Singleton fallback slots of a route table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fallback {
    /// Runs for automatic OPTIONS replies
    GlobalOptions,
    /// Runs when nothing matches
    NotFound,
    /// Runs when the path matches under other methods only
    MethodNotAllowed,
    /// Runs after a handler panicked
    Panic,
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Fallback::GlobalOptions => "GlobalOPTIONS",
            Fallback::NotFound => "NotFound",
            Fallback::MethodNotAllowed => "MethodNotAllowed",
            Fallback::Panic => "PanicHandler",
        })
    }
}

/// The payload of a recovered handler panic, available to the panic handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovered(pub String);

/// Route registration error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The pattern cannot be stored in the tree
    InvalidPattern {
        pattern: String,
        reason: &'static str,
    },
    /// A handler is already registered for this method and pattern
    DuplicateRoute { method: Method, pattern: String },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::InvalidPattern { pattern, reason } => {
                write!(f, "invalid route pattern '{pattern}': {reason}")
            }
            RouteError::DuplicateRoute { method, pattern } => {
                write!(f, "a handler is already registered for {method} {pattern}")
            }
        }
    }
}

impl std::error::Error for RouteError {}

/// Compiled dispatch table
///
/// Owns exact route storage, the fallback slots and the redirect/OPTIONS/405
/// toggles. Built once by the binder, then only read.
pub struct RouteTable {
    radix: RadixRouter,
    config: RouterConfig,
    global_options: Option<BoxedHandler>,
    not_found: Option<BoxedHandler>,
    method_not_allowed: Option<BoxedHandler>,
    panic_handler: Option<BoxedHandler>,
}

impl RouteTable {
    #[must_use]
    pub fn new(config: RouterConfig) -> Self {
        Self {
            radix: RadixRouter::new(),
            config,
            global_options: None,
            not_found: None,
            method_not_allowed: None,
            panic_handler: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Register a handler for `method` at `pattern`.
    pub fn handle(
        &mut self,
        method: Method,
        pattern: &str,
        handler: BoxedHandler,
    ) -> Result<(), RouteError> {
        self.radix.insert(method, pattern, handler)
    }

    /// Serve files from `source` under `pattern`, which must end in `/*filepath`.
    pub fn serve_files(
        &mut self,
        pattern: &str,
        source: Arc<dyn FileSource>,
    ) -> Result<(), RouteError> {
        if !pattern.ends_with("/*filepath") {
            return Err(RouteError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "path must end with /*filepath",
            });
        }
        let handler = handler_fn(move |req: &mut HandlerRequest, res: &mut HandlerResponse| {
            let file = req.get_path_param(FILEPATH_PARAM).unwrap_or("/");
            match source.open(file) {
                Ok((bytes, content_type)) => {
                    res.set_header("content-type", content_type.to_string());
                    res.write(&bytes);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    write_error(res, 404, "404 page not found");
                }
                Err(e) => {
                    warn!(file = %file, error = %e, "Static file read failed");
                    write_error(res, 500, "500 Internal Server Error");
                }
            }
        });
        self.radix.insert(Method::GET, pattern, handler)
    }

    /// Whether a fallback slot has been claimed
    #[must_use]
    pub fn is_set(&self, slot: Fallback) -> bool {
        self.slot(slot).is_some()
    }

    /// Install a fallback handler, replacing any previous one
    pub fn set_fallback(&mut self, slot: Fallback, handler: BoxedHandler) {
        let target = match slot {
            Fallback::GlobalOptions => &mut self.global_options,
            Fallback::NotFound => &mut self.not_found,
            Fallback::MethodNotAllowed => &mut self.method_not_allowed,
            Fallback::Panic => &mut self.panic_handler,
        };
        *target = Some(handler);
    }

    fn slot(&self, slot: Fallback) -> Option<&BoxedHandler> {
        match slot {
            Fallback::GlobalOptions => self.global_options.as_ref(),
            Fallback::NotFound => self.not_found.as_ref(),
            Fallback::MethodNotAllowed => self.method_not_allowed.as_ref(),
            Fallback::Panic => self.panic_handler.as_ref(),
        }
    }

    /// Every registered `(method, pattern)` pair
    #[must_use]
    pub fn routes(&self) -> Vec<(Method, Arc<str>)> {
        self.radix.routes()
    }

    /// Value of the `Allow` header for `path`, empty when nothing else matches.
    #[must_use]
    pub fn allowed(&self, path: &str, req_method: &Method) -> String {
        let mut allowed: Vec<&str> = self
            .radix
            .methods()
            .iter()
            .filter(|m| *m != req_method && **m != Method::OPTIONS)
            .filter(|m| path == "*" || self.radix.route(m, path).is_some())
            .map(Method::as_str)
            .collect();
        if allowed.is_empty() {
            return String::new();
        }
        allowed.push(Method::OPTIONS.as_str());
        allowed.sort_unstable();
        allowed.join(", ")
    }

    /// Dispatch one request.
    ///
    /// Custom NotFound and MethodNotAllowed handlers choose their own status;
    /// only the built-in replies write `404` and `405`.
    ///
    /// With a panic handler installed, a panicking handler is caught and the
    /// panic handler finishes the same response. Without one the panic
    /// propagates to the caller.
    pub fn serve(&self, req: &mut HandlerRequest) -> HandlerResponse {
        let mut res = HandlerResponse::default();
        let Some(panic_handler) = &self.panic_handler else {
            self.dispatch(req, &mut res);
            return res;
        };
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(req, &mut res)));
        if let Err(payload) = outcome {
            let message = panic_message(payload.as_ref());
            error!(
                request_id = %req.request_id,
                method = %req.method,
                path = %req.path,
                panic_message = %message,
                "Handler panicked - recovering"
            );
            req.extensions.insert(Recovered(message));
            panic_handler.serve(req, &mut res);
        }
        res
    }

    fn dispatch(&self, req: &mut HandlerRequest, res: &mut HandlerResponse) {
        let path = req.path.clone();
        if let Some((route, params)) = self.radix.route(&req.method, &path) {
            debug!(
                request_id = %req.request_id,
                method = %req.method,
                path = %path,
                route_pattern = %route.pattern,
                "Route matched"
            );
            req.path_params = params;
            req.route_pattern = Some(route.pattern);
            route.handler.serve(req, res);
            return;
        }

        debug!(method = %req.method, path = %path, "No route matched");

        if req.method != Method::CONNECT && path != "/" {
            let code = if req.method == Method::GET { 301 } else { 307 };
            if self.config.redirect_trailing_slash {
                let alternate = toggle_trailing_slash(&path);
                if self.radix.route(&req.method, &alternate).is_some() {
                    redirect(res, code, &alternate);
                    return;
                }
            }
            if self.config.redirect_fixed_path {
                if let Some(fixed) = self.radix.find_case_insensitive(
                    &req.method,
                    &clean_path(&path),
                    self.config.redirect_trailing_slash,
                ) {
                    redirect(res, code, &fixed);
                    return;
                }
            }
        }

        if req.method == Method::OPTIONS && self.config.handle_options {
            let allow = self.allowed(&path, &req.method);
            if !allow.is_empty() {
                res.set_header("allow", allow);
                if let Some(handler) = &self.global_options {
                    handler.serve(req, res);
                }
                return;
            }
        } else if self.config.handle_method_not_allowed {
            let allow = self.allowed(&path, &req.method);
            if !allow.is_empty() {
                res.set_header("allow", allow);
                match &self.method_not_allowed {
                    Some(handler) => handler.serve(req, res),
                    None => write_error(res, 405, "Method Not Allowed"),
                }
                return;
            }
        }

        match &self.not_found {
            Some(handler) => handler.serve(req, res),
            None => write_error(res, 404, "404 page not found"),
        }
    }
}

fn write_error(res: &mut HandlerResponse, status: u16, message: &str) {
    res.status = status;
    res.set_header("content-type", "text/plain; charset=utf-8".to_string());
    res.set_header("x-content-type-options", "nosniff".to_string());
    res.write(message.as_bytes());
    res.write(b"\n");
}

fn redirect(res: &mut HandlerResponse, code: u16, location: &str) {
    res.status = code;
    res.set_header("location", location.to_string());
    if code == 301 {
        res.set_header("content-type", "text/html; charset=utf-8".to_string());
        res.write(format!("<a href=\"{location}\">Moved Permanently</a>.\n\n").as_bytes());
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
