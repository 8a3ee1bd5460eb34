use crate::ids::RequestId;
use crate::router::ParamVec;
use http::{Extensions, HeaderName, HeaderValue, Method, StatusCode};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage.
///
/// Header names use `Arc<str>` so repeated names (`content-type`, `allow`)
/// clone in O(1); values are per-request data.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Request data handed to every handler in a compiled chain
#[derive(Debug)]
pub struct HandlerRequest {
    /// Unique request ID for tracing and correlation
    pub request_id: RequestId,
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// Path parameters filled in by the route table on a match
    pub path_params: ParamVec,
    /// Query string parameters
    pub query_params: ParamVec,
    /// HTTP headers
    pub headers: HeaderVec,
    /// Raw request body
    pub body: Vec<u8>,
    /// Full pattern of the route that matched (e.g. `/thing/:thingID`)
    pub route_pattern: Option<Arc<str>>,
    /// Values injected by providers earlier in the chain
    pub extensions: Extensions,
}

impl HandlerRequest {
    /// Build a request from a method and a path with an optional query string.
    #[must_use]
    pub fn new(method: Method, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (uri, None),
        };
        Self {
            request_id: RequestId::new(),
            method,
            path: path.to_string(),
            path_params: ParamVec::new(),
            query_params: parse_query(query),
            headers: HeaderVec::new(),
            body: Vec::new(),
            route_pattern: None,
            extensions: Extensions::new(),
        }
    }

    /// Convert an `http::Request`, keeping the inbound `X-Request-Id` when valid.
    #[must_use]
    pub fn from_http(req: http::Request<Vec<u8>>) -> Self {
        let (parts, body) = req.into_parts();
        let mut headers = HeaderVec::new();
        for (name, value) in &parts.headers {
            if let Ok(value) = value.to_str() {
                headers.push((Arc::from(name.as_str()), value.to_string()));
            }
        }
        let request_id = RequestId::from_header_or_new(
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("x-request-id"))
                .map(|(_, v)| v.as_str()),
        );
        Self {
            request_id,
            method: parts.method,
            path: parts.uri.path().to_string(),
            path_params: ParamVec::new(),
            query_params: parse_query(parts.uri.query()),
            headers,
            body,
            route_pattern: None,
            extensions: parts.extensions,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((Arc::from(name), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Get a path parameter by name
    ///
    /// Uses "last write wins" semantics when a name repeats at different depths.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name (last occurrence wins)
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn parse_query(query: Option<&str>) -> ParamVec {
    match query {
        Some(q) => url::form_urlencoded::parse(q.as_bytes())
            .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
            .collect(),
        None => ParamVec::new(),
    }
}

/// Response being written by a chain
///
/// Starts as an empty `200`; handlers set the status and append to the body.
#[derive(Debug, Clone)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    /// HTTP response headers
    pub headers: HeaderVec,
    /// Response body bytes written so far
    pub body: Vec<u8>,
}

impl Default for HandlerResponse {
    fn default() -> Self {
        Self::new(200)
    }
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            body: Vec::new(),
        }
    }

    /// Plain-text response
    #[must_use]
    pub fn text(status: u16, body: &str) -> Self {
        let mut res = Self::new(status);
        res.set_header("content-type", "text/plain; charset=utf-8".to_string());
        res.write(body.as_bytes());
        res
    }

    /// JSON response with the content type set
    #[must_use]
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        let mut res = Self::new(status);
        res.set_header("content-type", "application/json".to_string());
        res.body = body.to_string().into_bytes();
        res
    }

    /// Append bytes to the body
    pub fn write(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }

    /// Body decoded as UTF-8 (lossy)
    #[must_use]
    pub fn body_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Convert into an `http::Response`, dropping headers that are not valid HTTP.
    #[must_use]
    pub fn into_http(self) -> http::Response<Vec<u8>> {
        let mut res = http::Response::new(self.body);
        *res.status_mut() =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                res.headers_mut().append(name, value);
            }
        }
        res
    }
}

/// A request handler object
pub trait Handler: Send + Sync {
    fn serve(&self, req: &mut HandlerRequest, res: &mut HandlerResponse);
}

/// Shared handler object
pub type BoxedHandler = Arc<dyn Handler>;

/// Shared handler function
pub type HandlerFn = Arc<dyn Fn(&mut HandlerRequest, &mut HandlerResponse) + Send + Sync>;

struct FnHandler<F>(F);

impl<F> Handler for FnHandler<F>
where
    F: Fn(&mut HandlerRequest, &mut HandlerResponse) + Send + Sync,
{
    fn serve(&self, req: &mut HandlerRequest, res: &mut HandlerResponse) {
        (self.0)(req, res)
    }
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnHandler")
    }
}

/// Turn a closure into a handler object
pub fn handler_fn<F>(f: F) -> BoxedHandler
where
    F: Fn(&mut HandlerRequest, &mut HandlerResponse) + Send + Sync + 'static,
{
    Arc::new(FnHandler(f))
}

/// Bridge a handler function into the handler-object convention
#[must_use]
pub fn handler_from_fn(f: HandlerFn) -> BoxedHandler {
    handler_fn(move |req: &mut HandlerRequest, res: &mut HandlerResponse| f(req, res))
}

/// Bridge a handler object into the handler-function convention
#[must_use]
pub fn fn_from_handler(h: BoxedHandler) -> HandlerFn {
    Arc::new(move |req: &mut HandlerRequest, res: &mut HandlerResponse| h.serve(req, res))
}
