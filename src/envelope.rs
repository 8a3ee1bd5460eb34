//! # Envelope Module
//!
//! Ready-made chain units for the request/response envelope:
//!
//! - [`read_body`] - makes the request bytes available as [`Body`]
//! - [`decode_json`] - decodes [`Body`] into [`Json<T>`], answering `400` on bad input
//! - [`decode_xml`] - the same for XML into [`Xml<T>`]
//! - [`catch_panic`] - turns a panic further down the chain into a `500`
//! - [`respond_json`] - endpoint writing a serializable result as JSON
//!
//! ```rust
//! use nestmux::envelope::{decode_json, read_body, respond_json, Json};
//! use nestmux::handler::HandlerRequest;
//! use nestmux::{chain, Router};
//! use http::Method;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Deserialize, Serialize)]
//! struct Pet {
//!     name: String,
//! }
//!
//! let router = Router::new();
//! router.using([read_body()]);
//! router.post(
//!     "/pets",
//!     chain![
//!         decode_json::<Pet>(),
//!         respond_json("create_pet", |req: &mut HandlerRequest| {
//!             let pet = req.extensions.get::<Json<Pet>>().map(|j| j.0.clone());
//!             Ok::<_, String>(pet)
//!         }),
//!     ],
//! );
//!
//! let req = HandlerRequest::new(Method::POST, "/pets").with_body(r#"{"name":"Rex"}"#);
//! let res = router.serve(req);
//! assert_eq!(res.body_str(), r#"{"name":"Rex"}"#);
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use tracing::{error, warn};

use crate::chain::Entry;
use crate::handler::{handler_fn, BoxedHandler, HandlerRequest, HandlerResponse};
use crate::inject::{Endpoint, Flow, Step};
use crate::router::panic_message;

/// Raw request body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body(pub Vec<u8>);

/// A decoded JSON request body
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

/// A decoded XML request body
#[derive(Debug, Clone, PartialEq)]
pub struct Xml<T>(pub T);

/// Provide the request bytes as [`Body`].
#[must_use]
pub fn read_body() -> Step {
    Step::new("read_body", |req: &mut HandlerRequest, _res: &mut HandlerResponse| {
        let body = Body(req.body.clone());
        req.extensions.insert(body);
        Flow::Continue
    })
    .provides::<Body>()
}

/// Decode [`Body`] as JSON into [`Json<T>`].
///
/// A missing `Content-Type` is treated as JSON. Any other non-JSON content
/// type answers `415`; a body that does not decode answers `400`.
#[must_use]
pub fn decode_json<T>() -> Step
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    let name = format!("decode_json<{}>", std::any::type_name::<T>());
    decode_body(name, "json", "JSON", |bytes: &[u8]| {
        serde_json::from_slice::<T>(bytes)
            .map(Json)
            .map_err(|e| e.to_string())
    })
    .provides::<Json<T>>()
}

/// Decode [`Body`] as XML into [`Xml<T>`].
///
/// Same rules as [`decode_json`]: no `Content-Type` is accepted, a non-XML
/// one answers `415`, a body that does not decode answers `400`.
#[must_use]
pub fn decode_xml<T>() -> Step
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    let name = format!("decode_xml<{}>", std::any::type_name::<T>());
    decode_body(name, "xml", "XML", |bytes: &[u8]| {
        quick_xml::de::from_reader::<_, T>(bytes)
            .map(Xml)
            .map_err(|e| e.to_string())
    })
    .provides::<Xml<T>>()
}

fn decode_body<D, F>(name: String, media: &'static str, label: &'static str, decode: F) -> Step
where
    D: Clone + Send + Sync + 'static,
    F: Fn(&[u8]) -> Result<D, String> + Send + Sync + 'static,
{
    Step::new(name, move |req: &mut HandlerRequest, res: &mut HandlerResponse| {
        if let Some(ct) = req.get_header("content-type") {
            if !ct.contains(media) {
                *res = HandlerResponse::text(415, &format!("unsupported content type: {ct}"));
                return Flow::Halt;
            }
        }
        let bytes: &[u8] = req
            .extensions
            .get::<Body>()
            .map_or(&[][..], |b| b.0.as_slice());
        match decode(bytes) {
            Ok(value) => {
                req.extensions.insert(value);
                Flow::Continue
            }
            Err(e) => {
                warn!(
                    request_id = %req.request_id,
                    path = %req.path,
                    format = label,
                    error = %e,
                    "Request body failed to decode"
                );
                *res = HandlerResponse::text(400, &format!("invalid {label} body: {e}"));
                Flow::Halt
            }
        }
    })
    .requires::<Body>()
}

/// Recover panics from the rest of the chain as `500 panic: <message>`.
///
/// Anything written before the panic is discarded.
#[must_use]
pub fn catch_panic() -> Entry {
    Entry::wraps_handler(|next: BoxedHandler| {
        handler_fn(move |req: &mut HandlerRequest, res: &mut HandlerResponse| {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| next.serve(req, res)));
            if let Err(payload) = outcome {
                let message = panic_message(payload.as_ref());
                error!(
                    request_id = %req.request_id,
                    method = %req.method,
                    path = %req.path,
                    panic_message = %message,
                    "Handler panicked - recovering"
                );
                *res = HandlerResponse::text(500, &format!("panic: {message}"));
            }
        })
    })
}

/// Endpoint writing the result of `f`.
///
/// `Ok(Some(v))` is `200` with `v` as JSON, `Ok(None)` is `204`, `Err(e)` is
/// `500` with `e` as text.
pub fn respond_json<F, V, E>(name: impl Into<Cow<'static, str>>, f: F) -> Endpoint
where
    F: Fn(&mut HandlerRequest) -> Result<Option<V>, E> + Send + Sync + 'static,
    V: Serialize,
    E: Display,
{
    Endpoint::new(name, move |req: &mut HandlerRequest, res: &mut HandlerResponse| {
        match f(req) {
            Ok(Some(value)) => match serde_json::to_vec(&value) {
                Ok(body) => {
                    res.status = 200;
                    res.set_header("content-type", "application/json".to_string());
                    res.write(&body);
                }
                Err(e) => {
                    error!(error = %e, "Response failed to serialize");
                    *res = HandlerResponse::text(500, &e.to_string());
                }
            },
            Ok(None) => res.status = 204,
            Err(e) => *res = HandlerResponse::text(500, &e.to_string()),
        }
    })
}
