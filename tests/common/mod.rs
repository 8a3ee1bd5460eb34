#![allow(dead_code)]

//! Shared building blocks for the integration tests.
//!
//! Chains in these tests thread a `String` through the request extensions:
//! [`seed`] provides an empty one, [`down`] appends to it on the way in,
//! [`bottom`] writes it out, and [`up1`]/[`up2`] append to the response on
//! the way out. The response body therefore spells the execution order.

use std::sync::Arc;

use http::Method;
use nestmux::handler::{BoxedHandler, HandlerFn, HandlerRequest, HandlerResponse};
use nestmux::inject::{value, Endpoint, Flow, Step};
use nestmux::{Entry, Provider, Router};

pub fn seed() -> Provider {
    value(String::new())
}

/// Step appending `s` to the threaded string
pub fn down(s: &'static str) -> Entry {
    Step::new(
        format!("down {s}"),
        move |req: &mut HandlerRequest, _res: &mut HandlerResponse| {
            if let Some(acc) = req.extensions.get_mut::<String>() {
                acc.push_str(s);
            }
            Flow::Continue
        },
    )
    .requires::<String>()
    .provides::<String>()
    .into()
}

/// Handler-object middleware writing `s` after the inner handler
pub fn up1(s: &'static str) -> Entry {
    Entry::wraps_handler(move |next: BoxedHandler| {
        nestmux::handler::handler_fn(move |req: &mut HandlerRequest, res: &mut HandlerResponse| {
            next.serve(req, res);
            res.write(s.as_bytes());
        })
    })
}

/// Handler-function middleware writing `s` after the inner handler
pub fn up2(s: &'static str) -> Entry {
    Entry::wraps_handler_fn(move |next: HandlerFn| {
        Arc::new(move |req: &mut HandlerRequest, res: &mut HandlerResponse| {
            next(req, res);
            res.write(s.as_bytes());
        })
    })
}

/// Endpoint writing the threaded string
pub fn bottom() -> Entry {
    Endpoint::new("bottom", |req: &mut HandlerRequest, res: &mut HandlerResponse| {
        let acc = req.extensions.get::<String>().cloned().unwrap_or_default();
        res.write(acc.as_bytes());
    })
    .requires::<String>()
    .into()
}

/// Expected body for a request path
pub struct Case {
    pub path: &'static str,
    pub want: &'static str,
}

pub fn case(path: &'static str, want: &'static str) -> Case {
    Case { path, want }
}

pub fn send(router: &Router, method: Method, path: &str) -> HandlerResponse {
    router.serve(HandlerRequest::new(method, path))
}

pub fn do_test(router: &Router, cases: &[Case]) {
    do_test_method(router, Method::GET, cases);
}

pub fn do_test_method(router: &Router, method: Method, cases: &[Case]) {
    for tc in cases {
        let res = send(router, method.clone(), tc.path);
        assert_eq!(res.body_str(), tc.want, "{method} {}", tc.path);
    }
}

pub mod temp_files {
    use std::fs;
    use tempfile::TempDir;

    /// Directory populated with `(relative path, contents)` pairs
    pub fn static_dir(files: &[(&str, &str)]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, contents).unwrap();
        }
        dir
    }
}
