use super::{BindError, Router};
use crate::chain::{Entry, Provider};
use crate::handler::{handler_fn, BoxedHandler, HandlerRequest, HandlerResponse};
use crate::inject::{BindSite, BindTarget, ResolveError, Resolver};
use crate::router::Fallback;
use crate::static_files::StaticFiles;
use http::Method;
use parking_lot::Mutex;
use std::error::Error;
use std::sync::Arc;

/// Records every chain it is asked to resolve as the list of provider names.
#[derive(Clone, Default)]
struct Recorder {
    seen: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    fail_on: Option<&'static str>,
}

impl Resolver for Recorder {
    fn resolve(&self, chain: &[Entry], site: &BindSite) -> Result<BoxedHandler, ResolveError> {
        let names: Vec<String> = chain
            .iter()
            .map(|e| e.provider().map_or("mw", |p| p.name()).to_string())
            .collect();
        self.seen.lock().push((site.to_string(), names.clone()));
        if let Some(bad) = self.fail_on {
            if names.iter().any(|n| n == bad) {
                return Err(ResolveError::MissingEndpoint);
            }
        }
        let body = names.join("");
        Ok(handler_fn(
            move |_req: &mut HandlerRequest, res: &mut HandlerResponse| res.write(body.as_bytes()),
        ))
    }
}

fn p(name: &'static str) -> Provider {
    Provider::new(name, ())
}

fn recorded(rec: &Recorder) -> Vec<(String, String)> {
    rec.seen
        .lock()
        .iter()
        .map(|(site, names)| (site.clone(), names.join("")))
        .collect()
}

#[test]
fn test_chains_capture_parent_at_creation() {
    let rec = Recorder::default();
    let router = Router::new().with_resolver(rec.clone());
    router.using([p("a")]);
    router.get("/one", [p("1")]);
    router.using([p("b")]);
    let branch = router.with([p("w")]);
    router.using([p("c")]);
    branch.get("/two", [p("2")]);
    branch.using([p("x")]);
    branch.get("/three", [p("3")]);
    router.group(|g| {
        g.using([p("g")]);
        g.get("/four", [p("4")]);
    });
    router.bind().unwrap();

    assert_eq!(
        recorded(&rec),
        vec![
            ("GET /one".to_string(), "a1".to_string()),
            ("GET /two".to_string(), "abw2".to_string()),
            ("GET /three".to_string(), "abwx3".to_string()),
            ("GET /four".to_string(), "g4".to_string()),
        ]
    );
}

#[test]
fn test_paths_concatenate_without_separators() {
    let rec = Recorder::default();
    let router = Router::new().with_resolver(rec.clone());
    router.route("/api", |api| {
        api.route("/v1", |v1| {
            v1.post("", [p("e")]);
            v1.post("/items", [p("e")]);
        });
        api.group(|g| g.delete("/x", [p("e")]));
    });
    router.bind().unwrap();
    let sites: Vec<String> = recorded(&rec).into_iter().map(|(s, _)| s).collect();
    assert_eq!(
        sites,
        vec!["POST /api/v1", "POST /api/v1/items", "DELETE /api/x"]
    );
}

#[test]
fn test_first_declared_not_found_wins() {
    let rec = Recorder::default();
    let router = Router::new().with_resolver(rec.clone());
    router.not_found([p("outer")]);
    router.route("/inner", |inner| inner.not_found([p("inner")]));
    router.bind().unwrap();

    // the outer registration is declared first and visited first
    assert_eq!(
        recorded(&rec),
        vec![("NotFound".to_string(), "outer".to_string())]
    );
    let res = router.serve(HandlerRequest::new(Method::GET, "/missing"));
    assert_eq!(res.body_str(), "outer");
}

#[test]
fn test_first_declared_special_wins_across_branches() {
    let rec = Recorder::default();
    let router = Router::new().with_resolver(rec.clone());
    let branch = router.with([p("b")]);
    branch.route("", |r| r.method_not_allowed([p("deep")]));
    router.method_not_allowed([p("shallow")]);
    router.bind().unwrap();
    assert_eq!(
        recorded(&rec),
        vec![("MethodNotAllowed".to_string(), "bdeep".to_string())]
    );
}

#[test]
fn test_route_error_carries_method_and_path() {
    let rec = Recorder {
        fail_on: Some("bad"),
        ..Recorder::default()
    };
    let router = Router::new().with_resolver(rec.clone());
    router.route("/r", |r| r.put("/x", [p("bad")]));
    router.get("/later", [p("ok")]);

    let err = router.bind().unwrap_err();
    assert_eq!(err.to_string(), "bind router PUT /r/x: chain has no endpoint");
    assert!(matches!(
        err,
        BindError::Route { ref method, ref path, .. } if *method == Method::PUT && path == "/r/x"
    ));
    assert!(err.source().is_some());
    // traversal stopped at the failure
    assert_eq!(rec.seen.lock().len(), 1);
    assert!(!router.is_bound());
}

#[test]
fn test_fallback_error_names_the_slot() {
    let rec = Recorder {
        fail_on: Some("bad"),
        ..Recorder::default()
    };
    let router = Router::new().with_resolver(rec);
    router.panic_handler([p("bad")]);
    let err = router.bind().unwrap_err();
    assert_eq!(err.to_string(), "bind PanicHandler: chain has no endpoint");
    assert!(matches!(
        err,
        BindError::Fallback {
            kind: Fallback::Panic,
            ..
        }
    ));
}

#[test]
fn test_duplicate_route_fails_bind() {
    let router = Router::new().with_resolver(Recorder::default());
    router.get("/dup", [p("a")]);
    router.get("/dup", [p("b")]);
    let err = router.bind().unwrap_err();
    assert!(matches!(err, BindError::Table(_)));
    assert!(err.to_string().starts_with("register route:"));
}

#[test]
fn test_serve_files_skips_the_resolver() {
    let rec = Recorder::default();
    let router = Router::new().with_resolver(rec.clone());
    router.using([p("a")]);
    router.route("/static", |s| s.serve_files("/*filepath", StaticFiles::new(".")));
    router.bind().unwrap();
    assert!(rec.seen.lock().is_empty());
    let routes = router.table().unwrap().routes();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].0, Method::GET);
    assert_eq!(&*routes[0].1, "/static/*filepath");
}

#[test]
fn test_bind_runs_once() {
    let rec = Recorder::default();
    let router = Router::new().with_resolver(rec.clone());
    router.get("/", [p("x")]);
    router.bind().unwrap();
    router.bind().unwrap();
    router.serve(HandlerRequest::new(Method::GET, "/"));
    assert_eq!(rec.seen.lock().len(), 1);
}

#[test]
fn test_failed_bind_leaves_router_unbound_and_open() {
    let rec = Recorder {
        fail_on: Some("bad"),
        ..Recorder::default()
    };
    let router = Router::new().with_resolver(rec);
    router.get("/x", [p("bad")]);
    assert!(router.bind().is_err());
    router.get("/y", [p("fine")]);
    assert!(router.bind().is_err());
    assert!(router.table().is_none());
}

#[test]
#[should_panic(expected = "route tree modified after the router was bound")]
fn test_builder_panics_after_bind() {
    let router = Router::new().with_resolver(Recorder::default());
    router.bind().unwrap();
    router.get("/late", [p("x")]);
}

#[test]
#[should_panic(expected = "bind router GET /x")]
fn test_implicit_bind_failure_is_fatal() {
    let rec = Recorder {
        fail_on: Some("bad"),
        ..Recorder::default()
    };
    let router = Router::new().with_resolver(rec);
    router.get("/x", [p("bad")]);
    router.serve(HandlerRequest::new(Method::GET, "/x"));
}

#[test]
fn test_bind_site_targets() {
    let site = BindSite::route(Method::GET, "/a");
    assert_eq!(site.target, BindTarget::Route(Method::GET));
    let site = BindSite::fallback(Fallback::NotFound, "");
    assert_eq!(site.to_string(), "NotFound");
}
