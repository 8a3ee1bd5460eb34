mod common;

use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use common::{bottom, down, seed, send};
use http::Method;
use nestmux::chain::Entry;
use nestmux::handler::{handler_fn, BoxedHandler, HandlerRequest, HandlerResponse};
use nestmux::inject::{BindSite, Endpoint, Injector, ResolveError, Resolver, Step};
use nestmux::router::RouteError;
use nestmux::{chain, BindError, Router};

/// Delegates to the injector, counting every chain it is asked to resolve
#[derive(Clone, Default)]
struct CountingResolver {
    calls: Arc<AtomicUsize>,
}

impl Resolver for CountingResolver {
    fn resolve(&self, chain: &[Entry], site: &BindSite) -> Result<BoxedHandler, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Injector.resolve(chain, site)
    }
}

/// Ignores the chain and answers with the bind site
struct SiteEcho;

impl Resolver for SiteEcho {
    fn resolve(&self, _chain: &[Entry], site: &BindSite) -> Result<BoxedHandler, ResolveError> {
        let text = site.to_string();
        Ok(handler_fn(
            move |_req: &mut HandlerRequest, res: &mut HandlerResponse| {
                res.write(text.as_bytes());
            },
        ))
    }
}

#[test]
fn test_concurrent_first_requests_bind_once() {
    let resolver = CountingResolver::default();
    let calls = resolver.calls.clone();
    let router = Router::new().with_resolver(resolver);
    router.using(chain![seed(), down("a")]);
    router.get("/one", [bottom()]);
    router.get("/two", [down("b"), bottom()]);
    router.not_found([bottom()]);

    let router = Arc::new(router);
    let barrier = Arc::new(Barrier::new(8));
    let workers: Vec<_> = (0..8)
        .map(|i| {
            let router = Arc::clone(&router);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let path = if i % 2 == 0 { "/one" } else { "/two" };
                send(&router, Method::GET, path).body_str().into_owned()
            })
        })
        .collect();

    for (i, worker) in workers.into_iter().enumerate() {
        let body = worker.join().unwrap();
        assert_eq!(body, if i % 2 == 0 { "a" } else { "ab" });
    }
    assert!(router.is_bound());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_explicit_bind_is_idempotent() {
    let resolver = CountingResolver::default();
    let calls = resolver.calls.clone();
    let router = Router::new().with_resolver(resolver);
    router.get("/x", chain![seed(), bottom()]);

    router.bind().unwrap();
    router.bind().unwrap();
    assert_eq!(send(&router, Method::GET, "/x").status, 200);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unsatisfied_requirement_reports_route() {
    let router = Router::new();
    router.using([down("a")]);
    router.get("/needs/:seed", [bottom()]);

    let err = router.bind().unwrap_err();
    assert!(
        matches!(&err, BindError::Route { method, path, .. } if *method == Method::GET && path == "/needs/:seed")
    );
    assert_eq!(
        err.to_string(),
        "bind router GET /needs/:seed: 'down a' requires alloc::string::String, which nothing earlier in the chain provides"
    );
    assert!(matches!(
        err.source().and_then(|s| s.downcast_ref::<ResolveError>()),
        Some(ResolveError::Unsatisfied { .. })
    ));
    assert!(!router.is_bound());
}

#[test]
fn test_endpoint_must_be_last() {
    let router = Router::new();
    router.post(
        "/late",
        chain![
            Endpoint::new("early", |_req: &mut HandlerRequest, _res: &mut HandlerResponse| {}),
            Step::new("after", |_req: &mut HandlerRequest, _res: &mut HandlerResponse| {
                nestmux::inject::Flow::Continue
            }),
        ],
    );

    let err = router.bind().unwrap_err();
    assert_eq!(
        err.to_string(),
        "bind router POST /late: endpoint 'early' must be the last entry of the chain"
    );
}

#[test]
fn test_unsupported_provider_is_rejected() {
    let router = Router::new();
    router.get(
        "/opaque",
        chain![nestmux::Provider::new("mystery", 7u8), bottom()],
    );

    let err = router.bind().unwrap_err();
    assert!(err.to_string().ends_with("provider 'mystery' is not supported"));
}

#[test]
fn test_invalid_pattern_is_a_table_error() {
    let router = Router::new();
    router.get("/files/*rest/more", chain![seed(), bottom()]);

    let err = router.bind().unwrap_err();
    assert!(matches!(
        err,
        BindError::Table(RouteError::InvalidPattern { .. })
    ));
}

#[test]
fn test_builder_calls_after_bind_panic() {
    let router = Router::new();
    let api = router.with([down("a")]);
    router.get("/x", chain![seed(), bottom()]);
    router.bind().unwrap();

    let attempts: Vec<Box<dyn Fn()>> = vec![
        Box::new(|| api.get("/y", chain![seed(), bottom()])),
        Box::new(|| router.using([down("z")])),
        Box::new(|| router.not_found([bottom()])),
        Box::new(|| router.route("/r", |_| {})),
    ];
    for attempt in attempts {
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(attempt));
        let payload = outcome.unwrap_err();
        let message = payload
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| payload.downcast_ref::<&str>().map(|s| (*s).to_string()))
            .unwrap_or_default();
        assert!(message.contains("route tree modified after the router was bound"));
    }
}

#[test]
fn test_custom_resolver_sees_every_site() {
    let router = Router::new().with_resolver(SiteEcho);
    router.route("/api", |api| {
        api.put("/pets/:id", [down("ignored")]);
        api.not_found([down("ignored")]);
    });

    assert_eq!(send(&router, Method::PUT, "/api/pets/1").body_str(), "PUT /api/pets/:id");
    assert_eq!(send(&router, Method::GET, "/nope").body_str(), "NotFound");
}

#[test]
fn test_serve_http_round_trip() {
    let router = Router::new();
    router.get("/hello", chain![seed(), down("hi"), bottom()]);

    let req = http::Request::builder()
        .method(Method::GET)
        .uri("/hello?x=1")
        .body(Vec::new())
        .unwrap();
    let res = router.serve_http(req);
    assert_eq!(res.status(), http::StatusCode::OK);
    assert_eq!(res.body().as_slice(), b"hi");
}
