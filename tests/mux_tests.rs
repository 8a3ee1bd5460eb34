mod common;

use common::{bottom, case, do_test, down, seed, send, up1};
use http::Method;
use nestmux::handler::{HandlerRequest, HandlerResponse};
use nestmux::inject::{Endpoint, RoutePattern};
use nestmux::{chain, Router};

#[test]
fn test_use() {
    let mux = Router::new();
    mux.using([seed()]);
    mux.using([down("a")]);
    mux.get("/simplest", [bottom()]);
    mux.get("/two", [down("b"), bottom()]);

    mux.using([down("c"), down("d")]);
    mux.get("/afteruse", [bottom()]);

    do_test(
        &mux,
        &[
            case("/simplest", "a"),
            case("/two", "ab"),
            case("/afteruse", "acd"),
        ],
    );
}

#[test]
fn test_with() {
    let mux = Router::new();
    mux.using(chain![seed(), down("a")]);

    let m2 = mux.with([down("b"), down("c")]);

    let m3 = mux.with([down("d")]);
    m3.using([down("e")]);

    mux.get("/mux", [bottom()]);
    m2.get("/m2", [bottom()]);
    m3.get("/m3", [bottom()]);

    do_test(
        &mux,
        &[case("/mux", "a"), case("/m2", "abc"), case("/m3", "ade")],
    );
}

#[test]
fn test_with_branches_are_independent() {
    let mux = Router::new();
    mux.using(chain![seed(), down("a")]);
    let branch = mux.with([down("b"), down("c")]);
    branch.get("/branch", [bottom()]);
    mux.get("/root", [bottom()]);

    do_test(&mux, &[case("/branch", "abc"), case("/root", "a")]);
    let routes = mux.table().unwrap().routes();
    assert_eq!(routes.len(), 2);
}

#[test]
fn test_route() {
    let mux = Router::new();
    mux.using(chain![seed(), down("a")]);

    mux.route("/r2", |m2| {
        m2.using([down("b")]);
        m2.get("", [down("c"), bottom()]);
        m2.get("/a", [down("d"), bottom()]);
        m2.get("/b", [down("e"), bottom()]);
    });

    mux.get("/c", [down("f"), bottom()]);

    do_test(
        &mux,
        &[
            case("/r2", "abc"),
            case("/r2/a", "abd"),
            case("/r2/b", "abe"),
            case("/c", "af"),
        ],
    );
}

#[test]
fn test_group() {
    let mux = Router::new();
    mux.using(chain![seed(), down("a")]);

    mux.group(|g3| {
        g3.using(chain![seed(), down("b")]);
        g3.get("/g", [bottom()]);
    });

    mux.route("/r3", |m2| {
        m2.using([down("c")]);
        m2.get("/c", [bottom()]);
        m2.group(|g4| {
            g4.using(chain![seed(), down("d")]);
            g4.get("/d", [bottom()]);
        });
    });

    mux.get("/e", [bottom()]);

    do_test(
        &mux,
        &[
            case("/g", "b"),
            case("/r3/c", "ac"),
            case("/r3/d", "d"),
            case("/e", "a"),
        ],
    );
}

#[test]
fn test_group_ignores_later_parent_entries() {
    let mux = Router::new();
    mux.using(chain![seed(), down("a")]);
    mux.group(|g| {
        g.using(chain![seed(), down("x")]);
        g.get("/g", [bottom()]);
    });
    mux.using([down("b")]);
    mux.get("/after", [bottom()]);

    do_test(&mux, &[case("/g", "x"), case("/after", "ab")]);
}

#[test]
fn test_endpoint_sees_route_pattern() {
    let mux = Router::new();
    mux.get(
        "/thing/:thingID",
        [Endpoint::new(
            "thing",
            |req: &mut HandlerRequest, res: &mut HandlerResponse| {
                let pattern = req
                    .extensions
                    .get::<RoutePattern>()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default();
                res.write(pattern.as_bytes());
            },
        )
        .requires::<RoutePattern>()],
    );
    let res = send(&mux, Method::GET, "/thing/473");
    assert_eq!(res.body_str(), "/thing/:thingID");
}

#[test]
fn test_scenario_outer_middleware_runs_first() {
    let mux = Router::new();
    mux.using(chain![seed(), down("a")]);
    mux.route("/x", |x| x.get("", [up1("!"), down("b"), bottom()]));
    do_test(&mux, &[case("/x", "ab!")]);
}

#[test]
fn test_path_params_reach_the_endpoint() {
    let mux = Router::new();
    mux.route("/users/:user", |users| {
        users.get(
            "/posts/{post}",
            [Endpoint::new(
                "post",
                |req: &mut HandlerRequest, res: &mut HandlerResponse| {
                    let body = format!(
                        "{}:{}",
                        req.get_path_param("user").unwrap_or_default(),
                        req.get_path_param("post").unwrap_or_default()
                    );
                    res.write(body.as_bytes());
                },
            )],
        );
    });
    let res = send(&mux, Method::GET, "/users/ann/posts/12");
    assert_eq!(res.body_str(), "ann:12");
}

#[test]
fn test_all_verbs_register() {
    let mux = Router::new();
    mux.using(chain![seed(), down("v")]);
    mux.get("/v", [bottom()]);
    mux.head("/v", [bottom()]);
    mux.post("/v", [bottom()]);
    mux.put("/v", [bottom()]);
    mux.patch("/v", [bottom()]);
    mux.delete("/v", [bottom()]);
    mux.options("/v", [bottom()]);
    mux.method(Method::TRACE, "/v", [bottom()]);

    for method in [
        Method::GET,
        Method::HEAD,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
        Method::TRACE,
    ] {
        let res = send(&mux, method.clone(), "/v");
        assert_eq!(res.status, 200, "{method}");
        assert_eq!(res.body_str(), "v", "{method}");
    }
}

fn echo_param(name: &'static str) -> Endpoint {
    Endpoint::new(
        "echo_param",
        move |req: &mut HandlerRequest, res: &mut HandlerResponse| {
            let value = req.get_path_param(name).unwrap_or_default().to_string();
            res.write(value.as_bytes());
        },
    )
}

fn get_http(router: &Router, uri: &str) -> http::Response<Vec<u8>> {
    let req = http::Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Vec::new())
        .unwrap();
    router.serve_http(req)
}

#[test]
fn test_encoded_request_paths_are_decoded() {
    let mux = Router::new();
    mux.route("/users", |users| users.get("/:name", [echo_param("name")]));
    mux.get(
        "/café",
        [Endpoint::new(
            "cafe",
            |_req: &mut HandlerRequest, res: &mut HandlerResponse| res.write(b"menu"),
        )],
    );

    let res = get_http(&mux, "/users/j%C3%B6rg%20x");
    assert_eq!(res.status(), http::StatusCode::OK);
    assert_eq!(String::from_utf8_lossy(res.body()), "jörg x");

    let res = get_http(&mux, "/caf%C3%A9");
    assert_eq!(res.status(), http::StatusCode::OK);
    assert_eq!(res.body().as_slice(), b"menu");

    // An encoded slash stays inside its segment
    let res = get_http(&mux, "/users/a%2Fb");
    assert_eq!(String::from_utf8_lossy(res.body()), "a/b");

    let res = send(&mux, Method::GET, "/users/ann%21");
    assert_eq!(res.body_str(), "ann!");
}
