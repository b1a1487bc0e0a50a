use http::Method;
use std::sync::Arc;
use waypost_core::{ApiError, Request, Route, RouteMatch, Router};

async fn ok(_req: Request) -> Result<&'static str, ApiError> {
    Ok("ok")
}

fn router() -> Router {
    let mut router = Router::new();
    router.register(Route::get("/users/active", ok)).unwrap();
    router.register(Route::get("/users/{id:int}", ok)).unwrap();
    router
        .register(Route::get("/files/{key:uuid}/{rest:any}", ok).name("file"))
        .unwrap();
    router.register(Route::post("/users", ok)).unwrap();
    router
}

#[test]
fn one_table_serves_many_threads() {
    let router = Arc::new(router());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let router = Arc::clone(&router);
            std::thread::spawn(move || {
                for i in 0..500 {
                    let path = format!("/users/{}", t * 1000 + i);
                    match router.match_route(&Method::GET, &path) {
                        RouteMatch::Found { route, params } => {
                            assert_eq!(route.pattern(), "/users/{id:int}");
                            assert_eq!(params.get("id"), Some(&path[7..]));
                        }
                        other => panic!("{path}: {other:?}"),
                    }
                    assert!(matches!(
                        router.match_route(&Method::GET, "/users/active"),
                        RouteMatch::Found { route, .. } if route.pattern() == "/users/active"
                    ));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn any_placeholder_stays_within_one_segment() {
    let router = router();
    let key = "67e55044-10b1-426f-9247-bb680e5fe0c8";
    let url = router
        .url_for("file", &[("key", key), ("rest", "report.v2.pdf")])
        .unwrap();

    match router.match_route(&Method::GET, &url) {
        RouteMatch::Found { params, .. } => {
            assert_eq!(params.get("key"), Some(key));
            assert_eq!(params.get("rest"), Some("report.v2.pdf"));
        }
        other => panic!("{url}: {other:?}"),
    }

    assert!(router
        .url_for("file", &[("key", key), ("rest", "docs/report.pdf")])
        .is_err());
    assert!(matches!(
        router.match_route(&Method::GET, &format!("/files/{key}/docs/report.pdf")),
        RouteMatch::NotFound
    ));
}
