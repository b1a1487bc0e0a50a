//! Route matching benchmarks
//!
//! Measures lookup cost for literal hits, typed placeholders, 405 detection
//! and misses as the table grows.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use http::Method;
use waypost_core::{ApiError, Request, Route, Router};

async fn noop(_req: Request) -> Result<&'static str, ApiError> {
    Ok("")
}

/// A table with `resources` groups of CRUD-style routes
fn build_router(resources: usize) -> Router {
    let mut router = Router::new();
    for i in 0..resources {
        let base = format!("/r{i}");
        let routes = [
            Route::get(base.clone(), noop),
            Route::post(base.clone(), noop),
            Route::get(format!("{base}/active"), noop),
            Route::get(format!("{base}/{{id:int}}"), noop),
            Route::put(format!("{base}/{{id:int}}"), noop),
            Route::get(format!("{base}/{{id:int}}/posts/{{slug:slug}}"), noop),
            Route::get(format!("{base}/by-key/{{key:uuid}}"), noop),
        ];
        for route in routes {
            router.register(route).expect("benchmark routes are valid");
        }
    }
    router
}

fn bench_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_route");

    for resources in [1usize, 10, 100] {
        let router = build_router(resources);
        let last = resources - 1;
        let cases = [
            ("literal", Method::GET, format!("/r{last}/active")),
            ("int", Method::GET, format!("/r{last}/12345")),
            ("nested", Method::GET, format!("/r{last}/7/posts/hello-world")),
            (
                "uuid",
                Method::GET,
                format!("/r{last}/by-key/67e55044-10b1-426f-9247-bb680e5fe0c8"),
            ),
            ("method_not_allowed", Method::DELETE, format!("/r{last}/7")),
            ("not_found", Method::GET, "/nowhere/at/all".to_string()),
        ];

        for (label, method, path) in cases {
            group.bench_with_input(
                BenchmarkId::new(label, resources),
                &(method, path),
                |b, (method, path)| b.iter(|| black_box(router.match_route(method, black_box(path)))),
            );
        }
    }

    group.finish();
}

fn bench_url_for(c: &mut Criterion) {
    let mut router = Router::new();
    router
        .register(Route::get("/users/{id:int}/posts/{slug:slug}", noop).name("post.show"))
        .expect("benchmark route is valid");

    c.bench_function("url_for", |b| {
        b.iter(|| {
            router.url_for(
                black_box("post.show"),
                &[("id", "42"), ("slug", "hello-world")],
            )
        })
    });
}

fn bench_register(c: &mut Criterion) {
    c.bench_function("register_700_routes", |b| b.iter(|| build_router(black_box(100))));
}

criterion_group!(benches, bench_match, bench_url_for, bench_register);
criterion_main!(benches);
