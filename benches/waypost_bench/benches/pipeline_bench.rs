//! Middleware pipeline benchmarks
//!
//! Measures the per-request cost of running a composed chain and of a full
//! `App::dispatch`, for a growing number of pass-through layers.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use waypost_core::{
    from_fn, ApiError, App, BoxedNext, IntoResponse, MiddlewareFuture, MiddlewareLayer, Pipeline,
    Request, RequestIdLayer, Response, Route,
};

fn pass_through() -> impl MiddlewareLayer {
    from_fn(|req: Request, next: BoxedNext| async move { next(req).await })
}

fn request(path: &str) -> Request {
    http::Request::builder()
        .uri(path)
        .body("")
        .map(Request::from_http)
        .expect("static request is valid")
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime builds")
}

fn bench_compose_and_execute(c: &mut Criterion) {
    let rt = runtime();
    let terminal: BoxedNext = Arc::new(|_req: Request| {
        Box::pin(async { Ok::<Response, ApiError>("ok".into_response()) }) as MiddlewareFuture
    });

    let mut group = c.benchmark_group("pipeline_execute");
    for layers in [0usize, 1, 5, 10, 20] {
        let mut pipeline = Pipeline::new();
        for _ in 0..layers {
            pipeline.push(pass_through());
        }
        let chain = pipeline.compose(terminal.clone());

        group.bench_with_input(BenchmarkId::new("layers", layers), &chain, |b, chain| {
            b.iter(|| rt.block_on(chain(black_box(request("/")))))
        });
    }
    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let rt = runtime();
    let app = App::builder()
        .layer(RequestIdLayer::new())
        .layer(pass_through())
        .route(Route::get("/users/{id:int}", |req: Request| async move {
            Ok::<_, ApiError>(req.param("id").unwrap_or_default().to_string())
        }))
        .build()
        .expect("benchmark app builds");

    let mut group = c.benchmark_group("dispatch");
    for (label, path) in [("found", "/users/42"), ("not_found", "/users/abc")] {
        group.bench_function(label, |b| {
            b.iter(|| rt.block_on(app.dispatch(black_box(request(path)))))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compose_and_execute, bench_dispatch);
criterion_main!(benches);
