//! A small blog API.
//!
//! ```text
//! cargo run -p waypost --example blog
//! curl localhost:8080/posts/hello-world
//! curl localhost:8080/authors/1
//! curl -X DELETE localhost:8080/posts/hello-world   # 405, Allow: GET, PUT
//! ```

use std::sync::{Arc, OnceLock};
use waypost::prelude::*;

#[derive(Serialize, Deserialize)]
struct Post {
    slug: String,
    title: String,
}

async fn index(req: Request) -> Result<Json<Vec<String>>> {
    let links = req
        .state::<Links>()
        .ok_or_else(|| ApiError::internal("links missing"))?;
    let links = links
        .0
        .get()
        .ok_or_else(|| ApiError::service_unavailable("links not resolved yet"))?;
    Ok(Json(links.clone()))
}

async fn show_post(req: Request) -> Result<Json<Post>> {
    let slug = req.param("slug").unwrap_or_default().to_string();
    Ok(Json(Post {
        title: slug.replace('-', " "),
        slug,
    }))
}

async fn update_post(req: Request) -> Result<Json<Post>> {
    let post: Post = req.json()?;
    if Some(post.slug.as_str()) != req.param("slug") {
        return Err(ApiError::bad_request("slug in body does not match the path"));
    }
    Ok(Json(post))
}

async fn show_author(req: Request) -> Result<String> {
    Ok(format!("author #{}", req.param("id").unwrap_or_default()))
}

/// Index links, filled in from the built route table
#[derive(Clone, Default)]
struct Links(Arc<OnceLock<Vec<String>>>);

#[tokio::main]
async fn main() -> std::result::Result<(), BoxError> {
    load_dotenv();
    let config = ServerConfig::from_env()?;
    init_tracing_with(config.log_filter.as_deref());

    let links = Links::default();
    let app = App::builder()
        .layer(RecoverLayer::new())
        .layer(RequestIdLayer::new())
        .layer(LoggingLayer::new().format(LogFormat::Compact))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .state(links.clone())
        .route(Route::get("/", index))
        .route(Route::get("/posts/{slug:slug}", show_post).name("post.show"))
        .route(Route::put("/posts/{slug:slug}", update_post))
        .route(Route::get("/authors/{id:int}", show_author).name("author.show"))
        .build()?;

    let _ = links.0.set(vec![
        app.url_for("post.show", &[("slug", "hello-world")])?,
        app.url_for("author.show", &[("id", "1")])?,
    ]);

    info!(addr = %config.addr(), "Starting blog example");
    app.serve_with_shutdown(&config.addr(), async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}
