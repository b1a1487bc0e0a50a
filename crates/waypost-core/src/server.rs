//! HTTP server implementation

use crate::app::App;
use crate::error::ApiError;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Boxed error returned by the server entrypoints
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An HTTP/1 server bound to a socket
pub struct Server {
    listener: TcpListener,
    addr: SocketAddr,
}

impl Server {
    /// Bind to `addr` (e.g. `"127.0.0.1:8080"`; port 0 picks a free port)
    pub async fn bind(addr: &str) -> Result<Self, BoxError> {
        let addr: SocketAddr = addr.parse()?;
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        Ok(Self { listener, addr })
    }

    /// The address actually bound
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve `app` forever
    pub async fn run(self, app: App) -> Result<(), BoxError> {
        self.run_until(app, std::future::pending()).await
    }

    /// Serve `app` until `shutdown` resolves.
    ///
    /// Once `shutdown` fires no new connections are accepted; connections
    /// already being served run to completion on their own tasks.
    pub async fn run_until<F>(self, app: App, shutdown: F) -> Result<(), BoxError>
    where
        F: Future<Output = ()> + Send,
    {
        info!(addr = %self.addr, "waypost server listening");
        tokio::pin!(shutdown);

        loop {
            let (stream, remote_addr) = tokio::select! {
                accepted = self.listener.accept() => accepted?,
                _ = &mut shutdown => {
                    info!(addr = %self.addr, "Shutting down");
                    return Ok(());
                }
            };
            let io = TokioIo::new(stream);
            let app = app.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: hyper::Request<Incoming>| {
                    let app = app.clone();
                    async move { Ok::<_, Infallible>(handle_request(app, req).await) }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!(remote_addr = %remote_addr, "Connection error: {}", err);
                }
            });
        }
    }
}

/// Buffer the body and hand the request to the app
async fn handle_request(app: App, req: hyper::Request<Incoming>) -> Response {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            debug!(error = %err, "Failed to read request body");
            return ApiError::bad_request("Failed to read request body").into_response();
        }
    };
    app.dispatch(Request::from_parts(parts, body)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::router::Route;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn echo(req: Request) -> Result<String> {
        Ok(format!("{} {}", req.param("id").unwrap_or("-"), req.body().len()))
    }

    #[tokio::test]
    async fn serves_requests_until_shutdown() {
        let app = App::builder()
            .route(Route::post("/items/{id:int}", echo))
            .build()
            .unwrap();
        let server = Server::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(server.run_until(app, async {
            let _ = rx.await;
        }));

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(
                b"POST /items/7 HTTP/1.1\r\nhost: localhost\r\ncontent-length: 5\r\nconnection: close\r\n\r\nhello",
            )
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();
        assert!(raw.starts_with("HTTP/1.1 200 OK"), "{raw}");
        assert!(raw.ends_with("7 5"), "{raw}");

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn rejects_bad_addresses() {
        assert!(Server::bind("not an address").await.is_err());
    }
}
