//! Activation check against a loopback HTTP server.

use axum::{http::StatusCode, routing::get, Router};
use tokio::net::TcpListener;

use sicbo_bot::activation::{ActivationCheck, RemoteActivation};

/// Serve `router` on a free localhost port and return its base URL.
async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn check(path: &str) -> bool {
    let base = serve(
        Router::new()
            .route("/on", get(|| async { "1\n" }))
            .route("/off", get(|| async { "0" }))
            .route("/chatty", get(|| async { "1 please" }))
            .route("/broken", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "1") })),
    )
    .await;
    RemoteActivation::new(format!("{base}{path}"))
        .unwrap()
        .is_activated()
        .await
}

#[tokio::test]
async fn test_body_one_activates() {
    assert!(check("/on").await);
}

#[tokio::test]
async fn test_other_bodies_do_not_activate() {
    assert!(!check("/off").await);
    assert!(!check("/chatty").await);
}

#[tokio::test]
async fn test_http_error_is_not_activated() {
    assert!(!check("/broken").await);
    assert!(!check("/missing").await);
}
