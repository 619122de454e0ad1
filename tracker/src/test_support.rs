use std::net::SocketAddr;

use axum::Router;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use image::RgbaImage;

use crate::services::publisher::encode_png;

pub async fn spawn_test_server(app: Router) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve test app");
    });
    (addr, handle)
}

pub fn png_response(image: &RgbaImage) -> Response {
    let body = encode_png(image).expect("encode test png");
    ([(header::CONTENT_TYPE, "image/png")], body).into_response()
}
