use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tokio::time::Instant;
use tracing::{error, warn};

use crate::error::ErrorKind;

/// 记录失败的请求：5xx 记 error，认证和权限拒绝记 warn。
/// 失败原因取自 `AppError` 写入的 `ErrorKind`，响应体本身不含内部细节
pub async fn log_errors(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let kind = response
        .extensions()
        .get::<ErrorKind>()
        .map_or("unclassified", |kind| kind.0);
    let elapsed = started.elapsed();

    if status.is_server_error() {
        error!(
            "Server error on {} {} - Status: {}, Kind: {}, Elapsed: {:?}",
            method, path, status, kind, elapsed
        );
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        warn!(
            "Rejected {} {} - Status: {}, Kind: {}",
            method, path, status, kind
        );
    }

    response
}
