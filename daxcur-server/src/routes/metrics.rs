use axum::http::header;
use axum::response::IntoResponse;

use daxcur_core::metrics::COUNTERS;

pub async fn prometheus() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        COUNTERS.snapshot().to_prometheus(),
    )
}
