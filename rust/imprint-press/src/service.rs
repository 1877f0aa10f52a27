//! The HTTP front door.
//!
//! - `POST /` takes the raw request payload and answers `200` with either
//!   the signed URL (`text/plain`) or the PDF (`application/pdf`).
//! - `GET /health` answers `ok`.
//!
//! Every failure is answered with the same `500` and a generic message; the
//! cause is only logged.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use bytes::Bytes;
use imprint_signer::SecretStore;
use imprint_storage::ArtifactStore;

use crate::{Delivered, Press, Renderer};

const FAILURE: &str = "Internal Server Error";

/// Build the router serving `press`.
pub fn router<Store, Render, Secrets>(press: Press<Store, Render, Secrets>) -> Router
where
    Store: ArtifactStore + 'static,
    Render: Renderer + 'static,
    Secrets: SecretStore + Clone + 'static,
{
    Router::new()
        .route("/", post(handle::<Store, Render, Secrets>))
        .route("/health", get(health))
        .with_state(press)
}

async fn handle<Store, Render, Secrets>(
    State(press): State<Press<Store, Render, Secrets>>,
    payload: Bytes,
) -> Response
where
    Store: ArtifactStore + 'static,
    Render: Renderer + 'static,
    Secrets: SecretStore + Clone + 'static,
{
    match press.handle(payload).await {
        Ok(Delivered::Url(url)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            url.to_string(),
        )
            .into_response(),
        Ok(Delivered::Artifact(bytes)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/pdf")],
            bytes,
        )
            .into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, FAILURE).into_response(),
    }
}

async fn health() -> &'static str {
    "ok"
}
