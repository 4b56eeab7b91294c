use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::form::{FormError, FormField, UploadForm, classify};
use super::state::ServerState;
use crate::error::CaptionError;
use crate::imaging::{BackendError, RasterBackend, RenderError, RenderedImage, caption_bytes};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind server address {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// Routes: `GET /health`, `POST /thumbnail`.
pub fn router<B: RasterBackend + Send + 'static>(state: Arc<ServerState<B>>) -> Router {
    let limit = state.captioner.config().server.max_upload_bytes;
    Router::new()
        .route("/health", get(health))
        .route("/thumbnail", post(thumbnail::<B>))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

pub async fn run_server<B: RasterBackend + Send + 'static>(
    state: ServerState<B>,
    bind: &str,
) -> Result<(), ServerError> {
    let app = router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|source| ServerError::Bind {
            addr: bind.to_string(),
            source,
        })?;
    info!(addr = %bind, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("shutting down");
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn thumbnail<B: RasterBackend + Send + 'static>(
    State(state): State<Arc<ServerState<B>>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = read_form(&mut multipart).await?;
    let result = tokio::task::spawn_blocking(move || render_upload(&state, form))
        .await
        .map_err(|err| ApiError::Internal(format!("render task failed: {err}")))?;

    match result {
        Ok(rendered) => {
            info!(
                bytes = rendered.bytes.len(),
                lines = rendered.plan.overlay.lines.len(),
                font_size_px = rendered.plan.overlay.style.font_size_px,
                "thumbnail rendered"
            );
            Ok(([(header::CONTENT_TYPE, rendered.format.mime())], rendered.bytes).into_response())
        }
        Err(err) => {
            warn!(status = err.status().as_u16(), error = %err, "thumbnail rejected");
            Err(err)
        }
    }
}

/// Drain the multipart stream into an [`UploadForm`], skipping unknown fields.
pub(crate) async fn read_form(multipart: &mut Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await? {
        let Some(kind) = field.name().and_then(classify) else {
            continue;
        };
        match kind {
            FormField::File => form.file = Some(field.bytes().await?.to_vec()),
            other => form.set_text(other, field.text().await?),
        }
    }
    Ok(form)
}

pub(crate) fn render_upload<B: RasterBackend>(
    state: &ServerState<B>,
    form: UploadForm,
) -> Result<RenderedImage, ApiError> {
    let (source, request) = form.into_request()?;
    Ok(caption_bytes(
        &state.backend,
        &state.captioner,
        &source,
        &request,
    )?)
}

#[derive(Error, Debug)]
pub(crate) enum ApiError {
    #[error(transparent)]
    Caption(#[from] CaptionError),
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Multipart(#[from] MultipartError),
    #[error("unreadable image: {0}")]
    Unreadable(String),
    #[error("{0}")]
    Internal(String),
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Caption(e) => ApiError::Caption(e),
            RenderError::Backend(BackendError::Decode(msg)) => ApiError::Unreadable(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl ApiError {
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            ApiError::Caption(_) | ApiError::Form(_) | ApiError::Unreadable(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Multipart(e) => e.status(),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Caption(e) => (status, Json(e.report())).into_response(),
            ApiError::Multipart(e) => (
                status,
                Json(serde_json::json!({ "error": e.body_text() })),
            )
                .into_response(),
            other => (
                status,
                Json(serde_json::json!({ "error": other.to_string() })),
            )
                .into_response(),
        }
    }
}
