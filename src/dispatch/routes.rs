//! HTTP surface: the inbound orchestration endpoint plus health and route inspection.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, debug, info_span};
use uuid::Uuid;

use crate::dispatch::dispatcher::Dispatcher;
use crate::dispatch::types::{FileAttachment, HandlerResponse, InboundRequest};
use crate::error::DispatchError;

/// Returned when a JSON body does not parse.
pub const INVALID_JSON: &str = "El cuerpo de la solicitud no es JSON válido";

const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub dispatcher: Arc<Dispatcher>,
}

/// Build the Axum router for the gateway.
pub fn gateway_routes(dispatcher: Arc<Dispatcher>, max_upload_bytes: usize) -> Router {
    let state = GatewayState { dispatcher };

    Router::new()
        .route("/orchestrate", post(orchestrate))
        .route("/health", get(health))
        .route("/routes", get(list_routes))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "intent-gateway"
    }))
}

// ── Route inspection ────────────────────────────────────────────────────

async fn list_routes(State(state): State<GatewayState>) -> impl IntoResponse {
    let routes: Vec<Value> = state
        .dispatcher
        .routes()
        .entries()
        .into_iter()
        .map(|(intent, entry)| {
            serde_json::json!({
                "intent": intent.label(),
                "handler": entry.handler,
                "url": entry.url,
                "shape": entry.shape,
            })
        })
        .collect();
    Json(serde_json::json!({ "routes": routes }))
}

// ── Orchestrate ─────────────────────────────────────────────────────────

/// POST /orchestrate
///
/// Accepts `{"message": ...}` JSON or a multipart form with `file` and an
/// optional `question`, and relays the chosen handler's reply.
async fn orchestrate(State(state): State<GatewayState>, request: Request) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("orchestrate", %request_id);

    async move {
        let inbound = match read_inbound(request, &state).await {
            Ok(inbound) => inbound,
            Err(response) => return response,
        };

        match state.dispatcher.handle(inbound).await {
            Ok(response) => relay(response),
            Err(e) => e.into_response(),
        }
    }
    .instrument(span)
    .await
}

/// Turn a handler reply into an HTTP response without touching the body.
fn relay(response: HandlerResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body)).into_response()
}

/// Parse the HTTP body into an `InboundRequest`.
///
/// Rejections (bad JSON, broken multipart, oversized body) come back as
/// ready-made responses.
async fn read_inbound(request: Request, state: &GatewayState) -> Result<InboundRequest, Response> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(is_multipart_form);

    if is_multipart {
        let multipart = Multipart::from_request(request, state).await.map_err(|e| {
            DispatchError::ClientRequest(format!("Formulario multipart inválido: {}", e.body_text()))
                .into_response()
        })?;
        return read_multipart(multipart).await.map_err(multipart_error);
    }

    let bytes = Bytes::from_request(request, state)
        .await
        .map_err(body_error)?;
    if bytes.is_empty() {
        return Ok(InboundRequest::default());
    }

    let body: Value = serde_json::from_slice(&bytes).map_err(|e| {
        debug!(error = %e, "Rejecting malformed JSON body");
        DispatchError::ClientRequest(INVALID_JSON.to_string()).into_response()
    })?;
    Ok(InboundRequest::json(body))
}

async fn read_multipart(mut multipart: Multipart) -> Result<InboundRequest, MultipartError> {
    let mut inbound = InboundRequest::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                inbound.file = Some(FileAttachment {
                    bytes: bytes.to_vec(),
                    filename,
                    content_type,
                });
            }
            "question" => inbound.question = Some(field.text().await?),
            "message" => inbound.form_message = Some(field.text().await?),
            other => debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    Ok(inbound)
}

/// Media types compare case-insensitively.
fn is_multipart_form(content_type: &str) -> bool {
    content_type
        .get(..MULTIPART_FORM_DATA.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(MULTIPART_FORM_DATA))
}

fn body_error(e: BytesRejection) -> Response {
    debug!(status = %e.status(), error = %e.body_text(), "Rejecting unreadable body");
    (
        e.status(),
        Json(serde_json::json!({ "error": e.body_text() })),
    )
        .into_response()
}

fn multipart_error(e: MultipartError) -> Response {
    (
        e.status(),
        Json(serde_json::json!({
            "error": format!("Formulario multipart inválido: {}", e.body_text())
        })),
    )
        .into_response()
}
