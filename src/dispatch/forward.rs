//! Forwarding to downstream handler services.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::dispatch::types::{FileAttachment, ForwardPayload, HandlerResponse};
use crate::error::ForwardError;
use crate::routing::RouteEntry;

/// Filename used when the upload did not carry one.
const DEFAULT_FILENAME: &str = "document.pdf";

/// Sends a shaped payload to a handler and returns its reply.
#[async_trait]
pub trait HandlerClient: Send + Sync {
    /// Single attempt, no retries. Any non-JSON reply is an error.
    async fn forward(
        &self,
        route: &RouteEntry,
        payload: ForwardPayload,
    ) -> Result<HandlerResponse, ForwardError>;
}

/// `HandlerClient` over HTTP.
pub struct HttpForwarder {
    client: reqwest::Client,
}

impl HttpForwarder {
    /// Create a forwarder whose calls are bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HandlerClient for HttpForwarder {
    async fn forward(
        &self,
        route: &RouteEntry,
        payload: ForwardPayload,
    ) -> Result<HandlerResponse, ForwardError> {
        let transport = |e: reqwest::Error| ForwardError::Transport {
            handler: route.handler.to_string(),
            reason: e.to_string(),
        };

        let request = match payload {
            ForwardPayload::Json(body) => self.client.post(&route.url).json(&body),
            ForwardPayload::Multipart { file, question } => {
                let form = build_form(file, question).map_err(transport)?;
                self.client.post(&route.url).multipart(form)
            }
        };

        let response = request.send().await.map_err(transport)?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(transport)?;

        debug!(
            handler = route.handler,
            status,
            bytes = bytes.len(),
            "Handler replied"
        );

        let body = serde_json::from_slice(&bytes).map_err(|e| ForwardError::InvalidBody {
            handler: route.handler.to_string(),
            reason: e.to_string(),
        })?;

        Ok(HandlerResponse { status, body })
    }
}

/// Re-package an upload as `file` plus optional `question`.
fn build_form(file: FileAttachment, question: Option<String>) -> Result<Form, reqwest::Error> {
    let filename = file
        .filename
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string());
    let mut part = Part::bytes(file.bytes).file_name(filename);
    if let Some(content_type) = file.content_type {
        part = part.mime_str(&content_type)?;
    }

    let mut form = Form::new().part("file", part);
    if let Some(question) = question.filter(|q| !q.is_empty()) {
        form = form.text("question", question);
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::PayloadShape;
    use axum::extract::Multipart;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn route(url: String, shape: PayloadShape) -> RouteEntry {
        RouteEntry {
            handler: "test",
            url,
            shape,
        }
    }

    #[tokio::test]
    async fn json_payload_relays_status_and_body() {
        let app = Router::new().route(
            "/h",
            post(|Json(body): Json<Value>| async move {
                (StatusCode::NOT_FOUND, Json(json!({"echo": body})))
            }),
        );
        let base = serve(app).await;
        let forwarder = HttpForwarder::new(Duration::from_secs(5)).unwrap();

        let response = forwarder
            .forward(
                &route(format!("{base}/h"), PayloadShape::Json),
                ForwardPayload::Json(json!({"message": "hola", "extra": 1})),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(response.body["echo"]["message"], "hola");
        assert_eq!(response.body["echo"]["extra"], 1);
    }

    #[tokio::test]
    async fn multipart_payload_preserves_file_metadata() {
        let app = Router::new().route(
            "/h",
            post(|mut multipart: Multipart| async move {
                let mut fields = serde_json::Map::new();
                while let Some(field) = multipart.next_field().await.unwrap() {
                    let name = field.name().unwrap_or_default().to_string();
                    let filename = field.file_name().map(str::to_string);
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await.unwrap();
                    fields.insert(
                        name,
                        json!({
                            "filename": filename,
                            "content_type": content_type,
                            "data": String::from_utf8_lossy(&data),
                        }),
                    );
                }
                Json(Value::Object(fields))
            }),
        );
        let base = serve(app).await;
        let forwarder = HttpForwarder::new(Duration::from_secs(5)).unwrap();

        let file = FileAttachment {
            bytes: b"%PDF-1.4 fake".to_vec(),
            filename: Some("estado.pdf".into()),
            content_type: Some("application/pdf".into()),
        };
        let response = forwarder
            .forward(
                &route(format!("{base}/h"), PayloadShape::Multipart),
                ForwardPayload::Multipart {
                    file,
                    question: Some("En que gaste mas?".into()),
                },
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body["file"]["filename"], "estado.pdf");
        assert_eq!(response.body["file"]["content_type"], "application/pdf");
        assert_eq!(response.body["file"]["data"], "%PDF-1.4 fake");
        assert_eq!(response.body["question"]["data"], "En que gaste mas?");
    }

    #[tokio::test]
    async fn multipart_without_question_omits_field() {
        let app = Router::new().route(
            "/h",
            post(|mut multipart: Multipart| async move {
                let mut names = Vec::new();
                while let Some(field) = multipart.next_field().await.unwrap() {
                    names.push(field.name().unwrap_or_default().to_string());
                }
                Json(json!({ "fields": names }))
            }),
        );
        let base = serve(app).await;
        let forwarder = HttpForwarder::new(Duration::from_secs(5)).unwrap();

        let file = FileAttachment {
            bytes: b"%PDF".to_vec(),
            filename: None,
            content_type: None,
        };
        let response = forwarder
            .forward(
                &route(format!("{base}/h"), PayloadShape::Multipart),
                ForwardPayload::Multipart {
                    file,
                    question: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(response.body["fields"], json!(["file"]));
    }

    #[tokio::test]
    async fn non_json_reply_is_invalid_body() {
        let app = Router::new().route("/h", post(|| async { "<html>oops</html>" }));
        let base = serve(app).await;
        let forwarder = HttpForwarder::new(Duration::from_secs(5)).unwrap();

        let err = forwarder
            .forward(
                &route(format!("{base}/h"), PayloadShape::Json),
                ForwardPayload::Json(json!({"message": "hola"})),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ForwardError::InvalidBody { .. }));
    }

    #[tokio::test]
    async fn unreachable_handler_is_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let forwarder = HttpForwarder::new(Duration::from_secs(5)).unwrap();
        let err = forwarder
            .forward(
                &route(format!("http://{addr}/h"), PayloadShape::Json),
                ForwardPayload::Json(json!({"message": "hola"})),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ForwardError::Transport { .. }));
    }

    #[tokio::test]
    async fn slow_handler_times_out_as_transport_error() {
        let app = Router::new().route(
            "/h",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({}))
            }),
        );
        let base = serve(app).await;
        let forwarder = HttpForwarder::new(Duration::from_millis(100)).unwrap();

        let err = forwarder
            .forward(
                &route(format!("{base}/h"), PayloadShape::Json),
                ForwardPayload::Json(json!({"message": "hola"})),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ForwardError::Transport { .. }));
    }
}
