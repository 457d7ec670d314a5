//! Request dispatcher — validates, classifies, routes, forwards, relays.
//!
//! Flow:
//! 1. Shape detection: a non-empty file forces `PdfAnalysis` (no oracle call)
//! 2. Otherwise a non-empty `message` is required and classified
//! 3. Cross-check: `PdfAnalysis` without a file is a client error
//! 4. Route table lookup: `Unreasonable` is rejected before any forwarding
//! 5. Re-shape the payload (JSON as-is, multipart re-packaged)
//! 6. One forwarding attempt; the handler's status and body are relayed verbatim

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dispatch::forward::HandlerClient;
use crate::dispatch::types::{DispatchState, ForwardPayload, HandlerResponse, InboundRequest};
use crate::error::DispatchError;
use crate::intent::{Intent, IntentClassifier};
use crate::routing::{PayloadShape, Resolution, RouteTable};

/// Returned when neither a file nor a message was sent.
pub const MISSING_MESSAGE: &str = "No se proporcionó 'message' en la solicitud";

/// Returned when the text asks for document analysis but no file was sent.
pub const PDF_REQUIRES_FILE: &str = "Para analizar un PDF adjunta el archivo en el campo 'file'";

/// Orchestration entry point for one inbound request.
pub struct Dispatcher {
    classifier: IntentClassifier,
    routes: Arc<RouteTable>,
    client: Arc<dyn HandlerClient>,
}

impl Dispatcher {
    pub fn new(
        classifier: IntentClassifier,
        routes: Arc<RouteTable>,
        client: Arc<dyn HandlerClient>,
    ) -> Self {
        Self {
            classifier,
            routes,
            client,
        }
    }

    /// The route table this dispatcher consults.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Handle one request end to end.
    ///
    /// `Ok` carries whatever the handler answered, including its non-2xx
    /// statuses. `Err` is a client error or a forwarding failure.
    pub async fn handle(&self, request: InboundRequest) -> Result<HandlerResponse, DispatchError> {
        transition(DispatchState::Received);

        let result = self.run(request).await;
        match &result {
            Ok(response) => {
                transition(DispatchState::Relayed);
                info!(status = response.status, "Relayed handler response");
            }
            Err(e @ DispatchError::Upstream(_)) => {
                transition(DispatchState::Failed);
                warn!(error = %e, "Forwarding failed");
            }
            Err(e) => {
                transition(DispatchState::Rejected);
                info!(kind = e.label(), error = %e, "Request rejected");
            }
        }
        result
    }

    async fn run(&self, request: InboundRequest) -> Result<HandlerResponse, DispatchError> {
        // Step 1-3: shape detection, then classification only when no file is attached
        let has_file = request.attachment().is_some();
        transition(DispatchState::ShapeDetected);

        let intent = if has_file {
            transition(DispatchState::FileShortcut);
            Intent::PdfAnalysis
        } else {
            let message = request
                .message()
                .ok_or_else(|| DispatchError::ClientRequest(MISSING_MESSAGE.to_string()))?;
            let intent = self.classifier.classify(message).await;
            transition(DispatchState::Classified);
            intent
        };

        // Step 4: the user asked about a document but sent none
        if !has_file && intent == Intent::PdfAnalysis {
            return Err(DispatchError::ClientRequest(PDF_REQUIRES_FILE.to_string()));
        }

        // Step 5: route
        let route = match self.routes.resolve(intent) {
            Resolution::Forward(route) => route,
            Resolution::Reject(rejection) => {
                return Err(DispatchError::Rejected(rejection.reason.to_string()));
            }
        };
        transition(DispatchState::Routed);

        // Step 6-7: re-shape and forward
        let payload = shape_payload(request, route.shape)?;
        info!(
            intent = intent.label(),
            handler = route.handler,
            url = %route.url,
            "Forwarding request"
        );
        let response = self.client.forward(route, payload).await?;
        transition(DispatchState::Forwarded);

        Ok(response)
    }
}

/// Re-package the inbound request for the route's payload shape.
fn shape_payload(
    request: InboundRequest,
    shape: PayloadShape,
) -> Result<ForwardPayload, DispatchError> {
    match shape {
        PayloadShape::Json => {
            if let Some(body) = request.body {
                return Ok(ForwardPayload::Json(body));
            }
            // Multipart form carrying only a message: forward it as JSON.
            let message = request
                .form_message
                .filter(|m| !m.is_empty())
                .ok_or_else(|| DispatchError::ClientRequest(MISSING_MESSAGE.to_string()))?;
            Ok(ForwardPayload::Json(serde_json::json!({ "message": message })))
        }
        PayloadShape::Multipart => {
            let file = request
                .file
                .filter(|f| !f.is_empty())
                .ok_or_else(|| DispatchError::ClientRequest(PDF_REQUIRES_FILE.to_string()))?;
            // A form `message` stands in for a missing `question`.
            let question = match request.question.filter(|q| !q.is_empty()) {
                Some(question) => Some(question),
                None => {
                    let message = request.form_message.filter(|m| !m.is_empty());
                    if message.is_some() {
                        debug!("Using form message as the document question");
                    }
                    message
                }
            };
            Ok(ForwardPayload::Multipart { file, question })
        }
    }
}

fn transition(state: DispatchState) {
    debug!(state = state.label(), terminal = state.is_terminal(), "Dispatch state");
}
