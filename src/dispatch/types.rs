//! Shared types for the dispatch pipeline.

use serde_json::Value;

// ── Inbound request ─────────────────────────────────────────────────

/// An uploaded document.
#[derive(Debug, Clone)]
pub struct FileAttachment {
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

impl FileAttachment {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A request as received on the inbound endpoint.
///
/// The HTTP layer converts JSON and multipart bodies into this; validation
/// (exactly one usable shape) happens in the dispatcher.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    /// Full JSON body, forwarded as-is to JSON handlers.
    pub body: Option<Value>,
    /// Uploaded file, if the request was multipart.
    pub file: Option<FileAttachment>,
    /// Optional question accompanying the file.
    pub question: Option<String>,
    /// Message text from a multipart form that carried no file.
    pub form_message: Option<String>,
}

impl InboundRequest {
    /// A JSON request.
    pub fn json(body: Value) -> Self {
        Self {
            body: Some(body),
            ..Default::default()
        }
    }

    /// A file upload with an optional question.
    pub fn file(file: FileAttachment, question: Option<String>) -> Self {
        Self {
            file: Some(file),
            question,
            ..Default::default()
        }
    }

    /// The non-empty file attachment, if any.
    pub fn attachment(&self) -> Option<&FileAttachment> {
        self.file.as_ref().filter(|f| !f.is_empty())
    }

    /// The non-empty `message` text, from the JSON body or the form.
    pub fn message(&self) -> Option<&str> {
        let from_body = self
            .body
            .as_ref()
            .and_then(|body| body.get("message"))
            .and_then(Value::as_str);
        from_body
            .or(self.form_message.as_deref())
            .filter(|m| !m.is_empty())
    }
}

// ── Forwarded payload ───────────────────────────────────────────────

/// A request re-shaped for a handler.
#[derive(Debug, Clone)]
pub enum ForwardPayload {
    Json(Value),
    Multipart {
        file: FileAttachment,
        question: Option<String>,
    },
}

// ── Handler response ────────────────────────────────────────────────

/// Status and JSON body returned by a handler, relayed verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status: u16,
    pub body: Value,
}

// ── Dispatch state ──────────────────────────────────────────────────

/// Per-request dispatch state, used for tracing transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Received,
    ShapeDetected,
    Classified,
    FileShortcut,
    Routed,
    Forwarded,
    Relayed,
    Rejected,
    Failed,
}

impl DispatchState {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::ShapeDetected => "shape_detected",
            Self::Classified => "classified",
            Self::FileShortcut => "file_shortcut",
            Self::Routed => "routed",
            Self::Forwarded => "forwarded",
            Self::Relayed => "relayed",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }

    /// Whether the request ends in this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Relayed | Self::Rejected | Self::Failed)
    }
}
