//! Intent classifier — one oracle call, strict parsing, fail-closed to RAG.
//!
//! Flow:
//! 1. Build a fixed Spanish prompt with the taxonomy and few-shot examples
//! 2. Single LLM completion, bounded by a timeout
//! 3. `parse_intent_reply` → exact label match, or `Intent::Rag`
//!
//! No error ever leaves `classify`: timeouts, provider failures and
//! unparseable replies all degrade to the general-purpose RAG handler.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::LlmError;
use crate::intent::Intent;
use crate::intent::fence::strip_code_fence;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};

/// Max tokens for the classification call (the answer is a single word).
const CLASSIFY_MAX_TOKENS: u32 = 10;

/// Classification must be deterministic.
const CLASSIFY_TEMPERATURE: f32 = 0.0;

/// Default bound on the oracle round-trip.
pub const DEFAULT_CLASSIFY_TIMEOUT: Duration = Duration::from_secs(20);

/// Characters stripped from either end of the oracle reply.
const QUOTE_CHARS: &[char] = &['"', '\'', '`'];

/// Intent used whenever the oracle cannot give a usable answer.
pub const FALLBACK_INTENT: Intent = Intent::Rag;

/// Turns free text into an `Intent` using a language model.
pub struct IntentClassifier {
    llm: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl IntentClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            timeout: DEFAULT_CLASSIFY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Classify a user message. Never fails.
    pub async fn classify(&self, message: &str) -> Intent {
        if message.trim().is_empty() {
            debug!("Empty message, skipping oracle");
            return FALLBACK_INTENT;
        }

        let raw = match self.ask_oracle(message).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    model = self.llm.model_name(),
                    error = %e,
                    "Intent classification failed, falling back to rag"
                );
                return FALLBACK_INTENT;
            }
        };

        match parse_intent_reply(&raw) {
            Some(intent) => {
                info!(intent = intent.label(), "Intent classified");
                intent
            }
            None => {
                warn!(
                    raw_response = %raw,
                    "Unrecognized intent label, falling back to rag"
                );
                FALLBACK_INTENT
            }
        }
    }

    async fn ask_oracle(&self, message: &str) -> Result<String, LlmError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(build_classifier_system_prompt()),
            ChatMessage::user(build_classifier_user_prompt(message)),
        ])
        .with_temperature(CLASSIFY_TEMPERATURE)
        .with_max_tokens(CLASSIFY_MAX_TOKENS);

        match tokio::time::timeout(self.timeout, self.llm.complete(request)).await {
            Ok(result) => result.map(|response| response.content),
            Err(_) => Err(LlmError::Timeout {
                provider: self.llm.model_name().to_string(),
                timeout: self.timeout,
            }),
        }
    }
}

// ── Prompt construction ─────────────────────────────────────────────

fn build_classifier_system_prompt() -> String {
    "Eres un experto en clasificar la intención del usuario en estos temas: \
     educación financiera de preguntas y respuestas, información de estados de cuenta en PDF, \
     recomendador de compras, y solicitudes no razonables o peligrosas."
        .to_string()
}

/// Build the classification prompt around the user's message.
pub fn build_classifier_user_prompt(message: &str) -> String {
    format!(
        "Dado el siguiente mensaje de un usuario: \"{message}\"\n\
         Clasifícalo en una de las siguientes intenciones:\n\
         1. Chat RAG (preguntas y respuestas sobre educación financiera).\n\
         2. Análisis de PDF (resumen de gastos en documentos).\n\
         3. Asesor de Compras (recomendación de productos y precios).\n\
         4. Irrazonable (temas fuera de finanzas personales, ilegales o peligrosos).\n\
         Responde solo con una de las siguientes palabras, en minúsculas y sin nada más:\n\
         \"{rag}\" para Chat RAG,\n\
         \"{pdf}\" para Análisis de PDF,\n\
         \"{shopping}\" para Asesor de Compras,\n\
         \"{unreasonable}\" para solicitudes no razonables.\n\n\
         #Ejemplos\n\n\
         Ejemplo 1\n\
         Entrada: \"Como puedo dejar de gastar dinero?\"\n\
         Salida esperada: \"{rag}\"\n\n\
         Ejemplo 2\n\
         Entrada: \"Cual fue el mes que mas gastos realice?\"\n\
         Salida esperada: \"{pdf}\"\n\n\
         Ejemplo 3\n\
         Entrada: \"Que celular recomiendas comprar en este 2024?\"\n\
         Salida esperada: \"{shopping}\"\n\n\
         Ejemplo 4\n\
         Entrada: \"Quiero comprar armas de fuego\"\n\
         Salida esperada: \"{unreasonable}\"\n",
        rag = Intent::Rag.label(),
        pdf = Intent::PdfAnalysis.label(),
        shopping = Intent::Shopping.label(),
        unreasonable = Intent::Unreasonable.label(),
    )
}

// ── Response parsing ────────────────────────────────────────────────

/// Parse the oracle's raw reply into an intent.
///
/// Strips a code fence, surrounding whitespace and quotes, keeps the first
/// whitespace-delimited token, lowercases it, and requires an exact label
/// match. Anything else is `None`.
pub fn parse_intent_reply(raw: &str) -> Option<Intent> {
    let unfenced = strip_code_fence(raw);
    let unquoted = unfenced.trim().trim_matches(QUOTE_CHARS);
    let token = unquoted.split_whitespace().next()?;
    let token = token.trim_matches(QUOTE_CHARS).to_lowercase();
    Intent::from_label(&token)
}
