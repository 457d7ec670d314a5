//! Configuration types, built from environment variables.

use std::time::Duration;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

/// Default base URL of the assistant service hosting all three handlers.
pub const DEFAULT_ASSISTANT_URL: &str = "http://localhost:5001";

/// Default classification model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Absolute URLs of the downstream handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerUrls {
    pub rag: String,
    pub pdf_analysis: String,
    pub shopping: String,
}

impl HandlerUrls {
    /// Standard handler paths under one assistant base URL.
    pub fn from_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            rag: format!("{base}/assistant/rag"),
            pdf_analysis: format!("{base}/assistant/analyze-pdf"),
            shopping: format!("{base}/assistant/shopping-advisor"),
        }
    }

    /// `ASSISTANT_URL` plus per-handler overrides.
    pub fn from_env() -> Self {
        let base =
            std::env::var("ASSISTANT_URL").unwrap_or_else(|_| DEFAULT_ASSISTANT_URL.to_string());
        let mut urls = Self::from_base(&base);
        if let Ok(url) = std::env::var("GATEWAY_RAG_URL") {
            urls.rag = url;
        }
        if let Ok(url) = std::env::var("GATEWAY_PDF_URL") {
            urls.pdf_analysis = url;
        }
        if let Ok(url) = std::env::var("GATEWAY_SHOPPING_URL") {
            urls.shopping = url;
        }
        urls
    }
}

impl Default for HandlerUrls {
    fn default() -> Self {
        Self::from_base(DEFAULT_ASSISTANT_URL)
    }
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address the HTTP server binds to.
    pub bind: String,
    pub port: u16,
    pub handlers: HandlerUrls,
    /// Bound on the classification oracle call.
    pub classify_timeout: Duration,
    /// Bound on the handler forwarding call.
    pub forward_timeout: Duration,
    /// Maximum accepted request body (the PDF upload).
    pub max_upload_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 5000,
            handlers: HandlerUrls::default(),
            classify_timeout: Duration::from_secs(20),
            forward_timeout: Duration::from_secs(60),
            max_upload_bytes: 20 * 1024 * 1024, // 20 MiB
        }
    }
}

impl GatewayConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind: std::env::var("GATEWAY_BIND").unwrap_or(defaults.bind),
            port: env_parse("GATEWAY_PORT", defaults.port),
            handlers: HandlerUrls::from_env(),
            classify_timeout: Duration::from_secs(env_parse(
                "GATEWAY_CLASSIFY_TIMEOUT_SECS",
                defaults.classify_timeout.as_secs(),
            )),
            forward_timeout: Duration::from_secs(env_parse(
                "GATEWAY_FORWARD_TIMEOUT_SECS",
                defaults.forward_timeout.as_secs(),
            )),
            max_upload_bytes: env_parse("GATEWAY_MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
        }
    }

    /// Socket address string for the listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Build the classifier's LLM config from the environment.
pub fn llm_config_from_env() -> Result<LlmConfig, ConfigError> {
    let backend = match std::env::var("GATEWAY_LLM_BACKEND") {
        Ok(name) => LlmBackend::parse(&name).ok_or_else(|| ConfigError::InvalidValue {
            key: "GATEWAY_LLM_BACKEND".into(),
            message: format!("unknown backend '{name}' (expected openai or anthropic)"),
        })?,
        Err(_) => LlmBackend::OpenAi,
    };

    let key_var = backend.api_key_var();
    let api_key = std::env::var(key_var)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key_var.to_string()))?;

    let model = std::env::var("GATEWAY_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

    Ok(LlmConfig {
        backend,
        api_key: secrecy::SecretString::from(api_key),
        model,
    })
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}
