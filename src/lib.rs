//! Intent gateway — classifies requests and dispatches them to handler services.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod intent;
pub mod llm;
pub mod routing;
