//! Generative pipeline error types.

use thiserror::Error;

/// Ways a generative pipeline invocation (or its one-time setup) can fail.
///
/// None of these reach the caller of `IntentResolver::resolve`; every variant
/// routes resolution to the rule-based fallback.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("generative pipeline disabled")]
    Disabled,

    #[error("pipeline initialization failed: {0}")]
    Init(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("model server returned status {0}")]
    Status(u16),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("model returned no message")]
    EmptyResponse,
}

/// Convenience alias for pipeline results.
pub type PipelineResult<T> = Result<T, PipelineError>;
