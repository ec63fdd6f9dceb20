//! Error taxonomy for the engine.
//!
//! Author: AI-Generated
//! Created: 2026-01-29

use thiserror::Error;

/// The seven failure modes an engine operation can surface.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("quote error: {0}")]
    Quote(String),

    #[error("no route found for {from} -> {to}")]
    NoRoute { from: String, to: String },

    #[error("submission error: {0}")]
    Submission(String),

    #[error("execution timed out after {0}ms")]
    ExecutionTimeout(u64),

    #[error("operation cancelled")]
    Cancelled,
}

pub type EngineResult<T> = Result<T, EngineError>;
