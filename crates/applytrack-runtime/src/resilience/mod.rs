//! Resilience patterns for applytrack-runtime.
//!
//! This module provides:
//! - Failure classification by error text
//! - The ordered model fallback chain
//! - The day-scoped rate-limit log

mod classify;
mod fallback;
mod rate_limit;

pub use classify::{classify, FailureKind, RATE_LIMIT_MARKERS};
pub use fallback::{
    ChainError, FallbackRunner, Generation, GenerationError, GenerationOutcome, ModelChain,
    ModelId, ModelInvoker, DEFAULT_MODEL_CHAIN, EXHAUSTED_HINT, NO_MODEL_MESSAGE,
};
pub use rate_limit::{RateLimitLog, RateLimitLogger, RateLimitRecord};
