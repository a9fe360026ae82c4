//! AI-assisted analysis (spec §1/§7): an opaque text-completion service
//! that is explicitly recoverable — on failure or an open breaker,
//! `AiService` returns a deterministic fallback and marks the response
//! degraded instead of propagating an error.

mod provider;
mod service;

pub use provider::ReqwestAiProvider;
pub use service::{AiAnalysis, AiService};
