//! AI content production — the collaborator side of the version state machine.
//!
//! The state machine never talks to the Gemini API directly: it depends on
//! the narrow [`ContentGenerator`] trait. Generator failure is non-fatal to
//! existing data; the calling transition decides whether to mark the
//! portfolio `error` (generate) or leave everything untouched (refine).

pub mod builder;
pub mod gemini;
pub mod handlers;
pub mod prompts;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::AppError;

/// Collaborator interface for AI content production.
///
/// All three calls are fallible and side-effect free from the store's point
/// of view: a timeout or API error must be treated identically to any other
/// generation failure, and no partial version is ever persisted.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Produces the `ai_generated_content` section of a new public document.
    async fn generate_portfolio_content(
        &self,
        context: &Value,
        focus: &str,
    ) -> Result<Value, AppError>;

    /// Produces the private coaching document body.
    async fn generate_coaching_insights(
        &self,
        context: &Value,
        focus: &str,
    ) -> Result<Value, AppError>;

    /// Rewrites the full public document per the user instruction. Must return
    /// the same top-level keys; the merge engine discards any attempt to
    /// modify protected sections.
    async fn refine_content(
        &self,
        current_document: &Value,
        instruction: &str,
        sections: &[String],
    ) -> Result<Value, AppError>;
}
