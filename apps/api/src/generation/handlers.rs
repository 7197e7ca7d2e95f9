//! HTTP entry point for portfolio generation.

use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::builder::GenerationInputs;
use crate::state::AppState;
use crate::versioning::transitions;

const MAX_NAME_CHARS: usize = 200;

fn validate_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::Validation(format!(
            "name must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(name)
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub portfolio_id: Uuid,
    pub slug: String,
    pub status: &'static str,
    pub public_portfolio_url: String,
    pub private_coaching_url: String,
    pub generation_time_seconds: f64,
}

/// POST /api/v1/portfolio/generate
///
/// Synchronous: the response carries the finished portfolio's URLs. Clients
/// that would rather poll can use the status endpoint after a timeout.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<GenerateResponse>), AppError> {
    let inputs: GenerationInputs = serde_json::from_value(payload)
        .map_err(|e| AppError::Validation(format!("invalid generation request: {e}")))?;

    validate_name(&inputs.name)?;

    let started = Instant::now();
    let outcome = transitions::generate(&state.db, state.generator.as_ref(), inputs).await?;
    let elapsed = started.elapsed().as_secs_f64();

    info!(
        "Portfolio {} generated in {elapsed:.1}s",
        outcome.slug
    );

    let slug = outcome.slug;
    Ok((
        StatusCode::CREATED,
        Json(GenerateResponse {
            portfolio_id: outcome.portfolio_id,
            public_portfolio_url: format!("/portfolio/{slug}"),
            private_coaching_url: format!("/portfolio/{slug}/coaching"),
            slug,
            status: "completed",
            generation_time_seconds: (elapsed * 10.0).round() / 10.0,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_length_limit() {
        let at_limit = "a".repeat(MAX_NAME_CHARS);
        assert!(validate_name(&at_limit).is_ok());

        let over_limit = "a".repeat(MAX_NAME_CHARS + 1);
        assert!(matches!(
            validate_name(&over_limit),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_name_rejects_blank_input() {
        assert!(matches!(validate_name(""), Err(AppError::Validation(_))));
        assert!(matches!(validate_name("   "), Err(AppError::Validation(_))));
        assert_eq!(validate_name("  Ada Lovelace  ").unwrap(), "Ada Lovelace");
    }
}
