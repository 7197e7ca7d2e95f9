//! HTTP surface of the version state machine: refine/confirm/revert/edit
//! transitions plus the read-only portfolio, coaching, status, and version
//! listing endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::portfolio::{PortfolioStatus, VersionMetadata};
use crate::state::AppState;
use crate::versioning::transitions;

const MAX_INSTRUCTION_CHARS: usize = 1000;

fn validate_instruction(instruction: &str) -> Result<&str, AppError> {
    let instruction = instruction.trim();
    if instruction.is_empty() {
        return Err(AppError::Validation(
            "instruction must not be empty".to_string(),
        ));
    }
    if instruction.chars().count() > MAX_INSTRUCTION_CHARS {
        return Err(AppError::Validation(format!(
            "instruction must be at most {MAX_INSTRUCTION_CHARS} characters"
        )));
    }
    Ok(instruction)
}

#[derive(Debug, Deserialize)]
pub struct RefineRequest {
    pub instruction: String,
    /// Section aliases to target; `["all"]` rewrites the whole document.
    #[serde(default = "default_sections")]
    pub sections: Vec<String>,
}

fn default_sections() -> Vec<String> {
    vec!["all".to_string()]
}

#[derive(Debug, Serialize)]
pub struct RefineResponse {
    pub version: VersionMetadata,
    pub sections_updated: Vec<String>,
    pub portfolio: Value,
}

#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub status: &'static str,
    pub version: VersionMetadata,
    pub versions_pruned: u64,
}

#[derive(Debug, Deserialize)]
pub struct RevertRequest {
    pub version_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct RevertResponse {
    pub status: &'static str,
    pub version: VersionMetadata,
    pub restored_from_version: i32,
    pub versions_pruned: u64,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub updates: Map<String, Value>,
    pub changes_summary: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub version: VersionMetadata,
    pub portfolio: Value,
}

#[derive(Debug, Serialize)]
pub struct VersionListResponse {
    pub versions: Vec<VersionMetadata>,
    pub total_count: usize,
}

#[derive(Debug, Serialize)]
pub struct VersionContentResponse {
    #[serde(flatten)]
    pub version: VersionMetadata,
    pub public_content: Value,
}

// ────────────────────────── Transitions ──────────────────────────

/// POST /api/v1/portfolio/:slug/refine
pub async fn handle_refine(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(request): Json<RefineRequest>,
) -> Result<Json<RefineResponse>, AppError> {
    let instruction = validate_instruction(&request.instruction)?;

    let outcome = transitions::refine(
        &state.db,
        state.generator.as_ref(),
        &slug,
        instruction,
        &request.sections,
    )
    .await?;

    Ok(Json(RefineResponse {
        version: outcome.version,
        sections_updated: outcome.sections_updated,
        portfolio: outcome.public_content,
    }))
}

/// POST /api/v1/portfolio/:slug/confirm
pub async fn handle_confirm(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ConfirmResponse>, AppError> {
    let outcome = transitions::confirm(&state.db, &slug).await?;
    Ok(Json(ConfirmResponse {
        status: "confirmed",
        version: outcome.version,
        versions_pruned: outcome.pruned,
    }))
}

/// POST /api/v1/portfolio/:slug/revert
pub async fn handle_revert(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(request): Json<RevertRequest>,
) -> Result<Json<RevertResponse>, AppError> {
    let outcome = transitions::revert(&state.db, &slug, request.version_id).await?;
    Ok(Json(RevertResponse {
        status: "reverted",
        version: outcome.version,
        restored_from_version: outcome.restored_from,
        versions_pruned: outcome.pruned,
    }))
}

/// PATCH /api/v1/portfolio/:slug
pub async fn handle_edit(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(request): Json<EditRequest>,
) -> Result<Json<EditResponse>, AppError> {
    if request.updates.is_empty() {
        return Err(AppError::Validation(
            "updates must contain at least one field".to_string(),
        ));
    }

    let outcome =
        transitions::edit(&state.db, &slug, &request.updates, request.changes_summary).await?;

    Ok(Json(EditResponse {
        version: outcome.version,
        portfolio: outcome.public_content,
    }))
}

// ────────────────────────── Reads ──────────────────────────

/// GET /api/v1/portfolio/:slug — the public document of the current version.
///
/// Returns 202 while generation is still running so clients can poll.
pub async fn handle_get_portfolio(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let portfolio = transitions::require_portfolio(&state.db, &slug).await?;

    match portfolio.status {
        PortfolioStatus::Generating => Ok((
            StatusCode::ACCEPTED,
            Json(json!({
                "slug": portfolio.slug,
                "status": "generating",
                "message": "Portfolio generation in progress, retry shortly"
            })),
        )
            .into_response()),
        PortfolioStatus::Error => Err(AppError::GenerationFailed(
            portfolio
                .error_message
                .unwrap_or_else(|| "Portfolio generation failed".to_string()),
        )),
        PortfolioStatus::Draft => Err(AppError::InvalidState(format!(
            "Portfolio {slug} has not been generated yet"
        ))),
        PortfolioStatus::Completed => {
            let version = transitions::resolve_current_version(&state.db, &portfolio).await?;
            Ok(Json(version.public_content).into_response())
        }
    }
}

/// GET /api/v1/portfolio/:slug/coaching — the private coaching document.
pub async fn handle_get_coaching(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, AppError> {
    let portfolio = transitions::require_portfolio(&state.db, &slug).await?;

    if portfolio.status != PortfolioStatus::Completed {
        return Err(AppError::InvalidState(format!(
            "Portfolio {slug} is not completed (status: {:?})",
            portfolio.status
        )));
    }

    let version = transitions::resolve_current_version(&state.db, &portfolio).await?;
    version
        .coaching_content
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No coaching content for portfolio {slug}")))
}

/// GET /api/v1/portfolio/:slug/status — generation lifecycle, cheap to poll.
pub async fn handle_get_status(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, AppError> {
    let portfolio = transitions::require_portfolio(&state.db, &slug).await?;

    Ok(Json(json!({
        "slug": portfolio.slug,
        "status": portfolio.status,
        "current_version_id": portfolio.current_version_id,
        "error_message": portfolio.error_message,
        "generation_started_at": portfolio.generation_started_at,
        "generation_completed_at": portfolio.generation_completed_at,
    })))
}

/// GET /api/v1/portfolio/:slug/versions
pub async fn handle_list_versions(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<VersionListResponse>, AppError> {
    let versions = transitions::list_versions(&state.db, &slug).await?;
    let total_count = versions.len();
    Ok(Json(VersionListResponse {
        versions,
        total_count,
    }))
}

/// GET /api/v1/portfolio/:slug/versions/:version_id
pub async fn handle_get_version(
    State(state): State<AppState>,
    Path((slug, version_id)): Path<(String, Uuid)>,
) -> Result<Json<VersionContentResponse>, AppError> {
    let row = transitions::get_version(&state.db, &slug, version_id).await?;
    Ok(Json(VersionContentResponse {
        version: (&row).into(),
        public_content: row.public_content.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refine_request_defaults_sections_to_all() {
        let request: RefineRequest =
            serde_json::from_value(json!({ "instruction": "tighten the summary" })).unwrap();
        assert_eq!(request.sections, vec!["all".to_string()]);
    }

    #[test]
    fn test_refine_request_accepts_explicit_sections() {
        let request: RefineRequest = serde_json::from_value(json!({
            "instruction": "expand",
            "sections": ["summary", "projects"]
        }))
        .unwrap();
        assert_eq!(request.sections, vec!["summary", "projects"]);
    }

    #[test]
    fn test_edit_request_summary_is_optional() {
        let request: EditRequest = serde_json::from_value(json!({
            "updates": { "professional_summary": "New text" }
        }))
        .unwrap();
        assert!(request.changes_summary.is_none());
        assert_eq!(request.updates.len(), 1);
    }

    #[test]
    fn test_revert_request_requires_uuid() {
        let result: Result<RevertRequest, _> =
            serde_json::from_value(json!({ "version_id": "not-a-uuid" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_instruction_length_limit() {
        let at_limit = "a".repeat(MAX_INSTRUCTION_CHARS);
        assert!(validate_instruction(&at_limit).is_ok());

        let over_limit = "a".repeat(MAX_INSTRUCTION_CHARS + 1);
        assert!(matches!(
            validate_instruction(&over_limit),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_instruction_rejects_blank_input() {
        assert!(matches!(
            validate_instruction("   "),
            Err(AppError::Validation(_))
        ));
        assert_eq!(validate_instruction("  tighten  ").unwrap(), "tighten");
    }
}
