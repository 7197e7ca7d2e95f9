use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle of the generation process. Distinct from `VersionState`:
/// a portfolio can be `completed` while its latest version is a draft
/// awaiting confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "portfolio_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PortfolioStatus {
    Draft,
    Generating,
    Completed,
    Error,
}

/// State of a single content snapshot. Drafts are transient: they survive
/// only until the next confirm/revert prunes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "version_state", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VersionState {
    Draft,
    Committed,
}

/// Provenance tag recording which transition produced a version. Never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "version_created_by", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VersionCreatedBy {
    Ai,
    UserManual,
    AiRefinement,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PortfolioRow {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub portfolio_focus: String,
    pub status: PortfolioStatus,
    /// Plain identifier, not a foreign key: the version does not know it is
    /// "current", so confirm/revert pruning never fights a circular constraint.
    pub current_version_id: Option<Uuid>,
    pub error_message: Option<String>,
    pub ai_generation_metadata: Option<Value>,
    pub generation_started_at: Option<DateTime<Utc>>,
    pub generation_completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An immutable content snapshot. Created once by a transition, destroyed
/// only by confirm/revert pruning.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PortfolioVersionRow {
    pub id: Uuid,
    pub portfolio_id: Uuid,
    pub version_number: i32,
    pub version_state: VersionState,
    pub public_content: Value,
    pub coaching_content: Option<Value>,
    pub changes_summary: Option<String>,
    pub created_by: VersionCreatedBy,
    pub created_at: DateTime<Utc>,
}

/// Version metadata returned by list/transition endpoints (content omitted).
#[derive(Debug, Clone, Serialize)]
pub struct VersionMetadata {
    pub id: Uuid,
    pub version_number: i32,
    pub version_state: VersionState,
    pub created_by: VersionCreatedBy,
    pub changes_summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&PortfolioVersionRow> for VersionMetadata {
    fn from(row: &PortfolioVersionRow) -> Self {
        VersionMetadata {
            id: row.id,
            version_number: row.version_number,
            version_state: row.version_state,
            created_by: row.created_by,
            changes_summary: row.changes_summary.clone(),
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_by_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(VersionCreatedBy::AiRefinement).unwrap(),
            serde_json::json!("ai_refinement")
        );
        assert_eq!(
            serde_json::to_value(VersionCreatedBy::UserManual).unwrap(),
            serde_json::json!("user_manual")
        );
        assert_eq!(
            serde_json::to_value(VersionCreatedBy::Ai).unwrap(),
            serde_json::json!("ai")
        );
    }

    #[test]
    fn test_unknown_enum_value_is_rejected() {
        // Closed enums: an unrecognized provenance tag must fail to decode,
        // never be silently accepted.
        let result: Result<VersionCreatedBy, _> = serde_json::from_value(serde_json::json!("bot"));
        assert!(result.is_err());

        let result: Result<VersionState, _> = serde_json::from_value(serde_json::json!("pending"));
        assert!(result.is_err());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            PortfolioStatus::Draft,
            PortfolioStatus::Generating,
            PortfolioStatus::Completed,
            PortfolioStatus::Error,
        ] {
            let json = serde_json::to_value(status).unwrap();
            let back: PortfolioStatus = serde_json::from_value(json).unwrap();
            assert_eq!(back, status);
        }
    }
}
