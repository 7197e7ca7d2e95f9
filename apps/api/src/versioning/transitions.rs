//! Version State Machine — the transitions that create, promote, or discard
//! portfolio versions.
//!
//! Each mutating transition is one atomic unit: read latest → compute next →
//! insert → repoint → (maybe) prune, all inside a single transaction holding
//! the portfolio row lock. A failure anywhere rolls the whole unit back;
//! there is no partial-pruning state and no orphaned draft.
//!
//! The decision of WHAT a transition writes lives in the pure `*_plan`
//! functions; the transaction code only executes the plan. Transitions that
//! call the content generator (generate, refine) do the network call outside
//! the lock and treat collaborator failure as non-fatal to existing data.

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::builder::{
    build_coaching_document, build_public_document, data_sources_used, prepare_ai_context,
    GenerationInputs,
};
use crate::generation::ContentGenerator;
use crate::models::portfolio::{
    PortfolioRow, PortfolioStatus, PortfolioVersionRow, VersionCreatedBy, VersionMetadata,
    VersionState,
};
use crate::slug::generate_portfolio_slug;
use crate::versioning::merge::{apply_field_patch, merge_refined_document};
use crate::versioning::store::{self, NewVersion};

const SLUG_RETRY_ATTEMPTS: u32 = 3;
/// Instruction excerpt length recorded in a refinement's changes summary.
const SUMMARY_INSTRUCTION_CHARS: usize = 100;

pub struct GenerateOutcome {
    pub portfolio_id: Uuid,
    pub slug: String,
    pub version: VersionMetadata,
}

pub struct RefineOutcome {
    pub version: VersionMetadata,
    pub sections_updated: Vec<String>,
    pub public_content: Value,
}

pub struct ConfirmOutcome {
    pub version: VersionMetadata,
    pub pruned: u64,
}

pub struct RevertOutcome {
    pub version: VersionMetadata,
    pub restored_from: i32,
    pub pruned: u64,
}

pub struct EditOutcome {
    pub version: VersionMetadata,
    pub public_content: Value,
}

/// What a mutating transition writes: the version row to insert, the status
/// the portfolio moves to (`None` leaves it untouched), and whether every
/// other version is pruned afterwards.
struct VersionPlan<'a> {
    version: NewVersion<'a>,
    new_status: Option<PortfolioStatus>,
    prune_others: bool,
}

fn refine_plan<'a>(
    latest: &'a PortfolioVersionRow,
    merged: &'a Value,
    instruction: &str,
) -> VersionPlan<'a> {
    VersionPlan {
        version: NewVersion {
            portfolio_id: latest.portfolio_id,
            version_number: store::next_version_number(Some(latest.version_number)),
            version_state: VersionState::Draft,
            public_content: merged,
            // Coaching content is carried over unchanged unless regenerated.
            coaching_content: latest.coaching_content.as_ref(),
            changes_summary: refine_summary(instruction),
            created_by: VersionCreatedBy::AiRefinement,
        },
        new_status: None,
        prune_others: false,
    }
}

fn confirm_plan(latest: &PortfolioVersionRow) -> VersionPlan<'_> {
    VersionPlan {
        version: NewVersion {
            portfolio_id: latest.portfolio_id,
            version_number: store::next_version_number(Some(latest.version_number)),
            version_state: VersionState::Committed,
            public_content: &latest.public_content,
            coaching_content: latest.coaching_content.as_ref(),
            changes_summary: "Portfolio confirmed and finalized".to_string(),
            created_by: VersionCreatedBy::UserManual,
        },
        new_status: Some(PortfolioStatus::Completed),
        prune_others: true,
    }
}

/// The new number continues from the portfolio-wide maximum, not from the
/// target's number, so numbers stay monotonic across a revert.
fn revert_plan<'a>(
    target: &'a PortfolioVersionRow,
    max_number: Option<i32>,
) -> VersionPlan<'a> {
    VersionPlan {
        version: NewVersion {
            portfolio_id: target.portfolio_id,
            version_number: store::next_version_number(max_number),
            version_state: VersionState::Committed,
            public_content: &target.public_content,
            coaching_content: target.coaching_content.as_ref(),
            changes_summary: format!("Reverted to version {}", target.version_number),
            created_by: VersionCreatedBy::UserManual,
        },
        new_status: Some(PortfolioStatus::Completed),
        prune_others: true,
    }
}

fn edit_plan<'a>(
    latest: &'a PortfolioVersionRow,
    patched: &'a Value,
    changes_summary: Option<String>,
) -> VersionPlan<'a> {
    VersionPlan {
        version: NewVersion {
            portfolio_id: latest.portfolio_id,
            version_number: store::next_version_number(Some(latest.version_number)),
            version_state: VersionState::Committed,
            public_content: patched,
            coaching_content: latest.coaching_content.as_ref(),
            changes_summary: changes_summary.unwrap_or_else(|| "Manual edit".to_string()),
            created_by: VersionCreatedBy::UserManual,
        },
        new_status: None,
        prune_others: false,
    }
}

/// Executes a plan inside the caller's transaction: insert, repoint, and
/// prune when the plan says so. Repointing here is the only write path for
/// `current_version_id`, so every transition leaves exactly one current
/// version.
async fn execute_plan(
    tx: &mut Transaction<'_, Postgres>,
    transition: &str,
    portfolio_id: Uuid,
    plan: VersionPlan<'_>,
) -> Result<(PortfolioVersionRow, u64), AppError> {
    let version = store::insert_version(&mut **tx, plan.version)
        .await
        .map_err(|e| AppError::from_db(transition, e))?;

    store::repoint_current(&mut **tx, portfolio_id, version.id, plan.new_status)
        .await
        .map_err(|e| AppError::from_db(transition, e))?;

    let pruned = if plan.prune_others {
        store::prune_other_versions(&mut **tx, portfolio_id, version.id)
            .await
            .map_err(|e| AppError::from_db(transition, e))?
    } else {
        0
    };

    Ok((version, pruned))
}

/// Creates a portfolio and its first version from AI-generated content.
///
/// Generator failure marks the portfolio `error` and persists no version;
/// the caller sees `GenerationFailed` and may retry with a new request.
pub async fn generate(
    pool: &PgPool,
    generator: &dyn ContentGenerator,
    inputs: GenerationInputs,
) -> Result<GenerateOutcome, AppError> {
    let portfolio = create_portfolio(pool, &inputs).await?;
    info!(
        "Generating portfolio for {} with slug {}",
        inputs.name, portfolio.slug
    );

    let context = prepare_ai_context(&inputs);
    let focus = inputs.portfolio_focus.clone();

    let ai_content = match generator.generate_portfolio_content(&context, &focus).await {
        Ok(content) => content,
        Err(e) => return Err(fail_generation(pool, portfolio.id, e).await),
    };
    let coaching_insights = match generator.generate_coaching_insights(&context, &focus).await {
        Ok(insights) => insights,
        Err(e) => return Err(fail_generation(pool, portfolio.id, e).await),
    };

    let public_content = build_public_document(&inputs, &portfolio.slug, &ai_content);
    let coaching_content = build_coaching_document(&inputs, &coaching_insights);

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::from_db("generate", e))?;

    store::lock_portfolio_by_id(&mut *tx, portfolio.id)
        .await
        .map_err(|e| AppError::from_db("generate", e))?
        .ok_or_else(|| {
            AppError::NotFound(format!("Portfolio {} disappeared mid-generation", portfolio.id))
        })?;

    if store::max_version_number(&mut *tx, portfolio.id)
        .await
        .map_err(|e| AppError::from_db("generate", e))?
        .is_some()
    {
        return Err(AppError::InvalidState(format!(
            "generate: portfolio {} already has a version",
            portfolio.slug
        )));
    }

    let version = store::insert_version(
        &mut *tx,
        NewVersion {
            portfolio_id: portfolio.id,
            version_number: 1,
            version_state: VersionState::Committed,
            public_content: &public_content,
            coaching_content: Some(&coaching_content),
            changes_summary: "Initial portfolio generation".to_string(),
            created_by: VersionCreatedBy::Ai,
        },
    )
    .await
    .map_err(|e| AppError::from_db("generate", e))?;

    let metadata = json!({
        "model": crate::llm_client::MODEL,
        "generated_at": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        "sources_used": data_sources_used(&inputs),
    });
    store::complete_generation(&mut *tx, portfolio.id, version.id, &metadata)
        .await
        .map_err(|e| AppError::from_db("generate", e))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from_db("generate", e))?;

    info!(
        "Generated portfolio {} with committed version 1",
        portfolio.slug
    );

    Ok(GenerateOutcome {
        portfolio_id: portfolio.id,
        slug: portfolio.slug,
        version: (&version).into(),
    })
}

/// AI-assisted rewrite of the latest version into a new draft.
///
/// The draft supersedes the previous pointer but deletes nothing; earlier
/// versions stay in the store until a confirm/revert prunes them. On
/// collaborator failure the store and pointer are left exactly as before.
pub async fn refine(
    pool: &PgPool,
    generator: &dyn ContentGenerator,
    slug: &str,
    instruction: &str,
    sections: &[String],
) -> Result<RefineOutcome, AppError> {
    let portfolio = require_portfolio(pool, slug).await?;
    let latest = store::latest_version(pool, portfolio.id)
        .await?
        .ok_or_else(|| no_version_yet("refine", slug))?;

    info!(
        "Refining portfolio {slug} from version {} ({:?})",
        latest.version_number, latest.version_state
    );

    // Collaborator call happens outside any lock and before any write;
    // holding a row lock across network I/O would stall every other
    // transition on this portfolio.
    let merged =
        produce_refined_document(generator, &latest.public_content, instruction, sections).await?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::from_db("refine", e))?;

    store::lock_portfolio_by_id(&mut *tx, portfolio.id)
        .await
        .map_err(|e| AppError::from_db("refine", e))?
        .ok_or_else(|| AppError::NotFound(format!("Portfolio not found with slug: {slug}")))?;

    // Optimistic check: another transition may have landed while the model ran.
    let max_now = store::max_version_number(&mut *tx, portfolio.id)
        .await
        .map_err(|e| AppError::from_db("refine", e))?;
    if max_now != Some(latest.version_number) {
        return Err(AppError::ConcurrencyConflict(format!(
            "refine: portfolio {slug} changed while content was being generated, retry"
        )));
    }

    let plan = refine_plan(&latest, &merged, instruction);
    let (version, _) = execute_plan(&mut tx, "refine", portfolio.id, plan).await?;

    tx.commit()
        .await
        .map_err(|e| AppError::from_db("refine", e))?;

    info!(
        "Created draft version {} for portfolio {slug}",
        version.version_number
    );

    Ok(RefineOutcome {
        version: (&version).into(),
        sections_updated: sections.to_vec(),
        public_content: merged,
    })
}

/// Finalizes the latest version: copies it into a new committed version,
/// repoints, and irreversibly deletes every other version of the portfolio.
pub async fn confirm(pool: &PgPool, slug: &str) -> Result<ConfirmOutcome, AppError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::from_db("confirm", e))?;

    let portfolio = store::lock_portfolio_by_slug(&mut *tx, slug)
        .await
        .map_err(|e| AppError::from_db("confirm", e))?
        .ok_or_else(|| AppError::NotFound(format!("Portfolio not found with slug: {slug}")))?;

    let latest = store::latest_version(&mut *tx, portfolio.id)
        .await?
        .ok_or_else(|| no_version_yet("confirm", slug))?;

    let plan = confirm_plan(&latest);
    let (version, pruned) = execute_plan(&mut tx, "confirm", portfolio.id, plan).await?;

    tx.commit()
        .await
        .map_err(|e| AppError::from_db("confirm", e))?;

    info!(
        "Confirmed portfolio {slug}: committed version {}, pruned {pruned} other versions",
        version.version_number
    );

    Ok(ConfirmOutcome {
        version: (&version).into(),
        pruned,
    })
}

/// Restores an arbitrary prior version by copying its content into a new
/// committed version, then prunes all others.
pub async fn revert(
    pool: &PgPool,
    slug: &str,
    version_id: Uuid,
) -> Result<RevertOutcome, AppError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::from_db("revert", e))?;

    let portfolio = store::lock_portfolio_by_slug(&mut *tx, slug)
        .await
        .map_err(|e| AppError::from_db("revert", e))?
        .ok_or_else(|| AppError::NotFound(format!("Portfolio not found with slug: {slug}")))?;

    let target = store::get_version(&mut *tx, portfolio.id, version_id)
        .await
        .map_err(|e| AppError::from_db("revert", e))?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Version not found or does not belong to portfolio: {version_id}"
            ))
        })?;

    let max_number = store::max_version_number(&mut *tx, portfolio.id)
        .await
        .map_err(|e| AppError::from_db("revert", e))?;

    let plan = revert_plan(&target, max_number);
    let (version, pruned) = execute_plan(&mut tx, "revert", portfolio.id, plan).await?;

    tx.commit()
        .await
        .map_err(|e| AppError::from_db("revert", e))?;

    info!(
        "Reverted portfolio {slug} to version {}: committed version {}, pruned {pruned} other versions",
        target.version_number, version.version_number
    );

    Ok(RevertOutcome {
        version: (&version).into(),
        restored_from: target.version_number,
        pruned,
    })
}

/// Manual field-level edit. Applies the allow-listed patch onto the latest
/// version's content and records the result as a new committed version.
/// Unlike confirm/revert, history is preserved.
pub async fn edit(
    pool: &PgPool,
    slug: &str,
    updates: &Map<String, Value>,
    changes_summary: Option<String>,
) -> Result<EditOutcome, AppError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::from_db("edit", e))?;

    let portfolio = store::lock_portfolio_by_slug(&mut *tx, slug)
        .await
        .map_err(|e| AppError::from_db("edit", e))?
        .ok_or_else(|| AppError::NotFound(format!("Portfolio not found with slug: {slug}")))?;

    let latest = store::latest_version(&mut *tx, portfolio.id)
        .await?
        .ok_or_else(|| no_version_yet("edit", slug))?;

    let patched = apply_field_patch(&latest.public_content, updates, Utc::now())?;

    let plan = edit_plan(&latest, &patched, changes_summary);
    let (version, _) = execute_plan(&mut tx, "edit", portfolio.id, plan).await?;

    tx.commit()
        .await
        .map_err(|e| AppError::from_db("edit", e))?;

    info!(
        "Portfolio {slug} manually edited, created version {}",
        version.version_number
    );

    Ok(EditOutcome {
        version: (&version).into(),
        public_content: patched,
    })
}

/// Version metadata ordered newest-first by version number.
pub async fn list_versions(pool: &PgPool, slug: &str) -> Result<Vec<VersionMetadata>, AppError> {
    let portfolio = require_portfolio(pool, slug).await?;
    let rows = store::list_versions(pool, portfolio.id).await?;
    Ok(rows.iter().map(VersionMetadata::from).collect())
}

/// Full content of one version, ownership-checked against the slug.
pub async fn get_version(
    pool: &PgPool,
    slug: &str,
    version_id: Uuid,
) -> Result<PortfolioVersionRow, AppError> {
    let portfolio = require_portfolio(pool, slug).await?;
    store::get_version(pool, portfolio.id, version_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Version not found or does not belong to portfolio: {version_id}"
            ))
        })
}

pub async fn require_portfolio(pool: &PgPool, slug: &str) -> Result<PortfolioRow, AppError> {
    store::fetch_portfolio_by_slug(pool, slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Portfolio not found with slug: {slug}")))
}

/// Resolves the version the portfolio currently points at. A completed
/// portfolio whose pointer is missing or dangling is corrupted state.
pub async fn resolve_current_version(
    pool: &PgPool,
    portfolio: &PortfolioRow,
) -> Result<PortfolioVersionRow, AppError> {
    let version_id = portfolio.current_version_id.ok_or_else(|| {
        AppError::IntegrityViolation(format!(
            "completed portfolio {} has no current version pointer",
            portfolio.slug
        ))
    })?;

    store::get_version(pool, portfolio.id, version_id)
        .await?
        .ok_or_else(|| {
            AppError::IntegrityViolation(format!(
                "current version {version_id} of portfolio {} does not resolve",
                portfolio.slug
            ))
        })
}

/// Runs the collaborator and merges its output. Pure of the store: until
/// this returns `Ok`, refine has written nothing, so a failing model leaves
/// every version and the current pointer exactly as they were.
async fn produce_refined_document(
    generator: &dyn ContentGenerator,
    current: &Value,
    instruction: &str,
    sections: &[String],
) -> Result<Value, AppError> {
    let refined = generator
        .refine_content(current, instruction, sections)
        .await
        .map_err(|e| AppError::RefinementFailed(e.to_string()))?;

    merge_refined_document(current, &refined)
}

async fn create_portfolio(
    pool: &PgPool,
    inputs: &GenerationInputs,
) -> Result<PortfolioRow, AppError> {
    let mut last_collision = None;
    for _ in 0..SLUG_RETRY_ATTEMPTS {
        let slug = generate_portfolio_slug(&inputs.name);
        match store::insert_portfolio(pool, &slug, &inputs.name, &inputs.portfolio_focus).await {
            Ok(row) => return Ok(row),
            Err(AppError::DuplicateSlug(taken)) => {
                warn!("Slug collision on {taken}, regenerating");
                last_collision = Some(AppError::DuplicateSlug(taken));
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_collision
        .unwrap_or_else(|| AppError::Internal(anyhow::anyhow!("slug retry loop exhausted"))))
}

async fn fail_generation(pool: &PgPool, portfolio_id: Uuid, err: AppError) -> AppError {
    let message = err.to_string();
    if let Err(db_err) = store::mark_error(pool, portfolio_id, &message).await {
        tracing::error!("Failed to mark portfolio {portfolio_id} as error: {db_err}");
    }
    AppError::GenerationFailed(message)
}

fn no_version_yet(transition: &str, slug: &str) -> AppError {
    AppError::InvalidState(format!(
        "{transition}: no version exists yet for portfolio {slug}, generate it first"
    ))
}

fn refine_summary(instruction: &str) -> String {
    let excerpt: String = instruction.chars().take(SUMMARY_INSTRUCTION_CHARS).collect();
    format!("AI refinement: {excerpt}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    fn sample_document() -> Value {
        json!({
            "personal_info": { "name": "Ada Lovelace", "slug": "ada-1a2b3c", "focus": "backend" },
            "ai_generated_content": {
                "professional_summary": "Original summary.",
                "key_strengths": ["analysis"],
                "work_experience": [],
                "project_highlights": [],
                "achievements": [],
                "skills_summary": { "languages": ["Rust"], "frameworks": [], "tools": [] },
                "contact_info": {}
            },
            "data_sources": { "github_projects": [{ "name": "engine" }] },
            "metadata": { "generated_at": "2026-01-01T00:00:00Z", "data_sources_used": ["github"], "portfolio_focus": "backend" }
        })
    }

    fn sample_version(version_number: i32) -> PortfolioVersionRow {
        PortfolioVersionRow {
            id: Uuid::new_v4(),
            portfolio_id: Uuid::new_v4(),
            version_number,
            version_state: VersionState::Draft,
            public_content: sample_document(),
            coaching_content: Some(json!({ "skill_analysis": { "gaps": ["distributed systems"] } })),
            changes_summary: Some("AI refinement: tighten".to_string()),
            created_by: VersionCreatedBy::AiRefinement,
            created_at: Utc::now(),
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl ContentGenerator for FailingGenerator {
        async fn generate_portfolio_content(&self, _: &Value, _: &str) -> Result<Value, AppError> {
            Err(AppError::Llm("model unavailable".to_string()))
        }
        async fn generate_coaching_insights(&self, _: &Value, _: &str) -> Result<Value, AppError> {
            Err(AppError::Llm("model unavailable".to_string()))
        }
        async fn refine_content(
            &self,
            _: &Value,
            _: &str,
            _: &[String],
        ) -> Result<Value, AppError> {
            Err(AppError::Llm("model unavailable".to_string()))
        }
    }

    struct TamperingGenerator;

    #[async_trait]
    impl ContentGenerator for TamperingGenerator {
        async fn generate_portfolio_content(&self, _: &Value, _: &str) -> Result<Value, AppError> {
            unreachable!()
        }
        async fn generate_coaching_insights(&self, _: &Value, _: &str) -> Result<Value, AppError> {
            unreachable!()
        }
        async fn refine_content(
            &self,
            _: &Value,
            _: &str,
            _: &[String],
        ) -> Result<Value, AppError> {
            Ok(json!({
                "personal_info": { "name": "Mallory" },
                "data_sources": {},
                "ai_generated_content": { "professional_summary": "Refined." }
            }))
        }
    }

    #[test]
    fn test_refine_plan_is_a_draft_carrying_coaching_unchanged() {
        let latest = sample_version(3);
        let merged = sample_document();
        let plan = refine_plan(&latest, &merged, "tighten the summary");

        assert_eq!(plan.version.version_number, 4);
        assert_eq!(plan.version.version_state, VersionState::Draft);
        assert_eq!(plan.version.created_by, VersionCreatedBy::AiRefinement);
        assert_eq!(
            plan.version.coaching_content,
            latest.coaching_content.as_ref()
        );
        assert_eq!(
            plan.version.changes_summary,
            "AI refinement: tighten the summary"
        );
        // Refine supersedes but never deletes and never touches status
        assert!(!plan.prune_others);
        assert!(plan.new_status.is_none());
    }

    #[test]
    fn test_confirm_plan_commits_a_copy_and_prunes() {
        let latest = sample_version(5);
        let plan = confirm_plan(&latest);

        assert_eq!(plan.version.version_number, 6);
        assert_eq!(plan.version.version_state, VersionState::Committed);
        assert_eq!(plan.version.created_by, VersionCreatedBy::UserManual);
        assert_eq!(plan.version.public_content, &latest.public_content);
        assert_eq!(
            plan.version.coaching_content,
            latest.coaching_content.as_ref()
        );
        assert_eq!(
            plan.version.changes_summary,
            "Portfolio confirmed and finalized"
        );
        // After confirm exactly one version survives: the one just inserted
        assert!(plan.prune_others);
        assert_eq!(plan.new_status, Some(PortfolioStatus::Completed));
    }

    #[test]
    fn test_revert_plan_numbers_from_portfolio_max_not_target() {
        let target = sample_version(2);
        let plan = revert_plan(&target, Some(7));

        assert_eq!(plan.version.version_number, 8);
        assert_eq!(plan.version.version_state, VersionState::Committed);
        assert_eq!(plan.version.created_by, VersionCreatedBy::UserManual);
        assert_eq!(plan.version.public_content, &target.public_content);
        assert_eq!(plan.version.changes_summary, "Reverted to version 2");
        assert!(plan.prune_others);
        assert_eq!(plan.new_status, Some(PortfolioStatus::Completed));
    }

    #[test]
    fn test_edit_plan_preserves_history_and_status() {
        let latest = sample_version(3);
        let patched = sample_document();
        let plan = edit_plan(&latest, &patched, None);

        assert_eq!(plan.version.version_number, 4);
        assert_eq!(plan.version.version_state, VersionState::Committed);
        assert_eq!(plan.version.created_by, VersionCreatedBy::UserManual);
        assert_eq!(plan.version.changes_summary, "Manual edit");
        assert_eq!(
            plan.version.coaching_content,
            latest.coaching_content.as_ref()
        );
        assert!(!plan.prune_others);
        assert!(plan.new_status.is_none());

        let plan = edit_plan(&latest, &patched, Some("Fixed a typo".to_string()));
        assert_eq!(plan.version.changes_summary, "Fixed a typo");
    }

    #[tokio::test]
    async fn test_refine_failure_produces_no_document() {
        let current = sample_document();
        let err = produce_refined_document(
            &FailingGenerator,
            &current,
            "shorten",
            &["all".to_string()],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::RefinementFailed(_)));
    }

    #[tokio::test]
    async fn test_refined_document_keeps_protected_sections() {
        let current = sample_document();
        let merged = produce_refined_document(
            &TamperingGenerator,
            &current,
            "shorten",
            &["summary".to_string()],
        )
        .await
        .unwrap();

        assert_eq!(
            merged["ai_generated_content"]["professional_summary"],
            "Refined."
        );
        assert_eq!(merged["personal_info"], current["personal_info"]);
        assert_eq!(merged["data_sources"], current["data_sources"]);
    }

    #[test]
    fn test_refine_summary_truncates_long_instructions() {
        let instruction = "a".repeat(500);
        let summary = refine_summary(&instruction);
        assert_eq!(summary.chars().count(), "AI refinement: ".len() + 100);
    }

    #[test]
    fn test_refine_summary_keeps_short_instructions_whole() {
        assert_eq!(
            refine_summary("make it punchier"),
            "AI refinement: make it punchier"
        );
    }

    #[test]
    fn test_no_version_yet_names_the_transition() {
        let err = no_version_yet("confirm", "ada-1a2b3c");
        match err {
            AppError::InvalidState(msg) => {
                assert!(msg.starts_with("confirm:"));
                assert!(msg.contains("ada-1a2b3c"));
            }
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }
}
