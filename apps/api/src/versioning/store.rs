//! Version Store — all SQL touching the `portfolios` and `portfolio_versions`
//! tables. Functions take any `PgExecutor` so transitions can run them inside
//! a transaction while read-only handlers use the pool directly.

use serde_json::Value;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::portfolio::{
    PortfolioRow, PortfolioStatus, PortfolioVersionRow, VersionCreatedBy, VersionState,
};

/// Computes the number for the next version to be created.
///
/// Always max(existing) + 1. Pruning keeps the highest-numbered version
/// alive, so numbers are never reused even across a confirm/revert boundary.
pub fn next_version_number(max_existing: Option<i32>) -> i32 {
    max_existing.unwrap_or(0) + 1
}

pub async fn fetch_portfolio_by_slug<'e, E: PgExecutor<'e>>(
    executor: E,
    slug: &str,
) -> Result<Option<PortfolioRow>, sqlx::Error> {
    sqlx::query_as::<_, PortfolioRow>("SELECT * FROM portfolios WHERE slug = $1")
        .bind(slug)
        .fetch_optional(executor)
        .await
}

/// Locks the portfolio row for the duration of the enclosing transaction.
/// This is the per-portfolio serialization point: every mutating transition
/// acquires this lock before reading the latest version.
pub async fn lock_portfolio_by_slug<'e, E: PgExecutor<'e>>(
    executor: E,
    slug: &str,
) -> Result<Option<PortfolioRow>, sqlx::Error> {
    sqlx::query_as::<_, PortfolioRow>("SELECT * FROM portfolios WHERE slug = $1 FOR UPDATE")
        .bind(slug)
        .fetch_optional(executor)
        .await
}

pub async fn lock_portfolio_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    portfolio_id: Uuid,
) -> Result<Option<PortfolioRow>, sqlx::Error> {
    sqlx::query_as::<_, PortfolioRow>("SELECT * FROM portfolios WHERE id = $1 FOR UPDATE")
        .bind(portfolio_id)
        .fetch_optional(executor)
        .await
}

/// Inserts a new portfolio record. A slug collision surfaces as
/// `DuplicateSlug`; the caller retries with a freshly generated slug.
pub async fn insert_portfolio<'e, E: PgExecutor<'e>>(
    executor: E,
    slug: &str,
    name: &str,
    focus: &str,
) -> Result<PortfolioRow, AppError> {
    sqlx::query_as::<_, PortfolioRow>(
        r#"
        INSERT INTO portfolios (id, slug, name, portfolio_focus, status, generation_started_at)
        VALUES ($1, $2, $3, $4, 'generating', now())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(slug)
    .bind(name)
    .bind(focus)
    .fetch_one(executor)
    .await
    .map_err(|e| AppError::from_insert(slug, e))
}

/// Returns the version with the highest `version_number`, regardless of
/// state. A duplicate maximum number would be a data-integrity violation and
/// fails loudly rather than silently picking one.
pub async fn latest_version<'e, E: PgExecutor<'e>>(
    executor: E,
    portfolio_id: Uuid,
) -> Result<Option<PortfolioVersionRow>, AppError> {
    let top_two = sqlx::query_as::<_, PortfolioVersionRow>(
        r#"
        SELECT * FROM portfolio_versions
        WHERE portfolio_id = $1
        ORDER BY version_number DESC
        LIMIT 2
        "#,
    )
    .bind(portfolio_id)
    .fetch_all(executor)
    .await?;

    if let [first, second] = top_two.as_slice() {
        if first.version_number == second.version_number {
            return Err(AppError::IntegrityViolation(format!(
                "portfolio {portfolio_id} has two versions numbered {}",
                first.version_number
            )));
        }
    }

    Ok(top_two.into_iter().next())
}

pub async fn max_version_number<'e, E: PgExecutor<'e>>(
    executor: E,
    portfolio_id: Uuid,
) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar("SELECT MAX(version_number) FROM portfolio_versions WHERE portfolio_id = $1")
        .bind(portfolio_id)
        .fetch_one(executor)
        .await
}

/// Fetches a version by id, scoped to the owning portfolio. A version id that
/// exists but belongs to another portfolio is indistinguishable from absent.
pub async fn get_version<'e, E: PgExecutor<'e>>(
    executor: E,
    portfolio_id: Uuid,
    version_id: Uuid,
) -> Result<Option<PortfolioVersionRow>, sqlx::Error> {
    sqlx::query_as::<_, PortfolioVersionRow>(
        "SELECT * FROM portfolio_versions WHERE id = $1 AND portfolio_id = $2",
    )
    .bind(version_id)
    .bind(portfolio_id)
    .fetch_optional(executor)
    .await
}

pub async fn list_versions<'e, E: PgExecutor<'e>>(
    executor: E,
    portfolio_id: Uuid,
) -> Result<Vec<PortfolioVersionRow>, sqlx::Error> {
    sqlx::query_as::<_, PortfolioVersionRow>(
        r#"
        SELECT * FROM portfolio_versions
        WHERE portfolio_id = $1
        ORDER BY version_number DESC
        "#,
    )
    .bind(portfolio_id)
    .fetch_all(executor)
    .await
}

/// Parameters for inserting a new immutable version snapshot.
pub struct NewVersion<'a> {
    pub portfolio_id: Uuid,
    pub version_number: i32,
    pub version_state: VersionState,
    pub public_content: &'a Value,
    pub coaching_content: Option<&'a Value>,
    pub changes_summary: String,
    pub created_by: VersionCreatedBy,
}

pub async fn insert_version<'e, E: PgExecutor<'e>>(
    executor: E,
    new_version: NewVersion<'_>,
) -> Result<PortfolioVersionRow, sqlx::Error> {
    sqlx::query_as::<_, PortfolioVersionRow>(
        r#"
        INSERT INTO portfolio_versions
            (id, portfolio_id, version_number, version_state,
             public_content, coaching_content, changes_summary, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new_version.portfolio_id)
    .bind(new_version.version_number)
    .bind(new_version.version_state)
    .bind(new_version.public_content)
    .bind(new_version.coaching_content)
    .bind(new_version.changes_summary)
    .bind(new_version.created_by)
    .fetch_one(executor)
    .await
}

/// Repoints `current_version_id` and optionally moves the generation status,
/// stamping `updated_at`. Passing `None` leaves the status untouched.
pub async fn repoint_current<'e, E: PgExecutor<'e>>(
    executor: E,
    portfolio_id: Uuid,
    version_id: Uuid,
    status: Option<PortfolioStatus>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE portfolios
        SET current_version_id = $2,
            status = COALESCE($3, status),
            updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(portfolio_id)
    .bind(version_id)
    .bind(status)
    .execute(executor)
    .await?;
    Ok(())
}

/// Irreversibly deletes every version of the portfolio except the one just
/// created. Only confirm/revert call this, inside their transaction.
pub async fn prune_other_versions<'e, E: PgExecutor<'e>>(
    executor: E,
    portfolio_id: Uuid,
    keep_version_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM portfolio_versions WHERE portfolio_id = $1 AND id != $2",
    )
    .bind(portfolio_id)
    .bind(keep_version_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Marks the portfolio's generation attempt as failed. Terminal for this
/// attempt only; no version rows are touched.
pub async fn mark_error<'e, E: PgExecutor<'e>>(
    executor: E,
    portfolio_id: Uuid,
    message: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE portfolios
        SET status = 'error', error_message = $2, updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(portfolio_id)
    .bind(message)
    .execute(executor)
    .await?;
    Ok(())
}

/// Stamps generation completion metadata alongside the final status flip.
pub async fn complete_generation<'e, E: PgExecutor<'e>>(
    executor: E,
    portfolio_id: Uuid,
    version_id: Uuid,
    metadata: &Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE portfolios
        SET current_version_id = $2,
            status = 'completed',
            ai_generation_metadata = $3,
            generation_completed_at = now(),
            updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(portfolio_id)
    .bind(version_id)
    .bind(metadata)
    .execute(executor)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_version_number_starts_at_one() {
        assert_eq!(next_version_number(None), 1);
    }

    #[test]
    fn test_next_version_number_is_max_plus_one() {
        assert_eq!(next_version_number(Some(1)), 2);
        // After a confirm pruned v1..v4 and kept v5, numbering continues
        assert_eq!(next_version_number(Some(5)), 6);
    }
}
