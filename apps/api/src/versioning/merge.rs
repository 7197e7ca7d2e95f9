//! Content Merge Engine.
//!
//! Two update modes feed new version content:
//!
//! - **Full replace** (refine): the AI returns a whole document, but only its
//!   `ai_generated_content` section is taken. Protected top-level sections
//!   (`personal_info`, `data_sources`, `metadata`) are always carried from
//!   the current document, so a misbehaving model cannot corrupt them.
//! - **Partial patch** (manual edit): a field map restricted to an allow-list
//!   inside `ai_generated_content`. Unknown fields are silently ignored so
//!   forward-compatible clients don't break.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::errors::AppError;

/// Fields inside `ai_generated_content` that a manual edit may replace.
pub const EDITABLE_FIELDS: &[&str] = &[
    "professional_summary",
    "key_strengths",
    "project_highlights",
    "skills_summary",
];

/// Top-level sections that no refine or edit may ever alter.
pub const PROTECTED_SECTIONS: &[&str] = &["personal_info", "data_sources", "metadata"];

/// The four sections every public document carries.
const TOP_LEVEL_SECTIONS: &[&str] = &[
    "personal_info",
    "ai_generated_content",
    "data_sources",
    "metadata",
];

/// Applies a manual field patch onto a deep copy of the current document.
///
/// Only allow-listed fields inside `ai_generated_content` are replaced;
/// everything else is preserved as-is except a `metadata.last_edited` stamp.
pub fn apply_field_patch(
    current: &Value,
    updates: &Map<String, Value>,
    edited_at: DateTime<Utc>,
) -> Result<Value, AppError> {
    ensure_document_shape(current)?;

    let mut patched = current.clone();

    let ai_content = patched
        .get_mut("ai_generated_content")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| {
            AppError::IntegrityViolation(
                "document ai_generated_content is not an object".to_string(),
            )
        })?;

    for (field, value) in updates {
        if EDITABLE_FIELDS.contains(&field.as_str()) {
            ai_content.insert(field.clone(), value.clone());
        } else {
            debug!("Ignoring non-editable field in patch: {field}");
        }
    }

    if let Some(metadata) = patched.get_mut("metadata").and_then(Value::as_object_mut) {
        metadata.insert(
            "last_edited".to_string(),
            Value::String(edited_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
    }

    Ok(patched)
}

/// Merges an AI-refined document onto the current one.
///
/// The refined output must contain an `ai_generated_content` object; that
/// section is spliced onto a copy of the current document. Any AI attempt to
/// modify a protected section is discarded (and logged).
pub fn merge_refined_document(current: &Value, refined: &Value) -> Result<Value, AppError> {
    ensure_document_shape(current)?;

    let refined_content = refined
        .get("ai_generated_content")
        .filter(|v| v.is_object())
        .ok_or_else(|| {
            AppError::RefinementFailed(
                "AI output is missing an ai_generated_content object".to_string(),
            )
        })?;

    for section in PROTECTED_SECTIONS {
        if let Some(attempted) = refined.get(*section) {
            if Some(attempted) != current.get(*section) {
                warn!("AI refinement attempted to modify protected section '{section}', discarding");
            }
        }
    }

    let mut merged = current.clone();
    merged["ai_generated_content"] = refined_content.clone();
    Ok(merged)
}

/// Verifies the stored document still carries all four top-level sections.
/// A malformed stored document is corrupted state, surfaced loudly.
pub fn ensure_document_shape(document: &Value) -> Result<(), AppError> {
    let obj = document.as_object().ok_or_else(|| {
        AppError::IntegrityViolation("stored document is not a JSON object".to_string())
    })?;

    for section in TOP_LEVEL_SECTIONS {
        if !obj.contains_key(*section) {
            return Err(AppError::IntegrityViolation(format!(
                "stored document is missing top-level section '{section}'"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
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

    fn edit_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_patch_replaces_only_named_allowed_field() {
        let current = sample_document();
        let updates = json!({ "professional_summary": "New summary." });
        let patched =
            apply_field_patch(&current, updates.as_object().unwrap(), edit_time()).unwrap();

        assert_eq!(
            patched["ai_generated_content"]["professional_summary"],
            "New summary."
        );
        // Untouched sibling fields survive
        assert_eq!(
            patched["ai_generated_content"]["key_strengths"],
            json!(["analysis"])
        );
        // Protected sections are byte-identical
        assert_eq!(patched["data_sources"], current["data_sources"]);
        assert_eq!(patched["personal_info"], current["personal_info"]);
    }

    #[test]
    fn test_patch_ignores_fields_outside_allow_list() {
        let current = sample_document();
        let updates = json!({
            "professional_summary": "Y",
            "data_sources": { "github_projects": [] },
            "contact_info": { "email": "hax" },
            "unknown_future_field": 42
        });
        let patched =
            apply_field_patch(&current, updates.as_object().unwrap(), edit_time()).unwrap();

        assert_eq!(patched["ai_generated_content"]["professional_summary"], "Y");
        assert_eq!(patched["data_sources"], current["data_sources"]);
        // contact_info is not on the allow-list: unchanged
        assert_eq!(patched["ai_generated_content"]["contact_info"], json!({}));
        assert!(patched.get("unknown_future_field").is_none());
    }

    #[test]
    fn test_patch_stamps_last_edited() {
        let current = sample_document();
        let updates = json!({ "key_strengths": ["math", "logic"] });
        let patched =
            apply_field_patch(&current, updates.as_object().unwrap(), edit_time()).unwrap();

        assert_eq!(patched["metadata"]["last_edited"], "2026-08-25T12:00:00Z");
        // Original generation stamp survives
        assert_eq!(patched["metadata"]["generated_at"], "2026-01-01T00:00:00Z");
    }

    #[test]
    fn test_empty_patch_is_a_clean_copy_plus_stamp() {
        let current = sample_document();
        let updates = Map::new();
        let patched = apply_field_patch(&current, &updates, edit_time()).unwrap();
        assert_eq!(patched["ai_generated_content"], current["ai_generated_content"]);
    }

    #[test]
    fn test_patch_on_malformed_document_fails_loudly() {
        let broken = json!({ "ai_generated_content": {} }); // missing sections
        let updates = json!({ "professional_summary": "x" });
        let err = apply_field_patch(&broken, updates.as_object().unwrap(), edit_time())
            .unwrap_err();
        assert!(matches!(err, AppError::IntegrityViolation(_)));
    }

    #[test]
    fn test_merge_refined_takes_only_ai_content() {
        let current = sample_document();
        let refined = json!({
            "personal_info": { "name": "Mallory" },          // tampering attempt
            "data_sources": {},                                // tampering attempt
            "ai_generated_content": {
                "professional_summary": "Refined summary.",
                "key_strengths": ["analysis", "rigor"]
            }
        });

        let merged = merge_refined_document(&current, &refined).unwrap();
        assert_eq!(
            merged["ai_generated_content"]["professional_summary"],
            "Refined summary."
        );
        assert_eq!(merged["personal_info"], current["personal_info"]);
        assert_eq!(merged["data_sources"], current["data_sources"]);
        assert_eq!(merged["metadata"], current["metadata"]);
    }

    #[test]
    fn test_merge_refined_rejects_output_without_ai_content() {
        let current = sample_document();
        let err = merge_refined_document(&current, &json!({ "oops": true })).unwrap_err();
        assert!(matches!(err, AppError::RefinementFailed(_)));

        // ai_generated_content present but not an object is equally invalid
        let err =
            merge_refined_document(&current, &json!({ "ai_generated_content": "text" }))
                .unwrap_err();
        assert!(matches!(err, AppError::RefinementFailed(_)));
    }

    #[test]
    fn test_ensure_document_shape() {
        assert!(ensure_document_shape(&sample_document()).is_ok());
        assert!(ensure_document_shape(&json!([])).is_err());
        assert!(ensure_document_shape(&json!({ "personal_info": {} })).is_err());
    }
}
