//! Document builders — construct the public portfolio and private coaching
//! documents persisted as version content.
//!
//! The public document has four top-level sections. `personal_info` and
//! `data_sources` are set once here at generation time and never altered by
//! any later transition (the merge engine enforces this).

use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Raw inputs for portfolio generation, supplied by the caller as JSON.
/// Upload parsing and third-party API clients live outside this service;
/// by the time a request reaches us the data is already structured.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationInputs {
    pub name: String,
    #[serde(default = "default_focus")]
    pub portfolio_focus: String,
    pub linkedin_data: Option<Value>,
    pub resume_text: Option<String>,
    pub github_data: Option<Value>,
    pub codeforces_data: Option<Value>,
    pub leetcode_data: Option<Value>,
}

fn default_focus() -> String {
    "general".to_string()
}

/// Lists which data sources were actually supplied, in a stable order.
pub fn data_sources_used(inputs: &GenerationInputs) -> Vec<&'static str> {
    let mut sources = Vec::new();
    if inputs.linkedin_data.is_some() {
        sources.push("linkedin");
    }
    if inputs.resume_text.is_some() {
        sources.push("resume");
    }
    if inputs.github_data.is_some() {
        sources.push("github");
    }
    if inputs.codeforces_data.is_some() {
        sources.push("codeforces");
    }
    if inputs.leetcode_data.is_some() {
        sources.push("leetcode");
    }
    sources
}

/// Prepares the sanitized context sent to the model.
///
/// Only metadata, summaries, and statistics go in — never file contents.
/// Long free-text fields are truncated to keep the prompt bounded.
pub fn prepare_ai_context(inputs: &GenerationInputs) -> Value {
    let mut context = Map::new();
    context.insert("name".to_string(), json!(inputs.name));
    context.insert(
        "portfolio_focus".to_string(),
        json!(inputs.portfolio_focus),
    );

    if let Some(linkedin) = &inputs.linkedin_data {
        context.insert(
            "linkedin".to_string(),
            json!({
                "summary": str_field(linkedin, "summary", 2000),
                "experience": str_field(linkedin, "experience_raw", 2000),
                "education": str_field(linkedin, "education_raw", 1000),
                "skills": str_field(linkedin, "skills_raw", 500),
            }),
        );
    }

    if let Some(resume) = &inputs.resume_text {
        context.insert(
            "resume_highlights".to_string(),
            json!(truncate_chars(resume, 4000)),
        );
    }

    if let Some(Value::Array(repos)) = &inputs.github_data {
        let projects: Vec<Value> = repos
            .iter()
            .map(|repo| {
                json!({
                    "name": str_field(repo, "name", 200),
                    "description": str_field(repo, "description", 500),
                    "language": str_field(repo, "primary_language", 50),
                    "readme_summary": str_field(repo, "readme_text", 1000),
                })
            })
            .collect();
        context.insert("github_projects".to_string(), Value::Array(projects));
    }

    if let Some(cf) = &inputs.codeforces_data {
        context.insert("codeforces".to_string(), cf.clone());
    }
    if let Some(lc) = &inputs.leetcode_data {
        context.insert("leetcode".to_string(), lc.clone());
    }

    Value::Object(context)
}

/// Builds the complete public portfolio document from the AI-generated
/// content and the raw inputs.
pub fn build_public_document(
    inputs: &GenerationInputs,
    slug: &str,
    ai_generated_content: &Value,
) -> Value {
    json!({
        "personal_info": {
            "name": inputs.name,
            "slug": slug,
            "focus": inputs.portfolio_focus,
        },
        "ai_generated_content": {
            "professional_summary": ai_generated_content.get("professional_summary").cloned().unwrap_or(json!("")),
            "key_strengths": ai_generated_content.get("key_strengths").cloned().unwrap_or(json!([])),
            "work_experience": ai_generated_content.get("work_experience").cloned().unwrap_or(json!([])),
            "project_highlights": ai_generated_content.get("project_highlights").cloned().unwrap_or(json!([])),
            "achievements": ai_generated_content.get("achievements").cloned().unwrap_or(json!([])),
            "skills_summary": ai_generated_content.get("skills_summary").cloned().unwrap_or(json!({})),
            "contact_info": ai_generated_content.get("contact_info").cloned().unwrap_or(json!({})),
        },
        "data_sources": build_data_sources_section(inputs),
        "metadata": {
            "generated_at": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            "data_sources_used": data_sources_used(inputs),
            "portfolio_focus": inputs.portfolio_focus,
        },
    })
}

/// Builds the private coaching document.
pub fn build_coaching_document(inputs: &GenerationInputs, coaching_insights: &Value) -> Value {
    json!({
        "skill_analysis": coaching_insights.get("skill_analysis").cloned().unwrap_or(json!({})),
        "learning_path": coaching_insights.get("learning_path").cloned().unwrap_or(json!({})),
        "interview_prep": coaching_insights.get("interview_prep").cloned().unwrap_or(json!({})),
        "market_positioning": coaching_insights.get("market_positioning").cloned().unwrap_or(json!({})),
        "metadata": {
            "generated_at": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            "focus": inputs.portfolio_focus,
        },
    })
}

fn build_data_sources_section(inputs: &GenerationInputs) -> Value {
    let mut section = Map::new();

    if let Some(Value::Array(repos)) = &inputs.github_data {
        let projects: Vec<Value> = repos
            .iter()
            .map(|repo| {
                json!({
                    "name": str_field(repo, "name", 200),
                    "description": str_field(repo, "description", 500),
                    "language": str_field(repo, "primary_language", 50),
                    "github_url": str_field(repo, "github_url", 300),
                })
            })
            .collect();
        section.insert("github_projects".to_string(), Value::Array(projects));
    }

    let mut competitive = Map::new();
    if let Some(cf) = &inputs.codeforces_data {
        competitive.insert("codeforces".to_string(), cf.clone());
    }
    if let Some(lc) = &inputs.leetcode_data {
        competitive.insert("leetcode".to_string(), lc.clone());
    }
    if !competitive.is_empty() {
        section.insert(
            "competitive_programming".to_string(),
            Value::Object(competitive),
        );
    }

    if let Some(linkedin) = &inputs.linkedin_data {
        let skills_raw = str_field(linkedin, "skills_raw", 2000);
        let skills: Vec<String> = skills_raw
            .replace('\n', ",")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .take(15)
            .map(String::from)
            .collect();
        if !skills.is_empty() {
            section.insert("linkedin_skills".to_string(), json!(skills));
        }
    }

    Value::Object(section)
}

fn str_field(value: &Value, key: &str, max_chars: usize) -> String {
    truncate_chars(value.get(key).and_then(Value::as_str).unwrap_or(""), max_chars)
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
