//! Prompt builders for portfolio generation, coaching, and refinement.
//!
//! Prompts instruct the model to return bare JSON; the LLM client strips
//! markdown fences defensively anyway.

use serde_json::Value;

/// Section aliases accepted by the refine endpoint, mapped to the JSON paths
/// the model is told to modify.
const SECTION_PATHS: &[(&str, &str)] = &[
    ("summary", "ai_generated_content.professional_summary"),
    ("experience", "ai_generated_content.work_experience"),
    ("projects", "ai_generated_content.project_highlights"),
    ("skills", "ai_generated_content.skills_summary"),
    ("strengths", "ai_generated_content.key_strengths"),
    ("achievements", "ai_generated_content.achievements"),
    ("contact", "ai_generated_content.contact_info"),
];

pub fn build_portfolio_prompt(context: &Value, focus: &str) -> String {
    let context_json = serde_json::to_string_pretty(context).unwrap_or_default();
    format!(
        r#"You are a professional portfolio writer. Generate compelling portfolio content in JSON format.

FOCUS: {focus} (emphasize skills and projects relevant to this area)

DATA SOURCES:
{context_json}

TASK: Generate a professional portfolio with these sections. Output ONLY valid JSON, no markdown formatting.

OUTPUT FORMAT (JSON):
{{
  "professional_summary": "3-4 sentence summary highlighting experience, skills, and focus area",
  "key_strengths": ["strength 1", "strength 2", "strength 3", "strength 4"],
  "work_experience": [
    {{"title": "job title", "company": "company name", "duration": "start - end date", "description_bullets": ["achievement 1", "achievement 2"]}}
  ],
  "project_highlights": [
    {{"name": "project name", "description": "compelling 2-3 sentence description", "technologies": ["tech1", "tech2"], "highlights": ["highlight 1"]}}
  ],
  "achievements": ["achievement 1", "award 2"],
  "skills_summary": {{"languages": [], "frameworks": [], "tools": []}},
  "contact_info": {{"email": "", "linkedin": "", "github": ""}}
}}

REQUIREMENTS:
- Professional, ATS-friendly tone
- Emphasize {focus}-relevant skills
- Use ONLY provided data, no fabrication
- Be concise and impactful
- Highlight competitive programming achievements if present
- Use action verbs and quantify when possible"#
    )
}

pub fn build_coaching_prompt(context: &Value, focus: &str) -> String {
    let context_json = serde_json::to_string_pretty(context).unwrap_or_default();
    format!(
        r#"You are a career coach providing private, actionable feedback.

FOCUS: {focus}

DATA SOURCES:
{context_json}

TASK: Provide honest, constructive career guidance. Output ONLY valid JSON, no markdown formatting.

OUTPUT FORMAT (JSON):
{{
  "skill_analysis": {{"strengths": [], "gaps": []}},
  "learning_path": {{"immediate": [], "short_term": [], "long_term": []}},
  "interview_prep": {{"likely_questions": [], "talking_points": []}},
  "market_positioning": {{"target_roles": [], "competitive_advantages": [], "resume_improvements": []}}
}}

REQUIREMENTS:
- Be honest and constructive
- Provide specific, actionable advice
- Focus on {focus} career path
- Identify real skill gaps for target roles
- Suggest concrete next steps"#
    )
}

pub fn build_refinement_prompt(
    current_document: &Value,
    instruction: &str,
    sections: &[String],
) -> String {
    let refine_all = sections.is_empty() || sections.iter().any(|s| s == "all");

    let (scope_instruction, json_paths) = if refine_all {
        (
            "Apply the instruction to ALL sections of the portfolio (entire ai_generated_content)"
                .to_string(),
            SECTION_PATHS
                .iter()
                .map(|(_, path)| *path)
                .collect::<Vec<_>>()
                .join(", "),
        )
    } else {
        (
            format!(
                "Apply the instruction ONLY to these sections: {}",
                sections.join(", ")
            ),
            sections
                .iter()
                .map(|s| resolve_section_path(s))
                .collect::<Vec<_>>()
                .join(", "),
        )
    };

    let keep_rule = if refine_all {
        "Refine ALL content in ai_generated_content"
    } else {
        "Keep unspecified sections exactly as they are"
    };

    let document_json = serde_json::to_string_pretty(current_document).unwrap_or_default();

    format!(
        r#"You are a professional portfolio editor. Refine the portfolio based on the user's instruction.

USER INSTRUCTION: {instruction}

SCOPE: {scope_instruction}
(JSON paths to modify: {json_paths})

CURRENT PORTFOLIO JSON:
{document_json}

TASK:
1. Read the current portfolio JSON carefully
2. Apply the user's instruction to the specified sections
3. {keep_rule}
4. Return the COMPLETE updated portfolio JSON

CRITICAL REQUIREMENTS:
- Output ONLY valid JSON, no explanations or markdown
- Preserve the exact JSON structure
- Do NOT add or remove top-level keys
- Do NOT modify personal_info, data_sources, or metadata sections
- Ensure all required fields remain populated"#
    )
}

/// Resolves a user-facing section alias to its JSON path; unknown names pass
/// through unchanged so forward-compatible clients still get a usable prompt.
fn resolve_section_path(section: &str) -> &str {
    SECTION_PATHS
        .iter()
        .find(|(alias, _)| *alias == section)
        .map(|(_, path)| *path)
        .unwrap_or(section)
}
