//! Gemini-backed implementation of the [`ContentGenerator`] collaborator.

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::generation::prompts::{
    build_coaching_prompt, build_portfolio_prompt, build_refinement_prompt,
};
use crate::generation::ContentGenerator;
use crate::llm_client::LlmClient;

const COACHING_TEMPERATURE: f32 = 0.8;

pub struct GeminiGenerator {
    llm: LlmClient,
}

impl GeminiGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ContentGenerator for GeminiGenerator {
    async fn generate_portfolio_content(
        &self,
        context: &Value,
        focus: &str,
    ) -> Result<Value, AppError> {
        let prompt = build_portfolio_prompt(context, focus);
        let content: Value = self
            .llm
            .call_json(&prompt, None)
            .await
            .map_err(|e| AppError::Llm(format!("portfolio content generation: {e}")))?;
        info!("Generated portfolio content for focus: {focus}");
        Ok(content)
    }

    async fn generate_coaching_insights(
        &self,
        context: &Value,
        focus: &str,
    ) -> Result<Value, AppError> {
        let prompt = build_coaching_prompt(context, focus);
        let insights: Value = self
            .llm
            .call_json(&prompt, Some(COACHING_TEMPERATURE))
            .await
            .map_err(|e| AppError::Llm(format!("coaching insights generation: {e}")))?;
        info!("Generated coaching insights for focus: {focus}");
        Ok(insights)
    }

    async fn refine_content(
        &self,
        current_document: &Value,
        instruction: &str,
        sections: &[String],
    ) -> Result<Value, AppError> {
        let prompt = build_refinement_prompt(current_document, instruction, sections);
        let refined: Value = self
            .llm
            .call_json(&prompt, None)
            .await
            .map_err(|e| AppError::Llm(format!("refinement: {e}")))?;
        info!("Refined portfolio content, sections: {sections:?}");
        Ok(refined)
    }
}
