use std::sync::Arc;

use concierge_core::domain::requirement::Requirement;
use concierge_core::errors::DomainError;
use thiserror::Error;
use tracing::info;

use crate::llm::{ChatMessage, CompletionRequest, LlmClient, LlmError, Role};

pub const EXTRACTION_PROMPT: &str = r#"Extract manufacturing requirements from the conversation below.
Return ONLY valid JSON with these exact fields:

{
  "product_type": "string (broad category: electronics, consumer_goods, industrial, apparel, jeans, fashion, jackets, furniture)",
  "product_description": "string (the specific product the user wants to make, e.g. winter jackets, kitchen organizers, phone cases)",
  "materials": ["array of lowercase strings (e.g. plastic, metal, abs, denim, cotton)"],
  "moq": number (minimum order quantity),
  "geography": "string or null (e.g. China, Vietnam, Europe, Bangladesh, India)",
  "certifications": ["array of strings (e.g. ISO9001, BSCI, CE, GOTS, WRAP)"],
  "budget_tier": "string or null (low, medium, or high)"
}

Mapping rules:
- product_type: map to a broad category used by the factory database.
  Examples: "kitchen organizer" -> "consumer_goods", "phone case" -> "electronics", "denim jeans" -> "jeans".
- product_description: the exact product the user mentioned, not the category.
- materials: every mentioned material as a lowercase string.
- moq: the quantity as a number.
- geography: the region named in the conversation, or null.
- certifications: mentioned certifications, or [].
- budget_tier: map cost mentions to "low", "medium", or "high", or null if not mentioned.

Return ONLY the JSON, no explanations."#;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("requirement extraction needs a non-empty transcript")]
    EmptyTranscript,
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("extracted requirement is invalid: {0}")]
    Invalid(#[from] DomainError),
}

/// Turns a free-form transcript into a validated [`Requirement`].
#[derive(Clone)]
pub struct RequirementExtractor {
    client: Arc<dyn LlmClient>,
}

impl RequirementExtractor {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub async fn extract(&self, transcript: &str) -> Result<Requirement, ExtractionError> {
        if transcript.trim().is_empty() {
            return Err(ExtractionError::EmptyTranscript);
        }

        let request = CompletionRequest::new(vec![
            ChatMessage::system(EXTRACTION_PROMPT),
            ChatMessage::user(transcript),
        ])
        .with_temperature(0.0)
        .json();

        let raw = self.client.complete(request).await?;
        let requirement = Requirement::from_json(strip_code_fence(&raw))?;

        info!(
            event_name = "agent.extraction.completed",
            product_type = %requirement.product_type,
            moq = requirement.moq,
            materials = requirement.materials.len(),
            "requirement extracted from transcript"
        );

        Ok(requirement)
    }
}

/// Models sometimes wrap JSON in a Markdown fence even in JSON mode.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // drop the info string, e.g. ```json
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Joins every non-system turn, one per line.
pub fn transcript_from(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .filter(|message| message.role != Role::System)
        .map(|message| message.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
