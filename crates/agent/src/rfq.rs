use std::sync::Arc;

use chrono::{DateTime, Utc};
use concierge_core::domain::factory::{Factory, FactoryId};
use concierge_core::domain::requirement::Requirement;
use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;
use tracing::info;

use crate::llm::{ChatMessage, CompletionRequest, LlmClient, LlmError};

const RFQ_TEMPLATE_NAME: &str = "rfq_prompt.txt";
const TO_BE_DISCUSSED: &str = "To be discussed";
const FLEXIBLE: &str = "Flexible";

pub const RFQ_TEMPERATURE: f64 = 0.7;

#[derive(Debug, Error)]
pub enum RfqError {
    #[error("rfq template error: {0}")]
    Template(String),
    #[error(transparent)]
    Llm(#[from] LlmError),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RfqDraft {
    pub factory_id: FactoryId,
    pub factory_name: String,
    pub product: String,
    pub email: String,
    pub drafted_at: DateTime<Utc>,
}

pub struct RfqDrafter {
    client: Arc<dyn LlmClient>,
    tera: Tera,
}

impl RfqDrafter {
    pub fn new(client: Arc<dyn LlmClient>) -> Result<Self, RfqError> {
        let mut tera = Tera::default();
        tera.add_raw_template(RFQ_TEMPLATE_NAME, include_str!("../templates/rfq_prompt.txt.tera"))
            .map_err(|error| RfqError::Template(error.to_string()))?;

        Ok(Self { client, tera })
    }

    pub fn render_prompt(
        &self,
        factory: &Factory,
        requirement: &Requirement,
    ) -> Result<String, RfqError> {
        let context = prompt_context(factory, requirement);
        self.tera
            .render(RFQ_TEMPLATE_NAME, &context)
            .map_err(|error| RfqError::Template(error.to_string()))
    }

    pub async fn draft(
        &self,
        factory: &Factory,
        requirement: &Requirement,
    ) -> Result<RfqDraft, RfqError> {
        let prompt = self.render_prompt(factory, requirement)?;
        let request = CompletionRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(RFQ_TEMPERATURE);
        let email = self.client.complete(request).await?;

        info!(
            event_name = "agent.rfq.drafted",
            factory_id = %factory.id,
            product = %requirement.product_name(),
            "rfq email drafted"
        );

        Ok(RfqDraft {
            factory_id: factory.id.clone(),
            factory_name: factory.name.clone(),
            product: requirement.product_name().to_string(),
            email,
            drafted_at: Utc::now(),
        })
    }
}

fn prompt_context(factory: &Factory, requirement: &Requirement) -> Context {
    let mut context = Context::new();
    context.insert("factory_name", &factory.name);
    context.insert("factory_location", &factory.geography);
    context.insert("factory_certifications", &factory.certifications.join(", "));
    context.insert("product", requirement.product_name());
    context.insert("materials", &join_or(&requirement.materials, TO_BE_DISCUSSED));
    context.insert("moq", &requirement.moq);
    context.insert("geography", requirement.geography.as_deref().unwrap_or(FLEXIBLE));
    context.insert("certifications", &join_or(&requirement.certifications, TO_BE_DISCUSSED));
    context.insert(
        "budget_tier",
        requirement.budget_tier.map(|tier| tier.as_str()).unwrap_or(TO_BE_DISCUSSED),
    );
    context
}

fn join_or(values: &[String], fallback: &str) -> String {
    if values.is_empty() {
        fallback.to_string()
    } else {
        values.join(", ")
    }
}
