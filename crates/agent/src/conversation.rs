use std::sync::Arc;

use concierge_core::catalog::Catalog;
use concierge_core::domain::requirement::Requirement;
use concierge_core::errors::{ApplicationError, DomainError};
use concierge_core::matching::{
    render_recommendations, MatchEngine, RubricMatchEngine, DEFAULT_RECOMMENDATION_LIMIT,
};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::extraction::{transcript_from, ExtractionError, RequirementExtractor};
use crate::llm::{ChatMessage, CompletionRequest, LlmClient, LlmError};
use crate::rfq::{RfqDraft, RfqDrafter, RfqError};

pub const GENERATE_RFQ_DIRECTIVE: &str = "GENERATE_RFQ:";

pub const GREETING: &str = "Hello! I'm here to help you find the right manufacturing partner. \
Tell me about your product: what are you looking to manufacture?";

const SYSTEM_PROMPT_HEADER: &str = "You are an AI manufacturing concierge assistant. \
Your goal is to help users find the right manufacturing factory from our database.";

const SYSTEM_PROMPT_INSTRUCTIONS: &str = r#"Required information to collect:
1. product_type (e.g. electronics, consumer_goods, industrial, apparel)
2. materials (e.g. plastic, metal, abs, cotton)
3. moq (minimum order quantity as a number)
4. geography (preferred location, e.g. China, Vietnam, Europe)
5. certifications (e.g. ISO9001, BSCI, CE)
6. budget_tier (low, medium, or high)

Instructions:
- Ask concise, practical questions to gather requirements. Avoid technical jargon.
- Once you know at least product_type, materials, and moq, recommend the top factories from the database above, ranked by best fit.
- If the user names a geography, only recommend factories in that region and explain when fewer match.
- For each recommendation give the rank, factory name and location, its strengths, its trade-offs, and its MOQ minimum, certifications, and cost tier.
- After presenting recommendations, ask: "Would you like me to generate a Request for Quote (RFQ) email for any of these factories?"
- When the user asks for an RFQ, respond with exactly: "GENERATE_RFQ: [Factory Name]" using the exact factory name from the database."#;

#[derive(Debug, Error)]
pub enum ConciergeError {
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("could not build the system prompt: {0}")]
    Prompt(String),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Rfq(#[from] RfqError),
}

impl From<ConciergeError> for ApplicationError {
    fn from(value: ConciergeError) -> Self {
        match value {
            ConciergeError::EmptyMessage => {
                Self::Domain(DomainError::InvalidRequirement(value.to_string()))
            }
            ConciergeError::Extraction(ExtractionError::Invalid(error)) => Self::Domain(error),
            ConciergeError::Extraction(ExtractionError::EmptyTranscript) => Self::Domain(
                DomainError::InvalidRequirement(ExtractionError::EmptyTranscript.to_string()),
            ),
            ConciergeError::Llm(error)
            | ConciergeError::Extraction(ExtractionError::Llm(error))
            | ConciergeError::Rfq(RfqError::Llm(error)) => Self::Integration(error.to_string()),
            ConciergeError::Prompt(message) | ConciergeError::Rfq(RfqError::Template(message)) => {
                Self::Configuration(message)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReplyKind {
    Chat,
    RfqDrafted(RfqDraft),
    FactoryNotFound { requested: String },
    FactoryNameMissing,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConciergeReply {
    pub kind: ReplyKind,
    pub text: String,
}

impl ConciergeReply {
    fn chat(text: String) -> Self {
        Self { kind: ReplyKind::Chat, text }
    }
}

/// One buyer conversation. History starts with the catalog-seeded system
/// prompt and the greeting; the extracted requirement is cached after the
/// first successful extraction.
pub struct ConciergeSession {
    session_id: String,
    client: Arc<dyn LlmClient>,
    catalog: Arc<Catalog>,
    engine: RubricMatchEngine,
    extractor: RequirementExtractor,
    drafter: RfqDrafter,
    history: Vec<ChatMessage>,
    requirement: Option<Requirement>,
    recommendation_limit: usize,
}

impl ConciergeSession {
    pub fn new(client: Arc<dyn LlmClient>, catalog: Arc<Catalog>) -> Result<Self, ConciergeError> {
        let system_prompt = system_prompt(&catalog)?;
        let drafter = RfqDrafter::new(Arc::clone(&client))?;

        Ok(Self {
            session_id: Uuid::new_v4().to_string(),
            extractor: RequirementExtractor::new(Arc::clone(&client)),
            drafter,
            client,
            catalog,
            engine: RubricMatchEngine::new(),
            history: vec![ChatMessage::system(system_prompt), ChatMessage::assistant(GREETING)],
            requirement: None,
            recommendation_limit: DEFAULT_RECOMMENDATION_LIMIT,
        })
    }

    pub fn with_recommendation_limit(mut self, limit: usize) -> Self {
        self.recommendation_limit = limit;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn requirement(&self) -> Option<&Requirement> {
        self.requirement.as_ref()
    }

    /// Drops the cached requirement so the next RFQ or recommendation
    /// re-extracts from the full transcript.
    pub fn forget_requirement(&mut self) {
        self.requirement = None;
    }

    pub async fn handle_user_message(
        &mut self,
        text: &str,
    ) -> Result<ConciergeReply, ConciergeError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ConciergeError::EmptyMessage);
        }

        self.history.push(ChatMessage::user(text));
        let raw = match self.client.complete(CompletionRequest::new(self.history.clone())).await {
            Ok(raw) => raw,
            Err(error) => {
                // an unanswered turn is dropped so history keeps alternating
                self.history.pop();
                return Err(error.into());
            }
        };

        let reply = if raw.starts_with(GENERATE_RFQ_DIRECTIVE) {
            let target = directive_target(&raw[GENERATE_RFQ_DIRECTIVE.len()..]).to_string();
            match self.handle_directive(&target).await {
                Ok(reply) => reply,
                Err(error) => {
                    self.history.push(ChatMessage::assistant(raw));
                    return Err(error);
                }
            }
        } else {
            ConciergeReply::chat(raw)
        };

        self.history.push(ChatMessage::assistant(reply.text.clone()));
        Ok(reply)
    }

    /// Ranks the catalog with the deterministic engine for the current
    /// requirement, extracting it first when nothing is cached.
    pub async fn recommend_now(&mut self) -> Result<String, ConciergeError> {
        let requirement = self.current_requirement().await?;
        let matches = self.engine.recommend(
            &requirement,
            self.catalog.factories(),
            self.recommendation_limit,
        );

        info!(
            event_name = "matching.recommend.completed",
            correlation_id = %self.session_id,
            candidates = self.catalog.len(),
            matches = matches.len(),
            "catalog ranked for session requirement"
        );

        Ok(render_recommendations(&matches))
    }

    async fn handle_directive(&mut self, target: &str) -> Result<ConciergeReply, ConciergeError> {
        info!(
            event_name = "agent.concierge.directive",
            correlation_id = %self.session_id,
            factory = %target,
            "assistant requested an rfq"
        );

        if target.is_empty() {
            return Ok(ConciergeReply {
                kind: ReplyKind::FactoryNameMissing,
                text: "I had trouble identifying which factory you want the RFQ for. \
                       Could you please specify the factory name?"
                    .to_string(),
            });
        }

        let catalog = Arc::clone(&self.catalog);
        let Some(factory) = catalog.find_by_name(target) else {
            warn!(
                event_name = "agent.concierge.directive",
                correlation_id = %self.session_id,
                factory = %target,
                "rfq target is not in the catalog"
            );
            return Ok(ConciergeReply {
                kind: ReplyKind::FactoryNotFound { requested: target.to_string() },
                text: format!(
                    "I couldn't find the factory '{target}' in our database. \
                     Please specify one of the recommended factories."
                ),
            });
        };

        let requirement = self.current_requirement().await?;
        let draft = self.drafter.draft(factory, &requirement).await?;
        let text = format_rfq_reply(&draft);

        Ok(ConciergeReply { kind: ReplyKind::RfqDrafted(draft), text })
    }

    async fn current_requirement(&mut self) -> Result<Requirement, ConciergeError> {
        if let Some(requirement) = &self.requirement {
            return Ok(requirement.clone());
        }

        let transcript = transcript_from(&self.history);
        let requirement = self.extractor.extract(&transcript).await?;
        self.requirement = Some(requirement.clone());
        Ok(requirement)
    }
}

/// First line after the directive, trimmed.
fn directive_target(rest: &str) -> &str {
    rest.trim_start().lines().next().unwrap_or_default().trim()
}

pub fn format_rfq_reply(draft: &RfqDraft) -> String {
    format!(
        "**Request for Quote (RFQ) Email Generated**\n\n\
         **To:** {}\n\n---\n\n{}\n\n---\n\n\
         Feel free to copy this email and send it to the manufacturer!",
        draft.factory_name, draft.email
    )
}

fn system_prompt(catalog: &Catalog) -> Result<String, ConciergeError> {
    let factories = serde_json::to_string_pretty(catalog.factories())
        .map_err(|error| ConciergeError::Prompt(error.to_string()))?;

    Ok(format!(
        "{SYSTEM_PROMPT_HEADER}\n\nAvailable Factories in our Database:\n{factories}\n\n\
         {SYSTEM_PROMPT_INSTRUCTIONS}"
    ))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use concierge_core::catalog::{load_catalog, Catalog, CatalogSource};
    use concierge_core::domain::factory::FactoryId;

    use concierge_core::errors::{ApplicationError, DomainError};

    use super::{directive_target, ConciergeError, ConciergeSession, ReplyKind, GREETING};
    use crate::extraction::ExtractionError;
    use crate::llm::{CompletionRequest, LlmClient, LlmError, Role};

    /// Replies from a fixed script, in order, and records every request.
    #[derive(Default)]
    struct ScriptedClient {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedClient {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|reply| Ok(reply.to_string())).collect()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.seen.lock().expect("request log").clone()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
            self.seen.lock().expect("request log").push(request);
            self.replies
                .lock()
                .expect("script")
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::Transport("script exhausted".to_string())))
        }
    }

    const DENIM_REQUIREMENT: &str = r#"{
        "product_type": "jeans",
        "product_description": "slim fit denim jeans",
        "materials": ["denim", "cotton"],
        "moq": 2500,
        "geography": "Bangladesh",
        "certifications": ["BSCI"],
        "budget_tier": "low"
    }"#;

    fn catalog() -> Arc<Catalog> {
        Arc::new(load_catalog(&CatalogSource::Bundled).expect("bundled catalog"))
    }

    #[tokio::test]
    async fn session_starts_with_catalog_prompt_and_greeting() {
        let session =
            ConciergeSession::new(ScriptedClient::new(&[]), catalog()).expect("session builds");

        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::System);
        assert!(history[0].content.contains("Denim Masters Ltd"));
        assert!(history[0].content.contains("GENERATE_RFQ: [Factory Name]"));
        assert_eq!(history[1].content, GREETING);
    }

    #[tokio::test]
    async fn plain_replies_are_appended_to_history() {
        let client = ScriptedClient::new(&["How many units do you need?"]);
        let mut session = ConciergeSession::new(client.clone(), catalog()).expect("session");

        let reply = session.handle_user_message("  I make jeans ").await.expect("reply");

        assert_eq!(reply.kind, ReplyKind::Chat);
        assert_eq!(reply.text, "How many units do you need?");
        assert_eq!(session.history().len(), 4);
        assert_eq!(session.history()[2].content, "I make jeans");

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages.len(), 3);
        assert_eq!(requests[0].temperature, None);
    }

    #[tokio::test]
    async fn directive_drafts_rfq_for_named_factory() {
        let client = ScriptedClient::new(&[
            "GENERATE_RFQ: Denim Masters Ltd",
            DENIM_REQUIREMENT,
            "Subject: RFQ for slim fit denim jeans",
        ]);
        let mut session = ConciergeSession::new(client.clone(), catalog()).expect("session");

        let reply = session
            .handle_user_message("Please write an RFQ for Denim Masters")
            .await
            .expect("rfq reply");

        match &reply.kind {
            ReplyKind::RfqDrafted(draft) => {
                assert_eq!(draft.factory_id, FactoryId("F005".to_string()));
                assert_eq!(draft.product, "slim fit denim jeans");
            }
            other => panic!("expected an rfq draft, got {other:?}"),
        }
        assert!(reply.text.contains("**To:** Denim Masters Ltd"));
        assert!(reply.text.contains("Subject: RFQ for slim fit denim jeans"));
        assert!(!session.history().iter().any(|m| m.content.starts_with("GENERATE_RFQ:")));
        assert_eq!(session.requirement().map(|r| r.moq), Some(2500));

        let requests = client.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[1].json_mode);
        assert!(requests[1].messages[1].content.contains("Please write an RFQ for Denim Masters"));
        assert!(!requests[1].messages[1].content.contains("Available Factories"));
        assert!(requests[2].messages[0].content.contains("- Name: Denim Masters Ltd"));
    }

    #[tokio::test]
    async fn cached_requirement_skips_second_extraction() {
        let client = ScriptedClient::new(&[
            "GENERATE_RFQ: Denim Masters Ltd",
            DENIM_REQUIREMENT,
            "first email",
            "GENERATE_RFQ: dhaka knitwear industries",
            "second email",
        ]);
        let mut session = ConciergeSession::new(client.clone(), catalog()).expect("session");

        session.handle_user_message("RFQ for Denim Masters").await.expect("first rfq");
        let second = session.handle_user_message("and Dhaka Knitwear").await.expect("second rfq");

        assert!(matches!(
            second.kind,
            ReplyKind::RfqDrafted(ref draft) if draft.factory_id == FactoryId("F006".to_string())
        ));
        let requests = client.requests();
        assert_eq!(requests.len(), 5);
        assert!(requests.iter().filter(|request| request.json_mode).count() == 1);
    }

    #[tokio::test]
    async fn unknown_factory_gets_a_not_found_reply() {
        let client = ScriptedClient::new(&["GENERATE_RFQ: Atlantis Foundry"]);
        let mut session = ConciergeSession::new(client.clone(), catalog()).expect("session");

        let reply = session.handle_user_message("RFQ for Atlantis").await.expect("reply");

        assert_eq!(
            reply.kind,
            ReplyKind::FactoryNotFound { requested: "Atlantis Foundry".to_string() }
        );
        assert!(reply.text.contains("couldn't find the factory 'Atlantis Foundry'"));
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn blank_directive_target_asks_for_clarification() {
        let client = ScriptedClient::new(&["GENERATE_RFQ:   "]);
        let mut session = ConciergeSession::new(client, catalog()).expect("session");

        let reply = session.handle_user_message("send the RFQ").await.expect("reply");

        assert_eq!(reply.kind, ReplyKind::FactoryNameMissing);
        assert!(reply.text.contains("specify the factory name"));
    }

    #[tokio::test]
    async fn recommend_now_uses_the_deterministic_engine() {
        let client = ScriptedClient::new(&[DENIM_REQUIREMENT]);
        let mut session = ConciergeSession::new(client.clone(), catalog())
            .expect("session")
            .with_recommendation_limit(2);

        let rendered = session.recommend_now().await.expect("recommendations");

        assert!(rendered.starts_with("#1 Denim Masters Ltd (Bangladesh)"));
        assert!(rendered.contains("#2 "));
        assert!(!rendered.contains("#3 "));

        session.forget_requirement();
        assert!(session.requirement().is_none());
    }

    #[tokio::test]
    async fn failed_turns_keep_history_alternating() {
        let client = ScriptedClient::new(&["GENERATE_RFQ: Denim Masters Ltd", "not json"]);
        let mut session = ConciergeSession::new(client, catalog()).expect("session");

        let directive_failure = session.handle_user_message("RFQ for Denim Masters").await;
        assert!(matches!(directive_failure, Err(ConciergeError::Extraction(_))));

        let llm_failure = session.handle_user_message("hello?").await;
        assert!(matches!(llm_failure, Err(ConciergeError::Llm(_))));

        let roles: Vec<Role> = session.history().iter().map(|message| message.role).collect();
        assert_eq!(roles, vec![Role::System, Role::Assistant, Role::User, Role::Assistant]);
        assert_eq!(session.history()[3].content, "GENERATE_RFQ: Denim Masters Ltd");
        assert!(session.requirement().is_none());
    }

    #[tokio::test]
    async fn empty_message_and_llm_failure_are_errors() {
        let mut session =
            ConciergeSession::new(ScriptedClient::new(&[]), catalog()).expect("session");

        assert!(matches!(
            session.handle_user_message("   ").await,
            Err(ConciergeError::EmptyMessage)
        ));
        assert!(matches!(
            session.handle_user_message("hello").await,
            Err(ConciergeError::Llm(LlmError::Transport(_)))
        ));
    }

    #[test]
    fn session_errors_map_onto_the_application_taxonomy() {
        let invalid = DomainError::InvalidRequirement("moq is required".to_string());

        assert_eq!(
            ApplicationError::from(ConciergeError::Extraction(ExtractionError::Invalid(
                invalid.clone()
            ))),
            ApplicationError::Domain(invalid)
        );
        assert!(matches!(
            ApplicationError::from(ConciergeError::Llm(LlmError::Timeout(60))),
            ApplicationError::Integration(_)
        ));
        assert!(matches!(
            ApplicationError::from(ConciergeError::Prompt("bad".to_string())),
            ApplicationError::Configuration(_)
        ));
    }

    #[test]
    fn directive_target_takes_the_first_line() {
        assert_eq!(directive_target(" Denim Masters Ltd\nThanks!"), "Denim Masters Ltd");
        assert_eq!(directive_target("   "), "");
        assert_eq!(directive_target(""), "");
    }
}
