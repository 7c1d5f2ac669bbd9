//! Concierge agent - LLM-backed conversation around the matching engine
//!
//! This crate wraps the deterministic core with the parts that talk to a
//! language model:
//! - Requirement extraction from a chat transcript (`extraction`)
//! - RFQ email drafting for a chosen factory (`rfq`)
//! - The chat session that seeds the catalog into the system prompt and
//!   reacts to the `GENERATE_RFQ:` directive (`conversation`)
//! - A pluggable completion client for OpenAI/Anthropic/Ollama (`llm`)
//!
//! # Safety Principle
//!
//! The LLM is strictly a translator. It never scores or ranks factories.
//! Rankings always come from `concierge_core::matching`.

pub mod conversation;
pub mod extraction;
pub mod llm;
pub mod rfq;

pub use conversation::{ConciergeError, ConciergeReply, ConciergeSession, ReplyKind};
pub use extraction::{ExtractionError, RequirementExtractor};
pub use llm::{ChatMessage, CompletionRequest, HttpLlmClient, LlmClient, LlmError, Role};
pub use rfq::{RfqDraft, RfqDrafter, RfqError};
