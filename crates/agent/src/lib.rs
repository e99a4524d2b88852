//! Conversation engine for the WhatsApp sales assistant.
//!
//! - `runtime` drives one inbound message through the scripted flow or the
//!   AI responder, records history and delivers replies.
//! - `responder` and `llm` wrap the Gemini `generateContent` call and degrade
//!   every failure to a fixed customer-facing message.
//! - `conversation` builds the prompts.
//!
//! The scripted flow itself lives in `vendaflow_core::flows`; this crate only
//! orchestrates persistence and delivery around it.

pub mod conversation;
pub mod llm;
pub mod responder;
pub mod runtime;

pub use llm::{Content, ContentRole, GeminiClient, LlmClient, LlmError};
pub use responder::{AiResponder, GeminiResponder};
pub use runtime::{ConversationEngine, EngineError, ProcessOutcome};
