//! Conversation state and the language model collaborator

mod history;
mod model;

pub use history::{ChatHistoryStore, ChatMessage, ContextMessage, Role};
pub use model::{LanguageModel, ModelRequest, OpenRouterModel};
