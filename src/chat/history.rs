use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

/// Author of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One entry of the conversation, as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    /// Assistant placeholder still waiting for the model
    pub pending: bool,
    pub created_at: DateTime<Utc>,
}

/// One entry of the context window sent to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMessage {
    pub role: Role,
    pub content: String,
}

/// Append-only log of user and assistant turns
///
/// At most one assistant placeholder is pending at a time, and only a caller
/// holding its id can resolve or abandon it.
#[derive(Debug, Default)]
pub struct ChatHistoryStore {
    messages: Vec<ChatMessage>,
    pending: Option<Uuid>,
}

impl ChatHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_user(&mut self, text: impl Into<String>) -> Uuid {
        self.push(Role::User, text.into(), false)
    }

    /// Reserve a slot for the next assistant reply
    pub fn append_pending_assistant(&mut self) -> Uuid {
        if let Some(previous) = self.pending {
            warn!("Replacing unresolved assistant placeholder {}", previous);
            self.abandon(previous);
        }

        let id = self.push(Role::Assistant, String::new(), true);
        self.pending = Some(id);
        id
    }

    /// Fill in a pending placeholder. Returns false if `id` is not the current
    /// placeholder (already resolved, abandoned, or never issued).
    pub fn resolve_assistant(&mut self, id: Uuid, text: impl Into<String>) -> bool {
        if self.pending != Some(id) {
            debug!("Ignoring resolution for non-pending message {}", id);
            return false;
        }

        let Some(message) = self.messages.iter_mut().find(|m| m.id == id) else {
            self.pending = None;
            return false;
        };

        message.content = text.into();
        message.pending = false;
        self.pending = None;
        true
    }

    /// Drop a placeholder whose reply will never be applied
    pub fn abandon(&mut self, id: Uuid) -> bool {
        if self.pending != Some(id) {
            return false;
        }

        self.messages.retain(|m| m.id != id);
        self.pending = None;
        true
    }

    pub fn pending_id(&self) -> Option<Uuid> {
        self.pending
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The model context: every settled message in original order
    pub fn context(&self) -> Vec<ContextMessage> {
        self.messages
            .iter()
            .filter(|m| !m.pending)
            .map(|m| ContextMessage {
                role: m.role,
                content: m.content.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn push(&mut self, role: Role, content: String, pending: bool) -> Uuid {
        let id = Uuid::new_v4();
        self.messages.push(ChatMessage {
            id,
            role,
            content,
            pending,
            created_at: Utc::now(),
        });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_excludes_pending_and_keeps_order() {
        let mut history = ChatHistoryStore::new();
        history.append_user("What are your hours?");
        let first = history.append_pending_assistant();
        assert!(history.resolve_assistant(first, "Nine to five."));
        history.append_user("And on Sunday?");
        history.append_pending_assistant();

        let context = history.context();
        assert_eq!(context.len(), 3);
        assert_eq!(context[0].role, Role::User);
        assert_eq!(context[1].role, Role::Assistant);
        assert_eq!(context[1].content, "Nine to five.");
        assert_eq!(context[2].content, "And on Sunday?");
        assert_eq!(history.len(), 4);
    }

    #[test]
    fn test_only_current_placeholder_resolves() {
        let mut history = ChatHistoryStore::new();
        history.append_user("one");
        let stale = history.append_pending_assistant();
        history.abandon(stale);

        history.append_user("two");
        let current = history.append_pending_assistant();

        assert!(!history.resolve_assistant(stale, "late reply"));
        assert!(history.resolve_assistant(current, "reply"));
        assert!(!history.resolve_assistant(current, "again"));

        let assistant: Vec<_> = history
            .messages()
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .collect();
        assert_eq!(assistant.len(), 1);
        assert_eq!(assistant[0].content, "reply");
        assert!(!assistant[0].pending);
    }

    #[test]
    fn test_single_pending_placeholder() {
        let mut history = ChatHistoryStore::new();
        let first = history.append_pending_assistant();
        let second = history.append_pending_assistant();

        assert_ne!(first, second);
        assert_eq!(history.pending_id(), Some(second));
        assert_eq!(history.messages().iter().filter(|m| m.pending).count(), 1);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
