//! Conversation with the outfit assistant.
//!
//! A `Conversation` keeps the ordered transcript of one chat screen. Each
//! `send` appends the user's message, waits for the assistant, and appends
//! either the reply or a fixed apology when the request fails.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::{ApiClient, ApiError};
use crate::models::ChatRequest;

/// Preset prompt offered by the dashboard's "new outfit" shortcut
pub const NEW_OUTFIT_PROMPT: &str = "Помоги мне подобрать новый образ.";

/// Assistant message shown in place of a reply when the request fails
pub const CHAT_FAILURE_REPLY: &str = "Извините, произошла ошибка. Попробуйте позже.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    next_id: u64,
    pending: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a preset prompt by its shortcut key
    pub fn preset_prompt(key: &str) -> Option<&'static str> {
        match key {
            "new_outfit" => Some(NEW_OUTFIT_PROMPT),
            _ => None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Whether the send control should be enabled for `input`
    pub fn can_submit(&self, input: &str) -> bool {
        !self.pending && !input.trim().is_empty()
    }

    /// Send one message and wait for the assistant.
    ///
    /// Blank input (or a send while one is outstanding) does nothing and
    /// returns `Ok(None)`. On failure the apology is appended and the error is
    /// returned for the caller to report; nothing is retried.
    pub async fn send(&mut self, api: &ApiClient, input: &str) -> Result<Option<&Message>, ApiError> {
        if !self.can_submit(input) {
            return Ok(None);
        }
        let content = input.trim().to_string();
        self.push(Role::User, content.clone());

        self.pending = true;
        let result = api.chat(&ChatRequest { message: content }).await;
        self.pending = false;

        match result {
            Ok(reply) => {
                self.push(Role::Assistant, reply.response);
                Ok(self.messages.last())
            }
            Err(e) => {
                warn!(error = %e, "Assistant request failed");
                self.push(Role::Assistant, CHAT_FAILURE_REPLY.to_string());
                Err(e)
            }
        }
    }

    fn push(&mut self, role: Role, content: String) {
        self.next_id += 1;
        self.messages.push(Message {
            id: self.next_id,
            role,
            content,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_prompt() {
        assert_eq!(Conversation::preset_prompt("new_outfit"), Some(NEW_OUTFIT_PROMPT));
        assert_eq!(Conversation::preset_prompt("other"), None);
    }

    #[test]
    fn test_can_submit() {
        let mut conversation = Conversation::new();
        assert!(conversation.can_submit("hello"));
        assert!(!conversation.can_submit("   "));
        conversation.pending = true;
        assert!(!conversation.can_submit("hello"));
    }

    #[test]
    fn test_message_ids_increase() {
        let mut conversation = Conversation::new();
        conversation.push(Role::User, "a".to_string());
        conversation.push(Role::Assistant, "b".to_string());
        let ids: Vec<u64> = conversation.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
