//! Generation backend trait: system instruction plus chat messages in,
//! answer text out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// A message authored by the user.
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    /// A system instruction.
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }
}

/// A language model that answers from supplied context.
///
/// Implementations return `Ok(None)` when the backend answered but the
/// response carried no text; transport and HTTP failures are errors.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Short backend name used in logs and errors.
    fn name(&self) -> &str;

    /// Generate a reply to `messages` under the `system` instruction.
    async fn generate(&self, system: &str, messages: &[ChatMessage]) -> Result<Option<String>>;
}
