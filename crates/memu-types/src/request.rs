//! Request payloads for the MemU memory endpoints.
//!
//! Each request serializes directly into the JSON body the API expects and
//! exposes a `validate()` that runs before anything touches the network.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::MemuError;

/// Role of a speaker in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single turn of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
    /// Additional per-message fields forwarded as-is (e.g. `created_at`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConversationMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            extra: Map::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

fn default_user_name() -> String {
    "User".to_string()
}

fn default_agent_name() -> String {
    "Assistant".to_string()
}

/// Body of `POST /api/v3/memory/memorize`.
///
/// Exactly one of `conversation` or `conversation_text` must be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorizeRequest {
    pub user_id: String,
    pub agent_id: String,
    #[serde(default = "default_user_name")]
    pub user_name: String,
    #[serde(default = "default_agent_name")]
    pub agent_name: String,
    #[serde(default, skip_serializing_if = "no_messages")]
    pub conversation: Option<Vec<ConversationMessage>>,
    #[serde(default, skip_serializing_if = "blank_text")]
    pub conversation_text: Option<String>,
    /// ISO-8601 session date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_date: Option<String>,
}

impl MemorizeRequest {
    pub fn new(user_id: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            agent_id: agent_id.into(),
            user_name: default_user_name(),
            agent_name: default_agent_name(),
            conversation: None,
            conversation_text: None,
            session_date: None,
        }
    }

    pub fn with_conversation(mut self, conversation: Vec<ConversationMessage>) -> Self {
        self.conversation = Some(conversation);
        self
    }

    pub fn with_conversation_text(mut self, text: impl Into<String>) -> Self {
        self.conversation_text = Some(text.into());
        self
    }

    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = name.into();
        self
    }

    pub fn with_agent_name(mut self, name: impl Into<String>) -> Self {
        self.agent_name = name.into();
        self
    }

    pub fn with_session_date(mut self, date: impl Into<String>) -> Self {
        self.session_date = Some(date.into());
        self
    }

    pub fn validate(&self) -> Result<(), MemuError> {
        require_id("user_id", &self.user_id)?;
        require_id("agent_id", &self.agent_id)?;

        let has_conversation = !no_messages(&self.conversation);
        let has_text = !blank_text(&self.conversation_text);

        match (has_conversation, has_text) {
            (true, false) | (false, true) => Ok(()),
            (false, false) => Err(MemuError::InvalidArgument(
                "Either conversation or conversation_text must be provided".to_string(),
            )),
            (true, true) => Err(MemuError::InvalidArgument(
                "Only one of conversation or conversation_text may be provided".to_string(),
            )),
        }
    }
}

/// Query for `POST /api/v3/memory/retrieve`: free text or conversational context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RetrieveQuery {
    Text(String),
    Conversation(Vec<ConversationMessage>),
}

impl From<&str> for RetrieveQuery {
    fn from(value: &str) -> Self {
        RetrieveQuery::Text(value.to_string())
    }
}

impl From<String> for RetrieveQuery {
    fn from(value: String) -> Self {
        RetrieveQuery::Text(value)
    }
}

impl From<Vec<ConversationMessage>> for RetrieveQuery {
    fn from(value: Vec<ConversationMessage>) -> Self {
        RetrieveQuery::Conversation(value)
    }
}

/// Body of `POST /api/v3/memory/retrieve`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieveRequest {
    pub user_id: String,
    pub agent_id: String,
    pub query: RetrieveQuery,
}

impl RetrieveRequest {
    pub fn new(
        query: impl Into<RetrieveQuery>,
        user_id: impl Into<String>,
        agent_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            agent_id: agent_id.into(),
            query: query.into(),
        }
    }

    pub fn validate(&self) -> Result<(), MemuError> {
        require_id("user_id", &self.user_id)?;
        require_id("agent_id", &self.agent_id)?;
        let empty = match &self.query {
            RetrieveQuery::Text(text) => text.trim().is_empty(),
            RetrieveQuery::Conversation(messages) => messages.is_empty(),
        };
        if empty {
            return Err(MemuError::InvalidArgument("query must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Body of `POST /api/v3/memory/categories`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListCategoriesRequest {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

impl ListCategoriesRequest {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            agent_id: None,
        }
    }

    /// Scope to one agent. A blank id is treated as unset.
    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        let agent_id = agent_id.into();
        self.agent_id = (!agent_id.trim().is_empty()).then_some(agent_id);
        self
    }

    pub fn validate(&self) -> Result<(), MemuError> {
        require_id("user_id", &self.user_id)
    }
}

// Empty content counts as absent, both for validation and on the wire.
fn no_messages(conversation: &Option<Vec<ConversationMessage>>) -> bool {
    conversation.as_ref().is_none_or(|c| c.is_empty())
}

fn blank_text(text: &Option<String>) -> bool {
    text.as_ref().is_none_or(|t| t.trim().is_empty())
}

fn require_id(field: &str, value: &str) -> Result<(), MemuError> {
    if value.trim().is_empty() {
        return Err(MemuError::InvalidArgument(format!("{field} is required")));
    }
    Ok(())
}
