//! Wire primitives shared by the put payloads.

use serde::{Deserialize, Serialize};

pub const PLAIN_TEXT: &str = "PlainText";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub content_type: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_number: Option<u32>,
}

impl Message {
    pub fn plain(content: &str) -> Self {
        Self { content_type: PLAIN_TEXT.to_string(), content: content.to_string(), group_number: None }
    }

    pub fn grouped(content: &str, group: u32) -> Self {
        Self { content_type: PLAIN_TEXT.to_string(), content: content.to_string(), group_number: Some(group) }
    }
}

/// A prompt the service plays until it gets an answer or runs out of attempts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub max_attempts: u32,
    pub messages: Vec<Message>,
    /// Rendered card payload, JSON-encoded as the service expects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_card: Option<String>,
}

/// A statement is played once; no answer is collected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    pub messages: Vec<Message>,
}
