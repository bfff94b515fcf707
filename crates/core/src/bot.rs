//! Bot declarations and their fixed put mapping.

use serde::{Deserialize, Serialize};

use crate::wire::{Message, Prompt, Statement};
use crate::{Declaration, Kind};

pub const IDLE_SESSION_TTL_SECS: u32 = 300;
pub const LOCALE: &str = "en-US";

/// Declared bot properties as they arrive from a template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct BotProps {
    pub bot_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_description: Option<String>,
    /// Explicit checksum pin; normally absent on first create.
    #[serde(default, rename = "checksum", skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl BotProps {
    /// Minimal declaration identifying a bot by name.
    pub fn named(name: impl Into<String>) -> Self {
        Self { bot_name: name.into(), bot_description: None, checksum: None }
    }
}

impl Declaration for BotProps {
    fn name(&self) -> &str {
        &self.bot_name
    }

    fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref().filter(|c| !c.is_empty())
    }

    fn set_checksum(&mut self, checksum: String) {
        self.checksum = Some(checksum);
    }
}

/// Put payload for a bot. The conversation scaffolding is fixed: the service
/// requires abort/clarification prompts, so every bot ships the same ones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PutBotRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub abort_statement: Statement,
    pub child_directed: bool,
    pub clarification_prompt: Prompt,
    #[serde(rename = "idleSessionTTLInSeconds")]
    pub idle_session_ttl_in_seconds: u32,
    pub locale: String,
    pub process_behavior: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

pub struct Bot;

impl Kind for Bot {
    const KIND: &'static str = "bot";
    const COLLECTION: &'static str = "bots";

    type Props = BotProps;
    type PutRequest = PutBotRequest;

    fn put_request(props: &Self::Props) -> Self::PutRequest {
        PutBotRequest {
            name: props.bot_name.clone(),
            description: props.bot_description.clone(),
            abort_statement: Statement {
                messages: vec![
                    Message::plain("I don't understand. Can you try again?"),
                    Message::plain("I'm sorry, I don't understand."),
                ],
            },
            child_directed: true,
            clarification_prompt: Prompt {
                max_attempts: 1,
                messages: vec![
                    Message::plain("I'm sorry, I didn't hear that. Can you repeat what you just said?"),
                    Message::plain("Can you say that again?"),
                ],
                response_card: None,
            },
            idle_session_ttl_in_seconds: IDLE_SESSION_TTL_SECS,
            locale: LOCALE.to_string(),
            process_behavior: "SAVE".to_string(),
            checksum: props.checksum().map(str::to_string),
        }
    }
}
