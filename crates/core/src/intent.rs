//! Intent declarations and their fixed put mapping.

use serde::{Deserialize, Serialize};

use crate::wire::{Message, Prompt, Statement};
use crate::{Declaration, Kind};

/// Card shown when eliciting the runtime slot.
const RUNTIME_RESPONSE_CARD: &str = r#"{"version":1,"contentType":"application/vnd.amazonaws.card.generic","genericAttachments":[{"imageUrl":"https://imgflip.com/i/4er5gg","title":"What runtime do you want to use","buttons":[{"text":"Python","value":"python"},{"text":"dotnet","value":"dotnet"},{"text":"node","value":"nodejs"},{"text":"typescript","value":"typescript"}]}]}"#;

/// Declared intent properties as they arrive from a template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct IntentProps {
    pub intent_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_description: Option<String>,
    /// Hook invoked when the intent is fulfilled.
    #[serde(default)]
    pub intent_fulfillment_lambda_arn: String,
    #[serde(default, rename = "checksum", skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl IntentProps {
    /// Minimal declaration identifying an intent by name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            intent_name: name.into(),
            intent_description: None,
            intent_fulfillment_lambda_arn: String::new(),
            checksum: None,
        }
    }
}

impl Declaration for IntentProps {
    fn name(&self) -> &str {
        &self.intent_name
    }

    fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref().filter(|c| !c.is_empty())
    }

    fn set_checksum(&mut self, checksum: String) {
        self.checksum = Some(checksum);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CodeHook {
    pub uri: String,
    pub message_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentActivity {
    #[serde(rename = "type")]
    pub activity_type: String,
    pub code_hook: CodeHook,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpPrompt {
    pub prompt: Prompt,
    pub rejection_statement: Statement,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SlotDef {
    pub name: String,
    pub slot_constraint: String,
    pub slot_type: String,
    pub slot_type_version: String,
    pub value_elicitation_prompt: Prompt,
    pub priority: u32,
    pub sample_utterances: Vec<String>,
}

/// Put payload for an intent. Utterances, follow-up prompt and the two-slot
/// definition are fixed; only name, description and the hook URI vary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PutIntentRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fulfillment_activity: FulfillmentActivity,
    pub follow_up_prompt: FollowUpPrompt,
    pub sample_utterances: Vec<String>,
    pub slots: Vec<SlotDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

pub struct Intent;

impl Kind for Intent {
    const KIND: &'static str = "intent";
    const COLLECTION: &'static str = "intents";

    type Props = IntentProps;
    type PutRequest = PutIntentRequest;

    fn put_request(props: &Self::Props) -> Self::PutRequest {
        PutIntentRequest {
            name: props.intent_name.clone(),
            description: props.intent_description.clone(),
            fulfillment_activity: FulfillmentActivity {
                activity_type: "CodeHook".to_string(),
                code_hook: CodeHook {
                    uri: props.intent_fulfillment_lambda_arn.clone(),
                    message_version: "1.0".to_string(),
                },
            },
            follow_up_prompt: FollowUpPrompt {
                prompt: Prompt {
                    max_attempts: 3,
                    messages: vec![
                        Message::grouped("Creating {serviceName}", 1),
                        Message::grouped("Thank you -> your service {serviceName} is being created", 1),
                    ],
                    response_card: None,
                },
                rejection_statement: Statement {
                    messages: vec![
                        Message::grouped("Sure, have it your way!", 1),
                        Message::grouped("Alright, another time then!", 1),
                    ],
                },
            },
            sample_utterances: vec![
                "Create Service".to_string(),
                "Create Service with name {serviceName}".to_string(),
                "New Service".to_string(),
                "New Service with name {serviceName}".to_string(),
                "New Service {serviceName}".to_string(),
                "New Service with {runtime} and name {serviceName}".to_string(),
            ],
            slots: vec![
                SlotDef {
                    name: "runtime".to_string(),
                    slot_constraint: "Required".to_string(),
                    slot_type: "RuntimeVTwo".to_string(),
                    slot_type_version: "1".to_string(),
                    value_elicitation_prompt: Prompt {
                        max_attempts: 2,
                        messages: vec![
                            Message::plain("What runtime do you want to use?"),
                            Message::plain("Runtime?"),
                        ],
                        response_card: Some(RUNTIME_RESPONSE_CARD.to_string()),
                    },
                    priority: 2,
                    sample_utterances: vec!["Use {runtime}".to_string()],
                },
                SlotDef {
                    name: "serviceName".to_string(),
                    slot_constraint: "Required".to_string(),
                    slot_type: "ServiceNameRegExVTwo".to_string(),
                    slot_type_version: "1".to_string(),
                    value_elicitation_prompt: Prompt {
                        max_attempts: 2,
                        messages: vec![Message::plain("What should the service be called")],
                        response_card: None,
                    },
                    priority: 4,
                    sample_utterances: Vec::new(),
                },
            ],
            checksum: props.checksum().map(str::to_string),
        }
    }
}
