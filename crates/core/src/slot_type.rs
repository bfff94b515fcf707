//! Slot type declarations and their put mapping.

use serde::{Deserialize, Serialize};

use crate::{Declaration, Kind};

/// Strategy used when a declaration leaves the field unset or empty.
pub const DEFAULT_VALUE_SELECTION_STRATEGY: &str = "ORIGINAL_VALUE";

/// Declared slot type properties as they arrive from a template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct SlotTypeProps {
    pub slot_type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_type_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_type_value_selection_strategy: Option<String>,
    #[serde(default)]
    pub slot_type_enumeration_values: Vec<EnumerationValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_type_parent_slot_type_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_type_configurations: Option<Vec<SlotTypeConfiguration>>,
    #[serde(default, rename = "checksum", skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl SlotTypeProps {
    /// Minimal declaration identifying a slot type by name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            slot_type_name: name.into(),
            slot_type_description: None,
            slot_type_value_selection_strategy: None,
            slot_type_enumeration_values: Vec::new(),
            slot_type_parent_slot_type_signature: None,
            slot_type_configurations: None,
            checksum: None,
        }
    }
}

impl Declaration for SlotTypeProps {
    fn name(&self) -> &str {
        &self.slot_type_name
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
pub struct EnumerationValue {
    pub value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegexConfiguration {
    pub pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SlotTypeConfiguration {
    pub regex_configuration: RegexConfiguration,
}

/// Put payload for a slot type. Parent configuration only travels together
/// with a parent signature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PutSlotTypeRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub value_selection_strategy: String,
    pub enumeration_values: Vec<EnumerationValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_slot_type_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_type_configurations: Option<Vec<SlotTypeConfiguration>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

pub struct SlotType;

impl Kind for SlotType {
    const KIND: &'static str = "slot-type";
    const COLLECTION: &'static str = "slottypes";

    type Props = SlotTypeProps;
    type PutRequest = PutSlotTypeRequest;

    fn put_request(props: &Self::Props) -> Self::PutRequest {
        let strategy = props
            .slot_type_value_selection_strategy
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_VALUE_SELECTION_STRATEGY)
            .to_string();
        let has_parent = props.slot_type_parent_slot_type_signature.is_some();
        PutSlotTypeRequest {
            name: props.slot_type_name.clone(),
            description: props.slot_type_description.clone(),
            value_selection_strategy: strategy,
            enumeration_values: props.slot_type_enumeration_values.clone(),
            parent_slot_type_signature: props.slot_type_parent_slot_type_signature.clone(),
            slot_type_configurations: if has_parent { props.slot_type_configurations.clone() } else { None },
            checksum: props.checksum().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_defaults_when_unset_or_empty() {
        let mut props = SlotTypeProps::named("Runtime");
        assert_eq!(SlotType::put_request(&props).value_selection_strategy, "ORIGINAL_VALUE");

        props.slot_type_value_selection_strategy = Some(String::new());
        assert_eq!(SlotType::put_request(&props).value_selection_strategy, "ORIGINAL_VALUE");

        props.slot_type_value_selection_strategy = Some("TOP_RESOLUTION".into());
        assert_eq!(SlotType::put_request(&props).value_selection_strategy, "TOP_RESOLUTION");
    }

    #[test]
    fn configurations_travel_only_with_a_parent_signature() {
        let mut props = SlotTypeProps::named("ServiceNameRegEx");
        props.slot_type_configurations = Some(vec![SlotTypeConfiguration {
            regex_configuration: RegexConfiguration { pattern: "[a-z0-9-]{3,40}".into() },
        }]);
        let req = SlotType::put_request(&props);
        assert!(req.parent_slot_type_signature.is_none());
        assert!(req.slot_type_configurations.is_none());

        props.slot_type_parent_slot_type_signature = Some("AMAZON.AlphaNumeric".into());
        let req = SlotType::put_request(&props);
        assert_eq!(req.parent_slot_type_signature.as_deref(), Some("AMAZON.AlphaNumeric"));
        assert!(req.slot_type_configurations.is_some());
    }

    #[test]
    fn props_parse_with_enumeration_values() {
        let props: SlotTypeProps = serde_json::from_value(serde_json::json!({
            "SlotTypeName": "Runtime",
            "SlotTypeDescription": "supported runtimes",
            "SlotTypeEnumerationValues": [
                {"value": "python", "synonyms": ["py"]},
                {"value": "nodejs"}
            ]
        }))
        .unwrap();
        assert_eq!(props.slot_type_enumeration_values.len(), 2);
        assert_eq!(props.slot_type_enumeration_values[0].synonyms, vec!["py"]);
        assert!(props.slot_type_enumeration_values[1].synonyms.is_empty());
    }
}
