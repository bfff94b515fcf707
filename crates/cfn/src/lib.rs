//! Convo CFN adapter: custom-resource lifecycle envelope and dispatch.
//!
//! Translates lifecycle requests into reconciler calls and maps outcomes and
//! failures back into the response envelope the orchestrator consumes. The
//! delivery transport (how envelopes reach this process) is out of scope.

#![forbid(unsafe_code)]

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracing::{info, warn};

use convo_core::bot::Bot;
use convo_core::intent::Intent;
use convo_core::slot_type::SlotType;
use convo_core::{Kind, Outcome, ResourceAttrs, StoreError};
use convo_reconcile::{Reconciler, Store};

pub const BOT_RESOURCE_TYPE: &str = "Custom::Bot";
pub const INTENT_RESOURCE_TYPE: &str = "Custom::Intent";
pub const SLOT_TYPE_RESOURCE_TYPE: &str = "Custom::SlotType";

/// Lifecycle phase requested by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

/// Inbound custom-resource request envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleRequest {
    pub request_type: RequestType,
    pub request_id: String,
    pub stack_id: String,
    pub logical_resource_id: String,
    /// e.g. "Custom::Bot"
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_properties: Json,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_resource_properties: Option<Json>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

/// Outbound response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleResponse {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    /// Attribute exports consumable by dependent declarations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResourceAttrs>,
}

/// Envelope-level failures: anything the reconciler never saw.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("malformed request: {0}")]
    Malformed(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Per-kind lifecycle handler over an injected store.
pub struct LifecycleHandler<K: Kind, S> {
    reconciler: Reconciler<K, S>,
}

impl<K: Kind, S: Store<K>> LifecycleHandler<K, S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { reconciler: Reconciler::new(store) }
    }

    /// Process one request. The envelope itself never fails: errors become a
    /// FAILED response with the reason attached.
    pub async fn handle(&self, req: LifecycleRequest) -> LifecycleResponse {
        info!(
            resource_type = %req.resource_type,
            request_id = %req.request_id,
            request = ?req.request_type,
            "lifecycle request"
        );
        match self.dispatch(&req).await {
            Ok(outcome) => LifecycleResponse {
                status: ResponseStatus::Success,
                reason: None,
                physical_resource_id: outcome.physical_id,
                stack_id: req.stack_id,
                request_id: req.request_id,
                logical_resource_id: req.logical_resource_id,
                data: outcome.attributes,
            },
            Err(e) => {
                warn!(request_id = %req.request_id, error = %e, "lifecycle request failed");
                failed_response(req, e.to_string())
            }
        }
    }

    async fn dispatch(&self, req: &LifecycleRequest) -> Result<Outcome, AdapterError> {
        let desired = parse_props::<K>(&req.resource_properties)?;
        match req.request_type {
            RequestType::Create => Ok(self.reconciler.create(&desired).await?),
            RequestType::Update => {
                let physical_id = req
                    .physical_resource_id
                    .as_deref()
                    .ok_or_else(|| AdapterError::Malformed("update without physical resource id".into()))?;
                let old_raw = req
                    .old_resource_properties
                    .as_ref()
                    .ok_or_else(|| AdapterError::Malformed("update without old properties".into()))?;
                if *old_raw == req.resource_properties {
                    // Unchanged declaration: still must export live attributes.
                    return Ok(self.reconciler.no_update(physical_id, &desired).await?);
                }
                let previous = parse_props::<K>(old_raw)?;
                Ok(self.reconciler.update(physical_id, &desired, &previous).await?)
            }
            RequestType::Delete => {
                let physical_id = req.physical_resource_id.as_deref().unwrap_or(&req.logical_resource_id);
                Ok(self.reconciler.delete(physical_id, &desired).await?)
            }
        }
    }
}

fn parse_props<K: Kind>(raw: &Json) -> Result<K::Props, AdapterError> {
    serde_json::from_value(raw.clone())
        .map_err(|e| AdapterError::Malformed(format!("{} properties: {}", K::KIND, e)))
}

fn failed_response(req: LifecycleRequest, reason: String) -> LifecycleResponse {
    let physical_resource_id =
        req.physical_resource_id.unwrap_or_else(|| req.logical_resource_id.clone());
    LifecycleResponse {
        status: ResponseStatus::Failed,
        reason: Some(reason),
        physical_resource_id,
        stack_id: req.stack_id,
        request_id: req.request_id,
        logical_resource_id: req.logical_resource_id,
        data: None,
    }
}

/// Route a request to the handler for its declared resource type.
///
/// The store is shared: one client serves all three kinds.
pub async fn route<S>(req: LifecycleRequest, store: Arc<S>) -> LifecycleResponse
where
    S: Store<Bot> + Store<Intent> + Store<SlotType> + 'static,
{
    let resource_type = req.resource_type.clone();
    match resource_type.as_str() {
        BOT_RESOURCE_TYPE => LifecycleHandler::<Bot, S>::new(store).handle(req).await,
        INTENT_RESOURCE_TYPE => LifecycleHandler::<Intent, S>::new(store).handle(req).await,
        SLOT_TYPE_RESOURCE_TYPE => LifecycleHandler::<SlotType, S>::new(store).handle(req).await,
        other => {
            warn!(resource_type = %other, "unknown resource type");
            let reason = format!("unknown resource type: {other}");
            failed_response(req, reason)
        }
    }
}
