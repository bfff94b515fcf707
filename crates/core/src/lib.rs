//! Convo core types: resource declarations, wire payloads, and store errors.

#![forbid(unsafe_code)]

pub mod bot;
pub mod intent;
pub mod slot_type;
pub mod wire;

use serde::{Deserialize, Serialize};

/// Version alias addressing the mutable working copy of a resource.
pub const LATEST_VERSION: &str = "$LATEST";

/// Live identity attributes exported for downstream declarations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceAttrs {
    pub checksum: String,
    pub version: String,
}

/// Reply from a successful put. The service recomputes the checksum on every
/// write; the returned value is the token required by the next in-place put.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PutReply {
    pub name: String,
    pub checksum: String,
    pub version: String,
}

/// Result of one lifecycle operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Outcome {
    pub physical_id: String,
    pub attributes: Option<ResourceAttrs>,
}

/// Declarative input common to every resource kind.
pub trait Declaration: Clone + Send + Sync {
    /// Unique identifier within the kind's namespace.
    fn name(&self) -> &str;

    /// Caller-supplied checksum pin. Empty strings count as absent.
    fn checksum(&self) -> Option<&str>;

    fn set_checksum(&mut self, checksum: String);
}

/// Kind-specific mapping from a declaration to the remote put payload.
///
/// The three kinds differ only in this table: field names, fixed defaults,
/// and which fields are optional.
pub trait Kind: Send + Sync + 'static {
    /// Label used in logs and metrics.
    const KIND: &'static str;
    /// REST collection segment, e.g. "bots".
    const COLLECTION: &'static str;

    type Props: Declaration + serde::de::DeserializeOwned + Serialize;
    type PutRequest: Serialize + Send + Sync;

    fn put_request(props: &Self::Props) -> Self::PutRequest;
}

/// Remote call failures, suitable for surfacing across the adapter boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not_found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("remote: {0}")]
    Remote(String),
    #[error("transport: {0}")]
    Transport(String),
}
