//! Convo reconcile: the checksum-driven upsert protocol shared by every kind.
//!
//! A put that targets an existing name must carry that name's current
//! checksum or the service rejects it as a conflicting write. The reconciler
//! therefore either trusts a caller-supplied checksum, targets a fresh name,
//! or fetches the live checksum immediately before the put.

#![forbid(unsafe_code)]

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use tracing::{error, info, warn};

use convo_core::{Declaration, Kind, Outcome, PutReply, ResourceAttrs, StoreError, LATEST_VERSION};

/// Remote store surface for one resource kind.
#[async_trait]
pub trait Store<K: Kind>: Send + Sync {
    async fn put(&self, name: &str, req: &K::PutRequest) -> Result<PutReply, StoreError>;
    async fn get(&self, name: &str, version_or_alias: &str) -> Result<ResourceAttrs, StoreError>;
    async fn delete(&self, name: &str) -> Result<(), StoreError>;
}

/// Lifecycle reconciler for one resource kind, generic over the store.
pub struct Reconciler<K: Kind, S> {
    store: Arc<S>,
    _kind: PhantomData<K>,
}

impl<K: Kind, S: Store<K>> Reconciler<K, S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store, _kind: PhantomData }
    }

    /// Upsert from a declaration. The declared checksum is attached only when
    /// the caller supplied one.
    pub async fn create(&self, desired: &K::Props) -> Result<Outcome, StoreError> {
        let name = desired.name();
        let req = K::put_request(desired);
        info!(kind = K::KIND, name = %name, pinned = desired.checksum().is_some(), "put start");
        match self.store.put(name, &req).await {
            Ok(reply) => {
                counter!("reconcile_put_ok", 1u64);
                info!(kind = K::KIND, name = %reply.name, version = %reply.version, "put ok");
                Ok(Outcome {
                    physical_id: reply.name,
                    attributes: Some(ResourceAttrs { checksum: reply.checksum, version: reply.version }),
                })
            }
            Err(e) => {
                counter!("reconcile_put_err", 1u64);
                error!(kind = K::KIND, name = %name, error = %e, "put failed");
                Err(e)
            }
        }
    }

    /// Update in place or across a rename.
    ///
    /// A rename targets a fresh name, so no conflict is possible and the put
    /// goes out as declared. A same-name update without a declared checksum
    /// must acquire the live one first; the put consumes the get's result.
    pub async fn update(
        &self,
        _physical_id: &str,
        desired: &K::Props,
        previous: &K::Props,
    ) -> Result<Outcome, StoreError> {
        let same_name = desired.name() == previous.name();
        if desired.checksum().is_some() || !same_name {
            info!(kind = K::KIND, name = %desired.name(), same_name, "rename or pinned checksum, upserting directly");
            return self.create(desired).await;
        }
        info!(kind = K::KIND, name = %desired.name(), "same name without checksum, acquiring live checksum");
        let attrs = self.fetch_attrs(previous.name()).await?;
        let mut pinned = desired.clone();
        pinned.set_checksum(attrs.checksum);
        self.create(&pinned).await
    }

    /// Best-effort idempotent removal. Failures never block the caller's
    /// deletion flow; the physical id is reported unconditionally.
    pub async fn delete(&self, _physical_id: &str, desired: &K::Props) -> Result<Outcome, StoreError> {
        let name = desired.name();
        match self.store.delete(name).await {
            Ok(()) => {
                counter!("reconcile_delete_ok", 1u64);
                info!(kind = K::KIND, name = %name, "delete ok");
            }
            Err(StoreError::NotFound(_)) => {
                counter!("reconcile_delete_absent", 1u64);
                info!(kind = K::KIND, name = %name, "delete: already absent");
            }
            Err(e) => {
                counter!("reconcile_delete_err", 1u64);
                warn!(kind = K::KIND, name = %name, error = %e, "delete failed, continuing");
            }
        }
        Ok(Outcome { physical_id: name.to_string(), attributes: None })
    }

    /// No-op update: nothing to write, but downstream declarations may
    /// reference this resource's live checksum/version, so report them.
    pub async fn no_update(&self, physical_id: &str, desired: &K::Props) -> Result<Outcome, StoreError> {
        let attrs = self.fetch_attrs(desired.name()).await?;
        Ok(Outcome { physical_id: physical_id.to_string(), attributes: Some(attrs) })
    }

    async fn fetch_attrs(&self, name: &str) -> Result<ResourceAttrs, StoreError> {
        match self.store.get(name, LATEST_VERSION).await {
            Ok(attrs) => {
                counter!("reconcile_get_ok", 1u64);
                info!(kind = K::KIND, name = %name, version = %attrs.version, "get ok");
                Ok(attrs)
            }
            Err(e) => {
                counter!("reconcile_get_err", 1u64);
                error!(kind = K::KIND, name = %name, error = %e, "get failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convo_core::bot::{Bot, BotProps, PutBotRequest};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Put { name: String, checksum: Option<String> },
        Get { name: String, version: String },
        Delete { name: String },
    }

    #[derive(Default)]
    struct FakeStore {
        calls: Mutex<Vec<Call>>,
        live_checksum: Mutex<Option<String>>,
        fail_put: bool,
        fail_get: bool,
        fail_delete: bool,
    }

    impl FakeStore {
        fn with_live(checksum: &str) -> Self {
            let store = Self::default();
            *store.live_checksum.lock().unwrap() = Some(checksum.to_string());
            store
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Store<Bot> for FakeStore {
        async fn put(&self, name: &str, req: &PutBotRequest) -> Result<PutReply, StoreError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Put { name: name.to_string(), checksum: req.checksum.clone() });
            if self.fail_put {
                return Err(StoreError::Remote("put rejected".into()));
            }
            Ok(PutReply { name: req.name.clone(), checksum: "fresh".into(), version: LATEST_VERSION.into() })
        }

        async fn get(&self, name: &str, version_or_alias: &str) -> Result<ResourceAttrs, StoreError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Get { name: name.to_string(), version: version_or_alias.to_string() });
            if self.fail_get {
                return Err(StoreError::Remote("get rejected".into()));
            }
            let checksum = self
                .live_checksum
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
            Ok(ResourceAttrs { checksum, version: LATEST_VERSION.into() })
        }

        async fn delete(&self, name: &str) -> Result<(), StoreError> {
            self.calls.lock().unwrap().push(Call::Delete { name: name.to_string() });
            if self.fail_delete {
                return Err(StoreError::Remote("delete rejected".into()));
            }
            Ok(())
        }
    }

    fn recon(store: FakeStore) -> (Arc<FakeStore>, Reconciler<Bot, FakeStore>) {
        let store = Arc::new(store);
        (store.clone(), Reconciler::new(store))
    }

    #[tokio::test]
    async fn create_without_checksum_puts_unpinned() {
        let (store, r) = recon(FakeStore::default());
        let out = r.create(&BotProps::named("Greeter")).await.unwrap();
        assert_eq!(out.physical_id, "Greeter");
        assert_eq!(store.calls(), vec![Call::Put { name: "Greeter".into(), checksum: None }]);
        let attrs = out.attributes.unwrap();
        assert_eq!(attrs.checksum, "fresh");
        assert_eq!(attrs.version, LATEST_VERSION);
    }

    #[tokio::test]
    async fn update_with_declared_checksum_skips_get() {
        let (store, r) = recon(FakeStore::default());
        let mut desired = BotProps::named("Greeter");
        desired.checksum = Some("abc".into());
        let out = r.update("Greeter", &desired, &BotProps::named("Greeter")).await.unwrap();
        assert_eq!(out.physical_id, "Greeter");
        assert_eq!(
            store.calls(),
            vec![Call::Put { name: "Greeter".into(), checksum: Some("abc".into()) }]
        );
    }

    #[tokio::test]
    async fn same_name_update_fetches_live_checksum() {
        let (store, r) = recon(FakeStore::with_live("xyz"));
        let out = r
            .update("Greeter", &BotProps::named("Greeter"), &BotProps::named("Greeter"))
            .await
            .unwrap();
        assert_eq!(out.physical_id, "Greeter");
        assert_eq!(
            store.calls(),
            vec![
                Call::Get { name: "Greeter".into(), version: LATEST_VERSION.into() },
                Call::Put { name: "Greeter".into(), checksum: Some("xyz".into()) },
            ]
        );
    }

    #[tokio::test]
    async fn renamed_update_skips_get() {
        let (store, r) = recon(FakeStore::default());
        let out = r
            .update("Greeter", &BotProps::named("Farewell"), &BotProps::named("Greeter"))
            .await
            .unwrap();
        assert_eq!(out.physical_id, "Farewell");
        assert_eq!(store.calls(), vec![Call::Put { name: "Farewell".into(), checksum: None }]);
    }

    #[tokio::test]
    async fn empty_checksum_counts_as_absent() {
        let (store, r) = recon(FakeStore::with_live("xyz"));
        let mut desired = BotProps::named("Greeter");
        desired.checksum = Some(String::new());
        r.update("Greeter", &desired, &BotProps::named("Greeter")).await.unwrap();
        assert!(matches!(store.calls()[0], Call::Get { .. }));
    }

    #[tokio::test]
    async fn get_failure_fails_the_update() {
        let (store, r) = recon(FakeStore { fail_get: true, ..Default::default() });
        let err = r
            .update("Greeter", &BotProps::named("Greeter"), &BotProps::named("Greeter"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Remote(_)));
        // no put after a failed get
        assert_eq!(store.calls().len(), 1);
    }

    #[tokio::test]
    async fn put_failure_propagates() {
        let (_store, r) = recon(FakeStore { fail_put: true, ..Default::default() });
        let err = r.create(&BotProps::named("Greeter")).await.unwrap_err();
        assert!(matches!(err, StoreError::Remote(_)));
    }

    #[tokio::test]
    async fn delete_swallows_remote_failure() {
        let (store, r) = recon(FakeStore { fail_delete: true, ..Default::default() });
        let out = r.delete("Greeter", &BotProps::named("Greeter")).await.unwrap();
        assert_eq!(out.physical_id, "Greeter");
        assert!(out.attributes.is_none());
        assert_eq!(store.calls(), vec![Call::Delete { name: "Greeter".into() }]);
    }

    #[tokio::test]
    async fn delete_reports_the_declared_name_not_the_physical_id() {
        let (_store, r) = recon(FakeStore::default());
        let out = r.delete("stale-physical-id", &BotProps::named("Greeter")).await.unwrap();
        assert_eq!(out.physical_id, "Greeter");
    }

    #[tokio::test]
    async fn no_update_reports_live_attrs_and_keeps_physical_id() {
        let (store, r) = recon(FakeStore::with_live("live-1"));
        let out = r.no_update("physical-greeter", &BotProps::named("Greeter")).await.unwrap();
        assert_eq!(out.physical_id, "physical-greeter");
        let attrs = out.attributes.unwrap();
        assert_eq!(attrs.checksum, "live-1");
        assert_eq!(attrs.version, LATEST_VERSION);
        assert_eq!(
            store.calls(),
            vec![Call::Get { name: "Greeter".into(), version: LATEST_VERSION.into() }]
        );
    }

    #[tokio::test]
    async fn no_update_failure_propagates() {
        let (_store, r) = recon(FakeStore { fail_get: true, ..Default::default() });
        let err = r.no_update("Greeter", &BotProps::named("Greeter")).await.unwrap_err();
        assert!(matches!(err, StoreError::Remote(_)));
    }
}
