//! # Memory Store
//!
//! An in-process [`RemoteStore`] holding records as JSON values per kind.
//! Used by the console's `--memory` mode and as the store fake in tests.
//!
//! ## Failure Injection
//! ```text
//! store.fail(EntityKind::Addon, StoreError::Network("down".into()));
//!
//! fetch_collection::<Addon>()   → Err(Network("down"))
//! fetch_collection::<Device>()  → Ok([...])      other kinds unaffected
//!
//! store.recover(EntityKind::Addon);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use sale_core::{EntityId, EntityKind};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::store::{Entity, RemoteStore};

#[derive(Default)]
struct Inner {
    records: HashMap<EntityKind, BTreeMap<EntityId, Value>>,
    failures: HashMap<EntityKind, StoreError>,
    requests: HashMap<EntityKind, usize>,
}

impl Inner {
    /// Counts the request, then returns the injected failure if any.
    fn begin(&mut self, kind: EntityKind) -> StoreResult<()> {
        *self.requests.entry(kind).or_insert(0) += 1;
        match self.failures.get(&kind) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn next_id(&self, kind: EntityKind) -> EntityId {
        self.records
            .get(&kind)
            .and_then(|m| m.keys().next_back().copied())
            .unwrap_or(0)
            + 1
    }
}

/// Records kept in memory, keyed by kind and id.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Internal("memory store lock poisoned".to_string()))
    }

    /// Stores `entity` under its own id, replacing any previous record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Internal` if the entity has no id.
    pub fn insert<T: Entity>(&self, entity: &T) -> StoreResult<()> {
        let id = entity.id().ok_or_else(|| {
            StoreError::Internal(format!("cannot insert {} without id", T::KIND))
        })?;
        let value = serde_json::to_value(entity)?;
        self.lock()?
            .records
            .entry(T::KIND)
            .or_default()
            .insert(id, value);
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert) for seeding.
    pub fn with<T: Entity>(self, entities: impl IntoIterator<Item = T>) -> StoreResult<Self> {
        for entity in entities {
            self.insert(&entity)?;
        }
        Ok(self)
    }

    /// Makes every request for `kind` fail with `err` until recovered.
    pub fn fail(&self, kind: EntityKind, err: StoreError) -> StoreResult<()> {
        self.lock()?.failures.insert(kind, err);
        Ok(())
    }

    pub fn recover(&self, kind: EntityKind) -> StoreResult<()> {
        self.lock()?.failures.remove(&kind);
        Ok(())
    }

    /// Reads a stored record directly, bypassing failure injection.
    pub fn get<T: Entity>(&self, id: EntityId) -> StoreResult<Option<T>> {
        let inner = self.lock()?;
        match inner.records.get(&T::KIND).and_then(|m| m.get(&id)) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// How many requests have been made for `kind`, failed ones included.
    pub fn request_count(&self, kind: EntityKind) -> usize {
        self.lock()
            .map(|inner| inner.requests.get(&kind).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Serializes `payload` and stores it as record `id`.
    fn store<P: Serialize>(inner: &mut Inner, kind: EntityKind, id: EntityId, payload: &P) -> StoreResult<Value> {
        let mut value = serde_json::to_value(payload)?;
        match value.as_object_mut() {
            Some(object) => {
                object.insert("id".to_string(), Value::from(id));
            }
            None => {
                return Err(StoreError::Status {
                    status: 400,
                    message: format!("{} payload must be an object", kind),
                })
            }
        }
        inner.records.entry(kind).or_default().insert(id, value.clone());
        Ok(value)
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn fetch_collection<T: Entity>(&self) -> StoreResult<Vec<T>> {
        let values: Vec<Value> = {
            let mut inner = self.lock()?;
            inner.begin(T::KIND)?;
            inner
                .records
                .get(&T::KIND)
                .map(|m| m.values().cloned().collect())
                .unwrap_or_default()
        };
        debug!(kind = %T::KIND, count = values.len(), "Memory collection read");

        values
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(StoreError::from))
            .collect()
    }

    async fn fetch_by_id<T: Entity>(&self, id: EntityId) -> StoreResult<T> {
        let value = {
            let mut inner = self.lock()?;
            inner.begin(T::KIND)?;
            inner
                .records
                .get(&T::KIND)
                .and_then(|m| m.get(&id))
                .cloned()
                .ok_or_else(|| StoreError::not_found(T::KIND, id))?
        };
        Ok(serde_json::from_value(value)?)
    }

    async fn create<P, T>(&self, payload: &P) -> StoreResult<T>
    where
        P: Serialize + Sync,
        T: Entity,
    {
        let value = {
            let mut inner = self.lock()?;
            inner.begin(T::KIND)?;
            let id = inner.next_id(T::KIND);
            Self::store(&mut inner, T::KIND, id, payload)?
        };
        debug!(kind = %T::KIND, "Memory record created");
        Ok(serde_json::from_value(value)?)
    }

    async fn update<P, T>(&self, id: EntityId, payload: &P) -> StoreResult<T>
    where
        P: Serialize + Sync,
        T: Entity,
    {
        let value = {
            let mut inner = self.lock()?;
            inner.begin(T::KIND)?;
            let exists = inner
                .records
                .get(&T::KIND)
                .is_some_and(|m| m.contains_key(&id));
            if !exists {
                return Err(StoreError::not_found(T::KIND, id));
            }
            Self::store(&mut inner, T::KIND, id, payload)?
        };
        debug!(kind = %T::KIND, id, "Memory record updated");
        Ok(serde_json::from_value(value)?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use sale_core::{Addon, Device, Reference, Sale};
    use serde_json::json;

    fn seeded() -> MemoryStore {
        MemoryStore::new()
            .with([Device::new(3), Device::new(4)])
            .unwrap()
            .with([Addon::new(1)])
            .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_collection_per_kind() {
        let store = seeded();
        let devices: Vec<Device> = store.fetch_collection().await.unwrap();
        assert_eq!(devices.iter().map(|d| d.id).collect::<Vec<_>>(), vec![3, 4]);

        let sales: Vec<Sale> = store.fetch_collection().await.unwrap();
        assert!(sales.is_empty());
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_update_replaces() {
        let store = seeded();
        let created: Sale = store
            .create(&json!({"saleDate": "2024-01-01T10:00:00Z", "finalPrice": 10, "device": {"id": 3}}))
            .await
            .unwrap();
        assert_eq!(created.id, Some(1));
        assert_eq!(created.device, Some(Reference::new(3)));

        let updated: Sale = store
            .update(1, &json!({"saleDate": "2024-01-01T10:00:00Z", "finalPrice": 12, "device": {"id": 4}}))
            .await
            .unwrap();
        assert_eq!(updated.device, Some(Reference::new(4)));
        assert_eq!(store.get::<Sale>(1).unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = seeded();
        let err = store
            .update::<_, Sale>(9, &json!({"finalPrice": 1}))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::not_found(EntityKind::Sale, 9));

        let err = store.fetch_by_id::<Device>(99).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_failure_injection_is_per_kind() {
        let store = seeded();
        store
            .fail(EntityKind::Addon, StoreError::Network("down".to_string()))
            .unwrap();

        let err = store.fetch_collection::<Addon>().await.unwrap_err();
        assert_eq!(err, StoreError::Network("down".to_string()));
        assert!(store.fetch_collection::<Device>().await.is_ok());

        store.recover(EntityKind::Addon).unwrap();
        assert!(store.fetch_collection::<Addon>().await.is_ok());
        assert_eq!(store.request_count(EntityKind::Addon), 2);
    }

    #[test]
    fn test_insert_requires_id() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.insert(&Sale::default()),
            Err(StoreError::Internal(_))
        ));
    }
}
