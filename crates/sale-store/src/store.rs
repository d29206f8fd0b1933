//! # Store Seam
//!
//! [`Entity`] ties a wire type to its kind; [`RemoteStore`] is the four
//! operations the screens need. Every operation is asynchronous and may fail
//! with a [`StoreError`](crate::StoreError) that callers surface verbatim.

use async_trait::async_trait;
use sale_core::{Addon, Customization, Device, EntityId, EntityKind, Sale};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreResult;

/// A wire type stored under one [`EntityKind`].
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;

    /// Store-assigned identity, absent before creation.
    fn id(&self) -> Option<EntityId>;
}

impl Entity for Sale {
    const KIND: EntityKind = EntityKind::Sale;

    fn id(&self) -> Option<EntityId> {
        self.id
    }
}

impl Entity for Device {
    const KIND: EntityKind = EntityKind::Device;

    fn id(&self) -> Option<EntityId> {
        Some(self.id)
    }
}

impl Entity for Customization {
    const KIND: EntityKind = EntityKind::Customization;

    fn id(&self) -> Option<EntityId> {
        Some(self.id)
    }
}

impl Entity for Addon {
    const KIND: EntityKind = EntityKind::Addon;

    fn id(&self) -> Option<EntityId> {
        Some(self.id)
    }
}

/// The remote data store.
///
/// ## Operations
/// ```text
/// fetch_collection::<T>()      every record of T::KIND, unfiltered
/// fetch_by_id::<T>(id)         one record, NotFound if absent
/// create::<P, T>(payload)      new record, returns it with its id
/// update::<P, T>(id, payload)  replaces the record, returns the stored copy
/// ```
#[async_trait]
pub trait RemoteStore: Send + Sync + 'static {
    async fn fetch_collection<T: Entity>(&self) -> StoreResult<Vec<T>>;

    async fn fetch_by_id<T: Entity>(&self, id: EntityId) -> StoreResult<T>;

    async fn create<P, T>(&self, payload: &P) -> StoreResult<T>
    where
        P: Serialize + Sync,
        T: Entity;

    async fn update<P, T>(&self, id: EntityId, payload: &P) -> StoreResult<T>
    where
        P: Serialize + Sync,
        T: Entity;
}
