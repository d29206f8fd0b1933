//! # Collection Loader
//!
//! Status slots for the four fetches a Sale screen makes, and the task that
//! runs each fetch.
//!
//! ## Fetch Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Idle ──begin──► Loading ──Ok──► Loaded(payload)                       │
//! │                      │                                                  │
//! │                      └───Err──► Failed(StoreError)                      │
//! │                                                                         │
//! │   One slot per fetch: Sale, Devices, Customizations, Addons.            │
//! │   Each completion touches only its own slot; there is no combined       │
//! │   "all loaded" gate. A failed collection leaves the screen usable.      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Task Model
//! ```text
//! SaleScreen ──spawn_fetch──► tokio task ──store.fetch_*()──► remote store
//!      ▲                           │
//!      └──── mpsc (Tagged) ◄───────┘   tagged with the screen generation
//! ```
//!
//! A task never touches screen state. It sends its completion back; if the
//! screen is gone the send fails and the result is dropped.

use std::future::Future;
use std::sync::Arc;

use sale_core::{Addon, Customization, Device, EntityKind, Sale};
use sale_store::{RemoteStore, StoreError, StoreResult};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};
use ts_rs::TS;

// =============================================================================
// Status Slots
// =============================================================================

/// Status plus last payload or error of one fetch.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Loadable<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Failed(StoreError),
}

/// Payload-free status of a slot, for views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Idle,
    Loading,
    Loaded,
    Failed,
}

impl<T> Loadable<T> {
    pub fn status(&self) -> LoadStatus {
        match self {
            Loadable::Idle => LoadStatus::Idle,
            Loadable::Loading => LoadStatus::Loading,
            Loadable::Loaded(_) => LoadStatus::Loaded,
            Loadable::Failed(_) => LoadStatus::Failed,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Loadable::Loaded(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&StoreError> {
        match self {
            Loadable::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Loadable::Loaded(_))
    }

    /// Marks the slot as in flight. The previous payload is dropped.
    pub fn begin(&mut self) {
        *self = Loadable::Loading;
    }

    /// Replaces the slot wholesale with a completion.
    pub fn resolve(&mut self, result: StoreResult<T>) {
        *self = match result {
            Ok(v) => Loadable::Loaded(v),
            Err(e) => Loadable::Failed(e),
        };
    }
}

/// The three dependent collections of a Sale.
#[derive(Debug, Clone, Default)]
pub struct CollectionSet {
    pub devices: Loadable<Vec<Device>>,
    pub customizations: Loadable<Vec<Customization>>,
    pub addons: Loadable<Vec<Addon>>,
}

impl CollectionSet {
    pub fn any_loading(&self) -> bool {
        self.devices.is_loading() || self.customizations.is_loading() || self.addons.is_loading()
    }

    /// Kinds whose fetch failed, with the error, in display order.
    pub fn failures(&self) -> Vec<(EntityKind, &StoreError)> {
        [
            (EntityKind::Device, self.devices.error()),
            (EntityKind::Customization, self.customizations.error()),
            (EntityKind::Addon, self.addons.error()),
        ]
        .into_iter()
        .filter_map(|(kind, err)| err.map(|e| (kind, e)))
        .collect()
    }

    /// Loaded devices, or nothing if the collection is not available.
    pub fn devices(&self) -> &[Device] {
        self.devices.value().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn addons(&self) -> &[Addon] {
        self.addons.value().map(Vec::as_slice).unwrap_or_default()
    }
}

// =============================================================================
// Completions
// =============================================================================

/// Result of one fetch or submit task.
#[derive(Debug, Clone)]
pub enum Completion {
    SaleLoaded(StoreResult<Sale>),
    DevicesLoaded(StoreResult<Vec<Device>>),
    CustomizationsLoaded(StoreResult<Vec<Customization>>),
    AddonsLoaded(StoreResult<Vec<Addon>>),
    Submitted(StoreResult<Sale>),
}

impl Completion {
    pub fn kind(&self) -> EntityKind {
        match self {
            Completion::SaleLoaded(_) | Completion::Submitted(_) => EntityKind::Sale,
            Completion::DevicesLoaded(_) => EntityKind::Device,
            Completion::CustomizationsLoaded(_) => EntityKind::Customization,
            Completion::AddonsLoaded(_) => EntityKind::Addon,
        }
    }

    pub fn is_ok(&self) -> bool {
        match self {
            Completion::SaleLoaded(r) | Completion::Submitted(r) => r.is_ok(),
            Completion::DevicesLoaded(r) => r.is_ok(),
            Completion::CustomizationsLoaded(r) => r.is_ok(),
            Completion::AddonsLoaded(r) => r.is_ok(),
        }
    }
}

/// A completion stamped with the screen generation that spawned it.
#[derive(Debug)]
pub struct Tagged {
    pub generation: u64,
    pub completion: Completion,
}

// =============================================================================
// Fetch Tasks
// =============================================================================

/// Runs `op` on its own task and sends the completion back.
///
/// A task that panics still reports: `failed` turns the panic into an
/// `Internal` store error, so every spawned task yields exactly one
/// completion.
pub(crate) fn spawn_task<S, F, Fut>(
    store: Arc<S>,
    tx: UnboundedSender<Tagged>,
    generation: u64,
    op: F,
    failed: fn(StoreError) -> Completion,
) where
    S: RemoteStore,
    F: FnOnce(Arc<S>) -> Fut + Send + 'static,
    Fut: Future<Output = Completion> + Send + 'static,
{
    tokio::spawn(async move {
        let completion = match tokio::spawn(op(store)).await {
            Ok(completion) => completion,
            Err(e) => {
                warn!(generation, "Store task aborted: {}", e);
                failed(StoreError::Internal(format!("store task aborted: {}", e)))
            }
        };
        let kind = completion.kind();
        if tx.send(Tagged { generation, completion }).is_err() {
            debug!(%kind, generation, "Screen dropped; completion discarded");
        }
    });
}

/// Spawns the three collection fetches.
pub(crate) fn spawn_collections<S: RemoteStore>(
    store: &Arc<S>,
    tx: &UnboundedSender<Tagged>,
    generation: u64,
    collections: &mut CollectionSet,
) -> usize {
    collections.devices.begin();
    spawn_task(
        store.clone(),
        tx.clone(),
        generation,
        |s| async move { Completion::DevicesLoaded(s.fetch_collection().await) },
        |e| Completion::DevicesLoaded(Err(e)),
    );

    collections.customizations.begin();
    spawn_task(
        store.clone(),
        tx.clone(),
        generation,
        |s| async move { Completion::CustomizationsLoaded(s.fetch_collection().await) },
        |e| Completion::CustomizationsLoaded(Err(e)),
    );

    collections.addons.begin();
    spawn_task(
        store.clone(),
        tx.clone(),
        generation,
        |s| async move { Completion::AddonsLoaded(s.fetch_collection().await) },
        |e| Completion::AddonsLoaded(Err(e)),
    );

    3
}

/// Spawns the Sale fetch.
pub(crate) fn spawn_sale<S: RemoteStore>(
    store: &Arc<S>,
    tx: &UnboundedSender<Tagged>,
    generation: u64,
    id: sale_core::EntityId,
    slot: &mut Loadable<Sale>,
) -> usize {
    slot.begin();
    spawn_task(
        store.clone(),
        tx.clone(),
        generation,
        move |s| async move { Completion::SaleLoaded(s.fetch_by_id(id).await) },
        |e| Completion::SaleLoaded(Err(e)),
    );
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loadable_transitions() {
        let mut slot: Loadable<Vec<Device>> = Loadable::default();
        assert_eq!(slot.status(), LoadStatus::Idle);

        slot.begin();
        assert!(slot.is_loading());

        slot.resolve(Ok(vec![Device::new(3)]));
        assert_eq!(slot.status(), LoadStatus::Loaded);
        assert_eq!(slot.value().map(Vec::len), Some(1));

        slot.resolve(Err(StoreError::Network("down".to_string())));
        assert_eq!(slot.status(), LoadStatus::Failed);
        assert_eq!(slot.value(), None);
        assert!(slot.error().is_some());
    }

    #[test]
    fn test_collection_failures_in_order() {
        let mut set = CollectionSet::default();
        set.addons.resolve(Err(StoreError::Network("a".to_string())));
        set.devices.resolve(Err(StoreError::Network("d".to_string())));
        set.customizations.resolve(Ok(vec![]));

        let kinds: Vec<_> = set.failures().into_iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![EntityKind::Device, EntityKind::Addon]);
        assert!(set.devices().is_empty());
        assert!(!set.any_loading());
    }

    #[test]
    fn test_load_status_serialization() {
        assert_eq!(serde_json::to_string(&LoadStatus::Loaded).unwrap(), "\"loaded\"");
    }
}
