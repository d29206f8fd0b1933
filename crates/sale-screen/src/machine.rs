//! # Sale View-State Machine
//!
//! Owns one Sale screen from mount to unmount.
//!
//! ## States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  mount(id, edit=false) ──► Detail ──begin_edit──┐                       │
//! │                                                 ▼                       │
//! │  mount(id, edit=true) ──────────────────► EditExisting ──┐              │
//! │                                                          │ submit       │
//! │  mount(None, edit=true) ────────────────► EditNew ───────┤              │
//! │                                                          ▼              │
//! │                                    ┌──────────────── Submitting         │
//! │                                    │ Err                 │ Ok           │
//! │                                    ▼                     ▼              │
//! │                               SubmitFailed        SubmitSucceeded       │
//! │                             (editable, submit      (navigates to        │
//! │                              again to retry)        /sale, ends)        │
//! │                                                                         │
//! │  any state ──unmount──► Unmounted (context discarded)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Completions
//! Fetches run on their own tasks and report back over the screen's
//! channel. The screen applies them one at a time, in whatever order they
//! arrive; each updates only its own slot. Every completion carries the
//! generation of the screen that spawned it. Unmounting bumps the
//! generation, so anything arriving afterwards is reported as
//! [`Applied::Stale`] and changes nothing. Fetches that finish after a
//! successful submit are stale too: the saved record stays in place.

use std::sync::Arc;

use sale_core::form::{
    build_payload, existing_sale_defaults, new_sale_defaults, resolve_device, fields,
};
use sale_core::pricing::suggest_for_form;
use sale_core::temporal::default_now;
use sale_core::validation::{validate_form, FieldErrors};
use sale_core::{EntityId, EntityKind, Money, Sale, SaleFormValues};
use sale_store::RemoteStore;
use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{ScreenError, ScreenResult};
use crate::loader::{spawn_collections, spawn_sale, spawn_task, CollectionSet, Completion, Loadable, Tagged};
use crate::navigation::{edit_path, list_path, Navigator};
use crate::view::ScreenView;

// =============================================================================
// States and Mount Parameters
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ScreenState {
    Detail,
    EditNew,
    EditExisting,
    Submitting,
    SubmitSucceeded,
    SubmitFailed,
    Unmounted,
}

impl ScreenState {
    /// States in which the form accepts a submit.
    pub fn is_editable(&self) -> bool {
        matches!(
            self,
            ScreenState::EditNew | ScreenState::EditExisting | ScreenState::SubmitFailed
        )
    }
}

/// What the route asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountParams {
    pub sale_id: Option<EntityId>,
    pub edit: bool,
}

impl MountParams {
    /// `/sale/{id}`
    pub fn detail(id: EntityId) -> Self {
        Self { sale_id: Some(id), edit: false }
    }

    /// `/sale/{id}/edit`
    pub fn edit(id: EntityId) -> Self {
        Self { sale_id: Some(id), edit: true }
    }

    /// `/sale/new`
    pub fn new_sale() -> Self {
        Self { sale_id: None, edit: true }
    }
}

/// What applying one completion did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A fetch slot was updated.
    Loaded(EntityKind),
    /// The submit finished; the state is now `SubmitSucceeded` or `SubmitFailed`.
    Submitted(ScreenState),
    /// The completion belongs to an unmounted screen, or is a fetch that
    /// finished after the Sale was saved, and was ignored.
    Stale,
}

// =============================================================================
// Screen Context
// =============================================================================

/// Everything one mounted screen knows. Dropped on unmount.
#[derive(Debug, Default)]
pub struct ScreenContext {
    pub sale_id: Option<EntityId>,
    pub sale: Loadable<Sale>,
    pub collections: CollectionSet,
    /// Date default of a new Sale, taken once at mount.
    pub mounted_at: Option<String>,
    /// Values of the last submit; kept so a failed submit loses no edits.
    pub pending_values: Option<SaleFormValues>,
    pub last_error: Option<ScreenError>,
    pub field_errors: FieldErrors,
}

impl ScreenContext {
    pub fn is_new(&self) -> bool {
        self.sale_id.is_none()
    }
}

// =============================================================================
// Sale Screen
// =============================================================================

/// One mounted Sale screen.
pub struct SaleScreen<S: RemoteStore> {
    instance: Uuid,
    store: Arc<S>,
    navigator: Arc<dyn Navigator>,
    tx: UnboundedSender<Tagged>,
    rx: UnboundedReceiver<Tagged>,
    generation: u64,
    /// Spawned tasks not yet received, any generation.
    pending_total: usize,
    /// Spawned tasks of the current generation not yet received.
    pending_current: usize,
    state: ScreenState,
    context: Option<ScreenContext>,
}

impl<S: RemoteStore> SaleScreen<S> {
    /// Mounts a screen and starts its fetches.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// ## Rules
    /// - id + edit: `EditExisting`, fetches the Sale and the three collections
    /// - no id + edit: `EditNew`, fetches the three collections
    /// - id, no edit: `Detail`, fetches the Sale only
    /// - no id, no edit: rejected
    pub fn mount(
        store: Arc<S>,
        navigator: Arc<dyn Navigator>,
        params: MountParams,
    ) -> ScreenResult<Self> {
        let state = match (params.sale_id, params.edit) {
            (Some(_), true) => ScreenState::EditExisting,
            (None, true) => ScreenState::EditNew,
            (Some(_), false) => ScreenState::Detail,
            (None, false) => {
                return Err(ScreenError::invalid_state("detail view needs a sale id"));
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let mut screen = SaleScreen {
            instance: Uuid::new_v4(),
            store,
            navigator,
            tx,
            rx,
            generation: 0,
            pending_total: 0,
            pending_current: 0,
            state,
            context: Some(ScreenContext {
                sale_id: params.sale_id,
                ..Default::default()
            }),
        };

        info!(
            screen = %screen.instance,
            state = ?state,
            sale_id = ?params.sale_id,
            "Sale screen mounted"
        );

        let mut spawned = 0;
        if let Some(ctx) = screen.context.as_mut() {
            if let Some(id) = params.sale_id {
                spawned += spawn_sale(&screen.store, &screen.tx, screen.generation, id, &mut ctx.sale);
            }
            if params.edit {
                spawned += spawn_collections(
                    &screen.store,
                    &screen.tx,
                    screen.generation,
                    &mut ctx.collections,
                );
            }
            if params.sale_id.is_none() {
                ctx.mounted_at = Some(default_now());
            }
        }
        screen.track(spawned);

        Ok(screen)
    }

    fn track(&mut self, spawned: usize) {
        self.pending_total += spawned;
        self.pending_current += spawned;
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn instance_id(&self) -> Uuid {
        self.instance
    }

    pub fn state(&self) -> ScreenState {
        self.state
    }

    pub fn context(&self) -> Option<&ScreenContext> {
        self.context.as_ref()
    }

    /// Fetches and submits of this mount still in flight.
    pub fn pending(&self) -> usize {
        self.pending_current
    }

    /// Form defaults for the current edit mode.
    ///
    /// New: the mount-time date and nothing else. Existing: derived from the
    /// loaded Sale, `None` until it arrives. Detail: `None`.
    pub fn default_values(&self) -> Option<SaleFormValues> {
        let ctx = self.context.as_ref()?;
        match self.state {
            ScreenState::Detail | ScreenState::Unmounted => None,
            _ if ctx.is_new() => ctx.mounted_at.clone().map(new_sale_defaults),
            _ => ctx.sale.value().map(existing_sale_defaults),
        }
    }

    /// What the form should show: the last submitted values if a submit was
    /// made, otherwise the defaults.
    pub fn form_values(&self) -> Option<SaleFormValues> {
        let ctx = self.context.as_ref()?;
        match self.state {
            ScreenState::Detail | ScreenState::Unmounted => None,
            _ => ctx.pending_values.clone().or_else(|| self.default_values()),
        }
    }

    /// Non-binding price suggestion for `values`.
    pub fn suggested_price(&self, values: &SaleFormValues) -> Option<Money> {
        let ctx = self.context.as_ref()?;
        suggest_for_form(values, ctx.collections.devices(), ctx.collections.addons())
    }

    /// Every field error of `values`, including an unresolvable device once
    /// the device collection is loaded.
    pub fn validate(&self, values: &SaleFormValues) -> Result<(), FieldErrors> {
        let mut errors = match validate_form(values) {
            Ok(()) => FieldErrors::new(),
            Err(errors) => errors,
        };

        if let Some(ctx) = self.context.as_ref() {
            if let (Some(devices), Some(selected)) =
                (ctx.collections.devices.value(), values.device.as_ref())
            {
                if errors.get(fields::DEVICE).is_none() && !selected.is_blank() {
                    if let Err(e) = resolve_device(selected, devices) {
                        errors.insert(fields::DEVICE, e.to_string());
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn view(&self) -> ScreenView {
        ScreenView::build(self)
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    /// `Detail` → `EditExisting` for the same Sale.
    ///
    /// Navigates to the edit route and fetches the three collections. The
    /// Sale is fetched again only if it is neither loaded nor loading.
    pub fn begin_edit(&mut self) -> ScreenResult<()> {
        if self.state != ScreenState::Detail {
            return Err(ScreenError::invalid_state(format!(
                "cannot edit from {:?}",
                self.state
            )));
        }
        let Some(ctx) = self.context.as_mut() else {
            return Err(ScreenError::invalid_state("screen is not mounted"));
        };
        let Some(id) = ctx.sale_id else {
            return Err(ScreenError::invalid_state("detail view has no sale id"));
        };

        let mut spawned = spawn_collections(&self.store, &self.tx, self.generation, &mut ctx.collections);
        if !ctx.sale.is_loaded() && !ctx.sale.is_loading() {
            spawned += spawn_sale(&self.store, &self.tx, self.generation, id, &mut ctx.sale);
        }
        self.track(spawned);

        self.state = ScreenState::EditExisting;
        debug!(screen = %self.instance, sale_id = id, "Detail -> EditExisting");
        self.navigator.go_to(&edit_path(id));
        Ok(())
    }

    /// Builds the payload from `values` and issues create or update.
    ///
    /// Refused while the Sale is still loading, since the payload keeps the
    /// loaded record's unknown fields. A local conversion error is returned
    /// and recorded on the screen; the state does not change and nothing is
    /// sent. Otherwise the screen moves
    /// to `Submitting` and the outcome arrives as a completion.
    pub fn submit(&mut self, values: SaleFormValues) -> ScreenResult<()> {
        if !self.state.is_editable() {
            return Err(ScreenError::invalid_state(format!(
                "cannot submit from {:?}",
                self.state
            )));
        }
        let Some(ctx) = self.context.as_mut() else {
            return Err(ScreenError::invalid_state("screen is not mounted"));
        };
        if ctx.sale.is_loading() {
            return Err(ScreenError::invalid_state(
                "sale is still loading; submit once it has arrived",
            ));
        }

        let previous = ctx.sale.value();
        let mut payload = match build_payload(previous, &values, ctx.collections.devices()) {
            Ok(payload) => payload,
            Err(e) => {
                let err = ScreenError::from(e);
                debug!(screen = %self.instance, code = ?err.code, "Submit blocked: {}", err.message);
                ctx.field_errors = FieldErrors::new();
                if let Some(field) = err.field.as_deref() {
                    ctx.field_errors.insert(field, err.message.clone());
                }
                ctx.last_error = Some(err.clone());
                ctx.pending_values = Some(values);
                return Err(err);
            }
        };

        // an existing Sale is updated even if its record failed to load
        payload.id = payload.id.or(ctx.sale_id);
        let target = payload.id;
        ctx.pending_values = Some(values);
        ctx.last_error = None;
        ctx.field_errors = FieldErrors::new();

        match target {
            Some(id) => {
                info!(screen = %self.instance, sale_id = id, "Updating sale");
                spawn_task(
                    self.store.clone(),
                    self.tx.clone(),
                    self.generation,
                    move |s| async move { Completion::Submitted(s.update(id, &payload).await) },
                    |e| Completion::Submitted(Err(e)),
                );
            }
            None => {
                info!(screen = %self.instance, "Creating sale");
                spawn_task(
                    self.store.clone(),
                    self.tx.clone(),
                    self.generation,
                    move |s| async move { Completion::Submitted(s.create(&payload).await) },
                    |e| Completion::Submitted(Err(e)),
                );
            }
        }
        self.track(1);
        self.state = ScreenState::Submitting;
        Ok(())
    }

    /// Discards the screen context. In-flight tasks are not cancelled; their
    /// completions are ignored.
    pub fn unmount(&mut self) {
        if self.state == ScreenState::Unmounted {
            return;
        }
        debug!(
            screen = %self.instance,
            in_flight = self.pending_current,
            "Sale screen unmounted"
        );
        self.state = ScreenState::Unmounted;
        self.generation += 1;
        self.pending_current = 0;
        self.context = None;
    }

    // -------------------------------------------------------------------------
    // Completions
    // -------------------------------------------------------------------------

    /// Waits for the next completion and applies it.
    ///
    /// Returns `None` when no task is outstanding.
    pub async fn next_completion(&mut self) -> Option<Applied> {
        if self.pending_total == 0 {
            return None;
        }
        let tagged = self.rx.recv().await?;
        Some(self.apply(tagged))
    }

    /// Applies completions until every task of this mount has reported.
    pub async fn settle(&mut self) {
        while self.pending_current > 0 {
            if self.next_completion().await.is_none() {
                break;
            }
        }
    }

    /// Applies one completion to the screen state.
    pub fn apply(&mut self, tagged: Tagged) -> Applied {
        self.pending_total = self.pending_total.saturating_sub(1);

        let kind = tagged.completion.kind();
        if tagged.generation != self.generation || self.state == ScreenState::Unmounted {
            debug!(screen = %self.instance, %kind, "Stale completion ignored");
            return Applied::Stale;
        }
        self.pending_current = self.pending_current.saturating_sub(1);

        // the saved record is final; late fetches must not replace it
        if self.state == ScreenState::SubmitSucceeded
            && !matches!(tagged.completion, Completion::Submitted(_))
        {
            debug!(screen = %self.instance, %kind, "Completion after save ignored");
            return Applied::Stale;
        }

        let Some(ctx) = self.context.as_mut() else {
            return Applied::Stale;
        };

        match tagged.completion {
            Completion::SaleLoaded(result) => {
                if let Err(e) = &result {
                    warn!(screen = %self.instance, error = %e, "Sale could not be loaded");
                    ctx.last_error = Some(e.clone().into());
                }
                ctx.sale.resolve(result);
                Applied::Loaded(kind)
            }
            Completion::DevicesLoaded(result) => {
                log_collection(self.instance, kind, &result);
                ctx.collections.devices.resolve(result);
                Applied::Loaded(kind)
            }
            Completion::CustomizationsLoaded(result) => {
                log_collection(self.instance, kind, &result);
                ctx.collections.customizations.resolve(result);
                Applied::Loaded(kind)
            }
            Completion::AddonsLoaded(result) => {
                log_collection(self.instance, kind, &result);
                ctx.collections.addons.resolve(result);
                Applied::Loaded(kind)
            }
            Completion::Submitted(Ok(sale)) => {
                info!(screen = %self.instance, sale_id = ?sale.id, "Sale saved");
                ctx.sale_id = sale.id.or(ctx.sale_id);
                ctx.sale = Loadable::Loaded(sale);
                ctx.pending_values = None;
                ctx.last_error = None;
                self.state = ScreenState::SubmitSucceeded;
                self.navigator.go_to(&list_path());
                Applied::Submitted(self.state)
            }
            Completion::Submitted(Err(e)) => {
                warn!(screen = %self.instance, error = %e, "Sale could not be saved");
                ctx.last_error = Some(e.into());
                self.state = ScreenState::SubmitFailed;
                Applied::Submitted(self.state)
            }
        }
    }
}

impl<S: RemoteStore> Drop for SaleScreen<S> {
    fn drop(&mut self) {
        if self.state != ScreenState::Unmounted && self.pending_current > 0 {
            debug!(screen = %self.instance, in_flight = self.pending_current, "Sale screen dropped while loading");
        }
    }
}

fn log_collection<T>(instance: Uuid, kind: EntityKind, result: &sale_store::StoreResult<Vec<T>>) {
    match result {
        Ok(items) => debug!(screen = %instance, %kind, count = items.len(), "Collection loaded"),
        Err(e) => warn!(screen = %instance, %kind, error = %e, "Collection failed; continuing degraded"),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use sale_core::form::FieldValue;
    use sale_core::temporal::{from_wire, to_wire};
    use sale_core::{Addon, Customization, Device, Reference};
    use sale_store::{Entity, MemoryStore, StoreError, StoreResult};
    use serde_json::json;
    use tokio::sync::Semaphore;

    use crate::error::ErrorCode;
    use crate::loader::LoadStatus;
    use crate::navigation::HistoryNavigator;

    fn existing_sale() -> Sale {
        serde_json::from_value(json!({
            "id": 7,
            "saleDate": "2024-01-01T10:00:00Z",
            "finalPrice": 199.99,
            "device": {"id": 3},
            "customizations": [{"id": 1}, {"id": 2}],
            "addons": []
        }))
        .unwrap()
    }

    fn seeded() -> MemoryStore {
        MemoryStore::new()
            .with([Device::new(3), Device::new(4)])
            .unwrap()
            .with([Customization::new(1), Customization::new(2)])
            .unwrap()
            .with([Addon::new(1)])
            .unwrap()
            .with([existing_sale()])
            .unwrap()
    }

    fn mount<S: RemoteStore>(
        store: &Arc<S>,
        params: MountParams,
    ) -> (SaleScreen<S>, Arc<HistoryNavigator>) {
        let navigator = Arc::new(HistoryNavigator::new());
        let screen = SaleScreen::mount(store.clone(), navigator.clone(), params).unwrap();
        (screen, navigator)
    }

    fn new_sale_values() -> SaleFormValues {
        SaleFormValues {
            sale_date: Some("2024-01-01T10:00".to_string()),
            final_price: Some("250".into()),
            device: Some("3".into()),
            customizations: vec!["1".into()],
            addons: vec![],
            ..Default::default()
        }
    }

    /// Memory store whose requests wait for a permit of their kind.
    struct GatedStore {
        inner: MemoryStore,
        gates: HashMap<EntityKind, Semaphore>,
    }

    impl GatedStore {
        fn new(inner: MemoryStore) -> Self {
            let gates = [
                EntityKind::Sale,
                EntityKind::Device,
                EntityKind::Customization,
                EntityKind::Addon,
            ]
            .into_iter()
            .map(|k| (k, Semaphore::new(0)))
            .collect();
            Self { inner, gates }
        }

        fn release(&self, kind: EntityKind) {
            if let Some(gate) = self.gates.get(&kind) {
                gate.add_permits(1);
            }
        }

        fn release_all(&self) {
            for gate in self.gates.values() {
                gate.add_permits(16);
            }
        }

        async fn pass(&self, kind: EntityKind) {
            if let Some(gate) = self.gates.get(&kind) {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }
        }
    }

    #[async_trait]
    impl RemoteStore for GatedStore {
        async fn fetch_collection<T: Entity>(&self) -> StoreResult<Vec<T>> {
            self.pass(T::KIND).await;
            self.inner.fetch_collection().await
        }

        async fn fetch_by_id<T: Entity>(&self, id: EntityId) -> StoreResult<T> {
            self.pass(T::KIND).await;
            self.inner.fetch_by_id(id).await
        }

        async fn create<P, T>(&self, payload: &P) -> StoreResult<T>
        where
            P: Serialize + Sync,
            T: Entity,
        {
            self.pass(T::KIND).await;
            self.inner.create(payload).await
        }

        async fn update<P, T>(&self, id: EntityId, payload: &P) -> StoreResult<T>
        where
            P: Serialize + Sync,
            T: Entity,
        {
            self.pass(T::KIND).await;
            self.inner.update(id, payload).await
        }
    }

    // -------------------------------------------------------------------------
    // Mount
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_mount_new_seeds_date_only() {
        let store = Arc::new(seeded());
        let (mut screen, _) = mount(&store, MountParams::new_sale());
        assert_eq!(screen.state(), ScreenState::EditNew);
        assert!(screen.view().loading);

        let defaults = screen.default_values().unwrap();
        let mounted = to_wire(defaults.sale_date.as_deref().unwrap()).unwrap();
        let now = to_wire(&default_now()).unwrap();
        assert!((now - mounted).num_seconds().abs() <= 60);
        assert_eq!(defaults.device, None);
        assert!(defaults.customizations.is_empty());
        assert!(defaults.addons.is_empty());

        screen.settle().await;
        let view = screen.view();
        assert!(!view.loading);
        assert!(view.is_new);
        assert_eq!(view.device.options.len(), 2);
        assert_eq!(view.sale_status, LoadStatus::Idle);
        assert_eq!(store.request_count(EntityKind::Sale), 0);

        // idempotent
        assert_eq!(screen.default_values(), Some(defaults));
    }

    #[tokio::test]
    async fn test_mount_existing_derives_defaults() {
        let store = Arc::new(seeded());
        let (mut screen, _) = mount(&store, MountParams::edit(7));
        assert_eq!(screen.state(), ScreenState::EditExisting);
        assert_eq!(screen.default_values(), None);

        screen.settle().await;
        let defaults = screen.default_values().unwrap();
        let wire = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(defaults.sale_date, from_wire(Some(&wire)));
        assert_eq!(defaults.final_price, Some(FieldValue::Decimal(199.99)));
        assert_eq!(defaults.device, Some(FieldValue::from("3")));
        assert_eq!(
            defaults.customizations,
            vec![FieldValue::from("1"), FieldValue::from("2")]
        );
        assert!(defaults.addons.is_empty());
        assert_eq!(screen.default_values(), Some(defaults));

        for kind in [EntityKind::Sale, EntityKind::Device, EntityKind::Customization, EntityKind::Addon] {
            assert_eq!(store.request_count(kind), 1, "{kind}");
        }
    }

    #[tokio::test]
    async fn test_mount_detail_fetches_sale_only() {
        let store = Arc::new(seeded());
        let (mut screen, _) = mount(&store, MountParams::detail(7));
        screen.settle().await;

        assert_eq!(screen.state(), ScreenState::Detail);
        assert_eq!(store.request_count(EntityKind::Device), 0);
        assert_eq!(screen.default_values(), None);

        let detail = screen.view().detail.unwrap();
        assert_eq!(detail.sale.customizations, "1, 2");
        assert_eq!(detail.back_path, "/sale");
        assert_eq!(detail.edit_path.as_deref(), Some("/sale/7/edit"));
    }

    #[tokio::test]
    async fn test_mount_detail_without_id_is_rejected() {
        let store = Arc::new(seeded());
        let navigator = Arc::new(HistoryNavigator::new());
        let err = SaleScreen::mount(store, navigator, MountParams { sale_id: None, edit: false })
            .err()
            .unwrap();
        assert_eq!(err.code, ErrorCode::InvalidState);
    }

    #[tokio::test]
    async fn test_failed_sale_fetch_is_screen_error() {
        let store = Arc::new(seeded());
        let (mut screen, _) = mount(&store, MountParams::edit(99));
        screen.settle().await;

        let view = screen.view();
        assert_eq!(view.state, ScreenState::EditExisting);
        assert_eq!(view.sale_status, LoadStatus::Failed);
        assert_eq!(view.error.unwrap().code, ErrorCode::NotFound);
        assert_eq!(view.device.status, LoadStatus::Loaded);
    }

    // -------------------------------------------------------------------------
    // Degraded Mode
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_failed_collection_degrades_without_blocking() {
        let store = Arc::new(seeded());
        store
            .fail(EntityKind::Addon, StoreError::Network("addons down".to_string()))
            .unwrap();

        let (mut screen, nav) = mount(&store, MountParams::new_sale());
        screen.settle().await;

        let view = screen.view();
        assert_eq!(view.addons.status, LoadStatus::Failed);
        assert!(view.addons.disabled);
        assert!(view.addons.options.is_empty());
        assert!(!view.device.disabled);
        assert_eq!(view.warnings.len(), 1);
        assert!(view.warnings[0].contains("addons down"));
        assert!(view.error.is_none());

        screen.submit(new_sale_values()).unwrap();
        screen.settle().await;
        assert_eq!(screen.state(), ScreenState::SubmitSucceeded);
        assert_eq!(nav.current().as_deref(), Some("/sale"));
    }

    // -------------------------------------------------------------------------
    // Submit
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_submit_new_creates_and_navigates() {
        let store = Arc::new(seeded());
        let (mut screen, nav) = mount(&store, MountParams::new_sale());
        screen.settle().await;

        screen.submit(new_sale_values()).unwrap();
        assert_eq!(screen.state(), ScreenState::Submitting);
        assert!(screen.view().updating);

        screen.settle().await;
        assert_eq!(screen.state(), ScreenState::SubmitSucceeded);
        assert_eq!(nav.history(), vec!["/sale"]);

        let created = store.get::<Sale>(8).unwrap().unwrap();
        assert_eq!(created.device, Some(Reference::new(3)));
        assert_eq!(created.final_price, Some(Money::from_cents(25000)));
        assert_eq!(created.customizations, Some(vec![Reference::new(1)]));

        let ctx = screen.context().unwrap();
        assert_eq!(ctx.sale.value().and_then(|s| s.id), Some(8));
        assert!(screen.submit(new_sale_values()).is_err());
    }

    #[tokio::test]
    async fn test_submit_existing_updates() {
        let store = Arc::new(seeded());
        let (mut screen, _) = mount(&store, MountParams::edit(7));
        screen.settle().await;

        let mut values = screen.default_values().unwrap();
        values.final_price = Some("180.50".into());
        values.addons = vec!["1".into()];
        screen.submit(values).unwrap();
        screen.settle().await;

        assert_eq!(screen.state(), ScreenState::SubmitSucceeded);
        let stored = store.get::<Sale>(7).unwrap().unwrap();
        assert_eq!(stored.final_price, Some(Money::from_cents(18050)));
        assert_eq!(stored.addons, Some(vec![Reference::new(1)]));
        assert_eq!(stored.sale_date, existing_sale().sale_date);
    }

    #[tokio::test]
    async fn test_submit_without_device_never_reaches_submitting() {
        let store = Arc::new(seeded());
        let (mut screen, _) = mount(&store, MountParams::new_sale());
        screen.settle().await;

        let mut values = new_sale_values();
        values.device = None;
        let err = screen.submit(values).unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.field.as_deref(), Some("device"));
        assert_eq!(screen.state(), ScreenState::EditNew);
        assert_eq!(screen.pending(), 0);
        assert_eq!(store.request_count(EntityKind::Sale), 0);
        assert_eq!(screen.view().field_errors.get("device"), Some("device is required"));
    }

    #[tokio::test]
    async fn test_submit_unknown_device_is_unresolved() {
        let store = Arc::new(seeded());
        let (mut screen, _) = mount(&store, MountParams::new_sale());
        screen.settle().await;

        let mut values = new_sale_values();
        values.device = Some("9".into());
        let err = screen.submit(values).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnresolvedReference);
        assert_eq!(screen.state(), ScreenState::EditNew);
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_edits_and_allows_retry() {
        let store = Arc::new(seeded());
        let (mut screen, nav) = mount(&store, MountParams::new_sale());
        screen.settle().await;

        store
            .fail(EntityKind::Sale, StoreError::Network("connection reset".to_string()))
            .unwrap();
        let mut values = new_sale_values();
        values.final_price = Some("99.90".into());
        screen.submit(values.clone()).unwrap();
        screen.settle().await;

        assert_eq!(screen.state(), ScreenState::SubmitFailed);
        let view = screen.view();
        let error = view.error.unwrap();
        assert_eq!(error.code, ErrorCode::Transport);
        assert_eq!(error.message, "Network error: connection reset");
        assert_eq!(view.values, Some(values.clone()));
        assert!(nav.history().is_empty());

        store.recover(EntityKind::Sale).unwrap();
        screen.submit(values).unwrap();
        screen.settle().await;
        assert_eq!(screen.state(), ScreenState::SubmitSucceeded);
    }

    #[tokio::test]
    async fn test_submit_rejected_outside_edit_states() {
        let store = Arc::new(seeded());
        let (mut screen, _) = mount(&store, MountParams::detail(7));
        screen.settle().await;

        let err = screen.submit(new_sale_values()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);

        let (mut screen, _) = mount(&store, MountParams::new_sale());
        screen.settle().await;
        screen.submit(new_sale_values()).unwrap();
        let err = screen.submit(new_sale_values()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);
    }

    // -------------------------------------------------------------------------
    // Detail -> Edit
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_begin_edit_keeps_loaded_sale() {
        let store = Arc::new(seeded());
        let (mut screen, nav) = mount(&store, MountParams::detail(7));
        screen.settle().await;

        screen.begin_edit().unwrap();
        assert_eq!(screen.state(), ScreenState::EditExisting);
        assert_eq!(nav.history(), vec!["/sale/7/edit"]);
        assert!(screen.default_values().is_some());

        screen.settle().await;
        assert_eq!(store.request_count(EntityKind::Sale), 1);
        assert_eq!(store.request_count(EntityKind::Device), 1);
        assert!(screen.view().detail.is_none());

        assert!(screen.begin_edit().is_err());
    }

    // -------------------------------------------------------------------------
    // Concurrency
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_completions_apply_in_any_order() {
        let store = Arc::new(GatedStore::new(seeded()));
        let (mut screen, _) = mount(&store, MountParams::edit(7));
        assert_eq!(screen.pending(), 4);

        store.release(EntityKind::Addon);
        assert_eq!(
            screen.next_completion().await,
            Some(Applied::Loaded(EntityKind::Addon))
        );
        let view = screen.view();
        assert_eq!(view.addons.status, LoadStatus::Loaded);
        assert_eq!(view.device.status, LoadStatus::Loading);
        assert!(view.loading);
        assert_eq!(view.default_values, None);

        store.release(EntityKind::Sale);
        assert_eq!(
            screen.next_completion().await,
            Some(Applied::Loaded(EntityKind::Sale))
        );
        assert!(screen.default_values().is_some());
        assert!(screen.view().device.disabled);

        store.release(EntityKind::Customization);
        store.release(EntityKind::Device);
        screen.settle().await;
        assert!(!screen.view().loading);
        assert_eq!(screen.next_completion().await, None);
    }

    #[tokio::test]
    async fn test_late_completion_after_unmount_is_noop() {
        let store = Arc::new(GatedStore::new(seeded()));
        let (mut screen, nav) = mount(&store, MountParams::edit(7));
        screen.unmount();
        assert_eq!(screen.pending(), 0);

        let before = screen.view();
        store.release_all();
        for _ in 0..4 {
            assert_eq!(screen.next_completion().await, Some(Applied::Stale));
        }
        assert_eq!(screen.next_completion().await, None);

        assert_eq!(screen.view(), before);
        assert_eq!(screen.state(), ScreenState::Unmounted);
        assert!(screen.context().is_none());
        assert!(nav.history().is_empty());
    }

    #[tokio::test]
    async fn test_late_submit_after_unmount_does_not_navigate() {
        let store = Arc::new(GatedStore::new(seeded()));
        let (mut screen, nav) = mount(&store, MountParams::new_sale());
        for kind in [EntityKind::Device, EntityKind::Customization, EntityKind::Addon] {
            store.release(kind);
        }
        screen.settle().await;

        screen.submit(new_sale_values()).unwrap();
        screen.unmount();
        store.release(EntityKind::Sale);
        assert_eq!(screen.next_completion().await, Some(Applied::Stale));
        assert!(nav.history().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_screen_discards_completions() {
        let store = Arc::new(GatedStore::new(seeded()));
        let (screen, _) = mount(&store, MountParams::edit(7));
        drop(screen);

        store.release_all();
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        assert_eq!(store.inner.request_count(EntityKind::Device), 1);
    }

    #[tokio::test]
    async fn test_submit_waits_for_sale_to_load() {
        let store = Arc::new(GatedStore::new(seeded()));
        let (mut screen, _) = mount(&store, MountParams::edit(7));
        for kind in [EntityKind::Device, EntityKind::Customization, EntityKind::Addon] {
            store.release(kind);
        }
        for _ in 0..3 {
            assert!(matches!(screen.next_completion().await, Some(Applied::Loaded(_))));
        }

        let mut values = new_sale_values();
        values.id = Some(FieldValue::Integer(7));
        let err = screen.submit(values.clone()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);
        assert_eq!(screen.state(), ScreenState::EditExisting);
        assert_eq!(screen.pending(), 1);

        store.release(EntityKind::Sale);
        screen.settle().await;
        screen.submit(values).unwrap();
        store.release(EntityKind::Sale);
        screen.settle().await;

        assert_eq!(screen.state(), ScreenState::SubmitSucceeded);
        let saved = screen.context().and_then(|c| c.sale.value()).unwrap();
        assert_eq!(saved.final_price, Some(Money::from_cents(25000)));
        let stored = store.inner.get::<Sale>(7).unwrap().unwrap();
        assert_eq!(stored.final_price, Some(Money::from_cents(25000)));
    }

    #[tokio::test]
    async fn test_fetch_finishing_after_save_is_ignored() {
        let store = Arc::new(GatedStore::new(seeded()));
        let (mut screen, nav) = mount(&store, MountParams::new_sale());
        store.release(EntityKind::Device);
        assert_eq!(
            screen.next_completion().await,
            Some(Applied::Loaded(EntityKind::Device))
        );

        screen.submit(new_sale_values()).unwrap();
        store.release(EntityKind::Sale);
        assert_eq!(
            screen.next_completion().await,
            Some(Applied::Submitted(ScreenState::SubmitSucceeded))
        );
        assert_eq!(nav.history(), vec!["/sale"]);

        store.release(EntityKind::Customization);
        store.release(EntityKind::Addon);
        for _ in 0..2 {
            assert_eq!(screen.next_completion().await, Some(Applied::Stale));
        }
        assert_eq!(screen.next_completion().await, None);

        let ctx = screen.context().unwrap();
        assert_eq!(ctx.sale.value().and_then(|s| s.id), Some(8));
        assert!(ctx.collections.customizations.is_loading());
        assert_eq!(screen.state(), ScreenState::SubmitSucceeded);
    }

    /// Store whose Device fetch panics.
    struct PanickingStore(MemoryStore);

    #[async_trait]
    impl RemoteStore for PanickingStore {
        async fn fetch_collection<T: Entity>(&self) -> StoreResult<Vec<T>> {
            if T::KIND == EntityKind::Device {
                panic!("device backend crashed");
            }
            self.0.fetch_collection().await
        }

        async fn fetch_by_id<T: Entity>(&self, id: EntityId) -> StoreResult<T> {
            self.0.fetch_by_id(id).await
        }

        async fn create<P, T>(&self, payload: &P) -> StoreResult<T>
        where
            P: Serialize + Sync,
            T: Entity,
        {
            self.0.create(payload).await
        }

        async fn update<P, T>(&self, id: EntityId, payload: &P) -> StoreResult<T>
        where
            P: Serialize + Sync,
            T: Entity,
        {
            self.0.update(id, payload).await
        }
    }

    #[tokio::test]
    async fn test_panicking_fetch_still_settles() {
        let store = Arc::new(PanickingStore(seeded()));
        let (mut screen, _) = mount(&store, MountParams::new_sale());

        tokio::time::timeout(std::time::Duration::from_secs(5), screen.settle())
            .await
            .unwrap();

        let view = screen.view();
        assert!(!view.loading);
        assert_eq!(view.device.status, LoadStatus::Failed);
        assert!(view.device.disabled);
        assert_eq!(view.customizations.status, LoadStatus::Loaded);
        assert!(view.warnings[0].starts_with("Device list could not be loaded"));
    }

    // -------------------------------------------------------------------------
    // Validation & Pricing
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_validate_reports_unresolved_device_once_loaded() {
        let store = Arc::new(seeded());
        let (mut screen, _) = mount(&store, MountParams::new_sale());

        let mut values = new_sale_values();
        values.device = Some("9".into());
        assert!(screen.validate(&values).is_ok());

        screen.settle().await;
        let errors = screen.validate(&values).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.get("device").unwrap().contains("'9'"));

        values.final_price = Some("-1".into());
        assert_eq!(screen.validate(&values).unwrap_err().len(), 2);
    }

    #[tokio::test]
    async fn test_suggested_price_uses_loaded_catalogue() {
        let device = Device {
            base_price: Some(Money::from_cents(50000)),
            ..Device::new(3)
        };
        let addon = Addon {
            price: Some(Money::from_cents(2500)),
            free_from_price: Some(Money::from_cents(-1)),
            ..Addon::new(1)
        };
        let store = Arc::new(MemoryStore::new().with([device]).unwrap().with([addon]).unwrap());
        let (mut screen, _) = mount(&store, MountParams::new_sale());
        screen.settle().await;

        let mut values = new_sale_values();
        values.addons = vec!["1".into()];
        assert_eq!(screen.suggested_price(&values), Some(Money::from_cents(52500)));
    }
}
