//! # sale-screen: Sale Edit/View State Machine
//!
//! Loads a Sale and its dependent collections, presents detail or edit
//! mode, converts form values to the wire payload and commits it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Presentation ──mount/submit/begin_edit──►  SaleScreen                 │
//! │        ▲                                       │   │                    │
//! │        │ ScreenView                            │   │ go_to(path)        │
//! │        └───────────────────────────────────────┘   ▼                    │
//! │                                               Navigator                 │
//! │                                                                         │
//! │   SaleScreen ──spawn──► fetch tasks ──► RemoteStore (sale-store)        │
//! │        ▲                     │                                          │
//! │        └──── completions ────┘                                          │
//! │                                                                         │
//! │   Conversions (mapper, codec, payload) come from sale-core.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Typical Use
//! ```rust,no_run
//! use std::sync::Arc;
//! use sale_screen::{HistoryNavigator, MountParams, SaleScreen};
//! use sale_store::MemoryStore;
//!
//! # async fn run() -> Result<(), sale_screen::ScreenError> {
//! let store = Arc::new(MemoryStore::new());
//! let navigator = Arc::new(HistoryNavigator::new());
//! let mut screen = SaleScreen::mount(store, navigator, MountParams::new_sale())?;
//! screen.settle().await;
//!
//! let mut values = screen.default_values().unwrap_or_default();
//! values.final_price = Some("250".into());
//! values.device = Some("3".into());
//! screen.submit(values)?;
//! screen.settle().await;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;
pub mod machine;
pub mod navigation;
pub mod view;

pub use error::{ErrorCode, ScreenError, ScreenResult};
pub use loader::{CollectionSet, Completion, LoadStatus, Loadable};
pub use machine::{Applied, MountParams, SaleScreen, ScreenContext, ScreenState};
pub use navigation::{HistoryNavigator, Navigator};
pub use view::{DetailView, ScreenView, SelectField, SelectOption};
