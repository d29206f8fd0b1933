//! # sale-store: Remote Store Access
//!
//! The Sale screens consume the remote store through one narrow seam,
//! [`RemoteStore`]: fetch a collection, fetch by id, create, update. This
//! crate defines that seam and ships two implementations.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   sale-screen fetch task                                                │
//! │        │  store.fetch_collection::<Device>()                            │
//! │        ▼                                                                │
//! │   ┌──────────────────┐     GET /api/devices      ┌──────────────────┐  │
//! │   │    HttpStore     │ ─────────────────────────►│   remote store   │  │
//! │   │  (reqwest)       │ ◄───────────────────────── │   (REST)         │  │
//! │   └──────────────────┘     200 [{...}, ...]       └──────────────────┘  │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   StoreResult<Vec<Device>>  (errors surfaced verbatim as StoreError)    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Timeouts and authentication belong to the transport and are configured
//! on [`HttpStoreConfig`]; nothing above this crate retries.

pub mod error;
pub mod http;
pub mod memory;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use http::{HttpStore, HttpStoreConfig};
pub use memory::MemoryStore;
pub use store::{Entity, RemoteStore};
