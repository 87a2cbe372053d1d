//! Push-synchronized data layer between `bunker-api` and UI consumers.
//!
//! - **[`Inventory`]** owns the REST client, the notification transport and
//!   one [`ResourceCache`] per resource kind. [`start()`](Inventory::start)
//!   opens the change feed; [`shutdown()`](Inventory::shutdown) closes it.
//!
//! - **[`ResourceCache<R>`]** holds the client-side copy of one collection.
//!   Loads are lazy and coalesced, point refreshes are ordered against full
//!   loads, and every mutation is published to [`RecordStream`] subscribers.
//!
//! - **[`SubscriptionRouter`]** maps each change event to the cache for its
//!   kind: a record id triggers a point refresh, no id a full reload.

pub mod config;
pub mod error;
pub mod inventory;
pub mod router;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{InventoryConfig, TlsVerification};
pub use error::CoreError;
pub use inventory::{Cached, Caches, Inventory};
pub use router::{Invalidate, SubscriptionRouter};
pub use store::{CacheState, CacheStatus, Invalidation, RemoteResource, ResourceCache, Snapshot};
pub use stream::{RecordStream, RecordWatchStream};

// Model types re-exported so consumers need only this crate.
pub use bunker_api::models;
pub use bunker_api::{
    ChangeEvent, ChangeKind, ConnectionState, ConnectionStatus, Perishable, RecordId, Resource,
    ResourceKind, Stored,
};
