// bunker-api: Async Rust client for the prepper-bunker inventory backend (REST + change feed)

pub mod client;
pub mod error;
pub mod event;
pub mod kind;
pub mod models;
mod queries;
pub mod transport;
pub mod websocket;

pub use client::{InventoryClient, ResourceApi};
pub use error::Error;
pub use event::{ChangeEvent, ChangeKind, Timestamp};
pub use kind::{ResourceKind, UnknownKind};
pub use models::{Perishable, RecordId, Resource, Stored};
pub use transport::{TlsMode, TransportConfig};
pub use websocket::{ConnectionState, ConnectionStatus, NotificationTransport, ReconnectConfig};
