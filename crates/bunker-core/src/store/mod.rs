// ── Client-side record store ──
//
// One `ResourceCache` per resource kind, each backed by an ordered
// `RecordCollection` whose snapshots feed `RecordStream` subscribers.

mod cache;
mod collection;

pub use cache::{CacheState, CacheStatus, Invalidation, RemoteResource, ResourceCache};
pub use collection::Snapshot;
