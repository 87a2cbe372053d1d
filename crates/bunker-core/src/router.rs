// ── Change-event routing ──
//
// Maps each incoming change event to the cache for its resource kind.
// The only state is the kind -> cache table, built once at startup.

use std::collections::HashMap;
use std::sync::Arc;

use bunker_api::{ChangeEvent, Resource, ResourceKind};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::store::{Invalidation, RemoteResource, ResourceCache};

/// Anything that can be told its data is stale.
pub trait Invalidate: Send + Sync {
    fn kind(&self) -> ResourceKind;

    fn invalidate(&self, target: Invalidation);
}

impl<R: Resource, S: RemoteResource<R>> Invalidate for ResourceCache<R, S> {
    fn kind(&self) -> ResourceKind {
        R::KIND
    }

    fn invalidate(&self, target: Invalidation) {
        ResourceCache::invalidate(self, target);
    }
}

#[derive(Default)]
pub struct SubscriptionRouter {
    caches: HashMap<ResourceKind, Arc<dyn Invalidate>>,
}

impl SubscriptionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the cache for its kind, replacing any earlier registration.
    pub fn register(&mut self, cache: impl Invalidate + 'static) -> &mut Self {
        let kind = cache.kind();
        if self.caches.insert(kind, Arc::new(cache)).is_some() {
            debug!(%kind, "replaced cache registration");
        }
        self
    }

    pub fn kinds(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.caches.keys().copied()
    }

    /// Invalidate the cache for `event`'s kind.
    ///
    /// Returns `false` when no cache is registered for the event's
    /// resource type; such events are logged and dropped.
    pub fn route(&self, event: &ChangeEvent) -> bool {
        let Some(kind) = event.resource_kind() else {
            warn!(resource_type = %event.resource_type, "ignoring event for unknown resource type");
            return false;
        };
        let Some(cache) = self.caches.get(&kind) else {
            warn!(%kind, "ignoring event for unregistered resource kind");
            return false;
        };

        let target = match event.resource_id {
            Some(id) => Invalidation::Record(id),
            None => Invalidation::All,
        };
        debug!(%kind, ?target, change = %event.kind, "routing change event");
        cache.invalidate(target);
        true
    }

    /// Fully invalidate every registered cache.
    pub fn invalidate_all(&self) {
        for cache in self.caches.values() {
            cache.invalidate(Invalidation::All);
        }
    }

    /// Route every event from `events` until cancelled or the sender closes.
    ///
    /// A lagged receiver has skipped events, so everything is invalidated.
    pub async fn run(
        &self,
        mut events: broadcast::Receiver<Arc<ChangeEvent>>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                received = events.recv() => match received {
                    Ok(event) => {
                        self.route(&event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "router lagged behind change feed, invalidating all caches");
                        self.invalidate_all();
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
        debug!("subscription router stopped");
    }
}
