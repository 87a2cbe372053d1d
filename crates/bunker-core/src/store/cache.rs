// ── Per-kind resource cache ──
//
// In-memory mirror of one server collection plus its loading status.
// Server reads (full loads and single-record refreshes) draw tickets from
// one monotonically increasing sequence; a result is applied only if no
// newer read has already been applied for the same records.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bunker_api::{RecordId, Resource, ResourceApi, ResourceKind};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use strum::Display;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::collection::{RecordCollection, Snapshot};
use crate::error::CoreError;
use crate::stream::RecordStream;

// ── Remote source ────────────────────────────────────────────────────

/// Where a cache reads from and writes to.
///
/// Implemented for [`ResourceApi`]; tests substitute in-memory fakes.
pub trait RemoteResource<R: Resource>: Send + Sync + 'static {
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<R>, CoreError>> + Send;

    fn fetch_one(&self, id: RecordId) -> impl Future<Output = Result<R, CoreError>> + Send;

    fn create(&self, input: &R::Create) -> impl Future<Output = Result<R, CoreError>> + Send;

    fn update(
        &self,
        id: RecordId,
        input: &R::Create,
    ) -> impl Future<Output = Result<R, CoreError>> + Send;

    fn delete(&self, id: RecordId) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Whether `fetch_one` is available. Without it every invalidation is a
    /// full reload.
    fn supports_point_reads(&self) -> bool {
        true
    }
}

impl<R: Resource> RemoteResource<R> for ResourceApi<R> {
    async fn fetch_all(&self) -> Result<Vec<R>, CoreError> {
        Ok(self.list().await?)
    }

    async fn fetch_one(&self, id: RecordId) -> Result<R, CoreError> {
        Ok(self.get(id).await?)
    }

    async fn create(&self, input: &R::Create) -> Result<R, CoreError> {
        Ok(ResourceApi::create(self, input).await?)
    }

    async fn update(&self, id: RecordId, input: &R::Create) -> Result<R, CoreError> {
        Ok(ResourceApi::update(self, id, input).await?)
    }

    async fn delete(&self, id: RecordId) -> Result<(), CoreError> {
        Ok(ResourceApi::delete(self, id).await?)
    }
}

// ── Status ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[strum(serialize_all = "lowercase")]
pub enum CacheStatus {
    /// Nothing has asked for data yet.
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

/// Observable status of one cache.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheState {
    pub status: CacheStatus,
    /// Set when the latest full load failed; cleared by the next success.
    pub last_error: Option<CoreError>,
}

/// What a change notification asks the cache to refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    All,
    Record(RecordId),
}

// ── ResourceCache ────────────────────────────────────────────────────

type LoadFuture = Shared<BoxFuture<'static, Result<(), CoreError>>>;

/// Client-held mirror of one resource kind.
///
/// Cheaply cloneable; clones share the same records. Methods that start
/// background work must be called inside a tokio runtime.
pub struct ResourceCache<R: Resource, S = ResourceApi<R>> {
    inner: Arc<CacheInner<R, S>>,
}

impl<R: Resource, S> Clone for ResourceCache<R, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct CacheInner<R: Resource, S> {
    source: S,
    records: RecordCollection<R>,
    state: watch::Sender<CacheState>,
    load: Mutex<LoadState>,
}

/// Read bookkeeping. Never held across an `.await`.
#[derive(Default)]
struct LoadState {
    /// Last ticket handed out, shared by full loads and point refreshes.
    sequence: u64,
    current: Option<InFlight>,
    /// Ticket of the most recently issued full load.
    latest_load: u64,
    /// Ticket of the most recently applied full load.
    applied: u64,
    /// Ticket of the last applied point refresh, per record.
    point_stamps: HashMap<RecordId, u64>,
    /// A full invalidation arrived while `current` was in flight.
    rerun: bool,
    /// Outcome of the most recently applied full load.
    last: Option<Result<(), CoreError>>,
}

struct InFlight {
    generation: u64,
    done: LoadFuture,
}

enum LoadOutcome {
    Settled(Result<(), CoreError>),
    Superseded(LoadFuture),
}

impl<R: Resource, S: RemoteResource<R>> ResourceCache<R, S> {
    pub fn new(source: S) -> Self {
        let (state, _) = watch::channel(CacheState::default());
        Self {
            inner: Arc::new(CacheInner {
                source,
                records: RecordCollection::new(),
                state,
                load: Mutex::new(LoadState::default()),
            }),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        R::KIND
    }

    pub fn source(&self) -> &S {
        &self.inner.source
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Fetch the full collection, or join the load already in flight.
    pub async fn load(&self) -> Result<(), CoreError> {
        let done = self.inner.load_future(false);
        done.await
    }

    /// Fetch the full collection even if a load is in flight. The older
    /// load's result is discarded when it arrives.
    pub async fn reload(&self) -> Result<(), CoreError> {
        let done = self.inner.load_future(true);
        done.await
    }

    /// Mark data as stale after a change notification.
    ///
    /// No-op while the cache is idle and empty; the first load fetches
    /// everything. An idle cache holding records from local writes is
    /// refreshed like any other.
    pub fn invalidate(&self, target: Invalidation) {
        if self.inner.state.borrow().status == CacheStatus::Idle && self.inner.records.is_empty() {
            debug!(kind = %R::KIND, ?target, "cache idle, ignoring invalidation");
            return;
        }
        match target {
            Invalidation::Record(id) if self.inner.source.supports_point_reads() => {
                self.inner.refresh_record(id);
            }
            Invalidation::Record(_) | Invalidation::All => {
                let mut load = self.inner.lock_load();
                self.inner.invalidate_all(&mut load);
            }
        }
    }

    // ── Observation ──────────────────────────────────────────────────

    /// Subscribe to record changes. Starts the first load if the cache is idle.
    pub fn subscribe(&self) -> RecordStream<R> {
        let stream = RecordStream::new(self.inner.records.subscribe());
        self.inner.ensure_started();
        stream
    }

    pub fn status(&self) -> watch::Receiver<CacheState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> CacheState {
        self.inner.state.borrow().clone()
    }

    pub fn snapshot(&self) -> Snapshot<R> {
        self.inner.records.snapshot()
    }

    pub fn get(&self, id: RecordId) -> Option<Arc<R>> {
        self.inner.records.get(id)
    }

    // ── Optimistic mutations ─────────────────────────────────────────

    /// Insert a record the server just created. Returns `false` if an
    /// identical record was already present.
    pub fn apply_local_create(&self, record: R) -> bool {
        self.inner.records.upsert(record)
    }

    /// Replace (or insert) a record the server just updated.
    pub fn apply_local_update(&self, record: R) -> bool {
        self.inner.records.upsert(record)
    }

    /// Remove a record the server just deleted. Absent ids are a no-op.
    pub fn apply_local_delete(&self, id: RecordId) -> bool {
        self.inner.records.remove(id).is_some()
    }

    // ── Remote writes ────────────────────────────────────────────────

    pub async fn create(&self, input: &R::Create) -> Result<R, CoreError> {
        let record = self.inner.source.create(input).await?;
        self.apply_local_create(record.clone());
        Ok(record)
    }

    pub async fn update(&self, id: RecordId, input: &R::Create) -> Result<R, CoreError> {
        let record = self.inner.source.update(id, input).await?;
        self.apply_local_update(record.clone());
        Ok(record)
    }

    pub async fn delete(&self, id: RecordId) -> Result<(), CoreError> {
        self.inner.source.delete(id).await?;
        self.apply_local_delete(id);
        Ok(())
    }
}

impl<R: Resource, S: RemoteResource<R>> CacheInner<R, S> {
    fn lock_load(&self) -> MutexGuard<'_, LoadState> {
        self.load.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: CacheState) {
        self.state.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
    }

    fn mark_loading(&self) {
        self.state.send_if_modified(|state| {
            if state.status == CacheStatus::Loading {
                false
            } else {
                state.status = CacheStatus::Loading;
                true
            }
        });
    }

    fn load_future(self: &Arc<Self>, force: bool) -> LoadFuture {
        let mut load = self.lock_load();
        if !force {
            if let Some(in_flight) = &load.current {
                debug!(kind = %R::KIND, generation = in_flight.generation, "joining in-flight load");
                return in_flight.done.clone();
            }
        }
        self.spawn_load(&mut load)
    }

    fn ensure_started(self: &Arc<Self>) {
        let mut load = self.lock_load();
        if load.current.is_none() && self.state.borrow().status == CacheStatus::Idle {
            drop(self.spawn_load(&mut load));
        }
    }

    /// Issue a new full load. Caller holds the load lock.
    fn spawn_load(self: &Arc<Self>, load: &mut LoadState) -> LoadFuture {
        load.sequence += 1;
        let generation = load.sequence;
        load.latest_load = generation;
        load.rerun = false;
        self.mark_loading();
        debug!(kind = %R::KIND, generation, "full load issued");

        let task = tokio::spawn(Arc::clone(self).run_load(generation));
        let done = async move {
            task.await
                .unwrap_or_else(|e| Err(CoreError::Internal(format!("load task failed: {e}"))))
        }
        .boxed()
        .shared();

        load.current = Some(InFlight {
            generation,
            done: done.clone(),
        });
        done
    }

    async fn run_load(self: Arc<Self>, generation: u64) -> Result<(), CoreError> {
        let result = self.source.fetch_all().await;
        match self.finish_load(generation, result) {
            LoadOutcome::Settled(result) => result,
            // Report whatever the superseding load reports.
            LoadOutcome::Superseded(newer) => newer.await,
        }
    }

    fn finish_load(self: &Arc<Self>, generation: u64, result: Result<Vec<R>, CoreError>) -> LoadOutcome {
        let mut load = self.lock_load();
        if load.current.as_ref().is_some_and(|c| c.generation == generation) {
            load.current = None;
        }

        if generation != load.latest_load {
            debug!(
                kind = %R::KIND,
                generation,
                latest = load.latest_load,
                "discarding superseded load"
            );
            return match &load.current {
                Some(newer) => LoadOutcome::Superseded(newer.done.clone()),
                // The newest load already landed; its outcome stands.
                None => LoadOutcome::Settled(load.last.clone().unwrap_or(Ok(()))),
            };
        }

        let outcome = match result {
            Ok(records) => {
                let pinned: HashSet<RecordId> = load
                    .point_stamps
                    .iter()
                    .filter(|(_, stamp)| **stamp > generation)
                    .map(|(id, _)| *id)
                    .collect();
                let count = records.len();
                let changed = self.records.replace_all(records, &pinned);
                load.point_stamps.retain(|_, stamp| *stamp > generation);
                load.applied = generation;
                self.set_state(CacheState {
                    status: CacheStatus::Ready,
                    last_error: None,
                });
                debug!(
                    kind = %R::KIND,
                    generation,
                    count,
                    pinned = pinned.len(),
                    changed,
                    "full load applied"
                );
                Ok(())
            }
            Err(e) => {
                warn!(kind = %R::KIND, generation, error = %e, "full load failed");
                self.set_state(CacheState {
                    status: CacheStatus::Error,
                    last_error: Some(e.clone()),
                });
                Err(e)
            }
        };

        load.last = Some(outcome.clone());
        if load.rerun {
            debug!(kind = %R::KIND, "changes arrived mid-load, loading again");
            drop(self.spawn_load(&mut load));
        }

        LoadOutcome::Settled(outcome)
    }

    /// Full reload now, or exactly one trailing reload if a load is in flight.
    fn invalidate_all(self: &Arc<Self>, load: &mut LoadState) {
        if load.current.is_some() {
            load.rerun = true;
        } else {
            drop(self.spawn_load(load));
        }
    }

    fn refresh_record(self: &Arc<Self>, id: RecordId) {
        let ticket = {
            let mut load = self.lock_load();
            load.sequence += 1;
            load.sequence
        };
        debug!(kind = %R::KIND, id, ticket, "record refresh issued");

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let result = inner.source.fetch_one(id).await;
            inner.finish_refresh(id, ticket, result);
        });
    }

    fn finish_refresh(self: &Arc<Self>, id: RecordId, ticket: u64, result: Result<R, CoreError>) {
        let mut load = self.lock_load();
        if ticket < load.applied || load.point_stamps.get(&id).is_some_and(|s| *s > ticket) {
            debug!(kind = %R::KIND, id, ticket, "discarding stale record refresh");
            return;
        }

        match result {
            Ok(record) => {
                load.point_stamps.insert(id, ticket);
                let changed = self.records.upsert(record);
                debug!(kind = %R::KIND, id, changed, "record refreshed");
            }
            Err(e) if e.is_not_found() => {
                load.point_stamps.insert(id, ticket);
                let removed = self.records.remove(id).is_some();
                debug!(kind = %R::KIND, id, removed, "record gone on server");
            }
            Err(e) => {
                warn!(kind = %R::KIND, id, error = %e, "record refresh failed, reloading collection");
                self.invalidate_all(&mut load);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bunker_api::models::{StorageLocation, StorageLocationCreate};
    use pretty_assertions::assert_eq;
    use tokio::sync::oneshot;

    use super::*;

    type Reply<T> = oneshot::Sender<Result<T, CoreError>>;

    /// In-memory server. Calls resolve immediately from `server` unless a
    /// reply was scripted, in which case they wait for the test to send it.
    #[derive(Default)]
    struct FakeSource {
        server: Mutex<Vec<StorageLocation>>,
        scripted_lists: Mutex<VecDeque<oneshot::Receiver<Result<Vec<StorageLocation>, CoreError>>>>,
        scripted_gets: Mutex<VecDeque<oneshot::Receiver<Result<StorageLocation, CoreError>>>>,
        list_calls: AtomicUsize,
        get_calls: AtomicUsize,
        fail_writes: bool,
    }

    impl FakeSource {
        fn with(records: Vec<StorageLocation>) -> Self {
            Self {
                server: Mutex::new(records),
                ..Self::default()
            }
        }

        fn script_list(&self) -> Reply<Vec<StorageLocation>> {
            let (tx, rx) = oneshot::channel();
            self.scripted_lists.lock().unwrap().push_back(rx);
            tx
        }

        fn script_get(&self) -> Reply<StorageLocation> {
            let (tx, rx) = oneshot::channel();
            self.scripted_gets.lock().unwrap().push_back(rx);
            tx
        }

        fn lists(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst)
        }

        fn gets(&self) -> usize {
            self.get_calls.load(Ordering::SeqCst)
        }
    }

    impl RemoteResource<StorageLocation> for FakeSource {
        async fn fetch_all(&self) -> Result<Vec<StorageLocation>, CoreError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            let scripted = self.scripted_lists.lock().unwrap().pop_front();
            match scripted {
                Some(rx) => rx.await.unwrap(),
                None => Ok(self.server.lock().unwrap().clone()),
            }
        }

        async fn fetch_one(&self, id: RecordId) -> Result<StorageLocation, CoreError> {
            self.get_calls.fetch_add(1, Ordering::SeqCst);
            let scripted = self.scripted_gets.lock().unwrap().pop_front();
            match scripted {
                Some(rx) => rx.await.unwrap(),
                None => self
                    .server
                    .lock()
                    .unwrap()
                    .iter()
                    .find(|l| l.id == id)
                    .cloned()
                    .ok_or_else(|| CoreError::not_found(ResourceKind::StorageLocation, id)),
            }
        }

        async fn create(&self, input: &StorageLocationCreate) -> Result<StorageLocation, CoreError> {
            if self.fail_writes {
                return Err(CoreError::Rejected {
                    status: 400,
                    message: "name must not be blank".into(),
                });
            }
            let mut server = self.server.lock().unwrap();
            let id = server.iter().map(|l| l.id).max().unwrap_or(0) + 1;
            let record = StorageLocation {
                id,
                name: input.name.clone(),
                description: input.description.clone(),
            };
            server.push(record.clone());
            Ok(record)
        }

        async fn update(
            &self,
            id: RecordId,
            input: &StorageLocationCreate,
        ) -> Result<StorageLocation, CoreError> {
            let record = StorageLocation {
                id,
                name: input.name.clone(),
                description: input.description.clone(),
            };
            let mut server = self.server.lock().unwrap();
            server.retain(|l| l.id != id);
            server.push(record.clone());
            Ok(record)
        }

        async fn delete(&self, id: RecordId) -> Result<(), CoreError> {
            self.server.lock().unwrap().retain(|l| l.id != id);
            Ok(())
        }
    }

    /// A source that only lists; every invalidation becomes a full load.
    struct ListOnly(FakeSource);

    impl RemoteResource<StorageLocation> for ListOnly {
        fn fetch_all(&self) -> impl Future<Output = Result<Vec<StorageLocation>, CoreError>> + Send {
            self.0.fetch_all()
        }
        fn fetch_one(&self, id: RecordId) -> impl Future<Output = Result<StorageLocation, CoreError>> + Send {
            self.0.fetch_one(id)
        }
        fn create(&self, input: &StorageLocationCreate) -> impl Future<Output = Result<StorageLocation, CoreError>> + Send {
            self.0.create(input)
        }
        fn update(
            &self,
            id: RecordId,
            input: &StorageLocationCreate,
        ) -> impl Future<Output = Result<StorageLocation, CoreError>> + Send {
            self.0.update(id, input)
        }
        fn delete(&self, id: RecordId) -> impl Future<Output = Result<(), CoreError>> + Send {
            self.0.delete(id)
        }
        fn supports_point_reads(&self) -> bool {
            false
        }
    }

    fn loc(id: RecordId, name: &str) -> StorageLocation {
        StorageLocation {
            id,
            name: name.into(),
            description: None,
        }
    }

    fn names<S: RemoteResource<StorageLocation>>(
        cache: &ResourceCache<StorageLocation, S>,
    ) -> Vec<String> {
        cache.snapshot().iter().map(|l| l.name.clone()).collect()
    }

    /// Let spawned tasks on the current-thread runtime run to quiescence.
    async fn settle() {
        for _ in 0..50 {
            tokio::task::yield_now().await;
        }
    }

    async fn ready_cache(records: Vec<StorageLocation>) -> ResourceCache<StorageLocation, FakeSource> {
        let cache = ResourceCache::new(FakeSource::with(records));
        cache.load().await.unwrap();
        cache
    }

    // ── Loading ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn load_moves_idle_to_ready() {
        let cache = ResourceCache::new(FakeSource::with(vec![loc(1, "Cellar")]));
        assert_eq!(cache.state().status, CacheStatus::Idle);

        cache.load().await.unwrap();

        assert_eq!(cache.state(), CacheState {
            status: CacheStatus::Ready,
            last_error: None
        });
        assert_eq!(names(&cache), ["Cellar"]);
    }

    #[tokio::test]
    async fn concurrent_loads_share_one_request() {
        let cache = ResourceCache::new(FakeSource::default());
        let reply = cache.source().script_list();

        let (a, b, ()) = tokio::join!(cache.load(), cache.load(), async {
            settle().await;
            reply.send(Ok(vec![loc(1, "Cellar")])).unwrap();
        });

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(cache.source().lists(), 1);
        assert_eq!(names(&cache), ["Cellar"]);
    }

    #[tokio::test]
    async fn superseded_load_result_is_discarded() {
        let cache = ResourceCache::new(FakeSource::default());
        let first_reply = cache.source().script_list();
        let second_reply = cache.source().script_list();

        let first = tokio::spawn({
            let cache = cache.clone();
            async move { cache.load().await }
        });
        settle().await;
        let second = tokio::spawn({
            let cache = cache.clone();
            async move { cache.reload().await }
        });
        settle().await;

        // Newer load lands first, then the stale one.
        second_reply.send(Ok(vec![loc(1, "Fresh")])).unwrap();
        settle().await;
        first_reply.send(Ok(vec![loc(1, "Stale")])).unwrap();

        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();
        assert_eq!(names(&cache), ["Fresh"]);
        assert_eq!(cache.source().lists(), 2);
    }

    #[tokio::test]
    async fn superseded_load_reports_newer_failure() {
        let cache = ResourceCache::new(FakeSource::default());
        let first_reply = cache.source().script_list();
        let second_reply = cache.source().script_list();
        let error = CoreError::Api {
            message: "boom".into(),
            status: Some(500),
        };

        let first = tokio::spawn({
            let cache = cache.clone();
            async move { cache.reload().await }
        });
        settle().await;
        let second = tokio::spawn({
            let cache = cache.clone();
            async move { cache.reload().await }
        });
        settle().await;

        // The newer load fails first, then the older one succeeds late.
        second_reply.send(Err(error.clone())).unwrap();
        settle().await;
        first_reply.send(Ok(vec![loc(1, "Stale")])).unwrap();

        assert_eq!(second.await.unwrap(), Err(error.clone()));
        assert_eq!(first.await.unwrap(), Err(error));
        assert_eq!(cache.state().status, CacheStatus::Error);
        assert!(names(&cache).is_empty());
    }

    #[tokio::test]
    async fn failed_load_keeps_records_and_reports_error() {
        let cache = ready_cache(vec![loc(1, "Cellar")]).await;
        let reply = cache.source().script_list();
        let error = CoreError::Api {
            message: "boom".into(),
            status: Some(500),
        };

        let (result, ()) = tokio::join!(cache.reload(), async {
            settle().await;
            reply.send(Err(error.clone())).unwrap();
        });

        assert_eq!(result, Err(error.clone()));
        assert_eq!(cache.state().status, CacheStatus::Error);
        assert_eq!(cache.state().last_error, Some(error));
        assert_eq!(names(&cache), ["Cellar"]);

        cache.reload().await.unwrap();
        assert_eq!(cache.state().last_error, None);
    }

    #[tokio::test]
    async fn records_stay_visible_while_reloading() {
        let cache = ready_cache(vec![loc(1, "Cellar")]).await;
        let reply = cache.source().script_list();

        let pending = tokio::spawn({
            let cache = cache.clone();
            async move { cache.reload().await }
        });
        settle().await;

        assert_eq!(cache.state().status, CacheStatus::Loading);
        assert_eq!(names(&cache), ["Cellar"]);

        reply.send(Ok(vec![loc(1, "Cellar"), loc(2, "Garage")])).unwrap();
        pending.await.unwrap().unwrap();
        assert_eq!(names(&cache), ["Cellar", "Garage"]);
    }

    #[tokio::test]
    async fn subscribe_starts_first_load() {
        let cache = ResourceCache::new(FakeSource::with(vec![loc(1, "Cellar")]));
        let mut stream = cache.subscribe();
        assert!(stream.current().is_empty());

        let snap = stream.changed().await.unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(cache.source().lists(), 1);

        // A second subscriber does not load again.
        let _again = cache.subscribe();
        settle().await;
        assert_eq!(cache.source().lists(), 1);
    }

    // ── Invalidation ─────────────────────────────────────────────────

    #[tokio::test]
    async fn invalidating_idle_cache_is_noop() {
        let cache = ResourceCache::new(FakeSource::with(vec![loc(1, "Cellar")]));

        cache.invalidate(Invalidation::All);
        cache.invalidate(Invalidation::Record(1));
        settle().await;

        assert_eq!(cache.source().lists(), 0);
        assert_eq!(cache.source().gets(), 0);
        assert_eq!(cache.state().status, CacheStatus::Idle);
    }

    #[tokio::test]
    async fn idle_cache_with_local_records_converges() {
        let cache = ResourceCache::new(FakeSource::with(vec![loc(5, "Server")]));

        cache.apply_local_create(loc(5, "Local"));
        cache.invalidate(Invalidation::Record(5));
        settle().await;

        assert_eq!(names(&cache), ["Server"]);
        assert_eq!(cache.source().gets(), 1);
        assert_eq!(cache.source().lists(), 0);
    }

    #[tokio::test]
    async fn idle_cache_with_local_records_reloads_on_full_invalidation() {
        let cache = ResourceCache::new(FakeSource::with(vec![loc(1, "Cellar"), loc(2, "Garage")]));

        cache.apply_local_create(loc(3, "Local"));
        cache.invalidate(Invalidation::All);
        settle().await;

        assert_eq!(names(&cache), ["Cellar", "Garage"]);
        assert_eq!(cache.state().status, CacheStatus::Ready);
    }

    #[tokio::test]
    async fn record_invalidation_merges_by_identity() {
        let cache = ready_cache(vec![loc(1, "Cellar"), loc(2, "Garage")]).await;
        cache.source().server.lock().unwrap()[1].name = "Workshop".into();
        cache.source().server.lock().unwrap().push(loc(3, "Attic"));

        cache.invalidate(Invalidation::Record(2));
        cache.invalidate(Invalidation::Record(3));
        settle().await;

        assert_eq!(names(&cache), ["Cellar", "Workshop", "Attic"]);
        assert_eq!(cache.source().lists(), 1);
        assert_eq!(cache.source().gets(), 2);
    }

    #[tokio::test]
    async fn not_found_on_refresh_removes_record() {
        let cache = ready_cache(vec![loc(1, "Cellar"), loc(2, "Garage")]).await;
        cache.source().server.lock().unwrap().retain(|l| l.id != 1);

        cache.invalidate(Invalidation::Record(1));
        settle().await;

        assert_eq!(names(&cache), ["Garage"]);
        assert_eq!(cache.state().status, CacheStatus::Ready);
    }

    #[tokio::test]
    async fn failed_refresh_falls_back_to_full_reload() {
        let cache = ready_cache(vec![loc(1, "Cellar")]).await;
        let reply = cache.source().script_get();

        cache.invalidate(Invalidation::Record(1));
        settle().await;
        reply
            .send(Err(CoreError::Api {
                message: "boom".into(),
                status: Some(502),
            }))
            .unwrap();
        settle().await;

        assert_eq!(cache.source().lists(), 2);
        assert_eq!(cache.state().status, CacheStatus::Ready);
    }

    #[tokio::test]
    async fn record_invalidation_without_point_reads_reloads() {
        let cache = ResourceCache::new(ListOnly(FakeSource::with(vec![loc(1, "Cellar")])));
        cache.load().await.unwrap();

        cache.invalidate(Invalidation::Record(1));
        settle().await;

        assert_eq!(cache.source().0.lists(), 2);
        assert_eq!(cache.source().0.gets(), 0);
    }

    #[tokio::test]
    async fn invalidations_during_load_trigger_one_trailing_reload() {
        let cache = ready_cache(vec![loc(1, "Cellar")]).await;
        let reply = cache.source().script_list();

        let pending = tokio::spawn({
            let cache = cache.clone();
            async move { cache.reload().await }
        });
        settle().await;

        for _ in 0..5 {
            cache.invalidate(Invalidation::All);
        }
        reply.send(Ok(vec![loc(1, "Cellar")])).unwrap();
        pending.await.unwrap().unwrap();
        settle().await;

        // initial + reload + exactly one trailing load
        assert_eq!(cache.source().lists(), 3);
        assert_eq!(cache.state().status, CacheStatus::Ready);
    }

    // ── Read ordering ────────────────────────────────────────────────

    #[tokio::test]
    async fn refresh_newer_than_inflight_load_survives_it() {
        let cache = ready_cache(vec![loc(1, "Cellar"), loc(2, "Garage")]).await;
        let list_reply = cache.source().script_list();
        let get_reply = cache.source().script_get();

        let pending = tokio::spawn({
            let cache = cache.clone();
            async move { cache.reload().await }
        });
        settle().await;

        // Issued after the load started, resolved before it.
        cache.invalidate(Invalidation::Record(1));
        cache.source().server.lock().unwrap().retain(|l| l.id != 2);
        cache.invalidate(Invalidation::Record(2));
        settle().await;
        get_reply.send(Ok(loc(1, "Cellar (renamed)"))).unwrap();
        settle().await;
        assert_eq!(names(&cache), ["Cellar (renamed)"]);

        // The load read the server before those changes.
        list_reply
            .send(Ok(vec![loc(1, "Cellar"), loc(2, "Garage")]))
            .unwrap();
        pending.await.unwrap().unwrap();

        assert_eq!(names(&cache), ["Cellar (renamed)"]);
    }

    #[tokio::test]
    async fn refresh_older_than_applied_load_is_dropped() {
        let cache = ready_cache(vec![loc(1, "Cellar")]).await;
        let get_reply = cache.source().script_get();

        cache.invalidate(Invalidation::Record(1));
        settle().await;

        cache.source().server.lock().unwrap()[0].name = "Vault".into();
        cache.reload().await.unwrap();
        assert_eq!(names(&cache), ["Vault"]);

        get_reply.send(Ok(loc(1, "Cellar"))).unwrap();
        settle().await;

        assert_eq!(names(&cache), ["Vault"]);
    }

    #[tokio::test]
    async fn older_refresh_of_same_record_is_dropped() {
        let cache = ready_cache(vec![loc(1, "Cellar")]).await;
        let older = cache.source().script_get();
        let newer = cache.source().script_get();

        cache.invalidate(Invalidation::Record(1));
        cache.invalidate(Invalidation::Record(1));
        settle().await;

        newer.send(Ok(loc(1, "Second"))).unwrap();
        settle().await;
        older.send(Ok(loc(1, "First"))).unwrap();
        settle().await;

        assert_eq!(names(&cache), ["Second"]);
    }

    // ── Optimistic mutations ─────────────────────────────────────────

    #[tokio::test]
    async fn local_delete_is_idempotent() {
        let cache = ready_cache(vec![loc(1, "Cellar"), loc(2, "Garage")]).await;
        let mut stream = cache.subscribe();

        assert!(cache.apply_local_delete(1));
        let after_first = stream.changed().await.unwrap();

        assert!(!cache.apply_local_delete(1));
        assert_eq!(stream.latest(), after_first);
        assert_eq!(names(&cache), ["Garage"]);
    }

    #[tokio::test]
    async fn identical_local_writes_are_noops() {
        let cache = ready_cache(vec![loc(1, "Cellar")]).await;

        assert!(!cache.apply_local_create(loc(1, "Cellar")));
        assert!(!cache.apply_local_update(loc(1, "Cellar")));
        assert!(cache.apply_local_update(loc(1, "Vault")));
        assert!(cache.apply_local_create(loc(2, "Garage")));
        assert_eq!(names(&cache), ["Vault", "Garage"]);
    }

    #[tokio::test]
    async fn server_read_wins_over_unacknowledged_local_edit() {
        let cache = ready_cache(vec![loc(1, "Cellar")]).await;

        cache.apply_local_update(loc(1, "Local guess"));
        cache.invalidate(Invalidation::Record(1));
        settle().await;

        assert_eq!(names(&cache), ["Cellar"]);
    }

    #[tokio::test]
    async fn remote_writes_update_cache_and_absorb_echo() {
        let cache = ready_cache(vec![loc(1, "Cellar")]).await;

        let created = cache
            .create(&StorageLocationCreate {
                name: "Garage".into(),
                description: Some("next to the car".into()),
            })
            .await
            .unwrap();
        assert_eq!(created.id, 2);
        assert_eq!(names(&cache), ["Cellar", "Garage"]);

        // The change notification for our own write refetches an equal record.
        let mut stream = cache.subscribe();
        cache.invalidate(Invalidation::Record(2));
        settle().await;
        assert!(!stream.latest().is_empty());
        assert_eq!(stream.current(), &stream.latest());

        cache.delete(1).await.unwrap();
        assert_eq!(names(&cache), ["Garage"]);
    }

    #[tokio::test]
    async fn failed_remote_write_leaves_cache_untouched() {
        let source = FakeSource {
            fail_writes: true,
            ..FakeSource::with(vec![loc(1, "Cellar")])
        };
        let cache = ResourceCache::new(source);
        cache.load().await.unwrap();

        let err = cache
            .create(&StorageLocationCreate {
                name: String::new(),
                description: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Rejected { status: 400, .. }));
        assert_eq!(names(&cache), ["Cellar"]);
    }
}
