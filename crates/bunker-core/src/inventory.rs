// ── Inventory context ──
//
// The one object an application builds at startup. Owns the REST client,
// the notification transport, one cache per resource kind and the router
// that connects them, plus the background tasks that keep caches in sync.

use std::sync::Arc;

use bunker_api::models::{
    AmmunitionStock, AmmunitionSummary, AmmunitionType, Battery, BatteryTotal, Food, Fuel,
    FuelTotal, FuelType, Generator, Medication, StorageLocation, Weapon,
};
use bunker_api::{
    ChangeEvent, ConnectionStatus, InventoryClient, NotificationTransport, Perishable, RecordId,
    Resource, ResourceKind, Stored,
};
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::InventoryConfig;
use crate::error::CoreError;
use crate::router::SubscriptionRouter;
use crate::store::ResourceCache;

// ── Caches ───────────────────────────────────────────────────────────

/// One cache per resource kind.
#[derive(Clone)]
pub struct Caches {
    pub weapons: ResourceCache<Weapon>,
    pub ammunition_stocks: ResourceCache<AmmunitionStock>,
    pub ammunition_types: ResourceCache<AmmunitionType>,
    pub food: ResourceCache<Food>,
    pub medications: ResourceCache<Medication>,
    pub fuel: ResourceCache<Fuel>,
    pub fuel_types: ResourceCache<FuelType>,
    pub batteries: ResourceCache<Battery>,
    pub generators: ResourceCache<Generator>,
    pub storage_locations: ResourceCache<StorageLocation>,
}

impl Caches {
    fn new(client: &InventoryClient) -> Self {
        Self {
            weapons: ResourceCache::new(client.resource()),
            ammunition_stocks: ResourceCache::new(client.resource()),
            ammunition_types: ResourceCache::new(client.resource()),
            food: ResourceCache::new(client.resource()),
            medications: ResourceCache::new(client.resource()),
            fuel: ResourceCache::new(client.resource()),
            fuel_types: ResourceCache::new(client.resource()),
            batteries: ResourceCache::new(client.resource()),
            generators: ResourceCache::new(client.resource()),
            storage_locations: ResourceCache::new(client.resource()),
        }
    }

    /// The cache holding `R`.
    pub fn of<R: Cached>(&self) -> &ResourceCache<R> {
        R::cache(self)
    }

    fn router(&self) -> SubscriptionRouter {
        let mut router = SubscriptionRouter::new();
        router
            .register(self.weapons.clone())
            .register(self.ammunition_stocks.clone())
            .register(self.ammunition_types.clone())
            .register(self.food.clone())
            .register(self.medications.clone())
            .register(self.fuel.clone())
            .register(self.fuel_types.clone())
            .register(self.batteries.clone())
            .register(self.generators.clone())
            .register(self.storage_locations.clone());
        router
    }
}

/// Record types with a slot in [`Caches`].
pub trait Cached: Resource {
    fn cache(caches: &Caches) -> &ResourceCache<Self>;
}

macro_rules! cached {
    ($($record:ty => $field:ident),+ $(,)?) => {
        $(
            impl Cached for $record {
                fn cache(caches: &Caches) -> &ResourceCache<Self> {
                    &caches.$field
                }
            }
        )+
    };
}

cached! {
    Weapon => weapons,
    AmmunitionStock => ammunition_stocks,
    AmmunitionType => ammunition_types,
    Food => food,
    Medication => medications,
    Fuel => fuel,
    FuelType => fuel_types,
    Battery => batteries,
    Generator => generators,
    StorageLocation => storage_locations,
}

// ── Inventory ────────────────────────────────────────────────────────

/// Dependency-injected context shared by every view.
///
/// Cheaply cloneable via `Arc<InventoryInner>`. Construction does no I/O;
/// call [`start()`](Self::start) to open the notification feed.
#[derive(Clone)]
pub struct Inventory {
    inner: Arc<InventoryInner>,
}

struct InventoryInner {
    config: InventoryConfig,
    client: InventoryClient,
    transport: NotificationTransport,
    caches: Caches,
    router: Arc<SubscriptionRouter>,
    running: Mutex<Option<Running>>,
}

struct Running {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Inventory {
    pub fn new(config: InventoryConfig) -> Result<Self, CoreError> {
        let client = InventoryClient::new(config.api_url.as_str(), &config.transport())?;
        let transport = NotificationTransport::new(config.ws_url.clone(), config.reconnect());
        let caches = Caches::new(&client);
        let router = Arc::new(caches.router());

        Ok(Self {
            inner: Arc::new(InventoryInner {
                config,
                client,
                transport,
                caches,
                router,
                running: Mutex::new(None),
            }),
        })
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &InventoryClient {
        &self.inner.client
    }

    pub fn caches(&self) -> &Caches {
        &self.inner.caches
    }

    pub fn router(&self) -> &SubscriptionRouter {
        &self.inner.router
    }

    pub fn transport(&self) -> &NotificationTransport {
        &self.inner.transport
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Open the notification feed and start routing events to caches.
    ///
    /// Idempotent: a second call only re-arms the transport.
    pub async fn start(&self) {
        let mut running = self.inner.running.lock().await;
        if running.is_none() {
            let cancel = CancellationToken::new();
            let events = self.inner.transport.subscribe();
            let status = self.inner.transport.connection_state();

            let router = Arc::clone(&self.inner.router);
            let router_cancel = cancel.clone();
            let bridge = tokio::spawn(async move { router.run(events, router_cancel).await });

            let resync = tokio::spawn(resync_task(
                status,
                Arc::clone(&self.inner.router),
                cancel.clone(),
            ));

            *running = Some(Running {
                cancel,
                handles: vec![bridge, resync],
            });
            info!(ws_url = %self.inner.config.ws_url, "inventory sync started");
        }
        self.inner.transport.connect();
    }

    /// Close the feed, stop background tasks and wait for them to exit.
    pub async fn shutdown(&self) {
        self.inner.transport.disconnect();

        let Some(running) = self.inner.running.lock().await.take() else {
            return;
        };
        running.cancel.cancel();
        for handle in running.handles {
            let _ = handle.await;
        }
        debug!("inventory sync stopped");
    }

    // ── State observation ────────────────────────────────────────

    pub fn connection_state(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.transport.connection_state()
    }

    /// Every change event, in arrival order.
    pub fn events(&self) -> broadcast::Receiver<Arc<ChangeEvent>> {
        self.inner.transport.subscribe()
    }

    pub fn latest_event(&self) -> watch::Receiver<Option<Arc<ChangeEvent>>> {
        self.inner.transport.latest_event()
    }

    /// Fully invalidate every cache, e.g. for a manual refresh.
    pub fn invalidate_all(&self) {
        self.inner.router.invalidate_all();
    }

    /// Kinds with a registered cache.
    pub fn kinds(&self) -> Vec<ResourceKind> {
        let mut kinds: Vec<ResourceKind> = self.inner.router.kinds().collect();
        kinds.sort();
        kinds
    }

    // ── Ad-hoc queries (bypass the caches) ───────────────────────

    pub async fn by_location<R: Stored>(&self, location_id: RecordId) -> Result<Vec<R>, CoreError> {
        Ok(self.inner.client.resource::<R>().by_location(location_id).await?)
    }

    pub async fn expired<R: Perishable>(&self) -> Result<Vec<R>, CoreError> {
        Ok(self.inner.client.resource::<R>().expired().await?)
    }

    pub async fn expiring_soon<R: Perishable>(&self) -> Result<Vec<R>, CoreError> {
        Ok(self.inner.client.resource::<R>().expiring_soon().await?)
    }

    pub async fn ammunition_total(
        &self,
        ammunition_type_id: RecordId,
    ) -> Result<AmmunitionSummary, CoreError> {
        Ok(self
            .inner
            .client
            .resource::<AmmunitionStock>()
            .total(ammunition_type_id)
            .await?)
    }

    pub async fn fuel_total(&self, fuel_type_id: RecordId) -> Result<FuelTotal, CoreError> {
        Ok(self
            .inner
            .client
            .resource::<Fuel>()
            .total_by_type(fuel_type_id)
            .await?)
    }

    pub async fn battery_total(&self, battery_type: &str) -> Result<BatteryTotal, CoreError> {
        Ok(self
            .inner
            .client
            .resource::<Battery>()
            .total_by_type(battery_type)
            .await?)
    }

    pub async fn generators_by_status(&self, status: &str) -> Result<Vec<Generator>, CoreError> {
        Ok(self.inner.client.resource::<Generator>().by_status(status).await?)
    }

    pub async fn generators_by_fuel_type(
        &self,
        fuel_type_id: RecordId,
    ) -> Result<Vec<Generator>, CoreError> {
        Ok(self
            .inner
            .client
            .resource::<Generator>()
            .by_fuel_type(fuel_type_id)
            .await?)
    }

    pub async fn medications_by_purpose(&self, purpose: &str) -> Result<Vec<Medication>, CoreError> {
        Ok(self
            .inner
            .client
            .resource::<Medication>()
            .by_purpose(purpose)
            .await?)
    }

    pub async fn fuel_by_type(&self, fuel_type_id: RecordId) -> Result<Vec<Fuel>, CoreError> {
        Ok(self.inner.client.resource::<Fuel>().by_type(fuel_type_id).await?)
    }

    pub async fn batteries_by_type(&self, battery_type: &str) -> Result<Vec<Battery>, CoreError> {
        Ok(self
            .inner
            .client
            .resource::<Battery>()
            .by_type(battery_type)
            .await?)
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Invalidate every cache whenever the feed reopens after an earlier
/// connection: events sent while it was down are lost.
async fn resync_task(
    mut status: watch::Receiver<ConnectionStatus>,
    router: Arc<SubscriptionRouter>,
    cancel: CancellationToken,
) {
    let mut seen = status.borrow_and_update().opened;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let opened = status.borrow_and_update().opened;
                if opened > seen {
                    if seen > 0 {
                        info!(opened, "notification feed reopened, resyncing caches");
                        router.invalidate_all();
                    }
                    seen = opened;
                }
            }
        }
    }
}
