// Kind-specific read endpoints
//
// These are filtered views computed by the backend. They bypass any
// client-side cache and always hit the network.

use tracing::debug;

use crate::client::ResourceApi;
use crate::error::Error;
use crate::models::{
    AmmunitionStock, AmmunitionSummary, Battery, BatteryTotal, Fuel, FuelTotal, Generator,
    Medication, Perishable, RecordId, Stored,
};

impl<R: Stored> ResourceApi<R> {
    /// `GET /{kind}/by-location/{locationId}`
    pub async fn by_location(&self, location_id: RecordId) -> Result<Vec<R>, Error> {
        debug!(kind = %R::KIND, location_id, "listing by storage location");
        self.client()
            .get(&format!("{}/by-location/{location_id}", R::KIND.path()))
            .await
    }
}

impl<R: Perishable> ResourceApi<R> {
    /// Records whose expiration date has passed.
    ///
    /// `GET /{kind}/expired`
    pub async fn expired(&self) -> Result<Vec<R>, Error> {
        self.client()
            .get(&format!("{}/expired", R::KIND.path()))
            .await
    }

    /// Records expiring within the next month.
    ///
    /// `GET /{kind}/expiring-soon`
    pub async fn expiring_soon(&self) -> Result<Vec<R>, Error> {
        self.client()
            .get(&format!("{}/expiring-soon", R::KIND.path()))
            .await
    }
}

impl ResourceApi<AmmunitionStock> {
    /// Total rounds on hand for one ammunition type.
    ///
    /// `GET /ammunition-stocks/total/{typeId}`
    pub async fn total(&self, ammunition_type_id: RecordId) -> Result<AmmunitionSummary, Error> {
        self.client()
            .get(&format!("ammunition-stocks/total/{ammunition_type_id}"))
            .await
    }
}

impl ResourceApi<Fuel> {
    /// `GET /fuel/by-type/{typeId}`
    pub async fn by_type(&self, fuel_type_id: RecordId) -> Result<Vec<Fuel>, Error> {
        self.client()
            .get(&format!("fuel/by-type/{fuel_type_id}"))
            .await
    }

    /// `GET /fuel/total-by-type/{typeId}`
    pub async fn total_by_type(&self, fuel_type_id: RecordId) -> Result<FuelTotal, Error> {
        self.client()
            .get(&format!("fuel/total-by-type/{fuel_type_id}"))
            .await
    }
}

impl ResourceApi<Battery> {
    /// `GET /batteries/by-type/{type}`
    pub async fn by_type(&self, battery_type: &str) -> Result<Vec<Battery>, Error> {
        self.client()
            .get_segments(&["batteries", "by-type", battery_type])
            .await
    }

    /// `GET /batteries/total-by-type/{type}`
    pub async fn total_by_type(&self, battery_type: &str) -> Result<BatteryTotal, Error> {
        self.client()
            .get_segments(&["batteries", "total-by-type", battery_type])
            .await
    }
}

impl ResourceApi<Generator> {
    /// `GET /generators/by-status/{status}`
    pub async fn by_status(&self, status: &str) -> Result<Vec<Generator>, Error> {
        self.client()
            .get_segments(&["generators", "by-status", status])
            .await
    }

    /// `GET /generators/by-fuel-type/{fuelTypeId}`
    pub async fn by_fuel_type(&self, fuel_type_id: RecordId) -> Result<Vec<Generator>, Error> {
        self.client()
            .get(&format!("generators/by-fuel-type/{fuel_type_id}"))
            .await
    }
}

impl ResourceApi<Medication> {
    /// `GET /medications/by-purpose/{purpose}`
    pub async fn by_purpose(&self, purpose: &str) -> Result<Vec<Medication>, Error> {
        self.client()
            .get_segments(&["medications", "by-purpose", purpose])
            .await
    }
}
