// Record and create-input types for every inventory kind.
//
// Field names mirror the backend's JSON (camelCase). Server responses also
// carry denormalized display names (`storageLocationName`, ...) which are
// read-only and never sent back.

use std::fmt;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::kind::ResourceKind;

/// Stable integer identity of a record, unique within its kind.
pub type RecordId = i64;

/// A record type served by one REST collection.
///
/// `Create` is the request body for `POST /{kind}` and `PUT /{kind}/{id}`.
pub trait Resource:
    Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: ResourceKind;

    type Create: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static;

    fn id(&self) -> RecordId;
}

/// Records that live in a storage location (`GET /{kind}/by-location/{id}`).
pub trait Stored: Resource {
    fn storage_location_id(&self) -> RecordId;
}

/// Records with a shelf life (`/expired`, `/expiring-soon`).
pub trait Perishable: Stored {
    fn expiration_date(&self) -> NaiveDate;
}

macro_rules! resource {
    ($record:ty, $create:ty, $kind:expr) => {
        impl Resource for $record {
            const KIND: ResourceKind = $kind;
            type Create = $create;

            fn id(&self) -> RecordId {
                self.id
            }
        }
    };
}

macro_rules! stored {
    ($($record:ty),+ $(,)?) => {
        $(
            impl Stored for $record {
                fn storage_location_id(&self) -> RecordId {
                    self.storage_location_id
                }
            }
        )+
    };
}

// ── Weapons & ammunition ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weapon {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub weapon_type: String,
    pub model: String,
    pub quantity: i32,
    pub ammunition_type_id: RecordId,
    pub storage_location_id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ammunition_type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_location_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponCreate {
    #[serde(rename = "type")]
    pub weapon_type: String,
    pub model: String,
    pub quantity: i32,
    pub ammunition_type_id: RecordId,
    pub storage_location_id: RecordId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmmunitionStock {
    pub id: RecordId,
    pub quantity: i32,
    pub ammunition_type_id: RecordId,
    pub storage_location_id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ammunition_type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_location_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmmunitionStockCreate {
    pub quantity: i32,
    pub ammunition_type_id: RecordId,
    pub storage_location_id: RecordId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmmunitionType {
    pub id: RecordId,
    pub caliber: String,
    #[serde(rename = "type")]
    pub ammunition_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmmunitionTypeCreate {
    pub caliber: String,
    #[serde(rename = "type")]
    pub ammunition_type: String,
}

// ── Perishables ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Food {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub food_type: String,
    pub quantity: f64,
    pub expiration_date: NaiveDate,
    pub storage_location_id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_location_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodCreate {
    #[serde(rename = "type")]
    pub food_type: String,
    pub quantity: f64,
    pub expiration_date: NaiveDate,
    pub storage_location_id: RecordId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: RecordId,
    pub name: String,
    pub quantity: i32,
    pub expiration_date: NaiveDate,
    pub purpose: String,
    pub storage_location_id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_location_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationCreate {
    pub name: String,
    pub quantity: i32,
    pub expiration_date: NaiveDate,
    pub purpose: String,
    pub storage_location_id: RecordId,
}

// ── Power ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fuel {
    pub id: RecordId,
    pub quantity: f64,
    pub fuel_type_id: RecordId,
    pub storage_location_id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_location_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelCreate {
    pub quantity: f64,
    pub fuel_type_id: RecordId,
    pub storage_location_id: RecordId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelType {
    pub id: RecordId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelTypeCreate {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Battery {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub battery_type: String,
    pub capacity: f64,
    pub quantity: i32,
    pub storage_location_id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_location_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryCreate {
    #[serde(rename = "type")]
    pub battery_type: String,
    pub capacity: f64,
    pub quantity: i32,
    pub storage_location_id: RecordId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Generator {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub generator_type: String,
    pub power: f64,
    pub status: String,
    pub fuel_type_id: RecordId,
    pub storage_location_id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_location_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorCreate {
    #[serde(rename = "type")]
    pub generator_type: String,
    pub power: f64,
    pub status: String,
    pub fuel_type_id: RecordId,
    pub storage_location_id: RecordId,
}

// ── Storage ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageLocation {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageLocationCreate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ── Aggregates ──────────────────────────────────────────────────────

/// `GET /ammunition-stocks/total/{typeId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmmunitionSummary {
    pub ammunition_type_id: RecordId,
    pub caliber: String,
    #[serde(rename = "type")]
    pub ammunition_type: String,
    pub total_quantity: i64,
}

/// `GET /batteries/total-by-type/{type}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryTotal {
    pub battery_type: String,
    pub total_quantity: i64,
}

/// `GET /fuel/total-by-type/{typeId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelTotal {
    pub fuel_type: String,
    pub total_quantity: f64,
}

resource!(Weapon, WeaponCreate, ResourceKind::Weapon);
resource!(AmmunitionStock, AmmunitionStockCreate, ResourceKind::AmmunitionStock);
resource!(AmmunitionType, AmmunitionTypeCreate, ResourceKind::AmmunitionType);
resource!(Food, FoodCreate, ResourceKind::Food);
resource!(Medication, MedicationCreate, ResourceKind::Medication);
resource!(Fuel, FuelCreate, ResourceKind::Fuel);
resource!(FuelType, FuelTypeCreate, ResourceKind::FuelType);
resource!(Battery, BatteryCreate, ResourceKind::Battery);
resource!(Generator, GeneratorCreate, ResourceKind::Generator);
resource!(StorageLocation, StorageLocationCreate, ResourceKind::StorageLocation);

stored!(Weapon, AmmunitionStock, Food, Medication, Fuel, Battery, Generator);

impl Perishable for Food {
    fn expiration_date(&self) -> NaiveDate {
        self.expiration_date
    }
}

impl Perishable for Medication {
    fn expiration_date(&self) -> NaiveDate {
        self.expiration_date
    }
}
