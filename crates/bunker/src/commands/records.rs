//! Table rows and detail views for every record kind.

use bunker_core::models::{
    AmmunitionStock, AmmunitionType, Battery, Food, Fuel, FuelType, Generator, Medication,
    StorageLocation, Weapon,
};
use bunker_core::{Cached, RecordId, Resource};
use chrono::NaiveDate;
use tabled::Tabled;

use crate::output::detail;

/// How a record kind shows up in tables, detail views and watch lines.
pub trait Listing: Cached {
    type Row: Tabled;

    fn row(&self) -> Self::Row;

    fn detail(&self) -> String;

    /// Short human label, e.g. "Rice" or "Rifle M1".
    fn label(&self) -> String;
}

/// Display name if the server joined one in, else `#id`.
fn named(name: Option<&String>, id: RecordId) -> String {
    name.map_or_else(|| format!("#{id}"), Clone::clone)
}

/// "2027-01-15 (in 90 days)" / "(expired 3 days ago)".
pub fn expiry(date: NaiveDate, today: NaiveDate) -> String {
    let days = (date - today).num_days();
    match days {
        0 => format!("{date} (today)"),
        d if d > 0 => format!("{date} (in {d} days)"),
        d => format!("{date} (expired {} days ago)", -d),
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

// ── Weapons & ammunition ─────────────────────────────────────────────

#[derive(Tabled)]
pub struct WeaponRow {
    #[tabled(rename = "ID")]
    id: RecordId,
    #[tabled(rename = "Type")]
    weapon_type: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Qty")]
    quantity: i32,
    #[tabled(rename = "Ammunition")]
    ammunition: String,
    #[tabled(rename = "Location")]
    location: String,
}

impl Listing for Weapon {
    type Row = WeaponRow;

    fn row(&self) -> WeaponRow {
        WeaponRow {
            id: self.id,
            weapon_type: self.weapon_type.clone(),
            model: self.model.clone(),
            quantity: self.quantity,
            ammunition: named(self.ammunition_type_name.as_ref(), self.ammunition_type_id),
            location: named(self.storage_location_name.as_ref(), self.storage_location_id),
        }
    }

    fn detail(&self) -> String {
        detail(&[
            ("ID", self.id.to_string()),
            ("Type", self.weapon_type.clone()),
            ("Model", self.model.clone()),
            ("Quantity", self.quantity.to_string()),
            (
                "Ammunition",
                named(self.ammunition_type_name.as_ref(), self.ammunition_type_id),
            ),
            (
                "Location",
                named(self.storage_location_name.as_ref(), self.storage_location_id),
            ),
        ])
    }

    fn label(&self) -> String {
        format!("{} {}", self.weapon_type, self.model)
    }
}

#[derive(Tabled)]
pub struct AmmunitionStockRow {
    #[tabled(rename = "ID")]
    id: RecordId,
    #[tabled(rename = "Ammunition")]
    ammunition: String,
    #[tabled(rename = "Qty")]
    quantity: i32,
    #[tabled(rename = "Location")]
    location: String,
}

impl Listing for AmmunitionStock {
    type Row = AmmunitionStockRow;

    fn row(&self) -> AmmunitionStockRow {
        AmmunitionStockRow {
            id: self.id,
            ammunition: named(self.ammunition_type_name.as_ref(), self.ammunition_type_id),
            quantity: self.quantity,
            location: named(self.storage_location_name.as_ref(), self.storage_location_id),
        }
    }

    fn detail(&self) -> String {
        detail(&[
            ("ID", self.id.to_string()),
            (
                "Ammunition",
                named(self.ammunition_type_name.as_ref(), self.ammunition_type_id),
            ),
            ("Quantity", self.quantity.to_string()),
            (
                "Location",
                named(self.storage_location_name.as_ref(), self.storage_location_id),
            ),
        ])
    }

    fn label(&self) -> String {
        format!(
            "{} x {}",
            self.quantity,
            named(self.ammunition_type_name.as_ref(), self.ammunition_type_id)
        )
    }
}

#[derive(Tabled)]
pub struct AmmunitionTypeRow {
    #[tabled(rename = "ID")]
    id: RecordId,
    #[tabled(rename = "Caliber")]
    caliber: String,
    #[tabled(rename = "Type")]
    ammunition_type: String,
}

impl Listing for AmmunitionType {
    type Row = AmmunitionTypeRow;

    fn row(&self) -> AmmunitionTypeRow {
        AmmunitionTypeRow {
            id: self.id,
            caliber: self.caliber.clone(),
            ammunition_type: self.ammunition_type.clone(),
        }
    }

    fn detail(&self) -> String {
        detail(&[
            ("ID", self.id.to_string()),
            ("Caliber", self.caliber.clone()),
            ("Type", self.ammunition_type.clone()),
        ])
    }

    fn label(&self) -> String {
        format!("{} {}", self.caliber, self.ammunition_type)
    }
}

// ── Perishables ──────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct FoodRow {
    #[tabled(rename = "ID")]
    id: RecordId,
    #[tabled(rename = "Type")]
    food_type: String,
    #[tabled(rename = "Qty")]
    quantity: f64,
    #[tabled(rename = "Expires")]
    expires: NaiveDate,
    #[tabled(rename = "Location")]
    location: String,
}

impl Listing for Food {
    type Row = FoodRow;

    fn row(&self) -> FoodRow {
        FoodRow {
            id: self.id,
            food_type: self.food_type.clone(),
            quantity: self.quantity,
            expires: self.expiration_date,
            location: named(self.storage_location_name.as_ref(), self.storage_location_id),
        }
    }

    fn detail(&self) -> String {
        detail(&[
            ("ID", self.id.to_string()),
            ("Type", self.food_type.clone()),
            ("Quantity", self.quantity.to_string()),
            ("Expires", expiry(self.expiration_date, today())),
            (
                "Location",
                named(self.storage_location_name.as_ref(), self.storage_location_id),
            ),
        ])
    }

    fn label(&self) -> String {
        self.food_type.clone()
    }
}

#[derive(Tabled)]
pub struct MedicationRow {
    #[tabled(rename = "ID")]
    id: RecordId,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Purpose")]
    purpose: String,
    #[tabled(rename = "Qty")]
    quantity: i32,
    #[tabled(rename = "Expires")]
    expires: NaiveDate,
    #[tabled(rename = "Location")]
    location: String,
}

impl Listing for Medication {
    type Row = MedicationRow;

    fn row(&self) -> MedicationRow {
        MedicationRow {
            id: self.id,
            name: self.name.clone(),
            purpose: self.purpose.clone(),
            quantity: self.quantity,
            expires: self.expiration_date,
            location: named(self.storage_location_name.as_ref(), self.storage_location_id),
        }
    }

    fn detail(&self) -> String {
        detail(&[
            ("ID", self.id.to_string()),
            ("Name", self.name.clone()),
            ("Purpose", self.purpose.clone()),
            ("Quantity", self.quantity.to_string()),
            ("Expires", expiry(self.expiration_date, today())),
            (
                "Location",
                named(self.storage_location_name.as_ref(), self.storage_location_id),
            ),
        ])
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

// ── Energy ───────────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct FuelRow {
    #[tabled(rename = "ID")]
    id: RecordId,
    #[tabled(rename = "Fuel type")]
    fuel_type: String,
    #[tabled(rename = "Qty")]
    quantity: f64,
    #[tabled(rename = "Location")]
    location: String,
}

impl Listing for Fuel {
    type Row = FuelRow;

    fn row(&self) -> FuelRow {
        FuelRow {
            id: self.id,
            fuel_type: named(self.fuel_type_name.as_ref(), self.fuel_type_id),
            quantity: self.quantity,
            location: named(self.storage_location_name.as_ref(), self.storage_location_id),
        }
    }

    fn detail(&self) -> String {
        detail(&[
            ("ID", self.id.to_string()),
            ("Fuel type", named(self.fuel_type_name.as_ref(), self.fuel_type_id)),
            ("Quantity", self.quantity.to_string()),
            (
                "Location",
                named(self.storage_location_name.as_ref(), self.storage_location_id),
            ),
        ])
    }

    fn label(&self) -> String {
        format!(
            "{} {}",
            self.quantity,
            named(self.fuel_type_name.as_ref(), self.fuel_type_id)
        )
    }
}

#[derive(Tabled)]
pub struct FuelTypeRow {
    #[tabled(rename = "ID")]
    id: RecordId,
    #[tabled(rename = "Name")]
    name: String,
}

impl Listing for FuelType {
    type Row = FuelTypeRow;

    fn row(&self) -> FuelTypeRow {
        FuelTypeRow {
            id: self.id,
            name: self.name.clone(),
        }
    }

    fn detail(&self) -> String {
        detail(&[("ID", self.id.to_string()), ("Name", self.name.clone())])
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

#[derive(Tabled)]
pub struct BatteryRow {
    #[tabled(rename = "ID")]
    id: RecordId,
    #[tabled(rename = "Type")]
    battery_type: String,
    #[tabled(rename = "Capacity")]
    capacity: f64,
    #[tabled(rename = "Qty")]
    quantity: i32,
    #[tabled(rename = "Location")]
    location: String,
}

impl Listing for Battery {
    type Row = BatteryRow;

    fn row(&self) -> BatteryRow {
        BatteryRow {
            id: self.id,
            battery_type: self.battery_type.clone(),
            capacity: self.capacity,
            quantity: self.quantity,
            location: named(self.storage_location_name.as_ref(), self.storage_location_id),
        }
    }

    fn detail(&self) -> String {
        detail(&[
            ("ID", self.id.to_string()),
            ("Type", self.battery_type.clone()),
            ("Capacity", self.capacity.to_string()),
            ("Quantity", self.quantity.to_string()),
            (
                "Location",
                named(self.storage_location_name.as_ref(), self.storage_location_id),
            ),
        ])
    }

    fn label(&self) -> String {
        self.battery_type.clone()
    }
}

#[derive(Tabled)]
pub struct GeneratorRow {
    #[tabled(rename = "ID")]
    id: RecordId,
    #[tabled(rename = "Type")]
    generator_type: String,
    #[tabled(rename = "Power")]
    power: f64,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Fuel type")]
    fuel_type: String,
    #[tabled(rename = "Location")]
    location: String,
}

impl Listing for Generator {
    type Row = GeneratorRow;

    fn row(&self) -> GeneratorRow {
        GeneratorRow {
            id: self.id,
            generator_type: self.generator_type.clone(),
            power: self.power,
            status: self.status.clone(),
            fuel_type: named(self.fuel_type_name.as_ref(), self.fuel_type_id),
            location: named(self.storage_location_name.as_ref(), self.storage_location_id),
        }
    }

    fn detail(&self) -> String {
        detail(&[
            ("ID", self.id.to_string()),
            ("Type", self.generator_type.clone()),
            ("Power", self.power.to_string()),
            ("Status", self.status.clone()),
            ("Fuel type", named(self.fuel_type_name.as_ref(), self.fuel_type_id)),
            (
                "Location",
                named(self.storage_location_name.as_ref(), self.storage_location_id),
            ),
        ])
    }

    fn label(&self) -> String {
        format!("{} ({})", self.generator_type, self.status)
    }
}

// ── Storage locations ────────────────────────────────────────────────

#[derive(Tabled)]
pub struct StorageLocationRow {
    #[tabled(rename = "ID")]
    id: RecordId,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl Listing for StorageLocation {
    type Row = StorageLocationRow;

    fn row(&self) -> StorageLocationRow {
        StorageLocationRow {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone().unwrap_or_default(),
        }
    }

    fn detail(&self) -> String {
        detail(&[
            ("ID", self.id.to_string()),
            ("Name", self.name.clone()),
            ("Description", self.description.clone().unwrap_or_default()),
        ])
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

/// `Resource::id` as a plain-output line.
pub fn id_line<R: Resource>(record: &R) -> String {
    record.id().to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn expiry_is_relative_to_today() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(
            expiry(NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(), today),
            "2026-10-20 (in 4 days)"
        );
        assert_eq!(expiry(today, today), "2026-10-16 (today)");
        assert_eq!(
            expiry(NaiveDate::from_ymd_opt(2026, 10, 13).unwrap(), today),
            "2026-10-13 (expired 3 days ago)"
        );
    }

    #[test]
    fn missing_join_names_fall_back_to_ids() {
        let fuel = Fuel {
            id: 4,
            quantity: 20.0,
            fuel_type_id: 2,
            storage_location_id: 1,
            fuel_type_name: None,
            storage_location_name: Some("Shed".into()),
        };
        let detail = fuel.detail();
        assert!(detail.contains("#2"));
        assert!(detail.contains("Shed"));
        assert_eq!(fuel.label(), "20 #2");
    }
}
