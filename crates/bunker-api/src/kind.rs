// ── Resource kinds ──
//
// The closed set of inventory categories. Each kind knows its canonical
// kebab-case name, its REST collection path, and the PascalCase name the
// backend uses in change notifications.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

/// One of the fixed inventory categories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, IntoStaticStr, Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ResourceKind {
    Weapon,
    AmmunitionStock,
    AmmunitionType,
    Food,
    Medication,
    Fuel,
    FuelType,
    Battery,
    Generator,
    StorageLocation,
}

impl ResourceKind {
    /// Canonical kebab-case name, e.g. `"ammunition-stock"`.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// REST collection path segment, e.g. `"ammunition-stocks"`.
    pub fn path(self) -> &'static str {
        match self {
            Self::Weapon => "weapons",
            Self::AmmunitionStock => "ammunition-stocks",
            Self::AmmunitionType => "ammunition-types",
            Self::Food => "food",
            Self::Medication => "medications",
            Self::Fuel => "fuel",
            Self::FuelType => "fuel-types",
            Self::Battery => "batteries",
            Self::Generator => "generators",
            Self::StorageLocation => "storage-locations",
        }
    }

    /// Human-readable label for tables and log lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Weapon => "Weapons",
            Self::AmmunitionStock => "Ammunition",
            Self::AmmunitionType => "Ammunition types",
            Self::Food => "Food",
            Self::Medication => "Medications",
            Self::Fuel => "Fuel",
            Self::FuelType => "Fuel types",
            Self::Battery => "Batteries",
            Self::Generator => "Generators",
            Self::StorageLocation => "Storage locations",
        }
    }

    /// Resolve a `resourceType` string from the wire.
    ///
    /// Accepts the kebab-case name (`ammunition-stock`), the collection path
    /// (`ammunition-stocks`) and the backend's PascalCase entity name
    /// (`AmmunitionStock`), case-insensitively.
    pub fn from_wire(raw: &str) -> Option<Self> {
        let wanted = normalize(raw);
        if wanted.is_empty() {
            return None;
        }
        Self::iter().find(|kind| normalize(kind.name()) == wanted || normalize(kind.path()) == wanted)
    }
}

fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string does not name any [`ResourceKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resource kind '{0}'")]
pub struct UnknownKind(pub String);

impl FromStr for ResourceKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wire(s).ok_or_else(|| UnknownKind(s.to_owned()))
    }
}
