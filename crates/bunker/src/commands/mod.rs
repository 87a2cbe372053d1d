//! Command dispatch: routes parsed CLI commands to handlers.

pub mod config_cmd;
pub mod query;
pub mod records;
pub mod totals;
pub mod util;
pub mod watch;

use bunker_core::Inventory;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Expand `$body` once per resource kind with `$R` bound to its record type.
macro_rules! with_record_type {
    ($kind:expr, $R:ident => $body:expr) => {{
        use bunker_core::ResourceKind as K;
        use bunker_core::models::*;
        match $kind {
            K::Weapon => {
                type $R = Weapon;
                $body
            }
            K::AmmunitionStock => {
                type $R = AmmunitionStock;
                $body
            }
            K::AmmunitionType => {
                type $R = AmmunitionType;
                $body
            }
            K::Food => {
                type $R = Food;
                $body
            }
            K::Medication => {
                type $R = Medication;
                $body
            }
            K::Fuel => {
                type $R = Fuel;
                $body
            }
            K::FuelType => {
                type $R = FuelType;
                $body
            }
            K::Battery => {
                type $R = Battery;
                $body
            }
            K::Generator => {
                type $R = Generator;
                $body
            }
            K::StorageLocation => {
                type $R = StorageLocation;
                $body
            }
        }
    }};
}
pub(crate) use with_record_type;

/// Dispatch a command that needs a server.
pub async fn dispatch(
    cmd: Command,
    inventory: &Inventory,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::List(args) => query::list(inventory, &args, global).await,
        Command::Get { kind, id } => query::get(inventory, kind, id, global).await,
        Command::Create { kind, data } => query::create(inventory, kind, &data, global).await,
        Command::Update { kind, id, data } => {
            query::update(inventory, kind, id, &data, global).await
        }
        Command::Delete { kind, id } => query::delete(inventory, kind, id, global).await,
        Command::Expired { kind } => query::expired(inventory, kind, global).await,
        Command::Expiring { kind } => query::expiring(inventory, kind, global).await,
        Command::ByLocation { kind, location_id } => {
            query::by_location(inventory, kind, location_id, global).await
        }
        Command::Totals(args) => totals::handle(inventory, args, global).await,
        Command::Watch(args) => watch::handle(inventory, args, global).await,
        // Handled before a server connection is set up.
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
