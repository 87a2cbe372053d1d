//! Record listing, lookup, writes and the ad-hoc server queries.

use std::borrow::Borrow;

use bunker_core::models::{Food, Medication};
use bunker_core::{CoreError, Inventory, Perishable, RecordId, ResourceKind, Stored};
use serde::Serialize;

use crate::cli::{GlobalOpts, ListArgs, PerishableKind};
use crate::error::CliError;
use crate::output;

use super::records::{Listing, id_line};
use super::{util, with_record_type};

// ── Rendering ────────────────────────────────────────────────────────

/// Print records as a table/JSON/YAML/plain list.
pub fn print_records<R, T>(records: &[T], global: &GlobalOpts) -> Result<(), CliError>
where
    R: Listing,
    T: Borrow<R> + Serialize,
{
    let out = output::render_list(
        &global.output,
        records,
        |r| r.borrow().row(),
        |r| id_line(r.borrow()),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn print_record<R: Listing>(record: &R, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, record, Listing::detail, id_line)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── list ─────────────────────────────────────────────────────────────

pub async fn list(inventory: &Inventory, args: &ListArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if let Some(filtered) = filtered_list(inventory, args, global).await {
        return filtered;
    }
    with_record_type!(args.kind, R => list_cached::<R>(inventory, global).await)
}

/// Full collection through the kind's cache.
async fn list_cached<R: Listing>(inventory: &Inventory, global: &GlobalOpts) -> Result<(), CliError> {
    let cache = inventory.caches().of::<R>();
    cache.load().await?;
    print_records::<R, _>(cache.snapshot().as_slice(), global)
}

/// Server-side filtered listing, or `None` if no filter flag was given.
async fn filtered_list(
    inventory: &Inventory,
    args: &ListArgs,
    global: &GlobalOpts,
) -> Option<Result<(), CliError>> {
    let filters = [
        args.status.is_some(),
        args.fuel_type.is_some(),
        args.battery_type.is_some(),
        args.purpose.is_some(),
    ];
    match filters.iter().filter(|set| **set).count() {
        0 => return None,
        1 => {}
        _ => {
            return Some(Err(CliError::Validation {
                field: "filter".into(),
                reason: "use at most one filter flag".into(),
            }));
        }
    }

    let result = match (args.kind, args) {
        (ResourceKind::Generator, ListArgs { status: Some(status), .. }) => {
            print_filtered(inventory.generators_by_status(status).await, global)
        }
        (ResourceKind::Generator, ListArgs { fuel_type: Some(id), .. }) => {
            print_filtered(inventory.generators_by_fuel_type(*id).await, global)
        }
        (ResourceKind::Fuel, ListArgs { fuel_type: Some(id), .. }) => {
            print_filtered(inventory.fuel_by_type(*id).await, global)
        }
        (ResourceKind::Battery, ListArgs { battery_type: Some(kind), .. }) => {
            print_filtered(inventory.batteries_by_type(kind).await, global)
        }
        (ResourceKind::Medication, ListArgs { purpose: Some(purpose), .. }) => {
            print_filtered(inventory.medications_by_purpose(purpose).await, global)
        }
        (kind, _) => Err(CliError::Validation {
            field: "filter".into(),
            reason: format!("this filter does not apply to {kind}"),
        }),
    };
    Some(result)
}

fn print_filtered<R: Listing>(
    records: Result<Vec<R>, CoreError>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    print_records::<R, _>(&records?, global)
}

// ── get / create / update / delete ───────────────────────────────────

pub async fn get(
    inventory: &Inventory,
    kind: ResourceKind,
    id: RecordId,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    with_record_type!(kind, R => {
        let record = inventory
            .client()
            .resource::<R>()
            .get(id)
            .await
            .map_err(CoreError::from)?;
        print_record(&record, global)
    })
}

pub async fn create(
    inventory: &Inventory,
    kind: ResourceKind,
    data: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    with_record_type!(kind, R => {
        let input: <R as Resource>::Create = util::read_data(data)?;
        let record = inventory.caches().of::<R>().create(&input).await?;
        print_record(&record, global)
    })
}

pub async fn update(
    inventory: &Inventory,
    kind: ResourceKind,
    id: RecordId,
    data: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    with_record_type!(kind, R => {
        let input: <R as Resource>::Create = util::read_data(data)?;
        let record = inventory.caches().of::<R>().update(id, &input).await?;
        print_record(&record, global)
    })
}

pub async fn delete(
    inventory: &Inventory,
    kind: ResourceKind,
    id: RecordId,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let action = format!("delete {kind} #{id}");
    if !util::confirm(&format!("Delete {kind} #{id}?"), &action, global.yes)? {
        return Ok(());
    }
    with_record_type!(kind, R => inventory.caches().of::<R>().delete(id).await)?;
    if !global.quiet {
        eprintln!("Deleted {kind} #{id}");
    }
    Ok(())
}

// ── Ad-hoc queries ───────────────────────────────────────────────────

pub async fn expired(
    inventory: &Inventory,
    kind: PerishableKind,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match kind {
        PerishableKind::Food => print_expired::<Food>(inventory, global).await,
        PerishableKind::Medications => print_expired::<Medication>(inventory, global).await,
    }
}

async fn print_expired<R: Perishable + Listing>(
    inventory: &Inventory,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let records = inventory.expired::<R>().await?;
    print_records::<R, _>(&records, global)
}

pub async fn expiring(
    inventory: &Inventory,
    kind: PerishableKind,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match kind {
        PerishableKind::Food => print_expiring::<Food>(inventory, global).await,
        PerishableKind::Medications => print_expiring::<Medication>(inventory, global).await,
    }
}

async fn print_expiring<R: Perishable + Listing>(
    inventory: &Inventory,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let records = inventory.expiring_soon::<R>().await?;
    print_records::<R, _>(&records, global)
}

pub async fn by_location(
    inventory: &Inventory,
    kind: ResourceKind,
    location_id: RecordId,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    use bunker_core::models::{AmmunitionStock, Battery, Fuel, Generator, Weapon};

    match kind {
        ResourceKind::Weapon => print_located::<Weapon>(inventory, location_id, global).await,
        ResourceKind::AmmunitionStock => {
            print_located::<AmmunitionStock>(inventory, location_id, global).await
        }
        ResourceKind::Food => print_located::<Food>(inventory, location_id, global).await,
        ResourceKind::Medication => {
            print_located::<Medication>(inventory, location_id, global).await
        }
        ResourceKind::Fuel => print_located::<Fuel>(inventory, location_id, global).await,
        ResourceKind::Battery => print_located::<Battery>(inventory, location_id, global).await,
        ResourceKind::Generator => {
            print_located::<Generator>(inventory, location_id, global).await
        }
        ResourceKind::AmmunitionType | ResourceKind::FuelType | ResourceKind::StorageLocation => {
            Err(CliError::Validation {
                field: "kind".into(),
                reason: format!("{kind} records are not kept in a storage location"),
            })
        }
    }
}

async fn print_located<R: Stored + Listing>(
    inventory: &Inventory,
    location_id: RecordId,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let records = inventory.by_location::<R>(location_id).await?;
    print_records::<R, _>(&records, global)
}
