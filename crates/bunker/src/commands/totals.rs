//! Aggregate quantity handlers.

use bunker_core::Inventory;

use crate::cli::{GlobalOpts, TotalsArgs, TotalsCommand};
use crate::error::CliError;
use crate::output::{self, detail};

pub async fn handle(
    inventory: &Inventory,
    args: TotalsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let out = match args.command {
        TotalsCommand::Ammunition { ammunition_type_id } => {
            let total = inventory.ammunition_total(ammunition_type_id).await?;
            output::render_single(
                &global.output,
                &total,
                |t| {
                    detail(&[
                        ("Ammunition type", format!("#{}", t.ammunition_type_id)),
                        ("Caliber", t.caliber.clone()),
                        ("Type", t.ammunition_type.clone()),
                        ("Total rounds", t.total_quantity.to_string()),
                    ])
                },
                |t| t.total_quantity.to_string(),
            )?
        }
        TotalsCommand::Fuel { fuel_type_id } => {
            let total = inventory.fuel_total(fuel_type_id).await?;
            output::render_single(
                &global.output,
                &total,
                |t| {
                    detail(&[
                        ("Fuel type", t.fuel_type.clone()),
                        ("Total", t.total_quantity.to_string()),
                    ])
                },
                |t| t.total_quantity.to_string(),
            )?
        }
        TotalsCommand::Battery { battery_type } => {
            let total = inventory.battery_total(&battery_type).await?;
            output::render_single(
                &global.output,
                &total,
                |t| {
                    detail(&[
                        ("Battery type", t.battery_type.clone()),
                        ("Total", t.total_quantity.to_string()),
                    ])
                },
                |t| t.total_quantity.to_string(),
            )?
        }
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
