//! Vehicle browsing and inventory commands

use super::{open_guarded, open_session, price};
use crate::cli::VehicleArgs;
use crate::config::Config;
use crate::domain::VehicleId;
use crate::models::{Vehicle, VehicleInput};
use crate::services::Guard;

impl From<VehicleArgs> for VehicleInput {
    fn from(args: VehicleArgs) -> Self {
        Self {
            brand: args.brand,
            model: args.model,
            year: args.year,
            price: args.price,
            mileage: args.mileage,
        }
    }
}

fn print_vehicles(vehicles: &[Vehicle]) {
    if vehicles.is_empty() {
        println!("No vehicles found.");
        return;
    }

    println!("{:<6} {:<32} {:>14} {:>12}  Status", "ID", "Vehicle", "Price", "Mileage");
    println!("{:-<76}", "");
    for vehicle in vehicles {
        println!(
            "{:<6} {:<32} {:>14} {:>9.0} km  {}",
            vehicle.id,
            vehicle.display_name(),
            price(vehicle.price),
            vehicle.mileage,
            if vehicle.sold { "sold" } else { "available" }
        );
    }
}

fn print_vehicle(vehicle: &Vehicle) {
    println!("{}", vehicle.display_name());
    println!("  ID: {}", vehicle.id);
    println!("  Price: {}", price(vehicle.price));
    println!("  Mileage: {:.0} km", vehicle.mileage);
    println!(
        "  Status: {}",
        if vehicle.sold { "sold" } else { "available" }
    );
}

pub async fn cmd_vehicle_list(config: &Config, available_only: bool) -> anyhow::Result<()> {
    let ctx = open_session(config).await?;
    let vehicles = if available_only {
        ctx.catalog.list_available().await?
    } else {
        ctx.catalog.list().await?
    };

    print_vehicles(&vehicles);
    Ok(())
}

pub async fn cmd_vehicle_show(config: &Config, id: VehicleId) -> anyhow::Result<()> {
    let ctx = open_session(config).await?;
    let vehicle = ctx.catalog.get(id).await?;
    print_vehicle(&vehicle);
    Ok(())
}

pub async fn cmd_vehicle_search(config: &Config, query: &str) -> anyhow::Result<()> {
    let ctx = open_session(config).await?;
    let vehicles = ctx.catalog.search(query).await?;
    print_vehicles(&vehicles);
    Ok(())
}

pub async fn cmd_vehicle_add(config: &Config, args: VehicleArgs) -> anyhow::Result<()> {
    let ctx = open_guarded(config, Guard::Admin).await?;
    let vehicle = ctx.catalog.create(&args.into()).await?;
    print_vehicle(&vehicle);
    Ok(())
}

pub async fn cmd_vehicle_edit(
    config: &Config,
    id: VehicleId,
    args: VehicleArgs,
) -> anyhow::Result<()> {
    let ctx = open_guarded(config, Guard::Admin).await?;
    let vehicle = ctx.catalog.update(id, &args.into()).await?;
    print_vehicle(&vehicle);
    Ok(())
}

pub async fn cmd_vehicle_remove(config: &Config, id: VehicleId) -> anyhow::Result<()> {
    let ctx = open_guarded(config, Guard::Admin).await?;
    ctx.catalog.delete(id).await?;
    Ok(())
}

pub async fn cmd_vehicle_sell(config: &Config, id: VehicleId) -> anyhow::Result<()> {
    let ctx = open_guarded(config, Guard::Admin).await?;
    ctx.catalog.mark_sold(id).await?;
    Ok(())
}
