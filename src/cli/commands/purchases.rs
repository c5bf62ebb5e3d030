//! Purchase commands

use super::{open_guarded, price};
use crate::config::Config;
use crate::domain::{PaymentMethod, PurchaseId, PurchaseStatus, UserId, VehicleId};
use crate::models::{Purchase, PurchaseUpdate};
use crate::services::Guard;

fn print_purchases(purchases: &[Purchase]) {
    if purchases.is_empty() {
        println!("No purchases yet.");
        return;
    }

    println!(
        "{:<6} {:<8} {:>14}  {:<24} {:<11} Date",
        "ID", "Vehicle", "Total", "Payment", "Status"
    );
    println!("{:-<80}", "");
    for purchase in purchases {
        let date = purchase
            .purchased_at
            .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string());
        println!(
            "{:<6} {:<8} {:>14}  {:<24} {:<11} {}",
            purchase.id,
            purchase.vehicle_id,
            price(purchase.total_price),
            purchase.payment_method,
            purchase.status,
            date
        );
    }
}

fn print_purchase(purchase: &Purchase) {
    println!("Purchase {}", purchase.id);
    println!("  User: {}", purchase.user_id);
    println!("  Vehicle: {}", purchase.vehicle_id);
    println!("  Total: {}", price(purchase.total_price));
    println!("  Payment: {}", purchase.payment_method);
    println!("  Status: {}", purchase.status);
    if let Some(date) = purchase.purchased_at {
        println!("  Date: {}", date.format("%Y-%m-%d %H:%M"));
    }
}

pub async fn cmd_purchase_history(config: &Config) -> anyhow::Result<()> {
    let ctx = open_guarded(config, Guard::Authenticated).await?;
    let purchases = ctx.purchases.list_mine().await?;
    print_purchases(&purchases);
    Ok(())
}

pub async fn cmd_purchase_list(config: &Config, user: UserId) -> anyhow::Result<()> {
    let ctx = open_guarded(config, Guard::Authenticated).await?;
    let purchases = ctx.purchases.list_for_user(user).await?;
    print_purchases(&purchases);
    Ok(())
}

pub async fn cmd_purchase_show(config: &Config, id: PurchaseId) -> anyhow::Result<()> {
    let ctx = open_guarded(config, Guard::Authenticated).await?;
    let details = ctx.purchases.details(id).await?;

    print_purchase(&details.purchase);
    match details.vehicle {
        Some(vehicle) => println!("  {} (list price {})", vehicle.display_name(), price(vehicle.price)),
        None => println!("  Vehicle details unavailable"),
    }
    Ok(())
}

pub async fn cmd_purchase_buy(
    config: &Config,
    vehicle: VehicleId,
    payment: PaymentMethod,
) -> anyhow::Result<()> {
    let ctx = open_guarded(config, Guard::Authenticated).await?;
    ctx.purchases.load_available_vehicles().await?;

    let purchase = ctx.purchases.create(Some(vehicle), payment).await?;
    print_purchase(&purchase);
    Ok(())
}

pub async fn cmd_purchase_edit(
    config: &Config,
    id: PurchaseId,
    payment: Option<PaymentMethod>,
    status: Option<PurchaseStatus>,
) -> anyhow::Result<()> {
    let ctx = open_guarded(config, Guard::Admin).await?;
    let update = PurchaseUpdate {
        payment_method: payment,
        status,
    };

    let purchase = ctx.purchases.update(id, &update).await?;
    print_purchase(&purchase);
    Ok(())
}

pub async fn cmd_purchase_cancel(config: &Config, id: PurchaseId) -> anyhow::Result<()> {
    let ctx = open_guarded(config, Guard::Admin).await?;
    let purchase = ctx.purchases.cancel(id).await?;
    print_purchase(&purchase);
    Ok(())
}

pub async fn cmd_purchase_complete(config: &Config, id: PurchaseId) -> anyhow::Result<()> {
    let ctx = open_guarded(config, Guard::Admin).await?;
    let sale = ctx.purchases.complete(id).await?;

    print_purchase(&sale.purchase);
    println!("  Vehicle {} marked as sold", sale.vehicle_id);
    Ok(())
}

pub async fn cmd_purchase_delete(config: &Config, id: PurchaseId) -> anyhow::Result<()> {
    let ctx = open_guarded(config, Guard::Admin).await?;
    ctx.purchases.delete(id).await?;
    Ok(())
}
