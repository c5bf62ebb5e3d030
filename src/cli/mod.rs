//! Command-line interface for the dealership storefront.

mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{PaymentMethod, PurchaseId, PurchaseStatus, UserId, VehicleId};

/// Dealership - browse vehicles, buy them, and manage the inventory
#[derive(Parser)]
#[command(name = "dealership")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a default config file
    Init,

    /// Sign in and remember the session
    Login {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show who is signed in
    #[command(alias = "me")]
    Whoami,

    /// Create a customer account
    Register(RegisterArgs),

    /// Show or edit your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Browse and manage vehicles
    #[command(alias = "v")]
    Vehicles {
        #[command(subcommand)]
        command: VehicleCommands,
    },

    /// Buy vehicles and manage purchases
    #[command(alias = "p")]
    Purchases {
        #[command(subcommand)]
        command: PurchaseCommands,
    },
}

#[derive(Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub phone: String,

    #[arg(long)]
    pub password: String,

    #[arg(long)]
    pub address: Option<String>,

    #[arg(long)]
    pub city: Option<String>,

    #[arg(long)]
    pub zip_code: Option<String>,
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show your profile
    Show,

    /// Change profile fields; only the given ones are sent
    Update {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        city: Option<String>,

        #[arg(long)]
        zip_code: Option<String>,
    },
}

#[derive(Args)]
pub struct VehicleArgs {
    #[arg(long)]
    pub brand: String,

    #[arg(long)]
    pub model: String,

    #[arg(long)]
    pub year: i32,

    #[arg(long)]
    pub price: f64,

    #[arg(long, default_value = "0")]
    pub mileage: f64,
}

#[derive(Subcommand)]
pub enum VehicleCommands {
    /// List vehicles
    #[command(alias = "ls")]
    List {
        /// Only vehicles that can still be bought
        #[arg(long)]
        available: bool,
    },

    /// Show one vehicle
    Show { id: VehicleId },

    /// Search by brand or model
    #[command(alias = "s")]
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Add a vehicle (administrators)
    Add(VehicleArgs),

    /// Replace a vehicle's details (administrators)
    Edit {
        id: VehicleId,

        #[command(flatten)]
        vehicle: VehicleArgs,
    },

    /// Delete a vehicle (administrators)
    #[command(alias = "rm")]
    Remove { id: VehicleId },

    /// Mark a vehicle as sold (administrators)
    Sell { id: VehicleId },
}

#[derive(Subcommand)]
pub enum PurchaseCommands {
    /// Your purchase history
    #[command(alias = "h")]
    History,

    /// Purchases of a given user
    #[command(alias = "ls")]
    List {
        #[arg(long)]
        user: UserId,
    },

    /// Show a purchase with its vehicle
    Show { id: PurchaseId },

    /// Buy an available vehicle
    Buy {
        vehicle: VehicleId,

        /// credit-card, cash, bank-transfer or financing
        #[arg(long, default_value = "credit-card")]
        payment: PaymentMethod,
    },

    /// Change payment method or status (administrators)
    Edit {
        id: PurchaseId,

        #[arg(long)]
        payment: Option<PaymentMethod>,

        /// completed or cancelled
        #[arg(long)]
        status: Option<PurchaseStatus>,
    },

    /// Cancel a pending purchase (administrators)
    Cancel { id: PurchaseId },

    /// Complete the sale and mark the vehicle sold (administrators)
    Complete { id: PurchaseId },

    /// Delete a purchase (administrators)
    #[command(alias = "rm")]
    Delete { id: PurchaseId },
}

pub use commands::*;
