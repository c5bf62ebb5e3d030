pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod domain;
pub mod models;
pub mod notify;
pub mod services;
pub mod session;
pub mod state;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ProfileCommands, PurchaseCommands, VehicleCommands};
pub use config::Config;
use models::ProfileUpdate;
use notify::{ConsoleNotifier, Notifier};
pub use state::AppContext;

/// Runs the command line. Failures are reported here and turned into a
/// non-zero exit status by the caller.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let result = execute(cli).await;

    if let Err(e) = &result {
        error!("Command failed: {e:#}");
        ConsoleNotifier.error(&format!("{e:#}"));
    }

    result
}

async fn execute(cli: Cli) -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    let config = match &cli.config {
        Some(path) => {
            let mut config = Config::load_from_path(path)?;
            config.apply_overrides(|key| std::env::var(key).ok());
            config
        }
        None => Config::load()?,
    };

    init_tracing(&config);
    if let Ok(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }

    config.validate().context("Invalid configuration")?;
    dispatch(cli.command, &config).await
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

async fn dispatch(command: Commands, config: &Config) -> anyhow::Result<()> {
    match command {
        Commands::Init => cli::cmd_init(),

        Commands::Login { email, password } => cli::cmd_login(config, &email, &password).await,

        Commands::Logout => cli::cmd_logout(config).await,

        Commands::Whoami => cli::cmd_whoami(config).await,

        Commands::Register(args) => cli::cmd_register(config, args).await,

        Commands::Profile { command } => match command {
            ProfileCommands::Show => cli::cmd_profile_show(config).await,
            ProfileCommands::Update {
                name,
                email,
                phone,
                address,
                city,
                zip_code,
            } => {
                let update = ProfileUpdate {
                    name,
                    email,
                    phone,
                    address,
                    city,
                    zip_code,
                };
                cli::cmd_profile_update(config, update).await
            }
        },

        Commands::Vehicles { command } => match command {
            VehicleCommands::List { available } => cli::cmd_vehicle_list(config, available).await,
            VehicleCommands::Show { id } => cli::cmd_vehicle_show(config, id).await,
            VehicleCommands::Search { query } => {
                cli::cmd_vehicle_search(config, &query.join(" ")).await
            }
            VehicleCommands::Add(args) => cli::cmd_vehicle_add(config, args).await,
            VehicleCommands::Edit { id, vehicle } => cli::cmd_vehicle_edit(config, id, vehicle).await,
            VehicleCommands::Remove { id } => cli::cmd_vehicle_remove(config, id).await,
            VehicleCommands::Sell { id } => cli::cmd_vehicle_sell(config, id).await,
        },

        Commands::Purchases { command } => match command {
            PurchaseCommands::History => cli::cmd_purchase_history(config).await,
            PurchaseCommands::List { user } => cli::cmd_purchase_list(config, user).await,
            PurchaseCommands::Show { id } => cli::cmd_purchase_show(config, id).await,
            PurchaseCommands::Buy { vehicle, payment } => {
                cli::cmd_purchase_buy(config, vehicle, payment).await
            }
            PurchaseCommands::Edit {
                id,
                payment,
                status,
            } => cli::cmd_purchase_edit(config, id, payment, status).await,
            PurchaseCommands::Cancel { id } => cli::cmd_purchase_cancel(config, id).await,
            PurchaseCommands::Complete { id } => cli::cmd_purchase_complete(config, id).await,
            PurchaseCommands::Delete { id } => cli::cmd_purchase_delete(config, id).await,
        },
    }
}
