mod account;
mod init;
mod purchases;
mod vehicles;

pub use account::{cmd_login, cmd_logout, cmd_profile_show, cmd_profile_update, cmd_register, cmd_whoami};
pub use init::cmd_init;
pub use purchases::{
    cmd_purchase_buy, cmd_purchase_cancel, cmd_purchase_complete, cmd_purchase_delete,
    cmd_purchase_edit, cmd_purchase_history, cmd_purchase_list, cmd_purchase_show,
};
pub use vehicles::{
    cmd_vehicle_add, cmd_vehicle_edit, cmd_vehicle_list, cmd_vehicle_remove, cmd_vehicle_search,
    cmd_vehicle_sell, cmd_vehicle_show,
};

use crate::config::Config;
use crate::domain::Route;
use crate::services::{AccessError, GateDecision, Guard, evaluate_when_settled};
use crate::state::AppContext;

/// Builds the context and resolves any stored session.
async fn open_session(config: &Config) -> anyhow::Result<AppContext> {
    let ctx = AppContext::new(config)?;
    ctx.identity.initialize().await;
    Ok(ctx)
}

/// Opens a session and refuses to continue unless `guard` lets it through.
///
/// Signing in is checked first so an anonymous caller of an admin command
/// still gets the login hint.
async fn open_guarded(config: &Config, guard: Guard) -> anyhow::Result<AppContext> {
    let ctx = open_session(config).await?;

    let decision = match evaluate_when_settled(&ctx.identity, Guard::Authenticated).await {
        GateDecision::Render => evaluate_when_settled(&ctx.identity, guard).await,
        refused => refused,
    };

    match decision {
        GateDecision::Render => Ok(ctx),
        GateDecision::Suspend => Err(anyhow::anyhow!("Session is still being resolved")),
        GateDecision::Redirect(Route::Login) => Err(anyhow::anyhow!(
            "{}. Run `dealership login`.",
            AccessError::NotAuthenticated
        )),
        GateDecision::Redirect(_) => Err(AccessError::Forbidden.into()),
    }
}

fn price(amount: f64) -> String {
    format!("${amount:.2}")
}
