//! Sign-in, sign-up and profile commands

use super::{open_guarded, open_session};
use crate::cli::RegisterArgs;
use crate::config::Config;
use crate::models::{Credentials, ProfileUpdate, Registration, User};
use crate::services::Guard;

fn print_user(user: &User) {
    println!("{} <{}>", user.name, user.email);
    println!("  ID: {}", user.id);
    println!(
        "  Role: {}",
        user.role.as_ref().map_or("-", |r| r.as_str())
    );

    let fields = [
        ("Phone", &user.phone),
        ("Address", &user.address),
        ("City", &user.city),
        ("Zip code", &user.zip_code),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("  {label}: {value}");
        }
    }
}

pub async fn cmd_login(config: &Config, email: &str, password: &str) -> anyhow::Result<()> {
    let ctx = open_session(config).await?;
    let next = ctx
        .identity
        .login(&Credentials::new(email, password))
        .await?;

    if let Some(user) = ctx.identity.current_user() {
        print_user(&user);
    }
    println!();
    println!("Next: {next}");
    Ok(())
}

pub async fn cmd_logout(config: &Config) -> anyhow::Result<()> {
    let ctx = open_session(config).await?;
    ctx.identity.logout();
    Ok(())
}

pub async fn cmd_whoami(config: &Config) -> anyhow::Result<()> {
    let ctx = open_session(config).await?;

    match ctx.identity.current_user() {
        Some(user) => print_user(&user),
        None => println!("Not signed in."),
    }
    Ok(())
}

pub async fn cmd_register(config: &Config, args: RegisterArgs) -> anyhow::Result<()> {
    let ctx = open_session(config).await?;
    let registration = Registration {
        name: args.name,
        email: args.email,
        phone: args.phone,
        password: args.password,
        address: args.address,
        city: args.city,
        zip_code: args.zip_code,
    };

    let next = ctx.identity.register(&registration).await?;
    println!("Next: {next}");
    Ok(())
}

pub async fn cmd_profile_show(config: &Config) -> anyhow::Result<()> {
    let ctx = open_guarded(config, Guard::Authenticated).await?;
    let user = ctx.identity.require_user()?;
    print_user(&user);
    Ok(())
}

pub async fn cmd_profile_update(config: &Config, update: ProfileUpdate) -> anyhow::Result<()> {
    let ctx = open_guarded(config, Guard::Authenticated).await?;
    let user = ctx.identity.update_user(&update).await?;
    print_user(&user);
    Ok(())
}
