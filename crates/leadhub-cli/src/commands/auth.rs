use anyhow::Result;
use colored::Colorize;
use leadhub_application::AdminContext;
use leadhub_core::route::Guard;
use leadhub_core::session::{Credentials, CredentialsUpdate};

use crate::terminal::value_or_prompt;

pub async fn login(
    ctx: &AdminContext,
    email: Option<String>,
    password: Option<String>,
) -> Result<()> {
    if ctx.require(Guard::RequireAnonymous).await.is_err() {
        if let Some(user) = ctx.session().current_user() {
            println!("Already logged in as {}", user.display_name().bold());
        }
        return Ok(());
    }

    let credentials = Credentials::new(
        value_or_prompt(email, "Email")?,
        value_or_prompt(password, "Password")?,
    );
    let user = ctx
        .run("Logging in...", "Login successful", ctx.session().login(&credentials))
        .await?;
    println!("Logged in as {}", user.display_name().bold());
    Ok(())
}

pub async fn logout(ctx: &AdminContext) -> Result<()> {
    let result = ctx.session().logout().await;
    ctx.observe(&result);
    println!("Logged out");
    Ok(())
}

pub fn whoami(ctx: &AdminContext) -> Result<()> {
    match ctx.session().current_user() {
        Some(user) => {
            println!("{}", user.display_name().bold());
            if let Some(email) = &user.email {
                println!("  email: {}", email);
            }
            if let Some(id) = &user.id {
                println!("  id:    {}", id.dimmed());
            }
        }
        None => println!("Not logged in"),
    }
    Ok(())
}

pub async fn credentials(
    ctx: &AdminContext,
    old_email: Option<String>,
    old_password: Option<String>,
    new_email: Option<String>,
    new_password: Option<String>,
) -> Result<()> {
    let update = CredentialsUpdate {
        old_email: value_or_prompt(old_email, "Current email")?,
        old_password: value_or_prompt(old_password, "Current password")?,
        new_email: value_or_prompt(new_email, "New email")?,
        new_password: value_or_prompt(new_password, "New password")?,
    };
    ctx.run(
        "Updating credentials...",
        "Credentials updated",
        ctx.session().update_credentials(&update),
    )
    .await?;
    Ok(())
}
