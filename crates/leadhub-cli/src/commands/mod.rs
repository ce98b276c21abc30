pub mod auth;
pub mod collections;
pub mod config;
pub mod dashboard;
pub mod documents;

use anyhow::Result;
use leadhub_application::AdminContext;
use leadhub_core::route::Guard;

use crate::runtime::Runtime;
use crate::{Commands, DocAction};

pub async fn dispatch(runtime: &Runtime, command: Commands) -> Result<()> {
    let ctx = &runtime.ctx;
    ctx.init().await;

    match command {
        Commands::Login { email, password } => auth::login(ctx, email, password).await,
        Commands::Logout => auth::logout(ctx).await,
        Commands::Whoami => auth::whoami(ctx),
        Commands::Credentials {
            old_email,
            old_password,
            new_email,
            new_password,
        } => {
            admin(ctx).await?;
            auth::credentials(ctx, old_email, old_password, new_email, new_password).await
        }
        Commands::List { collection } => {
            admin(ctx).await?;
            collections::list(ctx, collection).await
        }
        Commands::Create {
            collection,
            fields,
            files,
        } => {
            admin(ctx).await?;
            collections::create(ctx, collection, &fields, &files).await
        }
        Commands::Update {
            collection,
            id,
            fields,
            files,
        } => {
            admin(ctx).await?;
            collections::update(ctx, collection, &id, &fields, &files).await
        }
        Commands::Delete {
            collection,
            id,
            yes,
        } => {
            admin(ctx).await?;
            collections::delete(ctx, collection, &id, yes).await
        }
        Commands::Doc { action } => {
            admin(ctx).await?;
            match action {
                DocAction::Show { document } => documents::show(ctx, document).await,
                DocAction::Set {
                    document,
                    fields,
                    files,
                } => documents::set(ctx, document, &fields, &files).await,
            }
        }
        Commands::Dashboard => {
            admin(ctx).await?;
            dashboard::show(ctx).await
        }
        // Handled before a runtime exists.
        Commands::Config { .. } => Ok(()),
    }
}

/// Admin commands run behind the auth guard.
async fn admin(ctx: &AdminContext) -> Result<()> {
    ctx.require(Guard::RequireAuth).await?;
    Ok(())
}
