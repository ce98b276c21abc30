use anyhow::Result;
use colored::Colorize;
use leadhub_application::{AdminContext, load_dashboard};

pub async fn show(ctx: &AdminContext) -> Result<()> {
    let summary = load_dashboard(ctx.api()).await;

    for entry in summary.entries() {
        match entry {
            Ok(collection) => {
                println!("{:<10} {}", collection.kind.as_ref().bold(), collection.count);
                for title in &collection.latest {
                    println!("           {}", title.dimmed());
                }
            }
            Err(e) => {
                ctx.observe::<()>(&Err(e.clone()));
            }
        }
    }
    Ok(())
}
