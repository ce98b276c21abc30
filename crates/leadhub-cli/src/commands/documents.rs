use anyhow::Result;
use leadhub_application::{AdminContext, DocumentSynchronizer};
use leadhub_core::document::DocumentKind;
use serde_json::Value;

use crate::args::{parse_field, parse_file};

async fn loaded(ctx: &AdminContext, kind: DocumentKind) -> Result<DocumentSynchronizer> {
    let doc = ctx.document(kind);
    let result = doc.load().await;
    ctx.observe(&result);
    result?;
    Ok(doc)
}

pub async fn show(ctx: &AdminContext, kind: DocumentKind) -> Result<()> {
    let doc = loaded(ctx, kind).await?;
    let fields = Value::Object(doc.fields().await);
    println!("{}", serde_json::to_string_pretty(&fields)?);
    Ok(())
}

pub async fn set(
    ctx: &AdminContext,
    kind: DocumentKind,
    fields: &[String],
    files: &[String],
) -> Result<()> {
    let doc = loaded(ctx, kind).await?;

    for raw in fields {
        let (path, value) = parse_field(raw)?;
        let result = doc.set(&path, value).await;
        ctx.observe(&result);
        result?;
    }
    for raw in files {
        let file = parse_file(raw)?;
        let result = doc.attach(&file.part, file.attachment).await;
        ctx.observe(&result);
        result?;
    }

    if !doc.is_dirty().await {
        println!("Nothing to save");
        return Ok(());
    }
    let result = doc.save(ctx.feedback()).await;
    if result.as_ref().is_err_and(|e| e.is_auth()) {
        ctx.session().invalidate();
    }
    result?;
    Ok(())
}
