use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use leadhub_application::{AdminContext, AlwaysConfirm, Confirmer, EntityListSynchronizer};
use leadhub_core::collection::CollectionKind;
use leadhub_core::dates;
use leadhub_core::record::{Record, SyncRecord};
use serde_json::Value;

use crate::args::build_draft;
use crate::terminal::StdinConfirmer;

/// Fields shown in the listing, first present one wins per column.
const LABEL_FIELDS: &[&str] = &["title", "fullName", "subject"];
const DATE_FIELDS: &[&str] = &["date", "createdAt", "year"];

async fn loaded(ctx: &AdminContext, kind: CollectionKind) -> Result<EntityListSynchronizer<Record>> {
    let sync = ctx.list::<Record>(kind);
    let result = sync.load().await;
    ctx.observe(&result);
    result?;
    Ok(sync)
}

pub async fn list(ctx: &AdminContext, kind: CollectionKind) -> Result<()> {
    let sync = loaded(ctx, kind).await?;
    let records = sync.records().await;

    println!("{} ({})", sync.spec().name.bold(), records.len());
    let now = Utc::now();
    for record in &records {
        println!("{}", row(record, kind, now));
    }
    Ok(())
}

pub async fn create(
    ctx: &AdminContext,
    kind: CollectionKind,
    fields: &[String],
    files: &[String],
) -> Result<()> {
    let draft = build_draft(fields, files)?;
    let sync = ctx.list::<Record>(kind);
    let name = sync.spec().name.clone();

    ctx.run(
        format!("Creating {} entry...", name),
        format!("{} entry created", name),
        sync.create(draft),
    )
    .await?;

    for record in sync.records().await {
        println!("{}", row(&record, kind, Utc::now()));
    }
    Ok(())
}

pub async fn update(
    ctx: &AdminContext,
    kind: CollectionKind,
    id: &str,
    fields: &[String],
    files: &[String],
) -> Result<()> {
    let patch = build_draft(fields, files)?;
    let sync = loaded(ctx, kind).await?;
    let name = sync.spec().name.clone();

    ctx.run(
        format!("Updating {} entry...", name),
        format!("{} entry updated", name),
        sync.update(id, patch),
    )
    .await?;

    if let Some(entry) = sync.find(id).await {
        println!("{}", row(&entry.record, kind, Utc::now()));
    }
    Ok(())
}

pub async fn delete(ctx: &AdminContext, kind: CollectionKind, id: &str, yes: bool) -> Result<()> {
    let sync = loaded(ctx, kind).await?;
    let name = sync.spec().name.clone();
    let confirmer: &dyn Confirmer = if yes { &AlwaysConfirm } else { &StdinConfirmer };

    // Confirmation comes first, so the outcome is reported after the fact.
    let result = sync.delete(id, confirmer).await;
    ctx.observe(&result);
    if result? {
        ctx.feedback().success(format!("{} entry deleted", name));
    } else {
        println!("Cancelled");
    }
    Ok(())
}

/// One listing line. News rows also show how long ago they were published.
fn row(record: &Record, kind: CollectionKind, now: DateTime<Utc>) -> String {
    let label = first_text(record, LABEL_FIELDS).unwrap_or_default();
    let date = first_text(record, DATE_FIELDS).unwrap_or_default();
    let mut line = format!("  {}  {:<12}  {}", record.record_id().dimmed(), date, label);
    if kind == CollectionKind::News {
        if let Some(age) = record.get_str("date").and_then(|d| dates::time_ago(d, now)) {
            line.push_str(&format!("  {}", format!("Published: {}", age).dimmed()));
        }
    }
    line
}

fn first_text(record: &Record, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match record.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(fields) => Record::new(fields).unwrap(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_news_row_shows_publish_age() {
        let now = Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap();
        let news = record(json!({ "_id": "n1", "title": "Launch", "date": "2025-01-28" }));

        let line = row(&news, CollectionKind::News, now);
        assert!(line.contains("Launch"));
        assert!(line.contains("Published: 3 days ago"));
    }

    #[test]
    fn test_other_rows_have_no_age() {
        let now = Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap();
        let event = record(json!({ "_id": "e1", "title": "Rally", "date": "2025-01-28" }));
        let undated = record(json!({ "_id": "n2", "title": "Draft" }));

        assert!(!row(&event, CollectionKind::Events, now).contains("Published"));
        assert!(!row(&undated, CollectionKind::News, now).contains("Published"));
    }
}
