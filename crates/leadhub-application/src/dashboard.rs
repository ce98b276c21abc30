//! Dashboard summary across the main collections.

use std::sync::Arc;

use leadhub_core::Result;
use leadhub_core::api::ApiTransport;
use leadhub_core::collection::{CollectionKind, CollectionSpec, SortRule};
use leadhub_core::envelope::extract_list;
use serde_json::Value;

/// How many titles of each list the summary shows.
pub const LATEST_LIMIT: usize = 3;

/// Count and latest titles of one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSummary {
    pub kind: CollectionKind,
    pub count: usize,
    pub latest: Vec<String>,
}

/// The dashboard's numbers. A failed collection is reported per entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub events: Result<CollectionSummary>,
    pub gallery: Result<CollectionSummary>,
    pub books: Result<CollectionSummary>,
    pub news: Result<CollectionSummary>,
}

impl DashboardSummary {
    pub fn entries(&self) -> [&Result<CollectionSummary>; 4] {
        [&self.events, &self.gallery, &self.books, &self.news]
    }
}

/// Loads the events, gallery, books and news lists concurrently.
pub async fn load_dashboard(api: Arc<dyn ApiTransport>) -> DashboardSummary {
    let (events, gallery, books, news) = futures::join!(
        summarize(api.as_ref(), CollectionKind::Events),
        summarize(api.as_ref(), CollectionKind::Gallery),
        summarize(api.as_ref(), CollectionKind::Books),
        summarize(api.as_ref(), CollectionKind::News),
    );
    DashboardSummary {
        events,
        gallery,
        books,
        news,
    }
}

async fn summarize(api: &dyn ApiTransport, kind: CollectionKind) -> Result<CollectionSummary> {
    let spec = kind.spec();
    let response = api.get(&spec.endpoints.list).await.inspect_err(|e| {
        tracing::warn!("[Dashboard] Loading {} failed: {}", kind, e);
    })?;
    let mut items = extract_list(response.body)?;
    let latest = latest_titles(&spec, &mut items);
    Ok(CollectionSummary {
        kind,
        count: items.len(),
        latest,
    })
}

/// Newest titles for dated collections, the last added ones otherwise.
fn latest_titles(spec: &CollectionSpec, items: &mut [Value]) -> Vec<String> {
    spec.sort_values(items);
    let titles = items
        .iter()
        .filter_map(|item| item.get("title").and_then(Value::as_str))
        .map(str::to_string);

    if spec.sort != SortRule::Unsorted {
        return titles.take(LATEST_LIMIT).collect();
    }
    let mut all: Vec<String> = titles.collect();
    let mut tail = all.split_off(all.len().saturating_sub(LATEST_LIMIT));
    tail.reverse();
    tail
}
