use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use leadhub_application::{AdminContext, AlwaysConfirm, RecordingSink, Reconciliation};
use leadhub_core::api::{ApiRequest, ApiResponse, ApiTransport, Method};
use leadhub_core::collection::CollectionKind;
use leadhub_core::feedback::NotificationKind;
use leadhub_core::record::{Draft, Event, NewsItem, Record, SyncRecord};
use leadhub_core::route::Guard;
use leadhub_core::{HubError, Result};
use serde_json::{Value, json};

/// In-memory backend: queued answers per route, every request logged.
#[derive(Default)]
struct MockBackend {
    answers: Mutex<HashMap<(Method, String), VecDeque<Result<Value>>>>,
    log: Mutex<Vec<(Method, String)>>,
}

impl MockBackend {
    fn on(&self, method: Method, path: &str, answer: Result<Value>) {
        self.answers
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(answer);
    }

    fn calls(&self, method: Method, path: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, p)| *m == method && p == path)
            .count()
    }
}

#[async_trait]
impl ApiTransport for MockBackend {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.log
            .lock()
            .unwrap()
            .push((request.method, request.path.clone()));
        let answer = self
            .answers
            .lock()
            .unwrap()
            .get_mut(&(request.method, request.path.clone()))
            .and_then(VecDeque::pop_front);
        match answer {
            Some(Ok(body)) => Ok(ApiResponse::ok(body)),
            Some(Err(e)) => Err(e),
            None => Err(HubError::transport(format!("unexpected {}", request.path))),
        }
    }
}

fn logged_in() -> (Arc<MockBackend>, AdminContext, Arc<RecordingSink>) {
    let backend = Arc::new(MockBackend::default());
    backend.on(
        Method::Get,
        "/check",
        Ok(json!({ "user": { "_id": "u1", "email": "admin@example.com" } })),
    );
    let sink = Arc::new(RecordingSink::new());
    let ctx = AdminContext::new(backend.clone(), sink.clone());
    (backend, ctx, sink)
}

fn ids<R: SyncRecord>(records: &[R]) -> Vec<&str> {
    records.iter().map(SyncRecord::record_id).collect()
}

#[tokio::test]
async fn news_create_prepends_server_record() {
    let (backend, ctx, _) = logged_in();
    ctx.init().await;
    backend.on(
        Method::Get,
        "/news/getnews",
        Ok(json!({ "data": [
            { "_id": "n2", "title": "B", "date": "2024-02-01", "description": "d", "newsurl": "u" },
            { "_id": "n3", "title": "C", "date": "2024-01-01", "description": "d", "newsurl": "u" }
        ] })),
    );
    backend.on(
        Method::Post,
        "/news/insertnews",
        Ok(json!({ "success": true, "data": {
            "_id": "n1", "title": "A", "date": "2024-03-01", "description": "d", "newsurl": "u"
        } })),
    );

    let news = ctx.list::<NewsItem>(CollectionKind::News);
    news.load().await.unwrap();
    let before = news.len().await;

    let draft = Draft::new()
        .field("title", "A")
        .field("date", "2024-03-01")
        .field("description", "d")
        .field("newsurl", "u");
    news.create(draft).await.unwrap();

    let records = news.records().await;
    assert_eq!(records.len(), before + 1);
    assert_eq!(ids(&records), ["n1", "n2", "n3"]);
}

#[tokio::test]
async fn gallery_locked_delete_keeps_entry_and_reports_message() {
    let (backend, ctx, sink) = logged_in();
    ctx.init().await;
    backend.on(
        Method::Get,
        "/gallery/getdata",
        Ok(json!({ "data": [
            { "_id": "g1", "title": "One", "year": 2020, "image": "https://cdn/1.jpg" },
            { "_id": "g2", "title": "Two", "year": "2021", "image": "https://cdn/2.jpg" }
        ] })),
    );
    backend.on(
        Method::Delete,
        "/gallery/delete/g2",
        Ok(json!({ "success": false, "message": "locked" })),
    );

    let gallery = ctx.list::<Record>(CollectionKind::Gallery);
    gallery.load().await.unwrap();
    let before = gallery.entries().await;

    let result = ctx
        .run("Deleting...", "Deleted", gallery.delete("g2", &AlwaysConfirm))
        .await;

    assert_eq!(result.unwrap_err().user_message(), "locked");
    assert_eq!(gallery.entries().await, before);
    let visible = sink.visible();
    assert_eq!(visible.last().unwrap().kind, NotificationKind::Error);
    assert_eq!(visible.last().unwrap().message, "locked");
}

#[tokio::test]
async fn delete_shrinks_list_by_one() {
    let (backend, ctx, _) = logged_in();
    backend.on(
        Method::Get,
        "/gallery/getdata",
        Ok(json!({ "data": [{ "_id": "g1", "title": "One", "year": 2020 }] })),
    );
    backend.on(Method::Delete, "/gallery/delete/g1", Ok(json!({ "success": true })));

    let gallery = ctx.list::<Record>(CollectionKind::Gallery);
    gallery.load().await.unwrap();
    assert!(gallery.delete("g1", &AlwaysConfirm).await.unwrap());
    assert!(gallery.find("g1").await.is_none());
    assert!(gallery.is_empty().await);
}

#[tokio::test]
async fn event_update_without_day_month_falls_back_to_load() {
    let (backend, ctx, _) = logged_in();
    backend.on(
        Method::Get,
        "/event/getevent",
        Ok(json!({ "data": [{ "_id": "e1", "title": "Rally", "date": "2024-03-15", "description": "d", "day": "15", "month": "Mar" }] })),
    );
    backend.on(
        Method::Put,
        "/event/updateevent/e1",
        Ok(json!({ "data": { "_id": "e1", "title": "Rally", "date": "2024-07-04" } })),
    );
    backend.on(
        Method::Get,
        "/event/getevent",
        Ok(json!({ "data": [{ "_id": "e1", "title": "Rally", "date": "2024-07-04", "description": "d", "day": "4", "month": "Jul" }] })),
    );

    let events = ctx.list::<Event>(CollectionKind::Events);
    events.load().await.unwrap();
    let outcome = events
        .update("e1", Draft::new().field("date", "2024-07-04"))
        .await
        .unwrap();

    assert_eq!(outcome, Reconciliation::Reloaded);
    assert_eq!(backend.calls(Method::Get, "/event/getevent"), 2);
    let e1 = events.find("e1").await.unwrap().record;
    assert_eq!(e1.day.as_deref(), Some("4"));
    assert_eq!(e1.month.as_deref(), Some("Jul"));
}

#[tokio::test]
async fn startup_checks_identity_exactly_once() {
    let (backend, ctx, _) = logged_in();
    assert_eq!(ctx.navigator().land("/admin"), None);

    ctx.init().await;
    ctx.init().await;
    ctx.require(Guard::RequireAuth).await.unwrap();

    assert_eq!(backend.calls(Method::Get, "/check"), 1);
    assert_eq!(ctx.navigator().land("/login").as_deref(), Some("/admin"));
    assert_eq!(ctx.navigator().land("/admin/news").as_deref(), Some("/admin/news"));
}

#[tokio::test]
async fn expired_session_redirects_to_login() {
    let (backend, ctx, _) = logged_in();
    ctx.init().await;
    backend.on(
        Method::Get,
        "/news/getnews",
        Err(HubError::unauthorized("jwt expired")),
    );

    let news = ctx.list::<NewsItem>(CollectionKind::News);
    let _ = ctx.run("Loading news...", "Loaded", news.load()).await;

    assert_eq!(ctx.navigator().navigate("/admin/news").await, "/login");
    assert!(ctx.require(Guard::RequireAuth).await.unwrap_err().is_auth());
}

#[tokio::test]
async fn loading_twice_yields_same_list() {
    let (backend, ctx, _) = logged_in();
    let page = json!({ "data": [
        { "_id": "n1", "title": "A", "date": "2024-01-01" },
        { "_id": "n2", "title": "B", "date": "2023-01-01" }
    ] });
    backend.on(Method::Get, "/news/getnews", Ok(page.clone()));
    backend.on(Method::Get, "/news/getnews", Ok(page));

    let news = ctx.list::<NewsItem>(CollectionKind::News);
    news.load().await.unwrap();
    let first = news.records().await;
    news.load().await.unwrap();
    assert_eq!(news.records().await, first);
}
