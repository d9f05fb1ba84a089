//! CollectionStore reconciliation over an in-memory transport.

use async_trait::async_trait;
use console_core::http::{ApiRequest, Method, Transport};
use console_core::store::{CollectionStore, Resource};
use console_core::{AppError, Identified, RecordId};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Note {
    id: Option<RecordId>,
    #[serde(default)]
    title: String,
}

impl Identified for Note {
    fn record_id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl Resource for Note {
    const NAME: &'static str = "note";
    const PATH: &'static str = "/notes";

    fn matches(&self, term: &str) -> bool {
        self.title.to_lowercase().contains(&term.to_lowercase())
    }
}

/// Replays scripted responses in order and records every request.
#[derive(Default)]
struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Value, AppError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    fn with(responses: Vec<Result<Value, AppError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, AppError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Value::Null))
    }
}

fn notes_page() -> Value {
    json!({
        "Data": [ { "Id": 1, "Title": "A" }, { "Id": 2, "Title": "B" } ],
        "Pagination": { "PageNumber": 1, "TotalItems": 2, "PageSize": 10 }
    })
}

fn titles(store: &CollectionStore<Note>) -> Vec<String> {
    store
        .snapshot()
        .collection
        .items
        .into_iter()
        .map(|n| n.title)
        .collect()
}

#[tokio::test]
async fn create_is_prepended_and_counted_without_refetch() {
    let transport = ScriptedTransport::with(vec![
        Ok(notes_page()),
        Ok(json!({ "success": true, "data": { "id": 3, "title": "C" } })),
    ]);
    let store: CollectionStore<Note> = CollectionStore::new(transport.clone(), 10);

    store.refresh().await.unwrap();
    store.create(&json!({ "Title": "C" })).await.unwrap();

    assert_eq!(titles(&store), vec!["C", "A", "B"]);
    assert_eq!(store.page_info().total_items, 3);
    let methods: Vec<Method> = transport.requests().into_iter().map(|r| r.method).collect();
    assert_eq!(methods, vec![Method::GET, Method::POST]);
}

#[tokio::test]
async fn failed_delete_leaves_page_untouched() {
    let transport = ScriptedTransport::with(vec![
        Ok(notes_page()),
        Err(AppError::Api {
            status: 409,
            message: "Note is referenced elsewhere".to_string(),
        }),
    ]);
    let store: CollectionStore<Note> = CollectionStore::new(transport, 10);

    store.refresh().await.unwrap();
    let err = store.delete(&RecordId::Int(1)).await.unwrap_err();

    assert!(matches!(err, AppError::Api { status: 409, .. }));
    let state = store.snapshot();
    assert_eq!(titles(&store), vec!["A", "B"]);
    assert_eq!(state.collection.page.total_items, 2);
    assert_eq!(state.error.as_deref(), Some("Note is referenced elsewhere"));
    assert!(store.inflight().is_empty());
}

#[tokio::test]
async fn subscribers_observe_loading_then_result() {
    let transport = ScriptedTransport::with(vec![Ok(notes_page())]);
    let store: CollectionStore<Note> = CollectionStore::new(transport, 10);
    let mut rx = store.subscribe();

    store.refresh().await.unwrap();

    assert!(rx.has_changed().unwrap());
    let state = rx.borrow_and_update().clone();
    assert!(!state.loading);
    assert_eq!(state.collection.items.len(), 2);
}

#[tokio::test]
async fn visible_filters_current_page_by_search_term() {
    let transport = ScriptedTransport::with(vec![Ok(notes_page()), Ok(notes_page())]);
    let store: CollectionStore<Note> = CollectionStore::new(transport.clone(), 10);

    store.refresh().await.unwrap();
    store.set_search("b").await.unwrap();

    let visible: Vec<String> = store.visible().into_iter().map(|n| n.title).collect();
    assert_eq!(visible, vec!["B"]);
    let last = transport.requests().pop().unwrap();
    assert!(last.query.contains(&("search".to_string(), "b".to_string())));
}

#[tokio::test]
async fn create_without_record_leaves_page_unchanged() {
    let transport = ScriptedTransport::with(vec![
        Ok(notes_page()),
        Ok(json!({ "success": true, "message": "Saved" })),
    ]);
    let store: CollectionStore<Note> = CollectionStore::new(transport.clone(), 10);

    store.refresh().await.unwrap();
    let err = store.create(&json!({ "Title": "C" })).await.unwrap_err();

    assert!(matches!(err, AppError::InternalError(_)));
    assert_eq!(titles(&store), vec!["A", "B"]);
    let state = store.snapshot();
    assert_eq!(state.collection.page.total_items, 2);
    assert!(!state.loading);
    assert!(state.error.is_some());
    let methods: Vec<Method> = transport.requests().into_iter().map(|r| r.method).collect();
    assert_eq!(methods, vec![Method::GET, Method::POST]);
}
