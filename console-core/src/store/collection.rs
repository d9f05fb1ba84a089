use super::Store;
use crate::envelope::{decode_list, decode_record};
use crate::error::AppError;
use crate::filter::{SortDirection, sort_by_key};
use crate::http::{ApiRequest, Transport};
use crate::inflight::InFlightRegistry;
use crate::pagination::{PageInfo, PageRequest, PagedCollection};
use crate::record::{Identified, RecordId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;
use validator::Validate;

/// A record type served from one REST collection endpoint.
pub trait Resource: Identified + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Short name used in logs and in-flight keys, e.g. `invoice`.
    const NAME: &'static str;
    /// Collection endpoint, e.g. `/invoices`.
    const PATH: &'static str;

    /// Client-side search over already-fetched records.
    fn matches(&self, term: &str) -> bool;

    fn item_path(id: &RecordId) -> String {
        format!("{}/{}", Self::PATH.trim_end_matches('/'), id)
    }
}

/// Paging, search and filters sent with a list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub page_size: u32,
    pub search: Option<String>,
    pub filters: BTreeMap<String, String>,
}

impl ListQuery {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            search: None,
            filters: BTreeMap::new(),
        }
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }

    pub fn to_request(&self, path: &str) -> ApiRequest {
        let mut request = ApiRequest::get(path)
            .query("page", self.page)
            .query("pageSize", self.page_size);
        if let Some(term) = self.search.as_deref().filter(|t| !t.trim().is_empty()) {
            request = request.query("search", term.trim());
        }
        for (key, value) in &self.filters {
            request = request.query(key.clone(), value);
        }
        request
    }
}

#[derive(Debug, Clone)]
pub struct CollectionState<R> {
    pub collection: PagedCollection<R>,
    /// The record open in a detail view, kept in sync with list updates.
    pub selected: Option<R>,
    pub query: ListQuery,
    pub loading: bool,
    pub error: Option<String>,
}

impl<R> CollectionState<R> {
    pub fn new(page_size: u32) -> Self {
        Self {
            collection: PagedCollection::default(),
            selected: None,
            query: ListQuery::new(page_size),
            loading: false,
            error: None,
        }
    }
}

/// CRUD store for one resource: fetches pages, reconciles mutations into the
/// current page without refetching, and turns every failure into `error`
/// state while leaving the list untouched.
pub struct CollectionStore<R: Resource> {
    transport: Arc<dyn Transport>,
    state: Store<CollectionState<R>>,
    inflight: InFlightRegistry,
}

impl<R: Resource> CollectionStore<R> {
    pub fn new(transport: Arc<dyn Transport>, page_size: u32) -> Self {
        Self::with_inflight(transport, page_size, InFlightRegistry::new())
    }

    pub fn with_inflight(
        transport: Arc<dyn Transport>,
        page_size: u32,
        inflight: InFlightRegistry,
    ) -> Self {
        Self {
            transport,
            state: Store::new(CollectionState::new(page_size)),
            inflight,
        }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn inflight(&self) -> &InFlightRegistry {
        &self.inflight
    }

    pub fn subscribe(&self) -> watch::Receiver<CollectionState<R>> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> CollectionState<R> {
        self.state.snapshot()
    }

    pub fn page_info(&self) -> PageInfo {
        self.state.read(|s| s.collection.page)
    }

    pub fn query(&self) -> ListQuery {
        self.state.read(|s| s.query.clone())
    }

    /// Fetch the page described by the current query.
    pub async fn refresh(&self) -> Result<(), AppError> {
        let query = self.query();
        self.begin();

        match self.transport.send(query.to_request(R::PATH)).await {
            Ok(body) => {
                let items: Vec<R> = decode_list(&body);
                let page = PageInfo::from_response(&body, query.page_request(), items.len());
                tracing::debug!(
                    resource = R::NAME,
                    page = page.page,
                    returned = items.len(),
                    total_items = page.total_items,
                    "Fetched page"
                );
                self.state.update(|s| {
                    s.collection = PagedCollection::new(items, page);
                    s.loading = false;
                });
                Ok(())
            }
            Err(e) => Err(self.record_failure("fetch", e)),
        }
    }

    pub async fn fetch_page(&self, page: u32) -> Result<(), AppError> {
        self.state.update(|s| s.query.page = page.max(1));
        self.refresh().await
    }

    /// Change the search term and go back to page 1.
    pub async fn set_search(&self, term: impl Into<String>) -> Result<(), AppError> {
        let term = term.into();
        self.state.update(|s| {
            s.query.search = if term.trim().is_empty() { None } else { Some(term) };
            s.query.page = 1;
        });
        self.refresh().await
    }

    /// Set (or with `None`, remove) a server-side filter and go back to page 1.
    pub async fn set_filter(
        &self,
        key: impl Into<String>,
        value: Option<String>,
    ) -> Result<(), AppError> {
        let key = key.into();
        self.state.update(|s| {
            match value {
                Some(v) => {
                    s.query.filters.insert(key, v);
                }
                None => {
                    s.query.filters.remove(&key);
                }
            }
            s.query.page = 1;
        });
        self.refresh().await
    }

    pub async fn clear_filters(&self) -> Result<(), AppError> {
        self.state.update(|s| {
            s.query.filters.clear();
            s.query.search = None;
            s.query.page = 1;
        });
        self.refresh().await
    }

    /// Fetch one record, open it as the selected record and refresh its row.
    pub async fn load(&self, id: &RecordId) -> Result<R, AppError> {
        self.begin();

        let result = async {
            let body = self.transport.send(ApiRequest::get(R::item_path(id))).await?;
            decode_record::<R>(&body)
        }
        .await;

        match result {
            Ok(record) => {
                self.state.update(|s| {
                    s.collection.replace_updated(record.clone());
                    s.selected = Some(record.clone());
                    s.loading = false;
                });
                Ok(record)
            }
            Err(e) => Err(self.record_failure("load", e)),
        }
    }

    pub fn select(&self, record: Option<R>) {
        self.state.update(|s| s.selected = record);
    }

    pub fn clear_error(&self) {
        self.state.update(|s| s.error = None);
    }

    /// Create a record and prepend it to the current page.
    pub async fn create<P>(&self, payload: &P) -> Result<R, AppError>
    where
        P: Serialize + Sync + ?Sized,
    {
        let operation = format!("{}.create", R::NAME);
        let _permit = self.inflight.acquire(&operation, None)?;
        self.begin();

        let result = async {
            let request = ApiRequest::post(R::PATH).json(payload)?;
            self.transport.send(request).await
        }
        .await;

        let body = match result {
            Ok(body) => body,
            Err(e) => return Err(self.record_failure("create", e)),
        };

        match saved_record::<R>(&body) {
            Some(record) => {
                tracing::info!(resource = R::NAME, id = ?record.record_id(), "Created record");
                self.state.update(|s| {
                    s.collection.insert_created(record.clone());
                    s.loading = false;
                });
                Ok(record)
            }
            None => {
                // Nothing to prepend; the page stays as it was.
                tracing::warn!(resource = R::NAME, "Create response carried no record, list left unchanged");
                Err(self.record_failure(
                    "create",
                    AppError::InternalError(anyhow::anyhow!(
                        "{} was created but the server returned no record",
                        R::NAME
                    )),
                ))
            }
        }
    }

    /// Update a record and replace it in the page and in the selection.
    pub async fn update<P>(&self, id: &RecordId, payload: &P) -> Result<R, AppError>
    where
        P: Serialize + Sync + ?Sized,
    {
        let operation = format!("{}.update", R::NAME);
        let _permit = self.inflight.acquire(&operation, Some(id))?;
        self.begin();

        let result = async {
            let request = ApiRequest::put(R::item_path(id)).json(payload)?;
            let body = self.transport.send(request).await?;
            match saved_record::<R>(&body) {
                Some(record) => Ok(record),
                // Some endpoints answer with only {Success, Message}.
                None => {
                    let body = self.transport.send(ApiRequest::get(R::item_path(id))).await?;
                    decode_record::<R>(&body)
                }
            }
        }
        .await;

        match result {
            Ok(record) => {
                tracing::info!(resource = R::NAME, id = %id, "Updated record");
                self.state.update(|s| {
                    s.collection.replace_updated(record.clone());
                    if s
                        .selected
                        .as_ref()
                        .and_then(|sel| sel.record_id())
                        .is_some_and(|sel| sel == id)
                    {
                        s.selected = Some(record.clone());
                    }
                    s.loading = false;
                });
                Ok(record)
            }
            Err(e) => Err(self.record_failure("update", e)),
        }
    }

    /// Validate `payload` locally and create it. Field errors are returned to
    /// the caller for inline display and never reach `error` state.
    pub async fn create_valid<P>(&self, payload: &P) -> Result<R, AppError>
    where
        P: Serialize + Validate + Sync,
    {
        payload.validate()?;
        self.create(payload).await
    }

    pub async fn update_valid<P>(&self, id: &RecordId, payload: &P) -> Result<R, AppError>
    where
        P: Serialize + Validate + Sync,
    {
        payload.validate()?;
        self.update(id, payload).await
    }

    /// Delete a record and drop it from the page.
    pub async fn delete(&self, id: &RecordId) -> Result<(), AppError> {
        let operation = format!("{}.delete", R::NAME);
        let _permit = self.inflight.acquire(&operation, Some(id))?;
        self.begin();

        match self.transport.send(ApiRequest::delete(R::item_path(id))).await {
            Ok(_) => {
                tracing::info!(resource = R::NAME, id = %id, "Deleted record");
                self.state.update(|s| {
                    s.collection.remove(id);
                    if s
                        .selected
                        .as_ref()
                        .and_then(|sel| sel.record_id())
                        .is_some_and(|sel| sel == id)
                    {
                        s.selected = None;
                    }
                    s.loading = false;
                });
                Ok(())
            }
            Err(e) => Err(self.record_failure("delete", e)),
        }
    }

    /// Records of the current page matching the search term, in server order.
    pub fn visible(&self) -> Vec<R> {
        self.state.read(|s| {
            let term = s.query.search.as_deref().unwrap_or("");
            s.collection
                .items
                .iter()
                .filter(|r| r.matches(term))
                .cloned()
                .collect()
        })
    }

    pub fn visible_sorted<K, F>(&self, direction: SortDirection, key: F) -> Vec<R>
    where
        F: FnMut(&R) -> K,
        K: Ord,
    {
        let mut records = self.visible();
        sort_by_key(&mut records, direction, key);
        records
    }

    /// Mark an action as started: `loading` on, previous error cleared.
    pub fn begin(&self) {
        self.state.update(|s| {
            s.loading = true;
            s.error = None;
        });
    }

    /// Put `error` into state for display and hand it back to the caller.
    pub fn record_failure(&self, action: &str, error: AppError) -> AppError {
        tracing::warn!(resource = R::NAME, action, error = %error, "Store action failed");
        let message = error.user_message();
        self.state.update(|s| {
            s.loading = false;
            s.error = Some(message);
        });
        error
    }
}

/// The record in a create/update response, if it has one with an id.
fn saved_record<R: Resource>(body: &Value) -> Option<R> {
    if !body.is_object() {
        return None;
    }
    decode_record::<R>(body)
        .ok()
        .filter(|record| record.record_id().is_some())
}
