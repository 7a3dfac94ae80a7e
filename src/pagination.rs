// src/pagination.rs
//! Filtered pagination controller.
//!
//! One `ListController` keeps a page of results in sync with a set of filter
//! criteria and a page cursor against a single list endpoint. Every mutation
//! issues a fresh request; when responses arrive out of order only the one
//! belonging to the newest request is applied.

use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::{debug, error};

use crate::core::ServiceClient;
use crate::error::PaginationError;
use crate::types::response::Paginated;
use crate::types::{Candidate, Job, Searchable};
use crate::utils::lock;

/// Filter value meaning "do not filter on this key".
pub const ANY_SENTINEL: &str = "any";

/// Which endpoint a controller lists and which filter keys it understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSpec {
    pub name: &'static str,
    pub endpoint: &'static str,
    pub filters: &'static [&'static str],
}

pub const JOBS: ResourceSpec = ResourceSpec {
    name: "jobs",
    endpoint: "/jobs",
    filters: &["experienceLevel", "city", "languageNames"],
};

pub const CANDIDATES: ResourceSpec = ResourceSpec {
    name: "candidates",
    endpoint: "/users/candidates",
    filters: &["bio", "city", "languageNames", "experienceLevel"],
};

impl ResourceSpec {
    pub fn accepts(&self, key: &str) -> bool {
        self.filters.contains(&key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStatus {
    Idle,
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
    pub status: ListStatus,
    pub criteria: BTreeMap<String, String>,
}

struct ListState<T> {
    criteria: BTreeMap<String, String>,
    page: u32,
    limit: u32,
    total: u64,
    items: Vec<T>,
    status: ListStatus,
    latest_request: u64,
}

/// `max(1, ceil(total / limit))`
pub fn total_pages(total: u64, limit: u32) -> u32 {
    let limit = u64::from(limit.max(1));
    let pages = total.div_ceil(limit).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

fn is_active(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !value.eq_ignore_ascii_case(ANY_SENTINEL)
}

/// `page` and `limit` first, then every active criterion in key order.
pub fn build_query(page: u32, limit: u32, criteria: &BTreeMap<String, String>) -> Vec<(String, String)> {
    let mut query = vec![
        ("page".to_string(), page.to_string()),
        ("limit".to_string(), limit.to_string()),
    ];
    query.extend(
        criteria
            .iter()
            .filter(|(_, value)| is_active(value))
            .map(|(key, value)| (key.clone(), value.trim().to_string())),
    );
    query
}

pub struct ListController<T> {
    client: ServiceClient,
    spec: ResourceSpec,
    state: Mutex<ListState<T>>,
}

pub type JobList = ListController<Job>;
pub type CandidateList = ListController<Candidate>;

impl<T> ListController<T>
where
    T: DeserializeOwned + Clone + Send + Sync,
{
    pub fn new(client: ServiceClient, spec: ResourceSpec, limit: u32) -> Self {
        let limit = limit.max(1);
        Self {
            client,
            spec,
            state: Mutex::new(ListState {
                criteria: BTreeMap::new(),
                page: 1,
                limit,
                total: 0,
                items: Vec::new(),
                status: ListStatus::Idle,
                latest_request: 0,
            }),
        }
    }

    /// Preset a criterion before the first fetch.
    pub fn with_filter(self, key: &str, value: &str) -> Result<Self, PaginationError> {
        self.check_key(key)?;
        lock(&self.state)
            .criteria
            .insert(key.to_string(), value.to_string());
        Ok(self)
    }

    pub fn spec(&self) -> &ResourceSpec {
        &self.spec
    }

    // ===== Reads =====

    pub fn items(&self) -> Vec<T> {
        lock(&self.state).items.clone()
    }

    pub fn page(&self) -> u32 {
        lock(&self.state).page
    }

    pub fn limit(&self) -> u32 {
        lock(&self.state).limit
    }

    pub fn total(&self) -> u64 {
        lock(&self.state).total
    }

    pub fn total_pages(&self) -> u32 {
        let state = lock(&self.state);
        total_pages(state.total, state.limit)
    }

    pub fn status(&self) -> ListStatus {
        lock(&self.state).status
    }

    pub fn criteria(&self) -> BTreeMap<String, String> {
        lock(&self.state).criteria.clone()
    }

    pub fn has_next_page(&self) -> bool {
        let state = lock(&self.state);
        state.page < total_pages(state.total, state.limit)
    }

    pub fn has_previous_page(&self) -> bool {
        lock(&self.state).page > 1
    }

    pub fn snapshot(&self) -> ListSnapshot<T> {
        let state = lock(&self.state);
        ListSnapshot {
            items: state.items.clone(),
            page: state.page,
            limit: state.limit,
            total: state.total,
            total_pages: total_pages(state.total, state.limit),
            status: state.status,
            criteria: state.criteria.clone(),
        }
    }

    /// Client-side narrowing of the loaded page; no request is made.
    pub fn search(&self, term: &str) -> Vec<T>
    where
        T: Searchable,
    {
        lock(&self.state)
            .items
            .iter()
            .filter(|item| item.matches(term))
            .cloned()
            .collect()
    }

    // ===== Mutations =====

    /// Changing what is searched for invalidates the position: page resets to 1.
    pub async fn set_filter(&self, key: &str, value: &str) -> Result<ListStatus, PaginationError> {
        self.check_key(key)?;
        {
            let mut state = lock(&self.state);
            state.criteria.insert(key.to_string(), value.to_string());
            state.page = 1;
        }
        Ok(self.refresh().await)
    }

    pub async fn clear_filters(&self) -> ListStatus {
        {
            let mut state = lock(&self.state);
            state.criteria.clear();
            state.page = 1;
        }
        self.refresh().await
    }

    pub async fn set_page(&self, page: u32) -> Result<ListStatus, PaginationError> {
        {
            let mut state = lock(&self.state);
            let last = total_pages(state.total, state.limit);
            if page < 1 || page > last {
                return Err(PaginationError::PageOutOfRange {
                    requested: page,
                    total_pages: last,
                });
            }
            state.page = page;
        }
        Ok(self.refresh().await)
    }

    pub async fn next_page(&self) -> Result<ListStatus, PaginationError> {
        let page = self.page().saturating_add(1);
        self.set_page(page).await
    }

    pub async fn previous_page(&self) -> Result<ListStatus, PaginationError> {
        let page = self.page().saturating_sub(1);
        self.set_page(page).await
    }

    pub async fn set_limit(&self, limit: u32) -> Result<ListStatus, PaginationError> {
        if limit < 1 {
            return Err(PaginationError::InvalidLimit);
        }
        {
            let mut state = lock(&self.state);
            state.limit = limit;
            state.page = 1;
        }
        Ok(self.refresh().await)
    }

    /// Fetch the current page for the current criteria.
    ///
    /// On success items, total, page and limit are replaced from the response
    /// (the server's echo wins over what was asked for). On failure the result
    /// set is emptied and the error logged; there is no retry. A response that
    /// belongs to a superseded request is dropped.
    pub async fn refresh(&self) -> ListStatus {
        let (sequence, query) = {
            let mut state = lock(&self.state);
            state.latest_request += 1;
            state.status = ListStatus::Loading;
            (
                state.latest_request,
                build_query(state.page, state.limit, &state.criteria),
            )
        };

        debug!("Fetching {} (request #{}): {:?}", self.spec.name, sequence, query);

        let result = self
            .client
            .get_with_query::<Paginated<T>>(self.spec.endpoint, query)
            .await;

        let mut state = lock(&self.state);
        if sequence != state.latest_request {
            debug!(
                "Discarding stale {} response #{} (latest is #{})",
                self.spec.name, sequence, state.latest_request
            );
            return state.status;
        }

        match result {
            Ok(response) => {
                let page = response.normalize(state.limit);
                state.items = page.items;
                state.total = page.total;
                state.page = page.page;
                state.limit = page.limit;
                state.status = ListStatus::Loaded;
            }
            Err(e) => {
                error!("Error fetching {}: {}", self.spec.name, e);
                state.items.clear();
                state.total = 0;
                state.status = ListStatus::Failed;
            }
        }
        state.status
    }

    fn check_key(&self, key: &str) -> Result<(), PaginationError> {
        if self.spec.accepts(key) {
            Ok(())
        } else {
            Err(PaginationError::UnknownFilter {
                resource: self.spec.name,
                key: key.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transport::{ApiRequest, ApiResponse, HttpTransport, Method};
    use crate::core::MockTransport;
    use crate::error::ApiError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::{mpsc, oneshot};

    fn jobs_page(ids: &[u64], page: u32, limit: u32, total: u64) -> serde_json::Value {
        let data: Vec<_> = ids
            .iter()
            .map(|id| json!({"id": id, "title": format!("Job {}", id), "city": "Cairo"}))
            .collect();
        json!({"data": data, "page": page, "limit": limit, "total": total})
    }

    fn controller(mock: &Arc<MockTransport>) -> JobList {
        ListController::new(ServiceClient::new(mock.clone()), JOBS, 10)
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(95, 10), 10);
        assert_eq!(total_pages(5, 0), 5);
    }

    #[test]
    fn test_build_query_omits_sentinel_and_blank() {
        let mut criteria = BTreeMap::new();
        criteria.insert("city".to_string(), "Cairo".to_string());
        criteria.insert("experienceLevel".to_string(), "any".to_string());
        criteria.insert("languageNames".to_string(), "  ".to_string());

        let query = build_query(2, 10, &criteria);
        assert_eq!(
            query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("limit".to_string(), "10".to_string()),
                ("city".to_string(), "Cairo".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_refresh_adopts_server_echo() {
        let mock = Arc::new(MockTransport::new());
        mock.respond_json(Method::Get, "/jobs", 200, jobs_page(&[1, 2], 1, 2, 7));

        let list = controller(&mock);
        assert_eq!(list.status(), ListStatus::Idle);
        assert_eq!(list.refresh().await, ListStatus::Loaded);

        let snap = list.snapshot();
        assert_eq!(snap.items.len(), 2);
        assert_eq!(snap.limit, 2);
        assert_eq!(snap.total, 7);
        assert_eq!(snap.total_pages, 4);
    }

    #[tokio::test]
    async fn test_set_filter_resets_page() {
        let mock = Arc::new(MockTransport::new());
        mock.respond_json(Method::Get, "/jobs", 200, jobs_page(&[1], 3, 10, 50));

        let list = controller(&mock);
        list.refresh().await;
        assert_eq!(list.page(), 3);

        list.set_filter("city", "Cairo").await.unwrap();
        let sent = mock.last_request().unwrap();
        assert_eq!(sent.query_value("page"), Some("1"));
        assert_eq!(sent.query_value("city"), Some("Cairo"));
    }

    #[tokio::test]
    async fn test_unknown_filter_rejected_without_request() {
        let mock = Arc::new(MockTransport::new());
        let list = controller(&mock);

        let err = list.set_filter("bio", "rust").await.unwrap_err();
        assert_eq!(
            err,
            PaginationError::UnknownFilter {
                resource: "jobs",
                key: "bio".into()
            }
        );
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_set_page_out_of_range() {
        let mock = Arc::new(MockTransport::new());
        mock.respond_json(Method::Get, "/jobs", 200, jobs_page(&[1], 1, 10, 25));

        let list = controller(&mock);
        list.refresh().await;
        assert_eq!(list.total_pages(), 3);

        assert_eq!(
            list.set_page(4).await.unwrap_err(),
            PaginationError::PageOutOfRange {
                requested: 4,
                total_pages: 3
            }
        );
        assert!(list.set_page(0).await.is_err());
        assert!(list.previous_page().await.is_err());
        assert_eq!(mock.requests().len(), 1);

        list.set_page(3).await.unwrap();
        assert_eq!(mock.last_request().unwrap().query_value("page"), Some("3"));
    }

    #[tokio::test]
    async fn test_failure_empties_results() {
        let mock = Arc::new(MockTransport::new());
        mock.respond_once(
            Method::Get,
            "/jobs",
            Ok(ApiResponse::json(200, &jobs_page(&[1, 2], 1, 10, 2))),
        )
        .respond(Method::Get, "/jobs", Err(ApiError::Network("down".into())));

        let list = controller(&mock);
        list.refresh().await;
        assert_eq!(list.items().len(), 2);

        assert_eq!(list.refresh().await, ListStatus::Failed);
        assert!(list.items().is_empty());
        assert_eq!(list.total(), 0);
        assert_eq!(list.total_pages(), 1);
    }

    #[tokio::test]
    async fn test_set_limit_validates_and_resets_page() {
        let mock = Arc::new(MockTransport::new());
        mock.respond_json(Method::Get, "/jobs", 200, json!({"data": []}));
        let list = controller(&mock);

        assert_eq!(list.set_limit(0).await.unwrap_err(), PaginationError::InvalidLimit);
        list.set_limit(25).await.unwrap();
        let sent = mock.last_request().unwrap();
        assert_eq!(sent.query_value("limit"), Some("25"));
        // Server echoed nothing: the requested size is kept
        assert_eq!(list.limit(), 25);
        assert_eq!(list.page(), 1);
    }

    #[tokio::test]
    async fn test_set_limit_adopts_server_echo() {
        let mock = Arc::new(MockTransport::new());
        mock.respond_json(Method::Get, "/jobs", 200, json!({"data": [], "limit": 50}));
        let list = controller(&mock);

        list.set_limit(25).await.unwrap();
        assert_eq!(list.limit(), 50);
    }

    #[tokio::test]
    async fn test_search_filters_loaded_page() {
        let mock = Arc::new(MockTransport::new());
        mock.respond_json(Method::Get, "/jobs", 200, jobs_page(&[1, 2, 12], 1, 10, 3));
        let list = controller(&mock);
        list.refresh().await;

        let hits: Vec<_> = list.search("job 1").into_iter().map(|j| j.id).collect();
        assert_eq!(hits.len(), 2);
        assert_eq!(list.search("").len(), 3);
    }

    /// Transport that parks each request until the test releases it.
    struct GatedTransport {
        pending: mpsc::UnboundedSender<(ApiRequest, oneshot::Sender<ApiResponse>)>,
    }

    #[async_trait]
    impl HttpTransport for GatedTransport {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
            let (tx, rx) = oneshot::channel();
            self.pending
                .send((request, tx))
                .map_err(|_| ApiError::Network("test driver gone".into()))?;
            rx.await
                .map_err(|_| ApiError::Network("response dropped".into()))
        }
    }

    #[tokio::test]
    async fn test_latest_request_wins_over_late_response() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let client = ServiceClient::new(Arc::new(GatedTransport { pending: tx }));
        let list: JobList = ListController::new(client, JOBS, 10);

        let driver = async {
            let (first, reply_first) = rx.recv().await.unwrap();
            let (second, reply_second) = rx.recv().await.unwrap();
            assert_eq!(first.query_value("city"), Some("Giza"));
            assert_eq!(second.query_value("city"), Some("Cairo"));

            // Newer request resolves first, stale one arrives afterwards
            reply_second
                .send(ApiResponse::json(200, &jobs_page(&[20], 1, 10, 1)))
                .unwrap();
            tokio::task::yield_now().await;
            reply_first
                .send(ApiResponse::json(200, &jobs_page(&[10, 11], 1, 10, 2)))
                .unwrap();
        };

        let (a, b, ()) = tokio::join!(
            list.set_filter("city", "Giza"),
            list.set_filter("city", "Cairo"),
            driver
        );
        assert!(a.is_ok() && b.is_ok());

        let snap = list.snapshot();
        assert_eq!(snap.status, ListStatus::Loaded);
        assert_eq!(snap.total, 1);
        assert_eq!(snap.items[0].id.as_str(), "20");
        assert_eq!(snap.criteria.get("city").map(String::as_str), Some("Cairo"));
    }
}
