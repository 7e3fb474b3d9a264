//! # Paginated List Controller
//!
//! A [`ResourceController`] specialised for `{data, meta, links}` pages.
//!
//! Pagination is owned by the server: every applied response rebuilds
//! [`PaginationState`] wholesale from the returned metadata. Changing any
//! filter resets the page to 1 immediately, before the refetch resolves.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use shared::models::{FilterSet, FilterValue, ListQuery, Page, PaginationState};
use shared::normalize::Normalize;
use tokio::sync::watch;
use tracing::{instrument, warn};

use crate::error::{ApiError, ApiResult};
use crate::resource::{
    CollectionLoader, MutationOutcome, ResourceController, ResourceState, ResourceStatus,
    RestResource, Ticket,
};

/// What a list screen renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView<T> {
    /// Rows of the last applied page.
    pub items: Vec<T>,
    /// Server-reported position, with the page reset applied eagerly.
    pub pagination: PaginationState,
    /// Filters of the current query.
    pub filters: FilterSet,
    /// A fetch is in flight.
    pub loading: bool,
    /// Error of the last failed fetch, cleared by the next success.
    pub error: Option<ApiError>,
}

struct ListState {
    query: ListQuery,
    pagination: PaginationState,
}

/// Paginated, filterable list over a [`RestResource`].
pub struct PaginatedListController<T>
where
    T: Normalize + Clone + Send + Sync + 'static,
{
    endpoint: RestResource<T>,
    resource: ResourceController<CollectionLoader<T>>,
    state: Mutex<ListState>,
}

impl<T> PaginatedListController<T>
where
    T: Normalize + Clone + Send + Sync + 'static,
{
    /// Create a list on page 1 with no filters. Nothing is fetched until
    /// [`load`](Self::load).
    pub fn new(endpoint: RestResource<T>, per_page: u32) -> Self {
        let query = ListQuery::first(per_page);
        let pagination = PaginationState::initial(query.page, query.per_page);
        let resource = ResourceController::new(endpoint.path(), CollectionLoader(endpoint.clone()));
        Self {
            endpoint,
            resource,
            state: Mutex::new(ListState { query, pagination }),
        }
    }

    /// Start from `filters` instead of an empty set.
    #[must_use]
    pub fn with_filters(self, filters: FilterSet) -> Self {
        self.state().query.filters = filters;
        self
    }

    fn state(&self) -> MutexGuard<'_, ListState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the current page/filter combination.
    ///
    /// # Errors
    /// See [`ResourceController::trigger`].
    pub async fn load(&self) -> ApiResult<Option<Page<T>>> {
        let ticket = {
            let state = self.state();
            self.resource.begin(state.query.clone())
        };
        self.fetch(ticket).await
    }

    #[instrument(
        name = "list.fetch",
        skip(self, ticket),
        fields(list = %self.endpoint.path(), page = ticket.as_ref().map(|t| t.args().page))
    )]
    async fn fetch(&self, ticket: Option<Ticket<ListQuery>>) -> ApiResult<Option<Page<T>>> {
        let Some(ticket) = ticket else {
            return Ok(None);
        };
        let generation = ticket.generation();
        let requested_per_page = ticket.args().per_page;
        let applied = self.resource.complete(ticket).await?;
        if let Some(page) = &applied {
            let pagination = PaginationState::from_meta(&page.meta, requested_per_page);
            if page.meta.last_page != pagination.last_page {
                warn!(
                    reported = page.meta.last_page,
                    computed = pagination.last_page,
                    "server last_page disagrees with total/per_page"
                );
            }
            let mut state = self.state();
            // A request started after this one settled owns the page now.
            if self.resource.generation() == generation {
                state.query.page = pagination.page;
                state.pagination = pagination;
            }
        }
        Ok(applied)
    }

    /// Start the request for the query in `state` before returning, while
    /// the lock is still held, so every older request is already stale.
    fn restart(
        &self,
        mut state: MutexGuard<'_, ListState>,
    ) -> impl Future<Output = ApiResult<Option<Page<T>>>> + Send + '_ {
        state.pagination.page = state.query.page;
        let ticket = self.resource.begin(state.query.clone());
        drop(state);
        self.fetch(ticket)
    }

    /// Replace every filter and go back to page 1.
    ///
    /// The reset and the new request both start before this returns, so
    /// [`pagination`](Self::pagination) reports page 1 while the refetch is
    /// pending and no older response can overwrite it.
    pub fn set_filters(
        &self,
        filters: FilterSet,
    ) -> impl Future<Output = ApiResult<Option<Page<T>>>> + Send + '_ {
        let mut state = self.state();
        state.query.filters = filters;
        state.query.page = 1;
        self.restart(state)
    }

    /// Set or unset one filter entry. Like [`set_filters`](Self::set_filters),
    /// this resets the page to 1.
    pub fn set_filter(
        &self,
        key: impl Into<String>,
        value: Option<FilterValue>,
    ) -> impl Future<Output = ApiResult<Option<Page<T>>>> + Send + '_ {
        let mut state = self.state();
        state.query.filters.set(key, value);
        state.query.page = 1;
        self.restart(state)
    }

    /// Go to page `page`. Only `page >= 1` is enforced; the upper bound is
    /// the server's business.
    pub fn set_page(
        &self,
        page: u32,
    ) -> impl Future<Output = ApiResult<Option<Page<T>>>> + Send + '_ {
        let mut state = self.state();
        state.query.page = page.max(1);
        self.restart(state)
    }

    /// Change the page size and go back to page 1.
    pub fn set_per_page(
        &self,
        per_page: u32,
    ) -> impl Future<Output = ApiResult<Option<Page<T>>>> + Send + '_ {
        let mut state = self.state();
        state.query.per_page = per_page.max(1);
        state.query.page = 1;
        self.restart(state)
    }

    /// Query that the next [`load`](Self::load) would send.
    #[must_use]
    pub fn query(&self) -> ListQuery {
        self.state().query.clone()
    }

    #[must_use]
    pub fn pagination(&self) -> PaginationState {
        self.state().pagination
    }

    #[must_use]
    pub fn filters(&self) -> FilterSet {
        self.state().query.filters.clone()
    }

    /// Rows of the last applied page.
    #[must_use]
    pub fn items(&self) -> Vec<T> {
        self.resource.value().map(|page| page.data).unwrap_or_default()
    }

    #[must_use]
    pub fn view(&self) -> ListView<T> {
        let resource = self.resource.view();
        let (pagination, filters) = {
            let state = self.state();
            (state.pagination, state.query.filters.clone())
        };
        ListView {
            items: resource.data.map(|page| page.data).unwrap_or_default(),
            pagination,
            filters,
            loading: resource.loading,
            error: resource.error,
        }
    }

    /// `true` when the last fetch came back empty on a page past the first,
    /// typically after deleting the only row of the trailing page. Stepping
    /// back is left to the caller.
    #[must_use]
    pub fn needs_step_back(&self) -> bool {
        let state = self.resource.state();
        state.status == ResourceStatus::Loaded
            && state
                .value
                .is_some_and(|page| self.pagination().is_past_end(page.data.len()))
    }

    /// Run a write and, if applied, refetch the current page and filters.
    ///
    /// # Errors
    /// Returns the write's error unless it is a validation failure.
    #[instrument(name = "list.mutate", skip(self, operation), fields(list = %self.endpoint.path()))]
    pub async fn mutate<R, F>(&self, operation: F) -> ApiResult<MutationOutcome<R>>
    where
        F: Future<Output = ApiResult<R>> + Send,
        R: Send,
    {
        let outcome = MutationOutcome::from_result(operation.await)?;
        if outcome.is_applied() {
            if let Err(err) = self.load().await {
                warn!(error = %err, "refetch after mutation failed");
            }
        }
        Ok(outcome)
    }

    /// # Errors
    /// See [`mutate`](Self::mutate).
    pub async fn create<B: Serialize + Sync>(
        &self,
        body: &B,
    ) -> ApiResult<MutationOutcome<Option<T>>> {
        self.mutate(self.endpoint.create(body)).await
    }

    /// # Errors
    /// See [`mutate`](Self::mutate).
    pub async fn update<B: Serialize + Sync>(
        &self,
        id: &str,
        body: &B,
    ) -> ApiResult<MutationOutcome<Option<T>>> {
        self.mutate(self.endpoint.update(id, body)).await
    }

    /// # Errors
    /// See [`mutate`](Self::mutate).
    pub async fn delete(&self, id: &str) -> ApiResult<MutationOutcome<()>> {
        self.mutate(self.endpoint.delete(id)).await
    }

    #[must_use]
    pub fn resource_state(&self) -> ResourceState<Page<T>> {
        self.resource.state()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<Page<T>>> {
        self.resource.subscribe()
    }

    /// Cancel any in-flight fetch and ignore later completions.
    pub fn dispose(&self) {
        self.resource.dispose();
    }
}
