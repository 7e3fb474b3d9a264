//! # Resource Controller
//!
//! A stateful handle over a single remote resource. Every `trigger` starts a
//! new generation and cancels the previous in-flight request; a response is
//! only ever written to state if its generation is still the latest one when
//! it settles. Stale responses are discarded silently.
//!
//! State is published through a [`tokio::sync::watch`] channel so derived
//! views can tell whether anything changed since they last looked.

mod rest;

pub use rest::{CollectionLoader, FeedLoader, ItemLoader, RestResource};

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use shared::models::FieldErrors;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, warn};

use crate::error::{ApiError, ApiResult};

/// Performs the actual fetch for a [`ResourceController`].
///
/// `cancel` fires when the request is superseded or the controller is
/// disposed. Honouring it is optional.
#[async_trait]
pub trait ResourceLoader: Send + Sync + 'static {
    /// Arguments of one fetch, remembered for [`ResourceController::refresh`].
    type Args: Clone + Send + Sync + 'static;
    /// The loaded value.
    type Output: Clone + Send + Sync + 'static;

    /// Fetch the value for `args`.
    async fn load(&self, args: Self::Args, cancel: CancellationToken) -> ApiResult<Self::Output>;
}

/// Lifecycle of a resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResourceStatus {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// The latest request is in flight.
    Loading,
    /// The latest request succeeded.
    Loaded,
    /// The latest request failed; see [`ResourceState::error`].
    Failed,
}

/// Snapshot of a controller.
///
/// `value` survives failures: a failed refetch keeps the last good value and
/// records the error next to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    /// Last successfully loaded value.
    pub value: Option<T>,
    pub status: ResourceStatus,
    /// Error of the latest failed request, cleared on success.
    pub error: Option<ApiError>,
    /// Incremented on every trigger.
    pub generation: u64,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            value: None,
            status: ResourceStatus::Idle,
            error: None,
            generation: 0,
        }
    }
}

impl<T> ResourceState<T> {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status == ResourceStatus::Loading
    }
}

/// What a view renders: `{data, loading, error}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceView<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<ApiError>,
}

/// Result of a create/update/delete routed through a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome<R> {
    /// The server accepted the write; the resource has been refetched.
    Applied(R),
    /// The server rejected the payload field by field. Nothing was refetched.
    Invalid(FieldErrors),
}

impl<R> MutationOutcome<R> {
    /// Sort a write result into an outcome. Validation failures become
    /// [`MutationOutcome::Invalid`]; every other error is propagated.
    ///
    /// # Errors
    /// Returns any non-validation error of `result`.
    pub fn from_result(result: ApiResult<R>) -> ApiResult<Self> {
        match result {
            Ok(value) => Ok(Self::Applied(value)),
            Err(ApiError::Validation { errors, .. }) => Ok(Self::Invalid(errors)),
            Err(err) => Err(err),
        }
    }

    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// Field errors of a rejected write.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Applied(_) => None,
            Self::Invalid(errors) => Some(errors),
        }
    }
}

/// A request started by [`ResourceController::begin`] and not yet loaded.
///
/// Until it is completed the controller reports itself as loading.
#[must_use = "a started request stays loading until it is completed"]
#[derive(Debug)]
pub struct Ticket<A> {
    generation: u64,
    token: CancellationToken,
    args: A,
}

impl<A> Ticket<A> {
    /// Generation this request will settle under.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn args(&self) -> &A {
        &self.args
    }
}

struct Control<A> {
    last_args: Option<A>,
    in_flight: Option<CancellationToken>,
    disposed: bool,
}

/// Generation-gated controller over one [`ResourceLoader`].
pub struct ResourceController<L: ResourceLoader> {
    name: String,
    loader: Arc<L>,
    state: watch::Sender<ResourceState<L::Output>>,
    control: Mutex<Control<L::Args>>,
}

impl<L: ResourceLoader> ResourceController<L> {
    /// Create an idle controller. Nothing is fetched until [`trigger`](Self::trigger).
    pub fn new(name: impl Into<String>, loader: L) -> Self {
        let (state, _) = watch::channel(ResourceState::default());
        Self {
            name: name.into(),
            loader: Arc::new(loader),
            state,
            control: Mutex::new(Control {
                last_args: None,
                in_flight: None,
                disposed: false,
            }),
        }
    }

    /// Name used in log output.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn loader(&self) -> &L {
        &self.loader
    }

    fn control(&self) -> MutexGuard<'_, Control<L::Args>> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch with `args`, superseding any request still in flight.
    ///
    /// Returns `Ok(Some(value))` when this request was applied, `Ok(None)`
    /// when it was superseded, cancelled, or the controller was disposed
    /// before it settled.
    ///
    /// # Errors
    /// Returns the loader's error when this request is still the latest one
    /// when it fails. The error is also recorded in state.
    #[instrument(name = "resource.trigger", skip(self, args), fields(resource = %self.name))]
    pub async fn trigger(&self, args: L::Args) -> ApiResult<Option<L::Output>> {
        match self.begin(args) {
            Some(ticket) => self.complete(ticket).await,
            None => Ok(None),
        }
    }

    /// Start a request without loading it yet: bump the generation, cancel
    /// the previous token and remember `args`.
    ///
    /// From this point on every older request is stale, even one that
    /// resolves before the returned ticket is passed to
    /// [`complete`](Self::complete). Returns `None` once disposed.
    pub fn begin(&self, args: L::Args) -> Option<Ticket<L::Args>> {
        let mut control = self.control();
        if control.disposed {
            debug!(resource = %self.name, "request ignored on disposed controller");
            return None;
        }
        if let Some(previous) = control.in_flight.take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        control.in_flight = Some(token.clone());
        control.last_args = Some(args.clone());

        let mut generation = 0;
        self.state.send_modify(|state| {
            state.generation += 1;
            state.status = ResourceStatus::Loading;
            generation = state.generation;
        });
        Some(Ticket {
            generation,
            token,
            args,
        })
    }

    /// Load a request started by [`begin`](Self::begin) and settle it.
    ///
    /// # Errors
    /// See [`trigger`](Self::trigger).
    pub async fn complete(&self, ticket: Ticket<L::Args>) -> ApiResult<Option<L::Output>> {
        let Ticket {
            generation,
            token,
            args,
        } = ticket;
        let result = self.loader.load(args, token).await;
        self.settle(generation, result)
    }

    fn settle(
        &self,
        generation: u64,
        result: ApiResult<L::Output>,
    ) -> ApiResult<Option<L::Output>> {
        let mut control = self.control();
        let latest = self.state.borrow().generation;
        if control.disposed || generation != latest {
            debug!(generation, latest, "discarding stale response");
            return Ok(None);
        }
        control.in_flight = None;

        match result {
            Ok(value) => {
                self.state.send_modify(|state| {
                    state.value = Some(value.clone());
                    state.status = ResourceStatus::Loaded;
                    state.error = None;
                });
                Ok(Some(value))
            }
            Err(ApiError::Cancelled) => {
                // The transport gave up on the latest request without a newer
                // one taking over. Fall back to the last settled status.
                self.state.send_modify(|state| {
                    state.status = match (&state.error, &state.value) {
                        (Some(_), _) => ResourceStatus::Failed,
                        (None, Some(_)) => ResourceStatus::Loaded,
                        (None, None) => ResourceStatus::Idle,
                    };
                });
                Ok(None)
            }
            Err(err) => {
                error!(generation, error = %err, "fetch failed");
                self.state.send_modify(|state| {
                    state.status = ResourceStatus::Failed;
                    state.error = Some(err.clone());
                });
                Err(err)
            }
        }
    }

    /// Re-run the last arguments. A no-op returning `Ok(None)` if nothing was
    /// ever triggered.
    ///
    /// # Errors
    /// See [`trigger`](Self::trigger).
    pub async fn refresh(&self) -> ApiResult<Option<L::Output>> {
        let args = self.control().last_args.clone();
        match args {
            Some(args) => self.trigger(args).await,
            None => Ok(None),
        }
    }

    /// Run a write and, if the server accepted it, refetch with the last
    /// arguments.
    ///
    /// A failed refetch does not turn an applied write into an error; it is
    /// recorded in state like any other failed fetch.
    ///
    /// # Errors
    /// Returns the write's error unless it is a validation failure, which
    /// comes back as [`MutationOutcome::Invalid`].
    #[instrument(name = "resource.mutate", skip(self, operation), fields(resource = %self.name))]
    pub async fn mutate<R, F>(&self, operation: F) -> ApiResult<MutationOutcome<R>>
    where
        F: Future<Output = ApiResult<R>> + Send,
        R: Send,
    {
        let outcome = MutationOutcome::from_result(operation.await)?;
        if outcome.is_applied() {
            if let Err(err) = self.refresh().await {
                warn!(error = %err, "refetch after mutation failed");
            }
        }
        Ok(outcome)
    }

    /// Cancel any in-flight request and ignore every later completion.
    pub fn dispose(&self) {
        let mut control = self.control();
        control.disposed = true;
        if let Some(token) = control.in_flight.take() {
            token.cancel();
        }
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.control().disposed
    }

    /// Generation of the most recently started request.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    /// Current snapshot.
    #[must_use]
    pub fn state(&self) -> ResourceState<L::Output> {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn view(&self) -> ResourceView<L::Output> {
        let state = self.state.borrow();
        ResourceView {
            data: state.value.clone(),
            loading: state.is_loading(),
            error: state.error.clone(),
        }
    }

    #[must_use]
    pub fn value(&self) -> Option<L::Output> {
        self.state.borrow().value.clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<L::Output>> {
        self.state.subscribe()
    }
}

impl<L: ResourceLoader> Drop for ResourceController<L> {
    fn drop(&mut self) {
        self.dispose();
    }
}
