use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use shared::models::{ListQuery, Page};
use shared::normalize::{Normalize, unwrap_data};
use tokio_util::sync::CancellationToken;

use super::ResourceLoader;
use crate::error::{ApiError, ApiResult};
use crate::transport::ApiTransport;

/// A REST collection at `path`, e.g. `students`, with the usual
/// `GET path`, `GET path/{id}`, `POST path`, `PUT path/{id}` and
/// `DELETE path/{id}` endpoints. Every payload goes through [`Normalize`].
pub struct RestResource<T> {
    transport: Arc<dyn ApiTransport>,
    path: String,
    _item: PhantomData<fn() -> T>,
}

impl<T> Clone for RestResource<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            path: self.path.clone(),
            _item: PhantomData,
        }
    }
}

impl<T> fmt::Debug for RestResource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestResource").field("path", &self.path).finish_non_exhaustive()
    }
}

impl<T: Normalize> RestResource<T> {
    pub fn new(transport: Arc<dyn ApiTransport>, path: impl Into<String>) -> Self {
        Self {
            transport,
            path: path.into().trim_matches('/').to_string(),
            _item: PhantomData,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn transport(&self) -> &Arc<dyn ApiTransport> {
        &self.transport
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.path, id)
    }

    /// One page of the collection.
    ///
    /// # Errors
    /// Propagates transport errors.
    pub async fn list(&self, query: &ListQuery, cancel: &CancellationToken) -> ApiResult<Page<T>> {
        let raw = self
            .transport
            .get(&self.path, &query.to_query_pairs(), cancel)
            .await?;
        Ok(Page::normalize(&raw))
    }

    /// The whole collection, unpaginated.
    ///
    /// # Errors
    /// Propagates transport errors.
    pub async fn all(&self, cancel: &CancellationToken) -> ApiResult<Vec<T>> {
        let raw = self.transport.get(&self.path, &[], cancel).await?;
        Ok(Vec::normalize(&raw))
    }

    /// # Errors
    /// Propagates transport errors; a missing item is [`ApiError::NotFound`].
    pub async fn get(&self, id: &str, cancel: &CancellationToken) -> ApiResult<T> {
        let raw = self.transport.get(&self.item_path(id), &[], cancel).await?;
        Ok(T::normalize(unwrap_data(&raw)))
    }

    /// `POST` a new item. Returns the created item when the server echoes it.
    ///
    /// # Errors
    /// Propagates transport errors, including validation failures.
    pub async fn create<B: Serialize + Sync>(&self, body: &B) -> ApiResult<Option<T>> {
        let body = to_body(body)?;
        self.write(Method::POST, &self.path, Some(body)).await
    }

    /// `PUT` an update to an existing item.
    ///
    /// # Errors
    /// Propagates transport errors, including validation failures.
    pub async fn update<B: Serialize + Sync>(&self, id: &str, body: &B) -> ApiResult<Option<T>> {
        let body = to_body(body)?;
        self.write(Method::PUT, &self.item_path(id), Some(body)).await
    }

    /// # Errors
    /// Propagates transport errors.
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        self.transport
            .send(Method::DELETE, &self.item_path(id), None, &CancellationToken::new())
            .await
            .map(|_| ())
    }

    // Writes are never superseded, so they run under a token nobody cancels.
    async fn write(&self, method: Method, path: &str, body: Option<Value>) -> ApiResult<Option<T>> {
        let response = self
            .transport
            .send(method, path, body, &CancellationToken::new())
            .await?;
        Ok(response
            .filter(|raw| !unwrap_data(raw).is_null())
            .map(|raw| T::normalize(unwrap_data(&raw))))
    }
}

fn to_body<B: Serialize>(body: &B) -> ApiResult<Value> {
    serde_json::to_value(body).map_err(|err| ApiError::decode(format!("request body: {err}")))
}

/// Loads one page of a [`RestResource`] per [`ListQuery`].
#[derive(Debug, Clone)]
pub struct CollectionLoader<T>(pub RestResource<T>);

#[async_trait]
impl<T> ResourceLoader for CollectionLoader<T>
where
    T: Normalize + Clone + Send + Sync + 'static,
{
    type Args = ListQuery;
    type Output = Page<T>;

    async fn load(&self, args: ListQuery, cancel: CancellationToken) -> ApiResult<Page<T>> {
        self.0.list(&args, &cancel).await
    }
}

/// Loads a single item of a [`RestResource`] by id.
#[derive(Debug, Clone)]
pub struct ItemLoader<T>(pub RestResource<T>);

#[async_trait]
impl<T> ResourceLoader for ItemLoader<T>
where
    T: Normalize + Clone + Send + Sync + 'static,
{
    type Args = String;
    type Output = T;

    async fn load(&self, args: String, cancel: CancellationToken) -> ApiResult<T> {
        self.0.get(&args, &cancel).await
    }
}

/// Loads a whole unpaginated feed, such as the received-messages list.
#[derive(Debug, Clone)]
pub struct FeedLoader<T>(pub RestResource<T>);

#[async_trait]
impl<T> ResourceLoader for FeedLoader<T>
where
    T: Normalize + Clone + Send + Sync + 'static,
{
    type Args = ();
    type Output = Vec<T>;

    async fn load(&self, _args: (), cancel: CancellationToken) -> ApiResult<Vec<T>> {
        self.0.all(&cancel).await
    }
}
