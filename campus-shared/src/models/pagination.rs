use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Default page size when neither the caller nor the server supplies one.
pub const DEFAULT_PER_PAGE: u32 = 15;

/// Pagination metadata as reported by the server in `meta`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageMeta {
    pub current_page: u32,
    pub per_page: u32,
    pub total: u64,
    pub last_page: u32,
}

impl Default for PageMeta {
    fn default() -> Self {
        Self {
            current_page: 1,
            per_page: DEFAULT_PER_PAGE,
            total: 0,
            last_page: 1,
        }
    }
}

/// Navigation links returned alongside a page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// One page of a collection: `{data, meta, links}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
    pub links: PageLinks,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            meta: PageMeta::default(),
            links: PageLinks::default(),
        }
    }
}

/// Client pagination state, rebuilt wholesale from server metadata.
///
/// Invariant: `last_page == max(1, ceil(total / per_page))`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationState {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub last_page: u32,
}

impl PaginationState {
    /// Initial state before any response has been received.
    #[must_use]
    pub fn initial(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
            total: 0,
            last_page: 1,
        }
    }

    /// Build the state from server metadata.
    ///
    /// `total` and `per_page` are taken from the server; `last_page` is
    /// recomputed from them so the invariant holds even when the server's own
    /// `last_page` disagrees. A zero `per_page` from the server falls back to
    /// the page size that was requested.
    #[must_use]
    pub fn from_meta(meta: &PageMeta, requested_per_page: u32) -> Self {
        let per_page = if meta.per_page == 0 {
            requested_per_page.max(1)
        } else {
            meta.per_page
        };
        Self {
            page: meta.current_page.max(1),
            per_page,
            total: meta.total,
            last_page: last_page_for(meta.total, per_page),
        }
    }

    /// `true` if a page after the current one exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.last_page
    }

    /// `true` if a page before the current one exists.
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// `true` when the current page came back empty but is not the first one,
    /// which happens after deleting the last row of a trailing page.
    #[must_use]
    pub const fn is_past_end(&self, item_count: usize) -> bool {
        item_count == 0 && self.page > 1
    }
}

/// `max(1, ceil(total / per_page))`, saturating at `u32::MAX`.
#[must_use]
pub fn last_page_for(total: u64, per_page: u32) -> u32 {
    let per_page = u64::from(per_page.max(1));
    let pages = total.div_ceil(per_page).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// A scalar filter value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl Display for FilterValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FilterValue::Bool(value) => write!(f, "{}", if *value { 1 } else { 0 }),
            FilterValue::Integer(value) => write!(f, "{value}"),
            FilterValue::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Filter key to value; a `None` value means "unset" and is never sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterSet(BTreeMap<String, Option<FilterValue>>);

impl FilterSet {
    /// An empty filter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.set(key, Some(value.into()));
        self
    }

    /// Set or unset a single entry.
    pub fn set(&mut self, key: impl Into<String>, value: Option<FilterValue>) {
        self.0.insert(key.into(), value);
    }

    /// Value of a key, if set.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.0.get(key).and_then(Option::as_ref)
    }

    /// Entries with a value, in key order.
    pub fn active(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.0
            .iter()
            .filter_map(|(key, value)| value.as_ref().map(|value| (key.as_str(), value)))
    }

    /// `true` when no entry carries a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active().next().is_none()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<FilterValue>)> for FilterSet {
    fn from_iter<I: IntoIterator<Item = (K, Option<FilterValue>)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(key, value)| (key.into(), value)).collect())
    }
}

/// Arguments of a paginated collection fetch: `{page, perPage, ...filters}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub per_page: u32,
    pub filters: FilterSet,
}

impl ListQuery {
    /// First page with the given size and no filters.
    #[must_use]
    pub fn first(per_page: u32) -> Self {
        Self {
            page: 1,
            per_page: per_page.max(1),
            filters: FilterSet::new(),
        }
    }

    /// Query-string pairs: `page`, `per_page`, then every set filter.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("per_page".to_string(), self.per_page.to_string()),
        ];
        pairs.extend(
            self.filters
                .active()
                .map(|(key, value)| (key.to_string(), value.to_string())),
        );
        pairs
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::first(DEFAULT_PER_PAGE)
    }
}
