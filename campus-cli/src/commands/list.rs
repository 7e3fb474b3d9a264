use anyhow::{Context, Result};
use client::{PaginatedListController, RestResource};
use serde_json::{Value, json};
use shared::config::ClientConfig;
use shared::models::{FilterSet, FilterValue, Session};
use tracing::warn;

use super::{print_json, transport};

/// Parse a `--filter key=value` argument.
pub fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

/// Typed filter value: booleans and integers are sent as such, an empty
/// string unsets the key.
fn filter_value(raw: &str) -> Option<FilterValue> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(flag) = raw.parse::<bool>() {
        return Some(FilterValue::Bool(flag));
    }
    if let Ok(number) = raw.parse::<i64>() {
        return Some(FilterValue::Integer(number));
    }
    Some(FilterValue::Text(raw.to_string()))
}

fn filter_set(filters: Vec<(String, String)>) -> FilterSet {
    filters
        .into_iter()
        .map(|(key, value)| (key, filter_value(&value)))
        .collect()
}

pub async fn run(
    config: &ClientConfig,
    session: &Session,
    resource: &str,
    page: u32,
    per_page: u32,
    filters: Vec<(String, String)>,
) -> Result<()> {
    let endpoint = RestResource::<Value>::new(transport(config, session)?, resource);
    let list = PaginatedListController::new(endpoint, per_page).with_filters(filter_set(filters));

    list.set_page(page)
        .await
        .with_context(|| format!("failed to list {resource}"))?;

    if list.needs_step_back() {
        warn!(page = list.pagination().page, "page is past the end of {resource}");
    }

    print_json(&json!({
        "data": list.items(),
        "pagination": list.pagination(),
        "filters": list.filters(),
    }))
}
