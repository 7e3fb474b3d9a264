use anyhow::{Context, Result};
use client::RestResource;
use client::resource::{ItemLoader, ResourceController};
use serde_json::Value;
use shared::config::ClientConfig;
use shared::models::Session;

use super::{print_json, transport};

pub async fn run(config: &ClientConfig, session: &Session, resource: &str, id: &str) -> Result<()> {
    let endpoint = RestResource::<Value>::new(transport(config, session)?, resource);
    let controller = ResourceController::new(resource, ItemLoader(endpoint));

    let record = controller
        .trigger(id.to_string())
        .await
        .with_context(|| format!("failed to fetch {resource}/{id}"))?;

    print_json(&record.unwrap_or(Value::Null))
}
