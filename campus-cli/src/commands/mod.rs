pub mod config;
pub mod conversations;
pub mod list;
pub mod show;

use anyhow::{Context, Result};
use client::HttpTransport;
use serde::Serialize;
use shared::config::ClientConfig;
use shared::models::Session;
use std::sync::Arc;

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}

pub fn transport(config: &ClientConfig, session: &Session) -> Result<Arc<HttpTransport>> {
    let transport = HttpTransport::new(config, session).context("failed to build HTTP client")?;
    Ok(Arc::new(transport))
}
