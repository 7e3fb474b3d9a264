use anyhow::{Result, bail};
use shared::config::ClientConfig;

/// Prints the resolved configuration in the specified format.
///
/// # Arguments
/// * `format` - The output format ("yaml" or "json").
///
/// # Errors
/// Returns an error if the format is unsupported or serialization fails.
pub fn print_config(config: &ClientConfig, format: &str) -> Result<()> {
    let rendered = match format {
        "yaml" => serde_yml::to_string(config)?,
        "json" => serde_json::to_string_pretty(config)?,
        _ => bail!("Unsupported format. Use 'yaml' or 'json'."),
    };
    print!("{rendered}");
    if !rendered.ends_with('\n') {
        println!();
    }
    Ok(())
}
