//! Check-config command - validates and prints the effective configuration

use crate::config::AppConfig;

/// Load the configuration and print it as JSON
pub fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}
