//! CLI module for the Contacts ETag API
//!
//! Provides subcommands:
//! - `serve`: run the HTTP server (default)
//! - `check-config`: load, validate and print the effective configuration

pub mod check_config;
pub mod serve;

use clap::{Parser, Subcommand};

/// Contacts API with ETag-based conditional caching
#[derive(Parser)]
#[command(name = "contacts-etag-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve(serve::ServeArgs),

    /// Validate configuration and print the effective settings
    CheckConfig,
}
