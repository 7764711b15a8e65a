//! CLI module for the API dashboard backend
//!
//! - `serve`: HTTP API for the dashboard widgets
//! - `fetch`: one fetch through the configured cache and upstream, printed as JSON

pub mod fetch;
pub mod serve;

use clap::{Parser, Subcommand};

/// API Dashboard - cached weather and geolocation data
#[derive(Parser)]
#[command(name = "api-dashboard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Fetch provider data once and print it
    Fetch(fetch::FetchArgs),
}
