//! OpenAPI from types - Command-line tool for generating OpenAPI documentation.
//!
//! This binary indexes the type definitions of a Rust project and expands the
//! operations listed in a manifest into an OpenAPI 3.0 document.
//!
//! # Usage
//!
//! ```bash
//! openapi-from-types [OPTIONS] --manifest <FILE> <PROJECT_PATH>
//! ```
//!
//! # Examples
//!
//! Generate YAML documentation:
//! ```bash
//! openapi-from-types ./my-api-project -m openapi-manifest.yaml -o openapi.yaml
//! ```
//!
//! Generate JSON documentation, failing on unresolved schemas:
//! ```bash
//! openapi-from-types ./my-api-project -m openapi-manifest.yaml -f json --strict
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_from_types::cli;

fn main() -> Result<()> {
    // Parse once to read the verbose flag before the logger exists
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("OpenAPI from types starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;
    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}
