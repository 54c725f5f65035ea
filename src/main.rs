//! `update-checkr` — validate a product license and check for updates.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]).
//! 2. Load saved credentials ([`config::FileStore`]).
//! 3. Build the HTTP transport and the installed-artifact lookup.
//! 4. Construct the [`client::LicenseClient`] (fails fast on a plugin setup
//!    with no plugin file).
//! 5. Query the license endpoint, resolve an update descriptor, and decide
//!    whether a configuration warning is needed.
//! 6. Render the requested report ([`report`]).
//! 7. Exit `0` (active and configured) or `1` (warning needed).

mod cli;
mod client;
mod config;
mod error;
mod lookup;
mod models;
mod report;
mod transport;
mod version;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, ReportFormat};
use client::LicenseClient;
use config::FileStore;
use lookup::FsLookup;
use models::{InstallKind, LicenseIdentity};
use report::CheckReport;
use transport::ReqwestTransport;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let kind: InstallKind = (&cli.kind).into();

    let store = FileStore::load(Path::new("."), cli.credentials.as_deref())?;
    let transport = ReqwestTransport::new(Duration::from_secs(cli.timeout))?;
    let lookup = FsLookup::new(kind, cli.manifest.clone(), cli.plugin_file.clone());

    let identity = LicenseIdentity {
        product_id: cli.product_id,
        product_name: cli.product_name,
        kind,
        locale: cli.locale,
        plugin_file: cli.plugin_file,
    };

    let client = LicenseClient::new(
        identity,
        &cli.endpoint,
        Box::new(store),
        Box::new(transport),
        Box::new(lookup),
    )?;

    let configured = client.is_configured();
    let (status, active, api_error) = match client.fetch_license_info().await {
        Ok(Some(info)) => (info.status.clone(), info.is_active(), None),
        Ok(None) => (None, false, None),
        Err(err) => (None, false, Some(err.to_string())),
    };

    let update = client.resolve_update_descriptor().await?;

    let warning = if client.needs_configuration_warning().await {
        Some(format!(
            "Enter a valid order id and domain to activate {}. \
             Save them to .update-checkr/credentials.toml to complete the setup.",
            client.identity().product_name
        ))
    } else {
        None
    };

    let check = CheckReport {
        product: client.identity().product_name.clone(),
        kind,
        locale: client.identity().locale.clone(),
        configured,
        status,
        active,
        api_error,
        update,
        warning,
    };

    match cli.report {
        ReportFormat::Terminal => report::render(&check, cli.quiet),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&check)?),
    }

    if check.needs_attention() {
        std::process::exit(1);
    }

    Ok(())
}
