use colored::Colorize;
use serde::Serialize;

use crate::models::{InstallKind, UpdateDescriptor};

/// Outcome of one license check, ready for rendering.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub product: String,
    pub kind: InstallKind,
    /// Locale/text-domain token forwarded untouched for the host's notices.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    pub configured: bool,
    /// Raw status string reported by the server, when a response was parsed.
    pub status: Option<String>,
    pub active: bool,
    /// Normalized API failure, when the query did not produce license info.
    pub api_error: Option<String>,
    pub update: Option<UpdateDescriptor>,
    pub warning: Option<String>,
}

impl CheckReport {
    pub fn needs_attention(&self) -> bool {
        self.warning.is_some()
    }
}

/// Render a colored terminal report.
pub fn render(report: &CheckReport, quiet: bool) {
    if quiet {
        let status = report.status.as_deref().unwrap_or(if report.configured {
            "unknown"
        } else {
            "not configured"
        });
        let update = report
            .update
            .as_ref()
            .map_or("none".to_string(), |u| u.new_version.clone());
        println!("Status: {}  Update: {}", status, update);
        return;
    }

    println!(
        "\n {} v{}",
        "update-checkr".bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(" Product: {} ({})\n", report.product, report.kind);

    if !report.configured {
        println!(" {} No saved order id / domain", "⚠".yellow());
    } else if let Some(err) = &report.api_error {
        println!(" {} License check failed: {}", "✗".red(), err);
    } else if report.active {
        println!(" {} License: {}", "✓".green(), "active".green());
    } else {
        println!(
            " {} License: {}",
            "⚠".yellow(),
            report.status.as_deref().unwrap_or("unknown").yellow()
        );
    }

    match &report.update {
        Some(update) => {
            println!(
                " {} Update available: {} ({})",
                "↑".cyan(),
                update.new_version.bold(),
                update.package_url
            );
        }
        None => println!(" {} No update available", "·".dimmed()),
    }

    if let Some(warning) = &report.warning {
        println!("\n {} {}", "[WARN]".yellow().bold(), warning);
    }

    println!();
}
