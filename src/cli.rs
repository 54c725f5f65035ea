use std::path::PathBuf;

use clap::Parser;

use crate::models::InstallKind;

#[derive(Parser, Debug)]
#[command(
    name = "update-checkr",
    about = "Validate a product license and check for updates against a license server",
    version
)]
pub struct Cli {
    /// Product id (slug) registered with the license server
    #[arg(long, value_name = "ID")]
    pub product_id: String,

    /// Human-readable product name, used in warnings
    #[arg(long, value_name = "NAME")]
    pub product_name: String,

    /// License server endpoint base URL
    #[arg(long, value_name = "URL")]
    pub endpoint: String,

    /// Installation kind
    #[arg(long, default_value = "plugin", value_name = "KIND")]
    pub kind: KindArg,

    /// Path to the plugin's main file (required with --kind plugin)
    #[arg(long, value_name = "FILE")]
    pub plugin_file: Option<PathBuf>,

    /// Installed artifact manifest
    #[arg(long, value_name = "FILE", default_value = "artifact.toml")]
    pub manifest: PathBuf,

    /// Credentials file [default: ./.update-checkr/credentials.toml, fallback ~/.config/update-checkr/credentials.toml]
    #[arg(long, value_name = "FILE")]
    pub credentials: Option<PathBuf>,

    /// Locale token passed through to notices; no effect on the check itself
    #[arg(long, value_name = "TOKEN")]
    pub locale: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 10, value_name = "SECS")]
    pub timeout: u64,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Only print the summary line
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum KindArg {
    Theme,
    Plugin,
}

impl From<&KindArg> for InstallKind {
    fn from(arg: &KindArg) -> Self {
        match arg {
            KindArg::Theme => InstallKind::Theme,
            KindArg::Plugin => InstallKind::Plugin,
        }
    }
}
