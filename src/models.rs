use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Whether the product using the client is installed as a theme or a plugin.
///
/// Affects how the locally installed version and the update-target slug are
/// resolved; the wire protocol is identical for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallKind {
    Theme,
    Plugin,
}

impl std::fmt::Display for InstallKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstallKind::Theme => write!(f, "theme"),
            InstallKind::Plugin => write!(f, "plugin"),
        }
    }
}

/// Identity of the installed product, fixed at construction time.
#[derive(Debug, Clone)]
pub struct LicenseIdentity {
    /// Product id (slug) registered with the license server.
    pub product_id: String,
    /// Human-readable product name, used when composing warnings.
    pub product_name: String,
    pub kind: InstallKind,
    /// Opaque locale/text-domain token forwarded to the host; the client
    /// itself never interprets it.
    pub locale: Option<String>,
    /// Path to the plugin's main descriptor file. Required for
    /// [`InstallKind::Plugin`], unused for themes.
    pub plugin_file: Option<PathBuf>,
}

/// Parsed license-server response.
///
/// Every field is optional: the server is free to omit any of them, and
/// downstream logic treats absence as a normal outcome rather than a parse
/// failure. The response carries exactly one version-like field, `version`,
/// meaning the latest available product version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseInfo {
    pub status: Option<String>,
    pub version: Option<String>,
    pub package_url: Option<String>,
    pub description_url: Option<String>,
    pub error: Option<String>,
}

impl LicenseInfo {
    /// True when the server reported the license as activated.
    pub fn is_active(&self) -> bool {
        self.status.as_deref() == Some("active")
    }
}

/// The minimal data a host update mechanism needs to offer a new package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateDescriptor {
    /// Update-target slug: the theme's template slug or the plugin's basename.
    pub slug: String,
    pub new_version: String,
    pub package_url: String,
}
