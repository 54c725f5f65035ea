use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;

/// Store key for the purchase order id.
pub const ORDER_ID_KEY: &str = "license_order_id";
/// Store key for the domain the license was registered for.
pub const DOMAIN_KEY: &str = "license_domain";

/// Read-only view of the host's settings storage.
///
/// The client only ever reads two keys ([`ORDER_ID_KEY`], [`DOMAIN_KEY`]);
/// how and where the host persists them is its own business.
pub trait CredentialStore: Send + Sync {
    fn read(&self, key: &str) -> Option<String>;
}

/// The saved order id / domain pair.
///
/// Both values must be present (and non-empty) for a license query to be
/// attempted; partial presence is treated as absence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    pub order_id: String,
    pub domain: String,
}

impl StoredCredentials {
    pub fn load(store: &dyn CredentialStore) -> Option<Self> {
        let order_id = store.read(ORDER_ID_KEY).filter(|v| !v.is_empty())?;
        let domain = store.read(DOMAIN_KEY).filter(|v| !v.is_empty())?;
        Some(Self { order_id, domain })
    }
}

/// Credential store backed by a flat TOML table of string values.
#[derive(Debug, Default)]
pub struct FileStore {
    values: HashMap<String, String>,
}

impl FileStore {
    /// Load credentials, searching in order:
    ///
    /// 1. `override_path` — path passed via `--credentials`
    /// 2. `<project_path>/.update-checkr/credentials.toml`
    /// 3. `~/.config/update-checkr/credentials.toml`
    ///
    /// A missing file yields an empty store: an unconfigured installation is
    /// a normal state, not an error. A file that exists but fails to parse is
    /// an error.
    pub fn load(project_path: &Path, override_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = override_path {
            return Self::from_file(path);
        }

        let project_file = project_path.join(".update-checkr").join("credentials.toml");
        if project_file.exists() {
            return Self::from_file(&project_file);
        }

        if let Some(home) = dirs::home_dir() {
            let home_file = home
                .join(".config")
                .join("update-checkr")
                .join("credentials.toml");
            if home_file.exists() {
                return Self::from_file(&home_file);
            }
        }

        Ok(Self::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let values: HashMap<String, String> = toml::from_str(&content)?;
        Ok(Self { values })
    }
}

impl CredentialStore for FileStore {
    fn read(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}
