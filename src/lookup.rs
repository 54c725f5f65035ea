use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::InstallKind;

/// Metadata of the locally installed artifact, read from its manifest.
#[derive(Debug, Deserialize)]
struct ArtifactManifest {
    version: String,
    /// Theme template slug. Optional; themes without one fall back to the
    /// manifest's directory name.
    #[serde(default)]
    template: Option<String>,
}

/// Looks up the locally installed version and the update-target slug.
pub trait InstallLookup: Send + Sync {
    fn installed_version(&self) -> Result<String>;
    fn target_slug(&self) -> Result<String>;
}

/// Filesystem-backed lookup over a small TOML artifact manifest.
pub struct FsLookup {
    kind: InstallKind,
    manifest_path: PathBuf,
    plugin_file: Option<PathBuf>,
}

impl FsLookup {
    pub fn new(kind: InstallKind, manifest_path: PathBuf, plugin_file: Option<PathBuf>) -> Self {
        Self {
            kind,
            manifest_path,
            plugin_file,
        }
    }

    fn manifest(&self) -> Result<ArtifactManifest> {
        let content = std::fs::read_to_string(&self.manifest_path).with_context(|| {
            format!(
                "cannot read artifact manifest {}",
                self.manifest_path.display()
            )
        })?;
        let manifest = toml::from_str(&content).with_context(|| {
            format!(
                "invalid artifact manifest {}",
                self.manifest_path.display()
            )
        })?;
        Ok(manifest)
    }
}

impl InstallLookup for FsLookup {
    fn installed_version(&self) -> Result<String> {
        Ok(self.manifest()?.version)
    }

    fn target_slug(&self) -> Result<String> {
        match self.kind {
            InstallKind::Theme => {
                let manifest = self.manifest()?;
                if let Some(template) = manifest.template {
                    return Ok(template);
                }
                self.manifest_path
                    .parent()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .context("theme manifest has no template and no parent directory")
            }
            InstallKind::Plugin => {
                let file = self
                    .plugin_file
                    .as_deref()
                    .context("plugin lookup has no plugin file path")?;
                Ok(plugin_slug(file))
            }
        }
    }
}

/// Derive a plugin's slug from the path of its main descriptor file: the
/// name of the directory holding the file, or the file stem for a bare file.
///
/// `post-subdomain-pro/main.php` -> `post-subdomain-pro`
pub fn plugin_slug(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .or_else(|| path.file_stem())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
