use anyhow::Context;
use sofref_core::config::PluginConfig;
use std::path::{Path, PathBuf};

/// Read-only access to the JSON file naming the Sofer.ai and Sefaria endpoints.
///
/// The API key and transcription id are per-session form input and never live
/// in this file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fields missing from the file fall back to the public endpoints.
    pub fn load(&self) -> anyhow::Result<PluginConfig> {
        let bytes = std::fs::read(&self.path)
            .with_context(|| format!("read config: {}", self.path.display()))?;
        let cfg: PluginConfig = serde_json::from_slice(&bytes).context("decode config JSON")?;
        Ok(cfg)
    }

    /// Like [`ConfigStore::load`], but a missing file means "use the defaults".
    pub fn load_or_default(&self) -> anyhow::Result<PluginConfig> {
        if !self.path.exists() {
            log::info!(
                "no config at {}; using default endpoints",
                self.path.display()
            );
            return Ok(PluginConfig::default());
        }
        self.load()
    }
}
