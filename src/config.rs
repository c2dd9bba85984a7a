use std::{fs, net::SocketAddr, path::Path, path::PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::StrategyKind;
use crate::layout::LayoutConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Directory holding `messages.json`.
    pub data_dir: PathBuf,
    /// Key required to delete all messages. Deletes are refused when unset.
    pub admin_key: Option<String>,
    pub strategy: StrategyKind,
    pub layout: LayoutConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_owned(),
            data_dir: PathBuf::from("data"),
            admin_key: None,
            strategy: StrategyKind::Spiral,
            layout: LayoutConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads `path` when given, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed reading {}", path.display()))?;
                serde_json::from_str::<Self>(&text)
                    .with_context(|| format!("invalid json in {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `PORT`, `BIND`, `DATA_DIR`, `ADMIN_KEY`, `LAYOUT_STRATEGY` and
    /// `LAYOUT_MAX_ATTEMPTS` from `lookup`. `BIND` wins over `PORT`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .with_context(|| format!("invalid PORT: {port}"))?;
            self.bind = format!("0.0.0.0:{port}");
        }
        if let Some(bind) = lookup("BIND") {
            self.bind = bind;
        }
        if let Some(dir) = lookup("DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(key) = lookup("ADMIN_KEY") {
            self.admin_key = (!key.is_empty()).then_some(key);
        }
        if let Some(strategy) = lookup("LAYOUT_STRATEGY") {
            self.strategy = serde_json::from_value(serde_json::Value::String(strategy.clone()))
                .with_context(|| format!("unknown LAYOUT_STRATEGY: {strategy}"))?;
        }
        if let Some(attempts) = lookup("LAYOUT_MAX_ATTEMPTS") {
            self.layout.max_attempts = attempts
                .trim()
                .parse()
                .with_context(|| format!("invalid LAYOUT_MAX_ATTEMPTS: {attempts}"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;
        if !self.layout.fits_canvas() {
            bail!("layout safe region lets cards run off the canvas");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind
            .parse()
            .with_context(|| format!("invalid bind address: {}", self.bind))
    }
}
