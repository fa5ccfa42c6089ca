use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

pub const DATA_DIR_KEY: &str = "data_dir";
pub const CATALOG_KEY: &str = "catalog";
pub const LOG_KEY: &str = "log";
pub const UNIT_KEY: &str = "unit";

/// Keys `curls config set` accepts.
pub const KNOWN_KEYS: [&str; 4] = [DATA_DIR_KEY, CATALOG_KEY, LOG_KEY, UNIT_KEY];

/// Flat key/value settings stored as TOML.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub map: BTreeMap<String, String>,
}

impl Config {
    /// `~/.config/curls/config.toml` (or the platform equivalent).
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join("curls").join("config.toml"))
            .context("Could not determine config directory")
    }

    /// A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let map = toml::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(Self { map })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = toml::to_string(&self.map)?;
        fs::write(path, content).with_context(|| format!("Failed to write config: {}", path.display()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    /// Where the database and workout files live.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match self.get(DATA_DIR_KEY) {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => dirs::data_dir()
                .map(|d| d.join("curls"))
                .context("Could not determine data directory"),
        }
    }

    /// Exercise database overriding the embedded one.
    pub fn catalog_path(&self) -> Option<PathBuf> {
        self.get(CATALOG_KEY).map(PathBuf::from)
    }

    pub fn log_filter(&self) -> &str {
        self.get(LOG_KEY).unwrap_or("warn")
    }

    pub fn unit(&self) -> &str {
        self.get(UNIT_KEY).unwrap_or("kg")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(&dir.path().join("config.toml")).unwrap();
        assert!(cfg.map.is_empty());
        assert_eq!(cfg.unit(), "kg");
        assert_eq!(cfg.log_filter(), "warn");
        assert!(cfg.catalog_path().is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.map.insert(UNIT_KEY.into(), "lb".into());
        cfg.map.insert(DATA_DIR_KEY.into(), "/tmp/curls data".into());
        cfg.save(&path).unwrap();

        let back = Config::load(&path).unwrap();
        assert_eq!(back, cfg);
        assert_eq!(back.unit(), "lb");
        assert_eq!(back.data_dir().unwrap(), PathBuf::from("/tmp/curls data"));
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "unit = [").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
