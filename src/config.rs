use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use portwait::{DEFAULT_INTERVAL_SECS, PollConfig};

fn config_path() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("cannot determine home directory")?
        .join(".portwait");
    fs::create_dir_all(&dir)?;
    Ok(dir.join("config.toml"))
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Shell for completions (bash, zsh, fish)
    pub shell: Option<String>,
    /// Editor for `portwait config` (overrides $VISUAL/$EDITOR)
    pub editor: Option<String>,
    /// Seconds to keep polling before giving up
    pub timeout: u64,
    /// Seconds between probes
    pub interval: f64,
    /// Log every failed probe
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shell: None,
            editor: None,
            timeout: 0,
            interval: DEFAULT_INTERVAL_SECS,
            debug: false,
        }
    }
}

impl Config {
    /// Load config from ~/.portwait/config.toml, falling back to defaults.
    pub fn load() -> Self {
        match config_path() {
            Ok(p) => Self::load_from(&p),
            Err(_) => Self::default(),
        }
    }

    /// Load config from `path`; a missing or unparsable file yields defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Build the poll settings, letting command-line values win.
    pub fn poll_config(
        &self,
        timeout: Option<&str>,
        interval: Option<f64>,
        debug: bool,
    ) -> Result<PollConfig> {
        let interval = interval.unwrap_or(self.interval);
        let cfg = match timeout {
            Some(t) => PollConfig::parse(t, interval)?,
            None => PollConfig::new(self.timeout, interval)?,
        };
        Ok(cfg.with_debug(debug || self.debug))
    }

    /// Resolve which editor to use: config > $VISUAL > $EDITOR > vi
    pub fn resolve_editor(&self) -> String {
        if let Some(ref e) = self.editor {
            return e.clone();
        }
        std::env::var("VISUAL")
            .or_else(|_| std::env::var("EDITOR"))
            .unwrap_or_else(|_| "vi".to_string())
    }

    /// Write a default config file if none exists. Returns the path.
    pub fn init() -> Result<PathBuf> {
        let path = config_path()?;
        Self::init_at(&path)?;
        Ok(path)
    }

    fn init_at(path: &Path) -> Result<()> {
        if path.exists() {
            return Ok(());
        }
        let content = toml::to_string_pretty(&Self::default())
            .context("failed to serialize default config")?;
        fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("config.toml"));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "timeout = 30\n").unwrap();
        let cfg = Config::load_from(&path);
        assert_eq!(cfg.timeout, 30);
        assert_eq!(cfg.interval, DEFAULT_INTERVAL_SECS);
        assert!(!cfg.debug);
    }

    #[test]
    fn malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "timeout = \"soon\"").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn init_writes_loadable_defaults_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config::init_at(&path).unwrap();
        assert_eq!(Config::load_from(&path), Config::default());

        fs::write(&path, "timeout = 7\n").unwrap();
        Config::init_at(&path).unwrap();
        assert_eq!(Config::load_from(&path).timeout, 7);
    }

    #[test]
    fn flags_override_file_values() {
        let cfg = Config {
            timeout: 10,
            interval: 1.0,
            ..Config::default()
        };
        let poll = cfg.poll_config(Some("3"), Some(0.5), true).unwrap();
        assert_eq!(poll.timeout, Duration::from_secs(3));
        assert_eq!(poll.interval, Duration::from_millis(500));
        assert!(poll.debug);

        let poll = cfg.poll_config(None, None, false).unwrap();
        assert_eq!(poll.timeout, Duration::from_secs(10));
        assert_eq!(poll.interval, Duration::from_secs(1));
        assert!(!poll.debug);
    }

    #[test]
    fn bad_timeout_flag_is_an_error() {
        assert!(Config::default().poll_config(Some("abc"), None, false).is_err());
    }

    #[test]
    fn editor_from_config_wins() {
        let cfg = Config {
            editor: Some("nano".into()),
            ..Config::default()
        };
        assert_eq!(cfg.resolve_editor(), "nano");
    }
}
