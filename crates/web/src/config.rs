//! Server configuration

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use testforge_runner::{CompletionConfig, ExecutorConfig};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP listen address
    pub listen: String,

    /// SQLite database path
    pub db_path: PathBuf,

    /// Completion service configuration
    pub completion: CompletionConfig,

    /// Runner configuration
    pub executor: ExecutorConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:5000".to_string(),
            db_path: testforge_common::default_db_path(),
            completion: CompletionConfig::default(),
            executor: ExecutorConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from file, falling back to defaults when it is absent
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file. The API key is never written.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`, skipping unset or blank values
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("TESTFORGE_WEB_ADDR") {
            self.listen = v;
        }
        if let Some(v) = get("TESTFORGE_DB_PATH") {
            self.db_path = PathBuf::from(v);
        }
        if let Some(v) = get("TESTFORGE_SCRATCH_DIR") {
            self.executor.scratch_dir = PathBuf::from(v);
        }
        if let Some(v) = get("OPENAI_API_KEY") {
            self.completion.api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_MODEL") {
            self.completion.model = v;
        }
        if let Some(v) = get("OPENAI_API_BASE") {
            self.completion.api_base = v;
        }
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listen
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid listen address '{}': {}", self.listen, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = ServerConfig::load(&tmp.path().join("absent.toml")).unwrap();

        assert_eq!(config.listen, "127.0.0.1:5000");
        assert_eq!(config.completion.model, "gpt-4");
        assert_eq!(config.completion.max_tokens, 2000);
        assert_eq!(config.executor.mocha_command, vec!["yarn", "mocha"]);
        assert!(config.completion.api_key.is_none());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
listen = "0.0.0.0:8080"

[executor]
jest_command = ["npx", "jest"]
working_dir = "/srv/app"
"#,
        )
        .unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.listen_addr().unwrap().port(), 8080);
        assert_eq!(config.executor.jest_command, vec!["npx", "jest"]);
        assert_eq!(config.executor.mocha_command, vec!["yarn", "mocha"]);
        assert_eq!(config.executor.working_dir, Some(PathBuf::from("/srv/app")));
        assert_eq!(config.completion.temperature, 0.7);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("TESTFORGE_DB_PATH", "/tmp/tf.db"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", " "),
        ]
        .into_iter()
        .collect();

        let mut config = ServerConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.db_path, PathBuf::from("/tmp/tf.db"));
        assert_eq!(config.completion.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.completion.model, "gpt-4");
    }

    #[test]
    fn test_save_omits_api_key() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.toml");
        let mut config = ServerConfig::default();
        config.completion.api_key = Some("sk-secret".to_string());

        config.save(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("sk-secret"));

        let reloaded = ServerConfig::load(&path).unwrap();
        assert!(reloaded.completion.api_key.is_none());
        assert_eq!(reloaded.listen, config.listen);
    }

    #[test]
    fn test_effective_config_survives_rewrite() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[executor]\nmocha_command = [\"npx\", \"mocha\"]\n").unwrap();

        let env: HashMap<&str, &str> = [
            ("TESTFORGE_WEB_ADDR", "0.0.0.0:7000"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("OPENAI_API_KEY", "sk-env"),
        ]
        .into_iter()
        .collect();
        let mut config = ServerConfig::load(&path).unwrap();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        config.db_path = PathBuf::from("/var/lib/testforge/state.db");
        config.save(&path).unwrap();

        let reloaded = ServerConfig::load(&path).unwrap();
        assert_eq!(reloaded.listen, "0.0.0.0:7000");
        assert_eq!(reloaded.db_path, PathBuf::from("/var/lib/testforge/state.db"));
        assert_eq!(reloaded.completion.model, "gpt-4o");
        assert_eq!(reloaded.executor.mocha_command, vec!["npx", "mocha"]);
        assert!(reloaded.completion.api_key.is_none());
    }

    #[test]
    fn test_invalid_listen_address() {
        let config = ServerConfig {
            listen: "not-an-address".to_string(),
            ..Default::default()
        };
        assert!(config.listen_addr().is_err());
    }
}
