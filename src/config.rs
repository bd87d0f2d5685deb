use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// The question-answering service the proxy forwards to.
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default = "default_ask_path")]
    pub ask_path: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_ask_path() -> String {
    "/ask".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl BackendConfig {
    /// Full URL of the ask endpoint.
    pub fn ask_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.ask_path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProxyConfig {
    pub bind: String,
}

/// Where the widgets send their queries.
#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
        }
    }
}

fn default_endpoint() -> String {
    "http://127.0.0.1:3000/api/chat".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_session_path")]
    pub path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            path: default_session_path(),
        }
    }
}

fn default_namespace() -> String {
    "startuptn".to_string()
}
fn default_session_path() -> PathBuf {
    PathBuf::from("./data/session.json")
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Validate backend
    if !is_http_url(&config.backend.base_url) {
        anyhow::bail!(
            "backend.base_url must be an http(s) URL, got '{}'",
            config.backend.base_url
        );
    }
    if !config.backend.ask_path.starts_with('/') {
        anyhow::bail!("backend.ask_path must start with '/'");
    }
    if config.backend.timeout_secs == 0 {
        anyhow::bail!("backend.timeout_secs must be > 0");
    }

    if config.proxy.bind.trim().is_empty() {
        anyhow::bail!("proxy.bind must not be empty");
    }

    if !is_http_url(&config.client.endpoint) {
        anyhow::bail!(
            "client.endpoint must be an http(s) URL, got '{}'",
            config.client.endpoint
        );
    }

    // Validate session
    let ns = &config.session.namespace;
    if ns.is_empty() || ns.chars().any(char::is_whitespace) {
        anyhow::bail!("session.namespace must be non-empty and contain no whitespace");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_src)?;
        validate(&config)?;
        Ok(config)
    }

    const MINIMAL: &str = r#"
[backend]
base_url = "http://localhost:8000/"

[proxy]
bind = "127.0.0.1:3000"
"#;

    #[test]
    fn test_defaults() {
        let cfg = parse(MINIMAL).unwrap();
        assert_eq!(cfg.backend.ask_url(), "http://localhost:8000/ask");
        assert_eq!(cfg.backend.timeout(), Duration::from_secs(30));
        assert_eq!(cfg.client.endpoint, "http://127.0.0.1:3000/api/chat");
        assert_eq!(cfg.session.namespace, "startuptn");
        assert_eq!(cfg.session.path, PathBuf::from("./data/session.json"));
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let err = parse(&MINIMAL.replace("http://localhost:8000/", "localhost:8000")).unwrap_err();
        assert!(err.to_string().contains("backend.base_url"));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let src = format!(
            "{}\n",
            MINIMAL.replace(
                "base_url = \"http://localhost:8000/\"",
                "base_url = \"http://localhost:8000\"\ntimeout_secs = 0",
            )
        );
        let err = parse(&src).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_rejects_namespace_with_spaces() {
        let src = format!("{}\n[session]\nnamespace = \"start up\"\n", MINIMAL);
        assert!(parse(&src).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/nonexistent/dockyard.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
