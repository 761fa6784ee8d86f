use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Plugin configuration.
///
/// ```yaml
/// path:
///   prefix: api
///   rewrites:
///     - regex: "^/internal/(.*)$"
///       replacement: "/$1"
/// domain:
///   rewrites:
///     - regex: "^(.+)\\.svc\\.cluster\\.local$"
///       replacement: "$1.example.com"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyCookieConfig {
    pub path: PathConfig,
    pub domain: DomainConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Segment prepended to every cookie path, without slashes (`api`, not `/api/`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rewrites: Vec<RewriteEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainConfig {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rewrites: Vec<RewriteEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteEntry {
    pub regex: String,
    #[serde(default)]
    pub replacement: String,
}

impl RewriteEntry {
    pub fn new(regex: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            regex: regex.into(),
            replacement: replacement.into(),
        }
    }
}

impl ProxyCookieConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("parse proxy-cookie yaml")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("parse proxy-cookie json")
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("parse proxy-cookie toml")
    }

    /// `.yaml`/`.yml` files are read as YAML, `.toml` as TOML, anything else
    /// as JSON.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config file: {}", path.display()))?;

        let parsed = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml(&text),
            Some("toml") => Self::from_toml(&text),
            _ => Self::from_json(&text),
        };
        parsed.with_context(|| format!("load config file: {}", path.display()))
    }

    pub fn is_empty(&self) -> bool {
        self.path.prefix.is_none() && self.path.rewrites.is_empty() && self.domain.rewrites.is_empty()
    }
}

pub const EXAMPLE_CONFIG: &str = r#"# proxy-cookie configuration example

path:
  # Prepended to every cookie path: "/" -> "/api", "/x" -> "/api/x"
  prefix: api
  # Applied in order after the prefix; each rule sees the previous output
  rewrites:
    - regex: "^/api/internal(/.*)?$"
      replacement: "/api$1"

domain:
  rewrites:
    - regex: "^\\.?([a-z0-9-]+)\\.svc\\.cluster\\.local$"
      replacement: "$1.example.com"
"#;
