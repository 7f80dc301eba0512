use std::collections::HashSet;
use std::env;
use std::path::Path;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const DEFAULT_PREDICT_ORIGIN: &str = "http://127.0.0.1:8000";
pub const PREDICT_PATH: &str = "/predict-image";

/// Forwards every request under `source` to the same trailing path under
/// `destination`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteRule {
    pub source: String,
    pub destination: String,
}

impl RewriteRule {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Upstream URL for `suffix`, the still percent-encoded part of the
    /// request path after `source`, carrying `query` over unchanged.
    pub fn target(&self, suffix: &str, query: Option<&str>) -> String {
        let mut target = format!(
            "{}/{}",
            self.destination.trim_end_matches('/'),
            suffix.trim_start_matches('/')
        );
        if let Some(query) = query {
            target.push('?');
            target.push_str(query);
        }
        target
    }
}

/// A remote host allowed to serve images into the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePattern {
    pub protocol: String,
    pub hostname: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default = "any_path")]
    pub pathname: String,
}

fn any_path() -> String {
    "**".to_string()
}

impl RemotePattern {
    pub fn new(protocol: &str, hostname: &str, port: Option<u16>) -> Self {
        Self {
            protocol: protocol.to_string(),
            hostname: hostname.to_string(),
            port,
            pathname: any_path(),
        }
    }

    pub fn matches(&self, url: &Url) -> bool {
        if url.scheme() != self.protocol {
            return false;
        }
        if url.host_str() != Some(self.hostname.as_str()) {
            return false;
        }
        if let Some(port) = self.port {
            if url.port_or_known_default() != Some(port) {
                return false;
            }
        }
        match self.pathname.as_str() {
            "**" => true,
            pattern => match pattern.strip_suffix("/**") {
                Some(prefix) => {
                    url.path() == prefix || url.path().starts_with(&format!("{prefix}/"))
                }
                None => url.path() == pattern,
            },
        }
    }
}

/// Optional TOML overrides for the static parts of the configuration.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    rewrites: Option<Vec<RewriteRule>>,
    remote_patterns: Option<Vec<RemotePattern>>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Origin image paths from prediction results are resolved against.
    pub backend_origin: String,
    /// Origin serving `POST /predict-image`.
    pub predict_origin: String,
    pub rewrites: Vec<RewriteRule>,
    pub remote_patterns: Vec<RemotePattern>,
}

impl AppConfig {
    pub fn new(backend_origin: impl Into<String>) -> Result<Self> {
        Self::with_predict_origin(backend_origin, DEFAULT_PREDICT_ORIGIN)
    }

    pub fn with_predict_origin(
        backend_origin: impl Into<String>,
        predict_origin: impl Into<String>,
    ) -> Result<Self> {
        let backend_origin = normalize_origin(backend_origin.into(), "BACKEND_URL")?;
        let predict_origin = normalize_origin(predict_origin.into(), "PREDICT_URL")?;

        Ok(Self {
            rewrites: vec![RewriteRule::new(
                "/saved_images",
                format!("{predict_origin}/saved_images"),
            )],
            remote_patterns: vec![
                RemotePattern::new("http", "localhost", Some(8000)),
                RemotePattern::new("http", "127.0.0.1", Some(8000)),
            ],
            backend_origin,
            predict_origin,
        })
    }

    /// Reads `BACKEND_URL` (required) and `PREDICT_URL` (optional).
    pub fn from_env() -> Result<Self> {
        let backend_origin = env::var("BACKEND_URL")
            .map_err(|_| AppError::Config("BACKEND_URL must be set".to_string()))?;
        let predict_origin =
            env::var("PREDICT_URL").unwrap_or_else(|_| DEFAULT_PREDICT_ORIGIN.to_string());
        Self::with_predict_origin(backend_origin, predict_origin)
    }

    /// Replaces rewrites and/or remote patterns with those found in a TOML file.
    pub fn merge_file(mut self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;

        if let Some(rewrites) = file.rewrites {
            validate_rewrites(&rewrites)?;
            self.rewrites = rewrites;
        }
        if let Some(patterns) = file.remote_patterns {
            self.remote_patterns = patterns;
        }
        Ok(self)
    }

    pub fn predict_url(&self) -> String {
        format!("{}{}", self.predict_origin, PREDICT_PATH)
    }

    pub fn is_image_allowed(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(url) => self.remote_patterns.iter().any(|p| p.matches(&url)),
            Err(_) => false,
        }
    }
}

/// Each source becomes a `{source}/*path` route, so it must be a distinct,
/// non-root absolute path free of route syntax.
pub(crate) fn validate_rewrites(rules: &[RewriteRule]) -> Result<()> {
    let mut seen = HashSet::new();
    for rule in rules {
        let source = rule.source.trim_end_matches('/');
        if !source.starts_with('/') {
            return Err(AppError::Config(format!(
                "rewrite source must be a non-root absolute path: {}",
                rule.source
            )));
        }
        if source.contains(['*', ':', '{', '}']) {
            return Err(AppError::Config(format!(
                "rewrite source must not contain route syntax (*, :, {{, }}): {}",
                rule.source
            )));
        }
        if !seen.insert(source) {
            return Err(AppError::Config(format!(
                "duplicate rewrite source: {}",
                rule.source
            )));
        }
    }
    Ok(())
}

fn normalize_origin(origin: String, name: &str) -> Result<String> {
    let trimmed = origin.trim().trim_end_matches('/').to_string();
    let url = Url::parse(&trimmed)
        .map_err(|e| AppError::Config(format!("{name} is not a valid URL ({trimmed}): {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(AppError::Config(format!(
            "{name} must be an http(s) origin: {trimmed}"
        )));
    }
    Ok(trimmed)
}
