//! YAML configuration for the `volley` binary.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use volley_core::{
    BatchCoordinator, CoordinatorConfig, EngineConfig, JsonFileCredentialSource, RegionClass,
    RequestDefaults, RouteTable, DEFAULT_REGION_CODE,
};
use volley_http::{HttpExecutorConfig, HttpRequestExecutor};
use volley_observability::LogConfig;

/// Upstream endpoint and credential file for one routing class.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    pub endpoint: String,
    pub credentials: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Routes {
    pub india: RouteConfig,
    pub americas: RouteConfig,
    pub global: RouteConfig,
}

impl Routes {
    pub fn get(&self, class: RegionClass) -> &RouteConfig {
        match class {
            RegionClass::India => &self.india,
            RegionClass::Americas => &self.americas,
            RegionClass::Global => &self.global,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct VolleyConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_region")]
    pub default_region: String,
    #[serde(default = "default_target")]
    pub default_target: u64,
    #[serde(default = "default_concurrency")]
    pub default_concurrency: u64,
    #[serde(default = "default_concurrency_ceiling")]
    pub concurrency_ceiling: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub accept_invalid_certs: bool,
    /// `null` or `0` disables progress logging.
    #[serde(default = "default_status_log_interval_ms")]
    pub status_log_interval_ms: Option<u64>,
    #[serde(default)]
    pub max_attempts: Option<u64>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub routes: Routes,
    #[serde(default)]
    pub logging: LogConfig,
}

fn default_bind() -> String { "0.0.0.0:9000".into() }
fn default_region() -> String { DEFAULT_REGION_CODE.into() }
fn default_target() -> u64 { 1_000 }
fn default_concurrency() -> u64 { 500 }
fn default_concurrency_ceiling() -> u64 { 5_000 }
fn default_request_timeout_ms() -> u64 { 8_000 }
fn default_status_log_interval_ms() -> Option<u64> { Some(2_000) }

impl VolleyConfig {
    /// Read and parse a config file. Relative credential paths are resolved
    /// against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config = Self::parse(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    fn resolve_paths(&mut self, base: &Path) {
        for route in [
            &mut self.routes.india,
            &mut self.routes.americas,
            &mut self.routes.global,
        ] {
            if route.credentials.is_relative() {
                route.credentials = base.join(&route.credentials);
            }
        }
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            defaults: RequestDefaults {
                region: self.default_region.clone(),
                target: self.default_target,
                concurrency: self.default_concurrency,
            },
            concurrency_ceiling: self.concurrency_ceiling,
            engine: EngineConfig {
                status_log_interval: self
                    .status_log_interval_ms
                    .filter(|ms| *ms > 0)
                    .map(Duration::from_millis),
                max_attempts: self.max_attempts,
            },
        }
    }

    fn executor_config(&self) -> HttpExecutorConfig {
        HttpExecutorConfig {
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            headers: self.headers.clone(),
            accept_invalid_certs: self.accept_invalid_certs,
        }
    }

    /// Wire executors, credential files and settings into a coordinator.
    /// All three routes share one connection pool.
    pub fn build_coordinator(&self) -> Result<BatchCoordinator> {
        let india = HttpRequestExecutor::new(&self.routes.india.endpoint, self.executor_config())
            .context("failed to build HTTP client")?;
        let americas = india.for_endpoint(&self.routes.americas.endpoint);
        let global = india.for_endpoint(&self.routes.global.endpoint);
        let routes = RouteTable {
            india: Arc::new(india),
            americas: Arc::new(americas),
            global: Arc::new(global),
        };

        let credentials = RegionClass::ALL
            .into_iter()
            .fold(JsonFileCredentialSource::new(), |source, class| {
                source.with_file(class, self.routes.get(class).credentials.clone())
            });

        Ok(BatchCoordinator::new(
            routes,
            Arc::new(credentials),
            self.coordinator_config(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
routes:
  india:    { endpoint: "https://in.example.com/call",  credentials: "tokens/ind.json" }
  americas: { endpoint: "https://us.example.com/call",  credentials: "/abs/americas.json" }
  global:   { endpoint: "https://gl.example.com/call",  credentials: "tokens/global.json" }
"#;

    #[test]
    fn defaults_apply() {
        let config = VolleyConfig::parse(MINIMAL).unwrap();
        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.default_region, "IND");
        assert_eq!(config.default_target, 1_000);
        assert_eq!(config.default_concurrency, 500);
        assert_eq!(config.concurrency_ceiling, 5_000);
        assert_eq!(config.request_timeout_ms, 8_000);
        assert_eq!(config.status_log_interval_ms, Some(2_000));
        assert!(config.max_attempts.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn zero_or_null_interval_disables_progress_log() {
        let yaml = format!("status_log_interval_ms: 0\n{MINIMAL}");
        let config = VolleyConfig::parse(&yaml).unwrap();
        assert!(config.coordinator_config().engine.status_log_interval.is_none());

        let yaml = format!("status_log_interval_ms: null\n{MINIMAL}");
        let config = VolleyConfig::parse(&yaml).unwrap();
        assert!(config.coordinator_config().engine.status_log_interval.is_none());
    }

    #[test]
    fn missing_routes_is_an_error() {
        assert!(VolleyConfig::parse("bind: 127.0.0.1:1\n").is_err());
    }

    #[test]
    fn relative_credential_paths_follow_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volley.yaml");
        std::fs::write(&path, MINIMAL).unwrap();

        let config = VolleyConfig::load(&path).unwrap();
        assert_eq!(config.routes.india.credentials, dir.path().join("tokens/ind.json"));
        assert_eq!(config.routes.americas.credentials, PathBuf::from("/abs/americas.json"));
    }

    #[test]
    fn coordinator_settings_follow_config() {
        let yaml = format!(
            "concurrency_ceiling: 64\nmax_attempts: 900\ndefault_region: br\n{MINIMAL}"
        );
        let config = VolleyConfig::parse(&yaml).unwrap();
        let coordinator = config.build_coordinator().unwrap();
        assert_eq!(coordinator.clamp_concurrency(10_000), 64);
        assert_eq!(coordinator.config().engine.max_attempts, Some(900));
        assert_eq!(coordinator.config().defaults.region, "br");
    }
}
