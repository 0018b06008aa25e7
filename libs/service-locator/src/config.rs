//! Locator configuration.
//!
//! Layered with Figment: defaults -> YAML file (if provided) -> environment (`LOCATOR__*`,
//! `__` separates nested keys, e.g. `LOCATOR__PREFERRED__GREETER=ShoutingGreeter`).
//!
//! Per-service sections under `services.<ImplementationName>` are read by implementations
//! during `initialize()`, with two loaders:
//!
//! 1. **Lenient** ([`service_config_or_default`]): falls back to `T::default()` when the
//!    section is missing.
//! 2. **Strict** ([`service_config_required`]): the section must exist and be valid.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Environment prefix for locator settings.
pub const ENV_PREFIX: &str = "LOCATOR__";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("config file does not exist: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("failed to load locator config: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("missing config section for service '{service}'")]
    MissingServiceConfig { service: String },
    #[error("invalid config for service '{service}': {source}")]
    InvalidServiceConfig {
        service: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Deployment-mode error policy for bootstrap failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapMode {
    /// The first provider, construction or initialization failure aborts bootstrap.
    Strict,
    /// Failures are logged and isolated; the affected capability stays unbound.
    #[default]
    Lenient,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocatorConfig {
    pub mode: BootstrapMode,
    /// Root for relative paths of the foundational file service; current dir when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_root: Option<PathBuf>,
    /// Capability name -> implementation name, applied before override providers.
    pub preferred: BTreeMap<String, String>,
    /// Raw per-implementation config sections, keyed by implementation short name.
    pub services: HashMap<String, serde_json::Value>,
}

impl LocatorConfig {
    /// Load defaults, then the YAML file (if any), then `LOCATOR__*` environment overrides.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingFile` if `path` is not a file, or `ConfigError::Load` if the
    /// merged configuration cannot be extracted.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigError::MissingFile(path.to_path_buf()));
            }
            figment = figment.merge(Yaml::file(path));
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Defaults plus environment overrides.
    ///
    /// # Errors
    /// Returns `ConfigError::Load` if an environment override is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    #[must_use]
    pub fn with_mode(mut self, mode: BootstrapMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_file_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.file_root = Some(root.into());
        self
    }

    #[must_use]
    pub fn with_preferred(
        mut self,
        capability: impl Into<String>,
        implementation: impl Into<String>,
    ) -> Self {
        self.preferred.insert(capability.into(), implementation.into());
        self
    }

    #[must_use]
    pub fn with_service_config(mut self, service: impl Into<String>, raw: serde_json::Value) -> Self {
        self.services.insert(service.into(), raw);
        self
    }

    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.mode == BootstrapMode::Strict
    }

    /// Raw section for `service` (short implementation name, ASCII case ignored).
    #[must_use]
    pub fn service_config(&self, service: &str) -> Option<&serde_json::Value> {
        self.services.get(service).or_else(|| {
            self.services
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(service))
                .map(|(_, raw)| raw)
        })
    }
}

/// Lenient loader.
///
/// - section missing -> `Ok(T::default())`
/// - section present but invalid -> `Err(ConfigError::InvalidServiceConfig)`
///
/// # Errors
/// Returns `ConfigError::InvalidServiceConfig` if the section cannot be deserialized.
pub fn service_config_or_default<T: DeserializeOwned + Default>(
    config: &LocatorConfig,
    service: &str,
) -> Result<T, ConfigError> {
    let Some(raw) = config.service_config(service) else {
        return Ok(T::default());
    };
    parse_section(raw, service)
}

/// Strict loader.
///
/// # Errors
/// Returns `ConfigError::MissingServiceConfig` if the section is absent, or
/// `ConfigError::InvalidServiceConfig` if it cannot be deserialized.
pub fn service_config_required<T: DeserializeOwned>(
    config: &LocatorConfig,
    service: &str,
) -> Result<T, ConfigError> {
    let raw = config
        .service_config(service)
        .ok_or_else(|| ConfigError::MissingServiceConfig {
            service: service.to_owned(),
        })?;
    parse_section(raw, service)
}

fn parse_section<T: DeserializeOwned>(raw: &serde_json::Value, service: &str) -> Result<T, ConfigError> {
    serde_json::from_value(raw.clone()).map_err(|e| ConfigError::InvalidServiceConfig {
        service: service.to_owned(),
        source: e,
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[derive(Debug, PartialEq, Deserialize, Default)]
    struct GreeterConfig {
        #[serde(default)]
        greeting: String,
        #[serde(default)]
        repeat: u32,
    }

    fn write_yaml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_are_lenient_and_empty() {
        let config = LocatorConfig::default();
        assert_eq!(config.mode, BootstrapMode::Lenient);
        assert!(!config.is_strict());
        assert!(config.file_root.is_none());
        assert!(config.preferred.is_empty());
    }

    #[test]
    fn load_reads_yaml_file() {
        let file = write_yaml(
            r"
mode: strict
file_root: /var/lib/app
preferred:
  Greeter: ShoutingGreeter
services:
  PlainGreeter:
    greeting: Hi
",
        );

        let config = temp_env::with_vars_unset(["LOCATOR__MODE"], || {
            LocatorConfig::load(Some(file.path())).unwrap()
        });

        assert!(config.is_strict());
        assert_eq!(config.file_root, Some(PathBuf::from("/var/lib/app")));
        assert_eq!(config.preferred.get("Greeter").unwrap(), "ShoutingGreeter");
        assert_eq!(
            config.service_config("PlainGreeter"),
            Some(&json!({ "greeting": "Hi" }))
        );
    }

    #[test]
    fn env_overrides_yaml() {
        let file = write_yaml("mode: lenient\n");

        let config = temp_env::with_var("LOCATOR__MODE", Some("strict"), || {
            LocatorConfig::load(Some(file.path())).unwrap()
        });

        assert_eq!(config.mode, BootstrapMode::Strict);
    }

    #[test]
    fn env_sets_nested_preferences() {
        let config = temp_env::with_var(
            "LOCATOR__PREFERRED__GREETER",
            Some("ShoutingGreeter"),
            || LocatorConfig::from_env().unwrap(),
        );

        // Env keys are lowercased; capability name matching ignores case.
        assert_eq!(config.preferred.get("greeter").unwrap(), "ShoutingGreeter");
    }

    #[test]
    fn unknown_mode_is_a_load_error() {
        let file = write_yaml("mode: sometimes\n");
        let result = temp_env::with_vars_unset(["LOCATOR__MODE"], || {
            LocatorConfig::load(Some(file.path()))
        });
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn missing_file_is_reported() {
        let result = LocatorConfig::load(Some(Path::new("/definitely/not/here.yaml")));
        assert!(matches!(result, Err(ConfigError::MissingFile(_))));
    }

    #[test]
    fn lenient_loader_falls_back_to_default() {
        let config = LocatorConfig::default();
        let parsed: GreeterConfig = service_config_or_default(&config, "PlainGreeter").unwrap();
        assert_eq!(parsed, GreeterConfig::default());
    }

    #[test]
    fn lenient_loader_parses_present_section_ignoring_case() {
        let config = LocatorConfig::default()
            .with_service_config("plaingreeter", json!({ "greeting": "Ahoy", "repeat": 2 }));
        let parsed: GreeterConfig = service_config_or_default(&config, "PlainGreeter").unwrap();
        assert_eq!(
            parsed,
            GreeterConfig {
                greeting: "Ahoy".to_owned(),
                repeat: 2
            }
        );
    }

    #[test]
    fn lenient_loader_rejects_invalid_section() {
        let config = LocatorConfig::default()
            .with_service_config("PlainGreeter", json!({ "repeat": "many" }));
        let result: Result<GreeterConfig, _> = service_config_or_default(&config, "PlainGreeter");
        match result {
            Err(ConfigError::InvalidServiceConfig { service, .. }) => {
                assert_eq!(service, "PlainGreeter");
            }
            other => panic!("expected InvalidServiceConfig, got {other:?}"),
        }
    }

    #[test]
    fn strict_loader_requires_section() {
        let config = LocatorConfig::default();
        let result: Result<GreeterConfig, _> = service_config_required(&config, "PlainGreeter");
        assert!(matches!(
            result,
            Err(ConfigError::MissingServiceConfig { service }) if service == "PlainGreeter"
        ));
    }
}
