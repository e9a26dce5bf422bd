//! Bootstrap configuration
//!
//! Resolution priority, highest first:
//! 1. Command-line arguments (or their environment variables, via clap)
//! 2. TOML config file
//! 3. Compiled defaults
//!
//! A missing default config file is not an error; the service warns and
//! starts with defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::registry::{CVM_URL, DEFAULT_FETCH_TIMEOUT, DEFAULT_TTL};
use crate::{Error, Result};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "BTM_CONFIG";

/// Default HTTP port for btm-ui
pub const DEFAULT_PORT: u16 = 5730;

/// Default bind address
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// TOML file contents; every field is optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct TomlConfig {
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub bind: Option<String>,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[registry]` table
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Set to false to never mark companies as listed
    #[serde(default)]
    pub enabled: Option<bool>,

    #[serde(default)]
    pub url: Option<String>,

    /// Local copy of the registry CSV; takes precedence over `url`
    #[serde(default)]
    pub file: Option<PathBuf>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

/// `[logging]` table
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Values given on the command line (or environment)
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub registry_url: Option<String>,
    pub registry_file: Option<PathBuf>,
    pub registry_timeout_secs: Option<u64>,
    pub registry_ttl_secs: Option<u64>,
    pub no_registry: bool,
    pub log_level: Option<String>,
}

/// Where the listed-company registry comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryLocation {
    Url(String),
    File(PathBuf),
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub port: u16,
    pub bind: String,
    pub registry_enabled: bool,
    pub registry_location: RegistryLocation,
    pub registry_timeout: Duration,
    pub registry_ttl: Duration,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self::resolve(&Overrides::default(), &TomlConfig::default())
    }
}

impl Settings {
    /// Merge overrides over the TOML file over compiled defaults
    pub fn resolve(overrides: &Overrides, toml: &TomlConfig) -> Self {
        let registry_location = if let Some(path) = &overrides.registry_file {
            RegistryLocation::File(path.clone())
        } else if let Some(url) = &overrides.registry_url {
            RegistryLocation::Url(url.clone())
        } else if let Some(path) = &toml.registry.file {
            RegistryLocation::File(path.clone())
        } else {
            RegistryLocation::Url(
                toml.registry
                    .url
                    .clone()
                    .unwrap_or_else(|| CVM_URL.to_string()),
            )
        };

        Self {
            port: overrides.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            bind: overrides
                .bind
                .clone()
                .or_else(|| toml.bind.clone())
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            registry_enabled: !overrides.no_registry && toml.registry.enabled.unwrap_or(true),
            registry_location,
            registry_timeout: overrides
                .registry_timeout_secs
                .or(toml.registry.timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_FETCH_TIMEOUT),
            registry_ttl: overrides
                .registry_ttl_secs
                .or(toml.registry.ttl_secs)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TTL),
            log_level: overrides
                .log_level
                .clone()
                .unwrap_or_else(|| toml.logging.level.clone()),
        }
    }

    /// `bind:port` listen address
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Platform config file location (`~/.config/brazil-tech-mapper/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("brazil-tech-mapper").join("config.toml"))
}

/// Pick the config file: CLI argument, then `BTM_CONFIG`, then platform default
///
/// Returns the path and whether it was requested explicitly.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<(PathBuf, bool)> {
    if let Some(path) = cli_arg {
        return Some((path.to_path_buf(), true));
    }
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some((PathBuf::from(path), true));
        }
    }
    default_config_path().map(|p| (p, false))
}

/// Parse a TOML config file
pub fn parse_toml(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
}

/// Where the loaded settings came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Read from this file
    File(PathBuf),
    /// Default file does not exist; compiled defaults apply
    MissingDefault(PathBuf),
    /// No platform config directory; compiled defaults apply
    NoConfigDir,
}

impl ConfigOrigin {
    /// Human-readable line for the startup log
    pub fn describe(&self) -> String {
        match self {
            ConfigOrigin::File(path) => format!("Loaded config from {}", path.display()),
            ConfigOrigin::MissingDefault(path) => {
                format!("Config file not found at {}, using defaults", path.display())
            }
            ConfigOrigin::NoConfigDir => {
                "Could not determine config directory, using defaults".to_string()
            }
        }
    }

    /// Emit [`describe`](Self::describe) at the matching level
    ///
    /// Loading happens before the subscriber exists, so the binary calls this
    /// once tracing is initialized.
    pub fn log(&self) {
        match self {
            ConfigOrigin::File(_) => info!("{}", self.describe()),
            _ => warn!("{}", self.describe()),
        }
    }
}

/// Parsed config file plus where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    pub origin: ConfigOrigin,
}

/// Load the config file selected by [`resolve_config_path`]
///
/// An explicitly requested file must exist. A missing default file yields
/// defaults, reported through [`ConfigOrigin::MissingDefault`].
pub fn load_toml_config(cli_arg: Option<&Path>) -> Result<LoadedConfig> {
    let Some((path, explicit)) = resolve_config_path(cli_arg) else {
        return Ok(LoadedConfig {
            config: TomlConfig::default(),
            origin: ConfigOrigin::NoConfigDir,
        });
    };

    if !path.exists() {
        if explicit {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return Ok(LoadedConfig {
            config: TomlConfig::default(),
            origin: ConfigOrigin::MissingDefault(path),
        });
    }

    let content = std::fs::read_to_string(&path)?;
    let config = parse_toml(&content)?;
    Ok(LoadedConfig {
        config,
        origin: ConfigOrigin::File(path),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.bind, "127.0.0.1");
        assert!(settings.registry_enabled);
        assert_eq!(settings.registry_location, RegistryLocation::Url(CVM_URL.to_string()));
        assert_eq!(settings.registry_timeout, Duration::from_secs(60));
        assert_eq!(settings.registry_ttl, Duration::from_secs(86_400));
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.listen_addr(), "127.0.0.1:5730");
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let toml = parse_toml(
            r#"
            port = 8080

            [registry]
            url = "http://localhost:9000/cad.csv"
            ttl_secs = 60

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        let settings = Settings::resolve(&Overrides::default(), &toml);
        assert_eq!(settings.port, 8080);
        assert_eq!(
            settings.registry_location,
            RegistryLocation::Url("http://localhost:9000/cad.csv".to_string())
        );
        assert_eq!(settings.registry_ttl, Duration::from_secs(60));
        assert_eq!(settings.registry_timeout, DEFAULT_FETCH_TIMEOUT);
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn test_cli_overrides_toml() {
        let toml = TomlConfig {
            port: Some(8080),
            registry: RegistryConfig {
                file: Some(PathBuf::from("/srv/cad.csv")),
                ..RegistryConfig::default()
            },
            ..TomlConfig::default()
        };
        let overrides = Overrides {
            port: Some(9090),
            registry_url: Some("http://mirror/cad.csv".to_string()),
            no_registry: true,
            ..Overrides::default()
        };

        let settings = Settings::resolve(&overrides, &toml);
        assert_eq!(settings.port, 9090);
        assert!(!settings.registry_enabled);
        assert_eq!(
            settings.registry_location,
            RegistryLocation::Url("http://mirror/cad.csv".to_string())
        );
    }

    #[test]
    fn test_toml_file_beats_toml_url() {
        let toml = parse_toml(
            r#"
            [registry]
            url = "http://ignored"
            file = "/data/cad_cia_aberta.csv"
            enabled = true
            "#,
        )
        .unwrap();
        let settings = Settings::resolve(&Overrides::default(), &toml);
        assert_eq!(
            settings.registry_location,
            RegistryLocation::File(PathBuf::from("/data/cad_cia_aberta.csv"))
        );
    }

    #[test]
    fn test_origin_describes_missing_default() {
        let origin = ConfigOrigin::MissingDefault(PathBuf::from("/home/u/.config/btm.toml"));
        assert_eq!(
            origin.describe(),
            "Config file not found at /home/u/.config/btm.toml, using defaults"
        );
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = parse_toml("port = \"not a number\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
