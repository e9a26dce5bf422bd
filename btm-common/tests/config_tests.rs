//! Config file resolution and graceful degradation
//!
//! Tests that touch BTM_CONFIG are marked #[serial] so they do not race on
//! the process environment.

use btm_common::config::{
    load_toml_config, resolve_config_path, ConfigOrigin, Overrides, RegistryLocation, Settings,
    TomlConfig, CONFIG_ENV_VAR,
};
use btm_common::Error;
use serial_test::serial;
use std::env;
use std::fs;
use std::time::Duration;

#[test]
#[serial]
fn test_cli_path_beats_env_var() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/btm-from-env.toml");

    let cli = std::path::Path::new("/tmp/btm-from-cli.toml");
    let (path, explicit) = resolve_config_path(Some(cli)).unwrap();
    assert_eq!(path, cli);
    assert!(explicit);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_beats_default() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/btm-from-env.toml");

    let (path, explicit) = resolve_config_path(None).unwrap();
    assert_eq!(path, std::path::PathBuf::from("/tmp/btm-from-env.toml"));
    assert!(explicit);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_explicit_missing_file_is_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    let err = load_toml_config(Some(&missing)).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
#[serial]
fn test_load_file_and_resolve() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
port = 6000
bind = "0.0.0.0"

[registry]
file = "/var/lib/btm/cad_cia_aberta.csv"
timeout_secs = 5
"#,
    )
    .unwrap();

    let loaded = load_toml_config(Some(&path)).unwrap();
    assert_eq!(loaded.origin, ConfigOrigin::File(path.clone()));
    let settings = Settings::resolve(&Overrides::default(), &loaded.config);

    assert_eq!(settings.listen_addr(), "0.0.0.0:6000");
    assert_eq!(settings.registry_timeout, Duration::from_secs(5));
    assert_eq!(
        settings.registry_location,
        RegistryLocation::File("/var/lib/btm/cad_cia_aberta.csv".into())
    );
}

#[test]
#[serial]
fn test_env_var_file_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("env.toml");
    fs::write(&path, "[logging]\nlevel = \"warn\"\n").unwrap();
    env::set_var(CONFIG_ENV_VAR, &path);

    let loaded = load_toml_config(None).unwrap();
    assert_eq!(loaded.config.logging.level, "warn");

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_malformed_file_is_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "port = [").unwrap();

    assert!(load_toml_config(Some(&path)).is_err());
}

#[test]
#[serial]
#[cfg(target_os = "linux")]
fn test_missing_default_file_is_reported() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = tempfile::tempdir().unwrap();
    let previous = env::var_os("XDG_CONFIG_HOME");
    env::set_var("XDG_CONFIG_HOME", dir.path());

    let loaded = load_toml_config(None).unwrap();
    let expected = dir.path().join("brazil-tech-mapper").join("config.toml");
    assert_eq!(loaded.config, TomlConfig::default());
    assert_eq!(loaded.origin, ConfigOrigin::MissingDefault(expected.clone()));
    assert!(loaded.origin.describe().contains("Config file not found"));
    assert!(loaded.origin.describe().contains(&expected.display().to_string()));

    match previous {
        Some(value) => env::set_var("XDG_CONFIG_HOME", value),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }
}
