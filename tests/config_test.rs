//! Tests for config module

use opendecks::config::Config;
use std::io::Write;

#[test]
fn test_config_file_exists() {
    let config_path = std::path::Path::new("config.toml");
    assert!(
        config_path.exists(),
        "config.toml should exist in project root"
    );
}

#[test]
fn test_config_toml_readable() {
    let content =
        std::fs::read_to_string("config.toml").expect("Should be able to read config.toml");

    for section in ["[kiosk]", "[schedule]", "[trigger]", "[logging]"] {
        assert!(
            content.contains(section),
            "config.toml should have {section} section"
        );
    }
}

#[test]
fn test_shipped_config_matches_defaults() {
    let config = Config::from_file(std::path::Path::new("config.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_partial_file_uses_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[kiosk]\ntimezone = \"America/New_York\"\nadmin_pin = \"0000\"").unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.kiosk.timezone, "America/New_York");
    assert_eq!(config.kiosk.admin_pin, "0000");
    assert_eq!(config.kiosk.signup_cooldown_secs, 60);
    assert_eq!(config.schedule.max_slots_per_window, 4);
    assert_eq!(config.zone().unwrap(), chrono_tz::America::New_York);
}

#[test]
fn test_invalid_file_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[kiosk]\ntimezone = \"Mars/Olympus\"").unwrap();
    assert!(Config::from_file(file.path()).is_err());

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[schedule]\nslot_minutes = 0").unwrap();
    assert!(Config::from_file(file.path()).is_err());

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "not toml at all [").unwrap();
    assert!(Config::from_file(file.path()).is_err());
}

#[test]
fn test_toml_roundtrip_keeps_seed() {
    let mut config = Config::default();
    config.schedule.rng_seed = Some(99);
    let text = config.to_toml().unwrap();
    let parsed: Config = toml::from_str(&text).unwrap();
    assert_eq!(parsed.schedule.rng_seed, Some(99));
}
