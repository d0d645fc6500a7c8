//! Layering checks for CLI overrides on top of defaults.

use std::ffi::OsString;

use ortho_config::OrthoConfig;
use postbox_config::{Config, LogFormat, default_max_mailbox_name_length};

fn args(values: &[&str]) -> Vec<OsString> {
    std::iter::once("postboxd")
        .chain(values.iter().copied())
        .map(OsString::from)
        .collect()
}

#[test]
fn cli_flags_override_defaults() {
    let config = Config::load_from_iter(args(&[
        "--jmap-endpoint",
        "/api/jmap",
        "--log-format",
        "compact",
    ]))
    .expect("configuration should load");

    assert_eq!(config.jmap_endpoint(), "/api/jmap");
    assert_eq!(config.log_format(), LogFormat::Compact);
    assert_eq!(
        config.max_mailbox_name_length(),
        default_max_mailbox_name_length()
    );
}

#[test]
fn loaded_defaults_pass_validation() {
    let config = Config::load_from_iter(args(&[])).expect("configuration should load");
    assert!(config.validate().is_ok());
}
