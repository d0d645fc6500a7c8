//! Test configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use postbox_config::Config;

use crate::bootstrap::ConfigLoader;

/// Loader returning defaults with a fixed CORS origin.
#[derive(Debug, Default)]
pub struct TestConfigLoader;

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            cors_allow_origin: "https://mail.example".to_owned(),
            ..Config::default()
        })
    }
}

/// Loader that intentionally fails by passing invalid CLI arguments.
#[derive(Debug, Default)]
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("postboxd"),
            OsString::from("--log-format"),
            OsString::from("bogus"),
        ];
        Config::load_from_iter(args)
    }
}

/// Loader that succeeds with a configuration `Config::validate` rejects.
#[derive(Debug, Default)]
pub struct InvalidConfigLoader;

impl ConfigLoader for InvalidConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            jmap_endpoint: "jmap".to_owned(),
            ..Config::default()
        })
    }
}
