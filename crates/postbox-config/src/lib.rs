//! Shared configuration for the Postbox pipeline.
//!
//! Values are layered by [`ortho_config`]: command-line flags override
//! `POSTBOX_*` environment variables, which override the configuration file,
//! which overrides the defaults in [`defaults`]. The daemon loads the
//! configuration once during bootstrap and hands borrowed views of it to the
//! telemetry layer, the mailbox store and the route table.

mod defaults;
mod logging;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_CORS_ALLOW_ORIGIN, DEFAULT_JMAP_ENDPOINT, DEFAULT_LOCAL_USER, DEFAULT_LOG_FILTER,
    DEFAULT_MAILBOXES, DEFAULT_MAX_MAILBOX_NAME_LENGTH, DEFAULT_PATH_DELIMITER,
    MIN_MAX_MAILBOX_NAME_LENGTH, default_cors_allow_origin, default_jmap_endpoint,
    default_local_user, default_log_filter, default_log_filter_string, default_log_format,
    default_max_mailbox_name_length, default_path_delimiter,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "POSTBOX")]
pub struct Config {
    /// `tracing` filter expression applied by the telemetry subscriber.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format of the telemetry subscriber.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Path the JMAP API route is mounted on.
    #[serde(default = "default_jmap_endpoint")]
    #[ortho_config(default = default_jmap_endpoint())]
    pub jmap_endpoint: String,
    /// Longest mailbox name accepted by the store.
    #[serde(default = "default_max_mailbox_name_length")]
    #[ortho_config(default = default_max_mailbox_name_length())]
    pub max_mailbox_name_length: usize,
    /// Hierarchy delimiter used when resolving client mailbox names.
    #[serde(default = "default_path_delimiter")]
    #[ortho_config(default = default_path_delimiter())]
    pub path_delimiter: String,
    /// Value of the `Access-Control-Allow-Origin` header.
    #[serde(default = "default_cors_allow_origin")]
    #[ortho_config(default = default_cors_allow_origin())]
    pub cors_allow_origin: String,
    /// Identity the binary's local replay mode runs as.
    #[serde(default = "default_local_user")]
    #[ortho_config(default = default_local_user())]
    pub local_user: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            jmap_endpoint: default_jmap_endpoint(),
            max_mailbox_name_length: default_max_mailbox_name_length(),
            path_delimiter: default_path_delimiter(),
            cors_allow_origin: default_cors_allow_origin(),
            local_user: default_local_user(),
        }
    }
}

impl Config {
    /// Returns the configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the configured log format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the JMAP endpoint path.
    #[must_use]
    pub fn jmap_endpoint(&self) -> &str {
        &self.jmap_endpoint
    }

    /// Returns the longest accepted mailbox name, in characters.
    #[must_use]
    pub fn max_mailbox_name_length(&self) -> usize {
        self.max_mailbox_name_length
    }

    /// Returns the hierarchy delimiter.
    ///
    /// Falls back to [`DEFAULT_PATH_DELIMITER`] when the configured value is
    /// empty; [`Config::validate`] reports that case as an error.
    #[must_use]
    pub fn path_delimiter(&self) -> char {
        self.path_delimiter
            .chars()
            .next()
            .unwrap_or(DEFAULT_PATH_DELIMITER)
    }

    /// Returns the CORS allow-origin value.
    #[must_use]
    pub fn cors_allow_origin(&self) -> &str {
        &self.cors_allow_origin
    }

    /// Returns the identity used by local replay mode.
    #[must_use]
    pub fn local_user(&self) -> &str {
        &self.local_user
    }

    /// Checks cross-field constraints the loader cannot express.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.jmap_endpoint.starts_with('/') {
            return Err(ConfigError::EndpointNotAbsolute {
                endpoint: self.jmap_endpoint.clone(),
            });
        }
        if self.max_mailbox_name_length < MIN_MAX_MAILBOX_NAME_LENGTH {
            return Err(ConfigError::MailboxNameLengthTooSmall {
                length: self.max_mailbox_name_length,
                minimum: MIN_MAX_MAILBOX_NAME_LENGTH,
            });
        }
        if self.path_delimiter.chars().count() != 1 {
            return Err(ConfigError::InvalidDelimiter {
                delimiter: self.path_delimiter.clone(),
            });
        }
        Ok(())
    }
}

/// Constraint violations reported by [`Config::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The endpoint is not an absolute path.
    #[error("jmap endpoint '{endpoint}' must start with '/'")]
    EndpointNotAbsolute { endpoint: String },
    /// The length limit would reject a default mailbox.
    #[error(
        "max mailbox name length {length} is below {minimum}, the longest default mailbox name"
    )]
    MailboxNameLengthTooSmall { length: usize, minimum: usize },
    /// The delimiter must be exactly one character.
    #[error("path delimiter '{delimiter}' must be a single character")]
    InvalidDelimiter { delimiter: String },
}
