//! Error taxonomy for config loading and validation.

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: String },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {message}")]
    Invalid { message: String },

    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error("unknown simulator mode: {value}")]
    UnknownSimulatorMode { value: String },

    #[error(transparent)]
    Credentials(#[from] crate::config::environment::CredentialsError),
}

impl ConfigError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub fn unknown_simulator_mode(value: impl Into<String>) -> Self {
        Self::UnknownSimulatorMode {
            value: value.into(),
        }
    }

    /// Every config error is fatal at startup; none are recoverable.
    pub fn is_recoverable(&self) -> bool {
        false
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::NotFound { path } => {
                format!("config file not found at {path}; pass --config or omit it to use defaults")
            }
            ConfigError::UnknownSimulatorMode { value } => format!(
                "unknown simulator mode '{value}'; expected one of base, strict, sycophantic"
            ),
            _ => self.to_string(),
        }
    }
}
