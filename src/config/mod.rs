//! Configuration loading, validation, and provider credentials.

pub mod environment;
pub mod error;
pub mod loader;
pub mod model;

pub use environment::{Credentials, CredentialsError, EnvironmentLoader};
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigurationLoader;
pub use model::{CallLogSettings, Config, GenerationSettings, OutputSettings, ProviderSettings};
