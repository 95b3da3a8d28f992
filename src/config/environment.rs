//! Provider credentials, isolated into a single construct created once at
//! startup and passed into the `ChatCompleter` factory. Never read from
//! hidden process-wide state afterward, and never logged.

use std::env;
use std::path::Path;

/// Optional `.env` loader, consulted before `Credentials::from_env` so a
/// developer can keep secrets out of the shell profile.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentLoader {
    env_file: Option<String>,
}

impl EnvironmentLoader {
    /// Load the given `.env` file if it exists. Does nothing when `env_file`
    /// is `None`, to keep unit tests unaffected by a repository-root `.env`.
    pub fn new(env_file: Option<&Path>) -> Self {
        if let Some(path) = env_file {
            if path.exists() {
                if let Err(e) = dotenv::from_path(path) {
                    eprintln!("Warning: failed to load .env file: {e}");
                }
            }
        }
        Self {
            env_file: env_file.map(|p| p.to_string_lossy().to_string()),
        }
    }
}

/// Provider credentials read once from the environment.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

impl Credentials {
    /// Read `OPENAI_API_KEY` (required), `OPENAI_BASE_URL` and `OPENAI_MODEL`
    /// (both optional, falling back to documented defaults) from the process
    /// environment.
    pub fn from_env() -> Result<Self, CredentialsError> {
        let api_key = env::var("OPENAI_API_KEY").map_err(|_| CredentialsError::MissingApiKey)?;
        if api_key.trim().is_empty() {
            return Err(CredentialsError::MissingApiKey);
        }
        let base_url = env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self {
            api_key,
            base_url,
            model,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
}
