use thiserror::Error;

pub type SeedResult<T> = Result<T, SeedError>;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("seed file not found: {path}")]
    NotFound { path: String },

    #[error("failed to read seed file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("seed file is not a JSON array: {path}")]
    NotAnArray { path: String },

    #[error("seed file is empty: {path}")]
    Empty { path: String },

    #[error("malformed seed at index {index}: {message}")]
    MalformedSeed { index: usize, message: String },
}

impl SeedError {
    pub fn is_recoverable(&self) -> bool {
        false
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SeedError::NotFound { path } => format!("seed file not found: {path}"),
            SeedError::Empty { path } => format!("seed file {path} contains no seeds"),
            _ => self.to_string(),
        }
    }
}
