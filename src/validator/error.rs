use thiserror::Error;

pub type ValidationResult<T> = Result<T, ValidationError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("could not extract a balanced JSON object from function_call value")]
    UnparsableCall,

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("arguments is not a JSON object")]
    ArgumentsNotObject,

    #[error("missing required argument: {0}")]
    MissingRequiredArgument(String),

    #[error("argument not declared in schema: {0}")]
    UndeclaredArgument(String),

    #[error("argument {name} has wrong type: expected {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("normalized id format invalid: {0}")]
    InvalidIdFormat(String),

    #[error("thinking tool '{0}' is not allowed in output")]
    ThinkingToolDisallowed(String),
}

impl ValidationError {
    /// Every validation error discards the whole conversation; none are
    /// partially recoverable.
    pub fn is_recoverable(&self) -> bool {
        false
    }
}
