//! Tool Validator: schema checking, argument validation, and ID
//! normalization for generated `function_call` turns.

pub mod error;
pub mod json_extract;
pub mod tool_validator;

pub use error::{ValidationError, ValidationResult};
pub use json_extract::extract_balanced_json;
pub use tool_validator::{validate_conversation, ValidationVerdict};
