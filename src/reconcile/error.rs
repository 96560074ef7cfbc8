use std::fmt;

use crate::form::form_model::FieldId;

#[derive(Debug)]
pub enum FormError {
    /// Candidate field-set is structurally unusable (missing id, unknown condition shape)
    MalformedInput { path: String, reason: String },

    /// Two fields share an identifier after reconciliation
    IdentifierCollision { id: FieldId, first: usize, second: usize },

    /// JSON parsing failed (generator output or input file)
    JsonParse { context: String, source: serde_json::Error },

    /// JSON serialization failed (rendering the current form)
    JsonSerialize { context: String, source: serde_json::Error },

    /// HTTP request to the completion service failed
    Http { endpoint: String, source: reqwest::Error },

    /// Completion service answered but not with usable content
    Generator(String),

    /// Credential environment variable is not set
    MissingCredential(String),

    /// Reading or writing a local file failed
    Io { path: String, source: std::io::Error },
}

impl FormError {
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        FormError::MalformedInput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error invalidates the round itself rather than the I/O around it.
    pub fn is_fatal_to_round(&self) -> bool {
        matches!(
            self,
            FormError::MalformedInput { .. } | FormError::IdentifierCollision { .. }
        )
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::MalformedInput { path, reason } => {
                write!(f, "Malformed input at {}: {}", path, reason)
            }
            FormError::IdentifierCollision { id, first, second } => {
                write!(
                    f,
                    "Identifier '{}' assigned to both fields[{}] and fields[{}]",
                    id, first, second
                )
            }
            FormError::JsonParse { context, source } => {
                write!(f, "JSON parse error ({}): {}", context, source)
            }
            FormError::JsonSerialize { context, source } => {
                write!(f, "JSON serialize error ({}): {}", context, source)
            }
            FormError::Http { endpoint, source } => {
                write!(f, "Request to {} failed: {}", endpoint, source)
            }
            FormError::Generator(msg) => {
                write!(f, "Generator returned no usable form: {}", msg)
            }
            FormError::MissingCredential(var) => {
                write!(f, "Environment variable {} is not set", var)
            }
            FormError::Io { path, source } => {
                write!(f, "I/O error on '{}': {}", path, source)
            }
        }
    }
}

impl std::error::Error for FormError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FormError::JsonParse { source, .. } => Some(source),
            FormError::JsonSerialize { source, .. } => Some(source),
            FormError::Http { source, .. } => Some(source),
            FormError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
