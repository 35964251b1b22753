use thiserror::Error;

/// A deployment spec violates one of its invariants.
///
/// Every `validate` on the spec types returns this error and nothing else, so a
/// caller can always tell user input problems apart from platform failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Prefixes the message with the path of the field that failed.
    pub fn within(self, field: &str) -> Self {
        Self {
            message: format!("{}: {}", field, self.message),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum OperatorError {
    #[error("Invalid spec: {0}")]
    InvalidSpec(#[from] ValidationError),

    #[error("Kubernetes API error: {message}")]
    KubeApiError { message: String },

    #[error("Persistent volume claim {name} not found")]
    ClaimNotFound { name: String },

    #[error("Agency error: {message}")]
    AgencyError { message: String },

    #[error("Status of {name} was modified concurrently")]
    StatusConflict { name: String },

    #[error("Internal server error: {message}")]
    InternalServerError { message: String },
}

impl From<kube::Error> for OperatorError {
    fn from(e: kube::Error) -> Self {
        OperatorError::KubeApiError {
            message: e.to_string(),
        }
    }
}
