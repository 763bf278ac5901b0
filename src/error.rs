use thiserror::Error;

/// Errors raised while validating or compiling a site definition
#[derive(Debug, Error)]
pub enum SiteError {
    /// A required attribute is absent or empty
    #[error("The \"{path}\" property is required")]
    MissingField { path: String },

    /// Exactly one of user/pass was provided
    #[error("Both the username and password are required")]
    InvalidCredentials,

    /// A new step reuses the name of an existing one
    #[error("Duplicated step name: {0}")]
    DuplicateStepName(String),

    #[error("The Step type {0} is not valid")]
    UnknownStepType(String),

    /// A `{{token}}` was left unresolved or is malformed
    #[error("Unresolved template token: {token}")]
    TemplateSubstitution { token: String },

    /// The definition does not have the expected shape
    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SiteError {
    /// Shorthand for a [`SiteError::MissingField`] at `path`
    pub fn missing(path: impl Into<String>) -> Self {
        SiteError::MissingField { path: path.into() }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, SiteError>;
