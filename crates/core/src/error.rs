use thiserror::Error;

/// Errors raised while validating gate configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration field failed validation.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
