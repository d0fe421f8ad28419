use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::repos::BackendError, config::LoadError, domain::error::DomainError,
    infra::error::InfraError,
};

/// Failure surfaced by an entity facade call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ApiError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Domain(DomainError::Validation { .. }))
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("failed to load configuration: {0}")]
    Config(#[from] LoadError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Api(ApiError::Domain(_)) => 65,
            AppError::Api(ApiError::Backend(_)) => 69,
            AppError::Config(_) | AppError::Infra(InfraError::Configuration { .. }) => 78,
            AppError::Infra(_) | AppError::Unexpected(_) => 1,
        }
    }
}

/// The error message followed by every message in its source chain.
pub fn error_chain(error: &dyn StdError) -> Vec<String> {
    let mut messages = vec![error.to_string()];
    let mut current = error.source();
    while let Some(inner) = current {
        messages.push(inner.to_string());
        current = inner.source();
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_includes_sources() {
        let error = AppError::Api(ApiError::Backend(BackendError::NotFound));
        let chain = error_chain(&error);
        assert_eq!(chain.first().map(String::as_str), Some("record not found"));
        assert_eq!(error.exit_code(), 69);
    }

    #[test]
    fn validation_errors_are_recognised() {
        let error = ApiError::from(DomainError::validation("title", "must not be empty"));
        assert!(error.is_validation());
        assert_eq!(AppError::from(error).exit_code(), 65);
    }
}
