use thiserror::Error;

use crate::{
    application::{aggregation::AggregationError, auth::AuthError, repos::StoreError},
    domain::error::DomainError,
    infra::error::InfraError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Aggregation(#[from] AggregationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Short, user-facing description of the failure class.
    pub fn presentation_message(&self) -> &'static str {
        match self {
            AppError::Aggregation(AggregationError::NotFound { .. }) | AppError::NotFound(_) => {
                "Resource not found"
            }
            AppError::Aggregation(AggregationError::Forbidden { .. }) => {
                "Only posts you created can be changed"
            }
            AppError::Aggregation(AggregationError::Domain(DomainError::Validation { .. }))
            | AppError::Domain(DomainError::Validation { .. })
            | AppError::Auth(AuthError::Validation(_))
            | AppError::Validation(_) => "Request could not be processed",
            AppError::Auth(AuthError::InvalidCredentials) => "Invalid email or password",
            AppError::Auth(AuthError::NotAuthenticated) => "Sign in first",
            AppError::Aggregation(AggregationError::Store(_))
            | AppError::Auth(AuthError::Store(_))
            | AppError::Store(_) => "Local storage failure",
            AppError::Auth(AuthError::Directory(_)) => "User directory unavailable",
            AppError::Infra(InfraError::Telemetry(_)) => "Logging subsystem could not start",
            AppError::Infra(InfraError::StoreOpen { .. }) => "Local storage failure",
            AppError::Infra(InfraError::ReadFile { .. }) => "Input file could not be read",
            AppError::Infra(InfraError::Fixtures(_) | InfraError::RemoteClient(_)) => {
                "Content source misconfigured"
            }
            AppError::Unexpected(_) => "Unexpected error occurred",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::PostOrigin;

    #[test]
    fn forbidden_writes_have_a_distinct_message() {
        let error = AppError::from(AggregationError::Forbidden {
            id: "json-1".to_string(),
            origin: PostOrigin::Remote,
        });
        assert_eq!(
            error.presentation_message(),
            "Only posts you created can be changed"
        );
        assert!(error.to_string().contains("remote"));
    }

    #[test]
    fn missing_posts_map_to_not_found() {
        let error = AppError::from(AggregationError::NotFound {
            id: "post-1".to_string(),
        });
        assert_eq!(error.presentation_message(), "Resource not found");
    }
}
