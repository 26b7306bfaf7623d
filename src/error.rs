//! Error taxonomy shared by the ports and the services layered on top of them.
//! The persistence helpers in `db` keep using `anyhow` internally; everything
//! that crosses a port boundary is narrowed to one of these variants so the UI
//! can decide how to present it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// The bird directory could not be reached, timed out, or answered with
    /// something we could not decode.
    #[error("network error: {0}")]
    Network(String),
    /// A required field was empty. Raised before any remote write happens.
    #[error("{0}")]
    Validation(String),
    /// The action requires a signed-in user.
    #[error("you need to sign in first")]
    NotAuthenticated,
    #[error("{0} not found")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    /// Collapse an `anyhow` chain coming out of the persistence layer. Typed
    /// errors raised deliberately inside `db` survive the trip unchanged.
    pub fn from_storage(err: anyhow::Error) -> Self {
        match err.downcast::<AppError>() {
            Ok(app) => app,
            Err(other) => AppError::Storage(format!("{other:#}")),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Network("request timed out".to_string())
        } else if let Some(status) = err.status() {
            AppError::Network(format!("bird directory answered {status}"))
        } else {
            AppError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Context};

    use super::*;

    #[test]
    fn typed_errors_survive_anyhow_round_trip() {
        let err: anyhow::Error = AppError::NotFound("list abc".into()).into();
        let err = err.context("failed to add bird");
        assert!(matches!(
            AppError::from_storage(err),
            AppError::NotFound(ref what) if what == "list abc"
        ));
    }

    #[test]
    fn untyped_errors_become_storage_with_full_chain() {
        let err = Err::<(), _>(anyhow!("disk full"))
            .context("failed to insert list")
            .unwrap_err();
        match AppError::from_storage(err) {
            AppError::Storage(message) => {
                assert!(message.contains("failed to insert list"));
                assert!(message.contains("disk full"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
