use super::assets::AssetError;
use super::store::RepositoryError;

/// Caller-visible failure raised by the board services.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Precondition(String),
    #[error("asset upload failed: {0}")]
    Upload(#[from] AssetError),
    #[error(transparent)]
    Repository(RepositoryError),
}

impl BoardError {
    pub(crate) fn missing(field: &str) -> Self {
        BoardError::Validation(format!("{field} is required"))
    }
}

impl From<RepositoryError> for BoardError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Duplicate(detail) => BoardError::Conflict(detail),
            RepositoryError::Missing(entity) => BoardError::NotFound(entity),
            other => BoardError::Repository(other),
        }
    }
}
