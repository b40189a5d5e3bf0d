pub mod models;
pub mod patch;
pub mod repository;
pub mod search;
pub mod slug;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
