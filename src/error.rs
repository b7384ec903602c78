use thiserror::Error;

use crate::db::StoreError;

/// Failure taxonomy shared by every service operation. The HTTP layer maps
/// each variant to a status code in `api::errors`.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("Username already exists.")]
    DuplicateUsername,
    #[error("User not found")]
    UserNotFound,
    #[error("Incorrect password")]
    BadCredentials,
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
