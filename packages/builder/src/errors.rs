//! Error types for the builder

use crate::mutations::MutationError;
use thiserror::Error;

/// Failure talking to the external section store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Failure of an explicit save
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("Refusing to save invalid sections: {0}")]
    Invalid(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum BuilderError {
    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("Save failed: {0}")]
    Persist(#[from] PersistError),

    #[error("Load failed: {0}")]
    Load(#[from] StoreError),

    #[error("Loaded sections are inconsistent: {0}")]
    Inconsistent(String),
}
