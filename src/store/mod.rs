//! Persistence for users and grade reports.
//!
//! Handlers only see the [`Store`] trait object; the Postgres implementation
//! lives in [`pg`] and a test double in `memory`.

pub mod pg;

#[cfg(test)]
pub mod memory;

use crate::models::{NewGrade, StoredGrade, UserId, UserRecord};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub use pg::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A `UNIQUE` constraint rejected the write.
    #[error("unique constraint violated")]
    UniqueViolation,
    #[error("store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Inserts a new user, failing with [`StoreError::UniqueViolation`] when
    /// the username is already taken.
    async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<UserRecord, StoreError>;
}

#[async_trait]
pub trait GradeStore: Send + Sync {
    async fn insert_grade(&self, grade: NewGrade) -> Result<StoredGrade, StoreError>;

    async fn grades_of(&self, owner: UserId) -> Result<Vec<StoredGrade>, StoreError>;
}

pub trait Store: CredentialStore + GradeStore {}

impl<T: CredentialStore + GradeStore> Store for T {}

pub type SharedStore = Arc<dyn Store>;
