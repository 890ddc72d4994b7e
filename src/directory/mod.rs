//! Case and user directories: where the inbox gets its data.
//!
//! The facet panel only ever reads snapshots (`list_cases`, `list_users`);
//! the remaining operations serve the rest of the application.

mod memory;
pub mod seed;
mod sqlite;

pub use memory::InMemoryDirectory;
pub use sqlite::SqliteDirectory;

use thiserror::Error;

use crate::db::DatabaseError;
use crate::models::*;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Internal lock error")]
    LockPoisoned,

    #[error("Case {0} already exists")]
    DuplicateCase(CaseId),

    #[error("Case {0} not found")]
    CaseNotFound(CaseId),

    #[error("User {0} already exists")]
    DuplicateUser(UserId),

    #[error("User {0} not found")]
    UserNotFound(UserId),

    #[error("Directory unavailable: {0}")]
    Unavailable(String),
}

pub trait CaseDirectory: Send + Sync {
    /// Full snapshot of the collection, ordered by id.
    fn list_cases(&self) -> Result<Vec<Case>, DirectoryError>;

    fn get_case(&self, id: CaseId) -> Result<Option<Case>, DirectoryError>;

    fn search_cases(
        &self,
        criteria: &CaseSearchCriteria,
    ) -> Result<SearchResult<Case>, DirectoryError>;

    /// Store a case under the next free id (one past the highest) and
    /// return it.
    fn create_case(&self, case: NewCase) -> Result<Case, DirectoryError>;

    /// Store a case under its own id; fails on an id already in use.
    fn insert_case(&self, case: Case) -> Result<(), DirectoryError>;

    fn update_case(&self, case: Case) -> Result<(), DirectoryError>;

    /// Returns false when no case had that id.
    fn delete_case(&self, id: CaseId) -> Result<bool, DirectoryError>;

    fn cases_assigned_to(&self, doctor_id: UserId) -> Result<Vec<Case>, DirectoryError> {
        Ok(self
            .list_cases()?
            .into_iter()
            .filter(|c| c.assigned_doctor_id == Some(doctor_id))
            .collect())
    }

    fn unassigned_cases(&self) -> Result<Vec<Case>, DirectoryError> {
        Ok(self
            .list_cases()?
            .into_iter()
            .filter(|c| c.assigned_doctor_id.is_none())
            .collect())
    }
}

pub trait UserDirectory: Send + Sync {
    /// Full snapshot of the directory, ordered by id.
    fn list_users(&self) -> Result<Vec<User>, DirectoryError>;

    fn get_user(&self, id: UserId) -> Result<Option<User>, DirectoryError>;

    fn search_users(
        &self,
        criteria: &UserSearchCriteria,
    ) -> Result<SearchResult<User>, DirectoryError>;

    /// Store a user under the next free id and return it.
    fn create_user(&self, user: NewUser) -> Result<User, DirectoryError>;

    fn insert_user(&self, user: User) -> Result<(), DirectoryError>;

    /// Merge `patch` into the stored user and return the result.
    fn update_user(&self, id: UserId, patch: UserPatch) -> Result<User, DirectoryError>;

    /// Returns false when no user had that id.
    fn delete_user(&self, id: UserId) -> Result<bool, DirectoryError>;

    /// Id of the signed-in user, if the directory knows one.
    fn current_user_id(&self) -> Option<UserId>;

    fn current_user(&self) -> Result<Option<User>, DirectoryError> {
        match self.current_user_id() {
            Some(id) => self.get_user(id),
            None => Ok(None),
        }
    }
}
