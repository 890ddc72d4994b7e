use std::sync::RwLock;

use chrono::{DateTime, Utc};

use super::{seed, CaseDirectory, DirectoryError, UserDirectory};
use crate::models::*;

/// Directory held entirely in memory. Backs the demo inbox and tests.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    cases: RwLock<Vec<Case>>,
    users: RwLock<Vec<User>>,
    current_user_id: Option<UserId>,
}

impl InMemoryDirectory {
    pub fn new(mut cases: Vec<Case>, mut users: Vec<User>, current_user_id: Option<UserId>) -> Self {
        cases.sort_by_key(|c| c.id);
        users.sort_by_key(|u| u.id);
        Self {
            cases: RwLock::new(cases),
            users: RwLock::new(users),
            current_user_id,
        }
    }

    /// The demonstration data set with case dates counted back from `now`.
    pub fn demo(now: DateTime<Utc>) -> Self {
        Self::new(
            seed::demo_cases(now),
            seed::demo_users(),
            Some(seed::DEMO_CURRENT_USER),
        )
    }

    fn read_cases(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<Case>>, DirectoryError> {
        self.cases.read().map_err(|_| DirectoryError::LockPoisoned)
    }

    fn write_cases(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<Case>>, DirectoryError> {
        self.cases.write().map_err(|_| DirectoryError::LockPoisoned)
    }

    fn read_users(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<User>>, DirectoryError> {
        self.users.read().map_err(|_| DirectoryError::LockPoisoned)
    }

    fn write_users(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<User>>, DirectoryError> {
        self.users.write().map_err(|_| DirectoryError::LockPoisoned)
    }
}

// Collections are kept sorted by id, so the last entry holds the highest.
fn next_id<T>(items: &[T], id: impl Fn(&T) -> i64) -> i64 {
    items.last().map_or(1, |item| id(item) + 1)
}

fn contains_ci(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

fn page_of<T: Clone>(items: Vec<T>, page: u32, page_size: u32, offset: usize) -> SearchResult<T> {
    let total = items.len();
    let items = items
        .into_iter()
        .skip(offset)
        .take(page_size as usize)
        .collect();
    SearchResult {
        items,
        total,
        page,
        page_size,
    }
}

impl CaseDirectory for InMemoryDirectory {
    fn list_cases(&self) -> Result<Vec<Case>, DirectoryError> {
        Ok(self.read_cases()?.clone())
    }

    fn get_case(&self, id: CaseId) -> Result<Option<Case>, DirectoryError> {
        Ok(self.read_cases()?.iter().find(|c| c.id == id).cloned())
    }

    fn search_cases(
        &self,
        criteria: &CaseSearchCriteria,
    ) -> Result<SearchResult<Case>, DirectoryError> {
        let query = criteria
            .query
            .as_deref()
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        let matched: Vec<Case> = self
            .read_cases()?
            .iter()
            .filter(|c| {
                query.as_deref().map_or(true, |q| {
                    contains_ci(&c.title, q) || contains_ci(&c.site, q) || contains_ci(&c.sector, q)
                })
            })
            .filter(|c| criteria.assigned_doctor_id.map_or(true, |id| c.assigned_doctor_id == Some(id)))
            .filter(|c| criteria.site.as_ref().map_or(true, |s| &c.site == s))
            .filter(|c| criteria.sector.as_ref().map_or(true, |s| &c.sector == s))
            .filter(|c| criteria.status.map_or(true, |s| c.status == s))
            .filter(|c| criteria.date_from.map_or(true, |from| c.day() >= from))
            .filter(|c| criteria.date_to.map_or(true, |to| c.day() <= to))
            .cloned()
            .collect();

        Ok(page_of(matched, criteria.page, criteria.page_size, criteria.offset()))
    }

    fn create_case(&self, case: NewCase) -> Result<Case, DirectoryError> {
        let mut cases = self.write_cases()?;
        let case = case.with_id(next_id(&cases, |c| c.id));
        cases.push(case.clone());
        Ok(case)
    }

    fn insert_case(&self, case: Case) -> Result<(), DirectoryError> {
        let mut cases = self.write_cases()?;
        match cases.binary_search_by_key(&case.id, |c| c.id) {
            Ok(_) => Err(DirectoryError::DuplicateCase(case.id)),
            Err(pos) => {
                cases.insert(pos, case);
                Ok(())
            }
        }
    }

    fn update_case(&self, case: Case) -> Result<(), DirectoryError> {
        let mut cases = self.write_cases()?;
        let slot = cases
            .iter_mut()
            .find(|c| c.id == case.id)
            .ok_or(DirectoryError::CaseNotFound(case.id))?;
        *slot = case;
        Ok(())
    }

    fn delete_case(&self, id: CaseId) -> Result<bool, DirectoryError> {
        let mut cases = self.write_cases()?;
        let before = cases.len();
        cases.retain(|c| c.id != id);
        Ok(cases.len() != before)
    }
}

impl UserDirectory for InMemoryDirectory {
    fn list_users(&self) -> Result<Vec<User>, DirectoryError> {
        Ok(self.read_users()?.clone())
    }

    fn get_user(&self, id: UserId) -> Result<Option<User>, DirectoryError> {
        Ok(self.read_users()?.iter().find(|u| u.id == id).cloned())
    }

    fn search_users(
        &self,
        criteria: &UserSearchCriteria,
    ) -> Result<SearchResult<User>, DirectoryError> {
        let query = criteria
            .query
            .as_deref()
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);
        let matched: Vec<User> = self
            .read_users()?
            .iter()
            .filter(|u| {
                query
                    .as_deref()
                    .map_or(true, |q| contains_ci(&u.name, q) || contains_ci(&u.specialty, q))
            })
            .cloned()
            .collect();
        Ok(page_of(matched, criteria.page, criteria.page_size, criteria.offset()))
    }

    fn create_user(&self, user: NewUser) -> Result<User, DirectoryError> {
        let mut users = self.write_users()?;
        let user = user.with_id(next_id(&users, |u| u.id));
        users.push(user.clone());
        Ok(user)
    }

    fn insert_user(&self, user: User) -> Result<(), DirectoryError> {
        let mut users = self.write_users()?;
        match users.binary_search_by_key(&user.id, |u| u.id) {
            Ok(_) => Err(DirectoryError::DuplicateUser(user.id)),
            Err(pos) => {
                users.insert(pos, user);
                Ok(())
            }
        }
    }

    fn update_user(&self, id: UserId, patch: UserPatch) -> Result<User, DirectoryError> {
        let mut users = self.write_users()?;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(DirectoryError::UserNotFound(id))?;
        patch.apply(user);
        Ok(user.clone())
    }

    fn delete_user(&self, id: UserId) -> Result<bool, DirectoryError> {
        let mut users = self.write_users()?;
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != before)
    }

    fn current_user_id(&self) -> Option<UserId> {
        self.current_user_id
    }
}
