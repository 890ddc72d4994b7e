use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use super::{seed, CaseDirectory, DirectoryError, UserDirectory};
use crate::db::{self, repository, DatabaseError};
use crate::models::*;

/// Directory persisted in a SQLite database.
///
/// One connection behind a mutex; every call holds the lock for the
/// duration of its statements.
pub struct SqliteDirectory {
    conn: Mutex<Connection>,
    current_user_id: Option<UserId>,
}

impl SqliteDirectory {
    pub fn open(path: &Path, current_user_id: Option<UserId>) -> Result<Self, DirectoryError> {
        let conn = db::open_database(path)?;
        tracing::info!(path = %path.display(), "Case directory opened");
        Ok(Self::from_connection(conn, current_user_id))
    }

    pub fn open_in_memory(current_user_id: Option<UserId>) -> Result<Self, DirectoryError> {
        Ok(Self::from_connection(db::open_memory_database()?, current_user_id))
    }

    /// Wrap an already-migrated connection.
    pub fn from_connection(conn: Connection, current_user_id: Option<UserId>) -> Self {
        Self {
            conn: Mutex::new(conn),
            current_user_id,
        }
    }

    /// Load the demonstration users and cases, in one transaction.
    /// Does nothing when the database already holds cases.
    pub fn seed_demo(&self, now: DateTime<Utc>) -> Result<bool, DirectoryError> {
        let mut conn = self.conn()?;
        let existing: i64 = conn
            .query_row("SELECT COUNT(*) FROM cases", [], |row| row.get(0))
            .map_err(DatabaseError::from)?;
        if existing > 0 {
            tracing::debug!(existing, "Directory already populated, skipping demo seed");
            return Ok(false);
        }

        let tx = conn.transaction().map_err(DatabaseError::from)?;
        for user in seed::demo_users() {
            repository::insert_user(&tx, &user)?;
        }
        let cases = seed::demo_cases(now);
        for case in &cases {
            repository::insert_case(&tx, case)?;
        }
        tx.commit().map_err(DatabaseError::from)?;

        tracing::info!(cases = cases.len(), "Demo data seeded");
        Ok(true)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DirectoryError> {
        self.conn.lock().map_err(|_| DirectoryError::LockPoisoned)
    }
}

impl CaseDirectory for SqliteDirectory {
    fn list_cases(&self) -> Result<Vec<Case>, DirectoryError> {
        Ok(repository::list_cases(&*self.conn()?)?)
    }

    fn get_case(&self, id: CaseId) -> Result<Option<Case>, DirectoryError> {
        Ok(repository::get_case(&*self.conn()?, id)?)
    }

    fn search_cases(
        &self,
        criteria: &CaseSearchCriteria,
    ) -> Result<SearchResult<Case>, DirectoryError> {
        Ok(repository::search_cases(&*self.conn()?, criteria)?)
    }

    fn create_case(&self, case: NewCase) -> Result<Case, DirectoryError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(DatabaseError::from)?;
        let case = case.with_id(repository::next_case_id(&tx)?);
        repository::insert_case(&tx, &case)?;
        tx.commit().map_err(DatabaseError::from)?;
        tracing::debug!(case_id = case.id, "Case created");
        Ok(case)
    }

    fn insert_case(&self, case: Case) -> Result<(), DirectoryError> {
        let conn = self.conn()?;
        if repository::get_case(&conn, case.id)?.is_some() {
            return Err(DirectoryError::DuplicateCase(case.id));
        }
        repository::insert_case(&conn, &case)?;
        Ok(())
    }

    fn update_case(&self, case: Case) -> Result<(), DirectoryError> {
        match repository::update_case(&*self.conn()?, &case) {
            Ok(()) => Ok(()),
            Err(DatabaseError::NotFound { .. }) => Err(DirectoryError::CaseNotFound(case.id)),
            Err(e) => Err(e.into()),
        }
    }

    fn delete_case(&self, id: CaseId) -> Result<bool, DirectoryError> {
        Ok(repository::delete_case(&*self.conn()?, id)?)
    }

    fn cases_assigned_to(&self, doctor_id: UserId) -> Result<Vec<Case>, DirectoryError> {
        Ok(repository::get_cases_assigned_to(&*self.conn()?, doctor_id)?)
    }

    fn unassigned_cases(&self) -> Result<Vec<Case>, DirectoryError> {
        Ok(repository::get_unassigned_cases(&*self.conn()?)?)
    }
}

impl UserDirectory for SqliteDirectory {
    fn list_users(&self) -> Result<Vec<User>, DirectoryError> {
        Ok(repository::list_users(&*self.conn()?)?)
    }

    fn get_user(&self, id: UserId) -> Result<Option<User>, DirectoryError> {
        Ok(repository::get_user(&*self.conn()?, id)?)
    }

    fn search_users(
        &self,
        criteria: &UserSearchCriteria,
    ) -> Result<SearchResult<User>, DirectoryError> {
        Ok(repository::search_users(&*self.conn()?, criteria)?)
    }

    fn create_user(&self, user: NewUser) -> Result<User, DirectoryError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(DatabaseError::from)?;
        let user = user.with_id(repository::next_user_id(&tx)?);
        repository::insert_user(&tx, &user)?;
        tx.commit().map_err(DatabaseError::from)?;
        tracing::debug!(user_id = user.id, "User created");
        Ok(user)
    }

    fn insert_user(&self, user: User) -> Result<(), DirectoryError> {
        let conn = self.conn()?;
        if repository::get_user(&conn, user.id)?.is_some() {
            return Err(DirectoryError::DuplicateUser(user.id));
        }
        repository::insert_user(&conn, &user)?;
        Ok(())
    }

    fn update_user(&self, id: UserId, patch: UserPatch) -> Result<User, DirectoryError> {
        let conn = self.conn()?;
        let mut user = repository::get_user(&conn, id)?.ok_or(DirectoryError::UserNotFound(id))?;
        patch.apply(&mut user);
        repository::update_user(&conn, &user)?;
        Ok(user)
    }

    fn delete_user(&self, id: UserId) -> Result<bool, DirectoryError> {
        Ok(repository::delete_user(&*self.conn()?, id)?)
    }

    fn current_user_id(&self) -> Option<UserId> {
        self.current_user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap()
    }

    fn seeded() -> SqliteDirectory {
        let dir = SqliteDirectory::open_in_memory(Some(seed::DEMO_CURRENT_USER)).unwrap();
        assert!(dir.seed_demo(now()).unwrap());
        dir
    }

    #[test]
    fn seed_is_applied_once() {
        let dir = seeded();
        assert!(!dir.seed_demo(now()).unwrap());
        assert_eq!(dir.list_cases().unwrap().len(), 16);
        assert_eq!(dir.list_users().unwrap().len(), 10);
    }

    #[test]
    fn matches_in_memory_directory() {
        let sql = seeded();
        let mem = InMemoryDirectory::demo(now());
        assert_eq!(sql.list_cases().unwrap(), mem.list_cases().unwrap());
        assert_eq!(sql.list_users().unwrap(), mem.list_users().unwrap());

        let criteria = CaseSearchCriteria {
            query: Some("oncology".into()),
            date_from: Some(chrono::NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()),
            ..Default::default()
        };
        let a = sql.search_cases(&criteria).unwrap();
        let b = mem.search_cases(&criteria).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.total, 2);
    }

    #[test]
    fn duplicate_insert_is_reported() {
        let dir = seeded();
        let case = dir.get_case(1).unwrap().unwrap();
        assert!(matches!(
            dir.insert_case(case),
            Err(DirectoryError::DuplicateCase(1))
        ));
    }

    #[test]
    fn update_missing_case_is_not_found() {
        let dir = seeded();
        let mut case = dir.get_case(1).unwrap().unwrap();
        case.id = 999;
        assert!(matches!(
            dir.update_case(case),
            Err(DirectoryError::CaseNotFound(999))
        ));
    }

    #[test]
    fn assignment_queries() {
        let dir = seeded();
        let mut case = dir.get_case(2).unwrap().unwrap();
        case.assigned_doctor_id = None;
        dir.update_case(case).unwrap();

        let unassigned: Vec<CaseId> = dir.unassigned_cases().unwrap().iter().map(|c| c.id).collect();
        assert_eq!(unassigned, vec![2]);
        let mine: Vec<CaseId> = dir.cases_assigned_to(1).unwrap().iter().map(|c| c.id).collect();
        assert_eq!(mine, vec![1, 12, 13, 14]);
        assert!(dir.delete_case(2).unwrap());
        assert!(dir.unassigned_cases().unwrap().is_empty());
    }

    #[test]
    fn current_user_is_looked_up() {
        let dir = seeded();
        assert_eq!(dir.current_user().unwrap().unwrap().name, "Damien");
        let anonymous = SqliteDirectory::open_in_memory(None).unwrap();
        assert!(anonymous.current_user().unwrap().is_none());
    }

    #[test]
    fn accented_search_agrees_with_memory() {
        let sql = seeded();
        let mem = InMemoryDirectory::demo(now());
        let criteria = UserSearchCriteria {
            query: Some("DÉB".into()),
            ..Default::default()
        };
        let a = sql.search_users(&criteria).unwrap();
        assert_eq!(a, mem.search_users(&criteria).unwrap());
        let ids: Vec<UserId> = a.items.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn create_case_assigns_next_id() {
        let dir = seeded();
        let template = dir.get_case(1).unwrap().unwrap();
        let created = dir
            .create_case(NewCase {
                title: "Case #017 - Walk-in".into(),
                assigned_doctor_id: None,
                site: template.site,
                sector: template.sector,
                date: template.date,
                status: CaseStatus::Pending,
                is_scanned: false,
                has_unseen_images: false,
                is_fully_scanned: false,
                has_shares: false,
            })
            .unwrap();
        assert_eq!(created.id, 17);
        assert_eq!(dir.get_case(17).unwrap(), Some(created));
    }

    #[test]
    fn user_lifecycle() {
        let dir = seeded();
        let lucie = dir
            .create_user(NewUser {
                name: "Lucie".into(),
                specialty: "Pédiatre".into(),
                site: Some("CHU-Angers".into()),
            })
            .unwrap();
        assert_eq!(lucie.id, 11);
        assert!(matches!(
            dir.insert_user(lucie),
            Err(DirectoryError::DuplicateUser(11))
        ));

        let renamed = dir
            .update_user(
                11,
                UserPatch {
                    name: Some("Lucie M.".into()),
                    site: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.specialty, "Pédiatre");
        assert_eq!(renamed.site, None);
        assert_eq!(dir.get_user(11).unwrap(), Some(renamed));

        assert!(dir.delete_user(11).unwrap());
        assert!(!dir.delete_user(11).unwrap());
        assert!(matches!(
            dir.update_user(11, UserPatch::default()),
            Err(DirectoryError::UserNotFound(11))
        ));
    }

    #[test]
    fn reopen_file_keeps_data() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cases.db");
        {
            let dir = SqliteDirectory::open(&path, None).unwrap();
            dir.seed_demo(now()).unwrap();
        }
        let dir = SqliteDirectory::open(&path, None).unwrap();
        assert_eq!(dir.list_cases().unwrap().len(), 16);
    }
}
