use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::CaseStatus;

pub type CaseId = i64;
pub type UserId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: CaseId,
    pub title: String,
    pub assigned_doctor_id: Option<UserId>,
    pub site: String,
    pub sector: String,
    pub date: DateTime<Utc>,
    pub status: CaseStatus,
    pub is_scanned: bool,
    pub has_unseen_images: bool,
    pub is_fully_scanned: bool,
    pub has_shares: bool,
}

impl Case {
    /// Calendar day (UTC) the case is filed under. Date filters compare on this.
    pub fn day(&self) -> NaiveDate {
        self.date.date_naive()
    }
}

/// A case before the directory has assigned an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCase {
    pub title: String,
    pub assigned_doctor_id: Option<UserId>,
    pub site: String,
    pub sector: String,
    pub date: DateTime<Utc>,
    pub status: CaseStatus,
    pub is_scanned: bool,
    pub has_unseen_images: bool,
    pub is_fully_scanned: bool,
    pub has_shares: bool,
}

impl NewCase {
    pub fn with_id(self, id: CaseId) -> Case {
        Case {
            id,
            title: self.title,
            assigned_doctor_id: self.assigned_doctor_id,
            site: self.site,
            sector: self.sector,
            date: self.date,
            status: self.status,
            is_scanned: self.is_scanned,
            has_unseen_images: self.has_unseen_images,
            is_fully_scanned: self.is_fully_scanned,
            has_shares: self.has_shares,
        }
    }
}

/// One page of a directory or results query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
}
