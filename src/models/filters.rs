use chrono::NaiveDate;

use super::case::UserId;
use super::enums::CaseStatus;

/// Directory-level case query: optional equality filters plus paging.
/// `page` is 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseSearchCriteria {
    pub query: Option<String>,
    pub page: u32,
    pub page_size: u32,
    pub assigned_doctor_id: Option<UserId>,
    pub site: Option<String>,
    pub sector: Option<String>,
    pub status: Option<CaseStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl Default for CaseSearchCriteria {
    fn default() -> Self {
        Self {
            query: None,
            page: 1,
            page_size: 50,
            assigned_doctor_id: None,
            site: None,
            sector: None,
            status: None,
            date_from: None,
            date_to: None,
        }
    }
}

impl CaseSearchCriteria {
    /// Zero-based offset of the first row on the requested page.
    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1) * self.page_size as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserSearchCriteria {
    pub query: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for UserSearchCriteria {
    fn default() -> Self {
        Self {
            query: None,
            page: 1,
            page_size: 50,
        }
    }
}

impl UserSearchCriteria {
    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1) * self.page_size as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_zero_based() {
        let criteria = CaseSearchCriteria {
            page: 3,
            page_size: 10,
            ..Default::default()
        };
        assert_eq!(criteria.offset(), 20);
    }

    #[test]
    fn page_zero_is_first_page() {
        let criteria = UserSearchCriteria {
            page: 0,
            ..Default::default()
        };
        assert_eq!(criteria.offset(), 0);
    }
}
