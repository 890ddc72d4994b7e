use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

use crate::db::DatabaseError;
use crate::models::*;

const CASE_COLUMNS: &str = "id, title, assigned_doctor_id, site, sector, date, status,
     is_scanned, has_unseen_images, is_fully_scanned, has_shares";

/// Raw row before enum/timestamp validation.
struct CaseRow {
    id: CaseId,
    title: String,
    assigned_doctor_id: Option<UserId>,
    site: String,
    sector: String,
    date: String,
    status: String,
    is_scanned: bool,
    has_unseen_images: bool,
    is_fully_scanned: bool,
    has_shares: bool,
}

impl CaseRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            assigned_doctor_id: row.get(2)?,
            site: row.get(3)?,
            sector: row.get(4)?,
            date: row.get(5)?,
            status: row.get(6)?,
            is_scanned: row.get(7)?,
            has_unseen_images: row.get(8)?,
            is_fully_scanned: row.get(9)?,
            has_shares: row.get(10)?,
        })
    }

    fn into_case(self) -> Result<Case, DatabaseError> {
        let date = DateTime::parse_from_rfc3339(&self.date)
            .map_err(|_| DatabaseError::InvalidTimestamp {
                field: "cases.date".into(),
                value: self.date.clone(),
            })?
            .with_timezone(&Utc);
        Ok(Case {
            id: self.id,
            title: self.title,
            assigned_doctor_id: self.assigned_doctor_id,
            site: self.site,
            sector: self.sector,
            date,
            status: CaseStatus::from_str(&self.status)?,
            is_scanned: self.is_scanned,
            has_unseen_images: self.has_unseen_images,
            is_fully_scanned: self.is_fully_scanned,
            has_shares: self.has_shares,
        })
    }
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Escape LIKE wildcards so user text is matched literally (ESCAPE '\').
pub(crate) fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for ch in text.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn query_cases(
    conn: &Connection,
    sql: &str,
    values: Vec<Value>,
) -> Result<Vec<Case>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(values), CaseRow::from_row)?;
    let mut cases = Vec::new();
    for row in rows {
        cases.push(row?.into_case()?);
    }
    Ok(cases)
}

pub fn insert_case(conn: &Connection, case: &Case) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO cases (id, title, assigned_doctor_id, site, sector, date, status,
         is_scanned, has_unseen_images, is_fully_scanned, has_shares)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            case.id,
            case.title,
            case.assigned_doctor_id,
            case.site,
            case.sector,
            format_date(&case.date),
            case.status.as_str(),
            case.is_scanned,
            case.has_unseen_images,
            case.is_fully_scanned,
            case.has_shares,
        ],
    )?;
    Ok(())
}

pub fn update_case(conn: &Connection, case: &Case) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE cases SET title = ?2, assigned_doctor_id = ?3, site = ?4, sector = ?5,
         date = ?6, status = ?7, is_scanned = ?8, has_unseen_images = ?9,
         is_fully_scanned = ?10, has_shares = ?11
         WHERE id = ?1",
        params![
            case.id,
            case.title,
            case.assigned_doctor_id,
            case.site,
            case.sector,
            format_date(&case.date),
            case.status.as_str(),
            case.is_scanned,
            case.has_unseen_images,
            case.is_fully_scanned,
            case.has_shares,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "case".into(),
            id: case.id.to_string(),
        });
    }
    Ok(())
}

/// Returns false when no case had that id.
pub fn delete_case(conn: &Connection, id: CaseId) -> Result<bool, DatabaseError> {
    let changed = conn.execute("DELETE FROM cases WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

/// One past the highest stored id; 1 for an empty table.
pub fn next_case_id(conn: &Connection) -> Result<CaseId, DatabaseError> {
    let id = conn.query_row("SELECT COALESCE(MAX(id), 0) + 1 FROM cases", [], |row| row.get(0))?;
    Ok(id)
}

pub fn get_case(conn: &Connection, id: CaseId) -> Result<Option<Case>, DatabaseError> {
    let sql = format!("SELECT {CASE_COLUMNS} FROM cases WHERE id = ?1");
    Ok(query_cases(conn, &sql, vec![Value::Integer(id)])?.pop())
}

pub fn list_cases(conn: &Connection) -> Result<Vec<Case>, DatabaseError> {
    let sql = format!("SELECT {CASE_COLUMNS} FROM cases ORDER BY id");
    query_cases(conn, &sql, Vec::new())
}

pub fn get_cases_assigned_to(
    conn: &Connection,
    doctor_id: UserId,
) -> Result<Vec<Case>, DatabaseError> {
    let sql = format!("SELECT {CASE_COLUMNS} FROM cases WHERE assigned_doctor_id = ?1 ORDER BY id");
    query_cases(conn, &sql, vec![Value::Integer(doctor_id)])
}

pub fn get_unassigned_cases(conn: &Connection) -> Result<Vec<Case>, DatabaseError> {
    let sql = format!("SELECT {CASE_COLUMNS} FROM cases WHERE assigned_doctor_id IS NULL ORDER BY id");
    query_cases(conn, &sql, Vec::new())
}

/// Query + equality filters + paging. `total` counts every match, not just the page.
pub fn search_cases(
    conn: &Connection,
    criteria: &CaseSearchCriteria,
) -> Result<SearchResult<Case>, DatabaseError> {
    let mut clauses: Vec<&str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(query) = criteria.query.as_deref().filter(|q| !q.is_empty()) {
        let pattern = like_pattern(query);
        clauses.push(
            "(casefold(title) LIKE ? ESCAPE '\\' OR casefold(site) LIKE ? ESCAPE '\\' OR casefold(sector) LIKE ? ESCAPE '\\')",
        );
        values.extend(std::iter::repeat(Value::Text(pattern)).take(3));
    }
    if let Some(doctor_id) = criteria.assigned_doctor_id {
        clauses.push("assigned_doctor_id = ?");
        values.push(Value::Integer(doctor_id));
    }
    if let Some(ref site) = criteria.site {
        clauses.push("site = ?");
        values.push(Value::Text(site.clone()));
    }
    if let Some(ref sector) = criteria.sector {
        clauses.push("sector = ?");
        values.push(Value::Text(sector.clone()));
    }
    if let Some(status) = criteria.status {
        clauses.push("status = ?");
        values.push(Value::Text(status.as_str().into()));
    }
    // Stored dates are UTC RFC 3339, so the first ten characters are the calendar day.
    if let Some(from) = criteria.date_from {
        clauses.push("substr(date, 1, 10) >= ?");
        values.push(Value::Text(from.format("%Y-%m-%d").to_string()));
    }
    if let Some(to) = criteria.date_to {
        clauses.push("substr(date, 1, 10) <= ?");
        values.push(Value::Text(to.format("%Y-%m-%d").to_string()));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM cases{where_sql}"),
        params_from_iter(values.iter()),
        |row| row.get(0),
    )?;

    let mut page_values = values;
    page_values.push(Value::Integer(criteria.page_size as i64));
    page_values.push(Value::Integer(criteria.offset() as i64));
    let items = query_cases(
        conn,
        &format!("SELECT {CASE_COLUMNS} FROM cases{where_sql} ORDER BY id LIMIT ? OFFSET ?"),
        page_values,
    )?;

    Ok(SearchResult {
        items,
        total: total as usize,
        page: criteria.page,
        page_size: criteria.page_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use chrono::{NaiveDate, TimeZone};

    fn test_db() -> Connection {
        open_memory_database().expect("in-memory DB")
    }

    fn make_case(id: CaseId, title: &str, site: &str, sector: &str, doctor: Option<UserId>) -> Case {
        Case {
            id,
            title: title.into(),
            assigned_doctor_id: doctor,
            site: site.into(),
            sector: sector.into(),
            date: Utc.with_ymd_and_hms(2024, 3, id as u32, 10, 30, 0).unwrap(),
            status: CaseStatus::Pending,
            is_scanned: true,
            has_unseen_images: false,
            is_fully_scanned: false,
            has_shares: false,
        }
    }

    fn seed(conn: &Connection) {
        insert_case(conn, &make_case(1, "Colon Analysis", "CHU-Angers", "Colon", Some(1))).unwrap();
        insert_case(conn, &make_case(2, "Throat Examination", "CHU-Caen", "Throat", Some(4))).unwrap();
        insert_case(conn, &make_case(3, "Remote Care", "Remote site", "General", None)).unwrap();
        insert_case(conn, &make_case(4, "Colon Follow-up", "CHU-Angers", "Colon", Some(1))).unwrap();
    }

    #[test]
    fn insert_and_get_round_trip() {
        let conn = test_db();
        let case = make_case(7, "Lungs Analysis", "CHU-Brest", "Lungs", Some(6));
        insert_case(&conn, &case).unwrap();
        assert_eq!(get_case(&conn, 7).unwrap(), Some(case));
        assert_eq!(get_case(&conn, 8).unwrap(), None);
    }

    #[test]
    fn update_missing_case_is_not_found() {
        let conn = test_db();
        let case = make_case(1, "Ghost", "CHU-Caen", "General", None);
        let err = update_case(&conn, &case).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn update_replaces_fields() {
        let conn = test_db();
        seed(&conn);
        let mut case = get_case(&conn, 3).unwrap().unwrap();
        case.assigned_doctor_id = Some(10);
        case.status = CaseStatus::Urgent;
        update_case(&conn, &case).unwrap();
        let stored = get_case(&conn, 3).unwrap().unwrap();
        assert_eq!(stored.assigned_doctor_id, Some(10));
        assert_eq!(stored.status, CaseStatus::Urgent);
    }

    #[test]
    fn next_id_follows_highest_stored() {
        let conn = test_db();
        assert_eq!(next_case_id(&conn).unwrap(), 1);
        seed(&conn);
        assert_eq!(next_case_id(&conn).unwrap(), 5);
        delete_case(&conn, 2).unwrap();
        assert_eq!(next_case_id(&conn).unwrap(), 5);
    }

    #[test]
    fn delete_reports_whether_row_existed() {
        let conn = test_db();
        seed(&conn);
        assert!(delete_case(&conn, 2).unwrap());
        assert!(!delete_case(&conn, 2).unwrap());
        assert_eq!(list_cases(&conn).unwrap().len(), 3);
    }

    #[test]
    fn assigned_and_unassigned_queries() {
        let conn = test_db();
        seed(&conn);
        let mine: Vec<CaseId> = get_cases_assigned_to(&conn, 1).unwrap().iter().map(|c| c.id).collect();
        assert_eq!(mine, vec![1, 4]);
        let unassigned = get_unassigned_cases(&conn).unwrap();
        assert_eq!(unassigned.len(), 1);
        assert_eq!(unassigned[0].id, 3);
    }

    #[test]
    fn search_matches_title_site_or_sector_case_insensitively() {
        let conn = test_db();
        seed(&conn);
        let result = search_cases(
            &conn,
            &CaseSearchCriteria {
                query: Some("THROAT".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].id, 2);

        let by_site = search_cases(
            &conn,
            &CaseSearchCriteria {
                query: Some("angers".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(by_site.total, 2);
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let conn = test_db();
        seed(&conn);
        let result = search_cases(
            &conn,
            &CaseSearchCriteria {
                query: Some("%".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(result.total, 0);
    }

    #[test]
    fn search_pages_but_counts_everything() {
        let conn = test_db();
        seed(&conn);
        let result = search_cases(
            &conn,
            &CaseSearchCriteria {
                page: 2,
                page_size: 3,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(result.total, 4);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].id, 4);
    }

    #[test]
    fn search_filters_by_calendar_day() {
        let conn = test_db();
        seed(&conn);
        let result = search_cases(
            &conn,
            &CaseSearchCriteria {
                date_from: NaiveDate::from_ymd_opt(2024, 3, 2),
                date_to: NaiveDate::from_ymd_opt(2024, 3, 3),
                ..Default::default()
            },
        )
        .unwrap();
        let ids: Vec<CaseId> = result.items.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn corrupt_status_surfaces_invalid_enum() {
        let conn = test_db();
        conn.execute_batch("PRAGMA ignore_check_constraints = ON;").unwrap();
        conn.execute(
            "INSERT INTO cases (id, title, site, sector, date, status)
             VALUES (9, 'Bad', 'CHU-Caen', 'General', '2024-03-01T00:00:00Z', 'archived')",
            [],
        )
        .unwrap();
        let err = get_case(&conn, 9).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEnum { .. }));
    }
}
