use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

use super::case::like_pattern;
use crate::db::DatabaseError;
use crate::models::*;

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        specialty: row.get(2)?,
        site: row.get(3)?,
    })
}

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, name, specialty, site) VALUES (?1, ?2, ?3, ?4)",
        params![user.id, user.name, user.specialty, user.site],
    )?;
    Ok(())
}

pub fn update_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET name = ?2, specialty = ?3, site = ?4 WHERE id = ?1",
        params![user.id, user.name, user.specialty, user.site],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "user".into(),
            id: user.id.to_string(),
        });
    }
    Ok(())
}

/// Returns false when no user had that id. Cases assigned to the user keep
/// the id and simply stop matching any doctor option.
pub fn delete_user(conn: &Connection, id: UserId) -> Result<bool, DatabaseError> {
    let changed = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

/// One past the highest stored id; 1 for an empty table.
pub fn next_user_id(conn: &Connection) -> Result<UserId, DatabaseError> {
    let id = conn.query_row("SELECT COALESCE(MAX(id), 0) + 1 FROM users", [], |row| row.get(0))?;
    Ok(id)
}

pub fn get_user(conn: &Connection, id: UserId) -> Result<Option<User>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, name, specialty, site FROM users WHERE id = ?1")?;
    let mut rows = stmt.query_map(params![id], user_from_row)?;
    let user = rows.next().transpose()?;
    Ok(user)
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, name, specialty, site FROM users ORDER BY id")?;
    let rows = stmt.query_map([], user_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Name or specialty substring search, paged by id.
pub fn search_users(
    conn: &Connection,
    criteria: &UserSearchCriteria,
) -> Result<SearchResult<User>, DatabaseError> {
    let (where_sql, mut values) = match criteria.query.as_deref().filter(|q| !q.is_empty()) {
        Some(query) => {
            let pattern = like_pattern(query);
            (
                " WHERE casefold(name) LIKE ? ESCAPE '\\' OR casefold(specialty) LIKE ? ESCAPE '\\'",
                vec![Value::Text(pattern.clone()), Value::Text(pattern)],
            )
        }
        None => ("", Vec::new()),
    };

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM users{where_sql}"),
        params_from_iter(values.iter()),
        |row| row.get(0),
    )?;

    values.push(Value::Integer(criteria.page_size as i64));
    values.push(Value::Integer(criteria.offset() as i64));
    let mut stmt = conn.prepare(&format!(
        "SELECT id, name, specialty, site FROM users{where_sql} ORDER BY id LIMIT ? OFFSET ?"
    ))?;
    let items = stmt
        .query_map(params_from_iter(values), user_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SearchResult {
        items,
        total: total as usize,
        page: criteria.page,
        page_size: criteria.page_size,
    })
}
