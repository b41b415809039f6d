use anyhow::Result;
use homecare_types::Role;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row};

use super::parse_role;
use crate::Database;
use crate::models::{NewUser, UserRow, UserSummaryRow, normalize_user_name};

const USER_COLUMNS: &str = "id, email, name, phone_number, password_hash";

// The first role assigned is the one shown in listings.
const SUMMARY_SELECT: &str = "
    SELECT u.id, u.email, u.name, u.phone_number,
           (SELECT r.name FROM user_roles ur
              JOIN roles r ON r.id = ur.role_id
             WHERE ur.user_id = u.id
             ORDER BY ur.id
             LIMIT 1) AS primary_role
      FROM users u";

impl Database {
    /// Insert the account and its single role in one transaction.
    /// Returns false when the email is already registered.
    pub fn create_user(&self, user: &NewUser<'_>, role: Role) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let inserted = tx.execute(
                "INSERT INTO users (id, user_name, email, name, phone_number, password_hash)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    user.id,
                    normalize_user_name(user.email),
                    user.email.trim(),
                    user.name,
                    user.phone_number,
                    user.password_hash,
                ],
            );
            match inserted {
                Ok(_) => {}
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            }
            insert_user_role(&tx, user.id, role)?;
            tx.commit()?;
            Ok(true)
        })
    }

    pub fn add_user_to_role(&self, user_id: &str, role: Role) -> Result<()> {
        self.with_conn(|conn| insert_user_role(conn, user_id, role))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
            let row = conn.query_row(&sql, [id], map_user).optional()?;
            Ok(row)
        })
    }

    /// Lookup is case-insensitive.
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM users WHERE user_name = ?1", USER_COLUMNS);
            let row = conn
                .query_row(&sql, [normalize_user_name(email)], map_user)
                .optional()?;
            Ok(row)
        })
    }

    pub fn email_exists(&self, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE user_name = ?1)",
                [normalize_user_name(email)],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    /// Roles in assignment order.
    pub fn get_roles_for_user(&self, user_id: &str) -> Result<Vec<Role>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.name FROM user_roles ur
                   JOIN roles r ON r.id = ur.role_id
                  WHERE ur.user_id = ?1
                  ORDER BY ur.id",
            )?;
            let roles = stmt
                .query_map([user_id], |row| parse_role(0, row.get(0)?))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(roles)
        })
    }

    pub fn get_user_summary(&self, id: &str) -> Result<Option<UserSummaryRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE u.id = ?1", SUMMARY_SELECT);
            let row = conn.query_row(&sql, [id], map_summary).optional()?;
            Ok(row)
        })
    }

    /// Every user with their primary role, ordered by name.
    pub fn get_all_users(&self) -> Result<Vec<UserSummaryRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} ORDER BY u.name, u.email", SUMMARY_SELECT);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_summary)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    /// Users holding `role` (as any of their roles), ordered by name.
    pub fn get_users_in_role(&self, role: Role) -> Result<Vec<UserSummaryRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE EXISTS (SELECT 1 FROM user_roles ur
                                    JOIN roles r ON r.id = ur.role_id
                                   WHERE ur.user_id = u.id AND r.name = ?1)
                    ORDER BY u.name, u.email",
                SUMMARY_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([role.as_str()], map_summary)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    pub fn user_has_role(&self, user_id: &str, role: Role) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM user_roles ur
                                 JOIN roles r ON r.id = ur.role_id
                                WHERE ur.user_id = ?1 AND r.name = ?2)",
                [user_id, role.as_str()],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    /// Returns false when the user does not exist.
    pub fn update_profile(
        &self,
        id: &str,
        name: &str,
        phone_number: Option<&str>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET name = ?2, phone_number = ?3, updated_at = datetime('now')
                 WHERE id = ?1",
                rusqlite::params![id, name, phone_number],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn update_password(&self, id: &str, password_hash: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET password_hash = ?2, updated_at = datetime('now') WHERE id = ?1",
                [id, password_hash],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn count_users(&self) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            Ok(count)
        })
    }

    pub fn count_users_in_role(&self, role: Role) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM user_roles ur
                   JOIN roles r ON r.id = ur.role_id
                  WHERE r.name = ?1",
                [role.as_str()],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }
}

fn insert_user_role(conn: &Connection, user_id: &str, role: Role) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO user_roles (user_id, role_id)
         SELECT ?1, id FROM roles WHERE name = ?2",
        [user_id, role.as_str()],
    )?;
    Ok(())
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        phone_number: row.get(3)?,
        password_hash: row.get(4)?,
    })
}

fn map_summary(row: &Row<'_>) -> rusqlite::Result<UserSummaryRow> {
    let primary_role = row
        .get::<_, Option<String>>(4)?
        .map(|name| parse_role(4, name))
        .transpose()?;

    Ok(UserSummaryRow {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        phone_number: row.get(3)?,
        primary_role,
    })
}
