use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (accounts and booking schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                user_name       TEXT NOT NULL UNIQUE,
                email           TEXT NOT NULL,
                name            TEXT NOT NULL,
                phone_number    TEXT,
                password_hash   TEXT NOT NULL,
                created_at      TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE roles (
                id      INTEGER PRIMARY KEY,
                name    TEXT NOT NULL UNIQUE
            );

            CREATE TABLE user_roles (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                role_id     INTEGER NOT NULL REFERENCES roles(id),
                UNIQUE(user_id, role_id)
            );

            CREATE TABLE available_days (
                id                          INTEGER PRIMARY KEY AUTOINCREMENT,
                healthcare_personnel_id     TEXT NOT NULL REFERENCES users(id),
                date                        TEXT NOT NULL,
                start_time                  TEXT NOT NULL,
                end_time                    TEXT NOT NULL
            );

            CREATE INDEX idx_available_days_date
                ON available_days(date, start_time);

            CREATE TABLE appointments (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                client_id           TEXT NOT NULL REFERENCES users(id),
                available_day_id    INTEGER NOT NULL REFERENCES available_days(id) ON DELETE CASCADE,
                start_time          TEXT NOT NULL,
                end_time            TEXT NOT NULL,
                task_description    TEXT NOT NULL
            );

            CREATE INDEX idx_appointments_day
                ON appointments(available_day_id);

            CREATE TABLE password_reset_tokens (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                token_hash  TEXT NOT NULL UNIQUE,
                expires_at  TEXT NOT NULL,
                used        INTEGER NOT NULL DEFAULT 0
            );

            INSERT INTO roles (id, name) VALUES
                (1, 'Client'),
                (2, 'HealthcarePersonnel'),
                (3, 'Admin');

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

/// Children before parents so foreign keys never block the drop.
pub fn drop_all(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        DROP TABLE IF EXISTS password_reset_tokens;
        DROP TABLE IF EXISTS appointments;
        DROP TABLE IF EXISTS available_days;
        DROP TABLE IF EXISTS user_roles;
        DROP TABLE IF EXISTS roles;
        DROP TABLE IF EXISTS users;
        DROP TABLE IF EXISTS schema_version;
        ",
    )?;
    Ok(())
}
