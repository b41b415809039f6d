use anyhow::Result;
use rusqlite::{OptionalExtension, Row};

use crate::Database;
use crate::models::{AvailableDayRow, NewAvailableDay};

// JOIN users to fetch the owner's name in the same query
const DAY_SELECT: &str = "
    SELECT d.id, d.healthcare_personnel_id, u.name, d.date, d.start_time, d.end_time
      FROM available_days d
      JOIN users u ON u.id = d.healthcare_personnel_id";

impl Database {
    /// All slots ordered by date, then owner name, then start time.
    pub fn get_all_available_days(&self) -> Result<Vec<AvailableDayRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} ORDER BY d.date, u.name, d.start_time", DAY_SELECT);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_day)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    pub fn get_available_day(&self, id: i64) -> Result<Option<AvailableDayRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE d.id = ?1", DAY_SELECT);
            let row = conn.query_row(&sql, [id], map_day).optional()?;
            Ok(row)
        })
    }

    pub fn create_available_day(&self, day: &NewAvailableDay) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO available_days (healthcare_personnel_id, date, start_time, end_time)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    day.healthcare_personnel_id,
                    day.date,
                    day.start_time,
                    day.end_time,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Returns false when the slot does not exist.
    pub fn update_available_day(&self, id: i64, day: &NewAvailableDay) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE available_days
                    SET healthcare_personnel_id = ?2, date = ?3, start_time = ?4, end_time = ?5
                  WHERE id = ?1",
                rusqlite::params![
                    id,
                    day.healthcare_personnel_id,
                    day.date,
                    day.start_time,
                    day.end_time,
                ],
            )?;
            Ok(changed > 0)
        })
    }

    /// Removes the slot and, by cascade, its appointments. Returns false when
    /// the slot does not exist.
    pub fn delete_available_day(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM available_days WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    pub fn count_available_days(&self) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row("SELECT COUNT(*) FROM available_days", [], |row| row.get(0))?;
            Ok(count)
        })
    }
}

fn map_day(row: &Row<'_>) -> rusqlite::Result<AvailableDayRow> {
    Ok(AvailableDayRow {
        id: row.get(0)?,
        healthcare_personnel_id: row.get(1)?,
        healthcare_personnel_name: row.get(2)?,
        date: row.get(3)?,
        start_time: row.get(4)?,
        end_time: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::fixtures::{self, date, time};
    use homecare_types::Role;

    #[test]
    fn listing_orders_by_date_then_personnel_then_start() {
        let db = fixtures::db();
        fixtures::user(&db, "p-ola", "Ola", Role::HealthcarePersonnel);
        fixtures::user(&db, "p-anne", "Anne", Role::HealthcarePersonnel);

        let late = fixtures::day(&db, "p-ola", date(2024, 5, 2), time(8, 0), time(12, 0));
        let ola_afternoon = fixtures::day(&db, "p-ola", date(2024, 5, 1), time(13, 0), time(16, 0));
        let ola_morning = fixtures::day(&db, "p-ola", date(2024, 5, 1), time(8, 0), time(12, 0));
        let anne = fixtures::day(&db, "p-anne", date(2024, 5, 1), time(14, 0), time(18, 0));

        let ids: Vec<_> = db
            .get_all_available_days()
            .unwrap()
            .iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, [anne, ola_morning, ola_afternoon, late]);
    }

    #[test]
    fn get_update_and_delete() {
        let db = fixtures::db();
        fixtures::user(&db, "p1", "Ola", Role::HealthcarePersonnel);
        let id = fixtures::day(&db, "p1", date(2024, 5, 1), time(8, 0), time(12, 0));

        let day = db.get_available_day(id).unwrap().unwrap();
        assert_eq!(day.healthcare_personnel_name, "Ola");
        assert_eq!(day.start_time, time(8, 0));

        let changed = NewAvailableDay {
            healthcare_personnel_id: "p1".into(),
            date: date(2024, 5, 3),
            start_time: time(9, 0),
            end_time: time(11, 0),
        };
        assert!(db.update_available_day(id, &changed).unwrap());
        assert!(!db.update_available_day(id + 100, &changed).unwrap());
        assert_eq!(db.get_available_day(id).unwrap().unwrap().date, date(2024, 5, 3));

        assert!(db.delete_available_day(id).unwrap());
        assert!(db.get_available_day(id).unwrap().is_none());
    }

    #[test]
    fn delete_missing_day_returns_false() {
        let db = fixtures::db();
        assert!(!db.delete_available_day(42).unwrap());
        assert_eq!(db.count_available_days().unwrap(), 0);
    }

    #[test]
    fn owner_must_exist() {
        let db = fixtures::db();
        let result = db.create_available_day(&NewAvailableDay {
            healthcare_personnel_id: "ghost".into(),
            date: date(2024, 5, 1),
            start_time: time(8, 0),
            end_time: time(9, 0),
        });
        assert!(result.is_err());
    }
}
