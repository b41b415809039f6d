use anyhow::Result;
use rusqlite::{OptionalExtension, Row};

use crate::Database;
use crate::models::{AppointmentRow, NewAppointment};

// Client, day and the day's owner joined in one query (no N+1)
const APPOINTMENT_SELECT: &str = "
    SELECT a.id, a.client_id, c.name, a.available_day_id, d.date,
           d.healthcare_personnel_id, p.name, a.start_time, a.end_time, a.task_description
      FROM appointments a
      JOIN users c ON c.id = a.client_id
      JOIN available_days d ON d.id = a.available_day_id
      JOIN users p ON p.id = d.healthcare_personnel_id";

impl Database {
    /// All appointments ordered by their day's date, then start time.
    pub fn get_all_appointments(&self) -> Result<Vec<AppointmentRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} ORDER BY d.date, a.start_time, a.id", APPOINTMENT_SELECT);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_appointment)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    /// One client's appointments, in listing order.
    pub fn get_appointments_for_client(&self, client_id: &str) -> Result<Vec<AppointmentRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE a.client_id = ?1 ORDER BY d.date, a.start_time, a.id",
                APPOINTMENT_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([client_id], map_appointment)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    pub fn get_appointment(&self, id: i64) -> Result<Option<AppointmentRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE a.id = ?1", APPOINTMENT_SELECT);
            let row = conn.query_row(&sql, [id], map_appointment).optional()?;
            Ok(row)
        })
    }

    pub fn create_appointment(&self, appointment: &NewAppointment) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO appointments (client_id, available_day_id, start_time, end_time, task_description)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    appointment.client_id,
                    appointment.available_day_id,
                    appointment.start_time,
                    appointment.end_time,
                    appointment.task_description,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Returns false when the appointment does not exist.
    pub fn update_appointment(&self, id: i64, appointment: &NewAppointment) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE appointments
                    SET client_id = ?2, available_day_id = ?3, start_time = ?4,
                        end_time = ?5, task_description = ?6
                  WHERE id = ?1",
                rusqlite::params![
                    id,
                    appointment.client_id,
                    appointment.available_day_id,
                    appointment.start_time,
                    appointment.end_time,
                    appointment.task_description,
                ],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_appointment(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM appointments WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    pub fn count_appointments(&self) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row("SELECT COUNT(*) FROM appointments", [], |row| row.get(0))?;
            Ok(count)
        })
    }
}

fn map_appointment(row: &Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        client_id: row.get(1)?,
        client_name: row.get(2)?,
        available_day_id: row.get(3)?,
        date: row.get(4)?,
        healthcare_personnel_id: row.get(5)?,
        healthcare_personnel_name: row.get(6)?,
        start_time: row.get(7)?,
        end_time: row.get(8)?,
        task_description: row.get(9)?,
    })
}
