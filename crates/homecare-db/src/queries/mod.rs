//! Repository layer: one module per entity, each adding methods to
//! [`Database`](crate::Database).

pub mod appointments;
pub mod available_days;
pub mod reset_tokens;
pub mod users;

use homecare_types::Role;
use homecare_types::models::UnknownRole;
use rusqlite::types::Type;

/// Role names are stored as text; map a bad value to a conversion error.
fn parse_role(column: usize, value: String) -> rusqlite::Result<Role> {
    value.parse().map_err(|e: UnknownRole| {
        rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e))
    })
}
