//! HTTP layer of the homecare booking service: handlers, auth and seeding.

pub mod appointments;
pub mod auth;
pub mod available_days;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod password;
pub mod routes;
pub mod seed;
pub mod state;
pub mod token;
pub mod users;

pub use routes::router;
pub use state::{AppState, AppStateInner};
