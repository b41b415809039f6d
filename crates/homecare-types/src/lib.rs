//! Wire and domain types shared by the homecare crates.

pub mod api;
pub mod models;

pub use models::Role;
