//! Person records and their SQLite storage.

pub mod repository;
pub mod seed;
pub mod types;

pub use repository::{PersonRepository, UpsertOutcome};
pub use types::Person;
