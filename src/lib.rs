//! CRUD HTTP service for person records stored in SQLite.
//!
//! A person is a row of the `pessoa` table: first name, surname, CPF
//! (the Brazilian national ID, used as the business key) and birth date.
//!
//! ```text
//! GET    /pessoas        list everyone
//! GET    /pessoa/{cpf}   rows with that CPF, 404 if none
//! DELETE /pessoa/{cpf}   delete by CPF, 404 if none
//! POST   /pessoa         insert (201) or update (200) by CPF
//! GET    /metrics        Prometheus exposition
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`person`]: Person records, SQLite repository and sample data
//! - [`api`]: HTTP router and handlers
//! - [`metrics`]: Request metrics and the Prometheus recorder
//! - [`logging`]: File and console logging
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod person;
pub mod utils;

pub use config::Config;
pub use error::{ApiError, AppError, Result};
