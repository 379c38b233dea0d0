//! Database layer
//!
//! SQLite access through sqlx. `init` owns pool setup and schema creation;
//! `inspectors` holds the entity queries; `audit` appends audit records on a
//! caller-supplied transaction so the status change and its audit entry
//! commit as one atomic unit.

pub mod audit;
pub mod init;
pub mod inspectors;

pub use init::init_database;
