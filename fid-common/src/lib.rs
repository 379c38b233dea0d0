//! # Field Inspector Dispatch — Common Library
//!
//! Shared code for the dispatch services including:
//! - Domain models (Inspector, DrugTest, Certification)
//! - Geographic primitives and great-circle distance
//! - Injectable clock for deterministic time-window checks
//! - Configuration loading
//! - Common error types

pub mod clock;
pub mod config;
pub mod error;
pub mod geo;
pub mod models;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use geo::GeoPoint;
