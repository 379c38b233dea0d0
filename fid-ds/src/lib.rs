//! # Field Inspector Dispatch Service
//!
//! Inspector eligibility and geographic dispatch engine:
//! - Proximity search over inspectors with multi-criterion filtering,
//!   sorting and pagination, fronted by a short-lived result cache
//! - Mobilization workflow gating the Available -> Mobilized transition on
//!   compliance rules, committed atomically with its audit record

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod eligibility;
pub mod error;
pub mod mobilize;
pub mod search;

pub use error::{Error, Result};
