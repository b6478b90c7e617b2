//! `muster` - Emergency check-in ledger and accountability reporting
//!
//! This library loads the community roster and staff/faculty exports,
//! records check-ins in a `SQLite` or in-memory store, and reports who has
//! and has not checked in.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod checkin;
pub mod cli;
pub mod config;
pub mod directory;
pub mod error;
pub mod logging;
pub mod report;
pub mod service;
pub mod store;
pub mod validator;

pub use checkin::{CheckIn, CheckInRequest};
pub use config::{Config, StorageBackend};
pub use directory::{PublicUser, Roster, StaffSet, User};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use report::{build_report, Report};
pub use service::CheckInService;
pub use store::{open_store, CheckInStore};
pub use validator::IdentityValidator;
