//! Check-in operations exposed to callers.
//!
//! [`CheckInService`] ties the roster, the staff set and a check-in store
//! together behind the five operations a front end needs: validate an id,
//! submit a check-in, list check-ins, clear them, and build the
//! accountability report.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::checkin::{CheckIn, CheckInInput, CheckInRequest};
use crate::config::{Config, StorageBackend};
use crate::directory::{PublicUser, Roster, StaffSet};
use crate::error::{Error, Result};
use crate::report::{build_report, Report};
use crate::store::{open_store, CheckInStore};
use crate::validator::IdentityValidator;

/// Outcome of validating an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    /// Whether the id is on the roster.
    pub authorized: bool,
    /// Public fields of the matching user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<PublicUser>,
}

/// Outcome of submitting a check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    /// Whether the check-in was stored.
    pub accepted: bool,
    /// Sequence number of the stored record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_id: Option<u64>,
    /// Why the check-in was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SubmitResponse {
    /// Fold a submission outcome into a response.
    ///
    /// Roster and validation rejections become `accepted: false` with a
    /// reason.
    ///
    /// # Errors
    ///
    /// Store failures and any other unexpected error are passed through.
    pub fn from_outcome(outcome: Result<CheckIn>) -> Result<Self> {
        match outcome {
            Ok(record) => Ok(Self {
                accepted: true,
                sequence_id: Some(record.sequence_id),
                reason: None,
            }),
            Err(err) if err.is_not_authorized() || err.is_validation() => Ok(Self {
                accepted: false,
                sequence_id: None,
                reason: Some(err.to_string()),
            }),
            Err(err) => Err(err),
        }
    }
}

/// Outcome of clearing the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearResponse {
    /// Number of check-ins removed.
    pub deleted_count: usize,
    /// Human-readable summary.
    pub message: String,
}

/// A summary of the running configuration and store contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    /// Active store backend.
    pub backend: StorageBackend,
    /// Database file, for the sqlite backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
    /// Users on the roster.
    pub roster_size: usize,
    /// Staff and faculty members.
    pub staff_size: usize,
    /// Stored check-ins.
    pub check_in_count: usize,
}

/// The check-in service.
#[derive(Debug, Clone)]
pub struct CheckInService {
    roster: Arc<Roster>,
    staff: Arc<StaffSet>,
    validator: IdentityValidator,
    store: Arc<dyn CheckInStore>,
}

impl CheckInService {
    /// Create a service over an already-loaded roster, staff set and store.
    #[must_use]
    pub fn new(roster: Roster, staff: StaffSet, store: Arc<dyn CheckInStore>) -> Self {
        let roster = Arc::new(roster);
        Self {
            validator: IdentityValidator::new(Arc::clone(&roster)),
            roster,
            staff: Arc::new(staff),
            store,
        }
    }

    /// Load the directory sources and open the store named by `config`.
    ///
    /// Unreadable directory sources are logged and treated as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened.
    pub fn from_config(config: &Config) -> Result<Self> {
        let roster = Roster::load(config.roster_path());
        let staff = StaffSet::load(
            &config.staff_paths(),
            &config.directory.header_token,
            &config.directory.group_marker,
        );
        if roster.is_empty() {
            warn!("Roster is empty; every check-in will be rejected");
        }

        let store = open_store(config)?;
        Ok(Self::new(roster, staff, store))
    }

    /// The loaded roster.
    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// The loaded staff and faculty set.
    #[must_use]
    pub fn staff(&self) -> &StaffSet {
        &self.staff
    }

    /// Check whether `id` is on the roster.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if `id` is blank.
    pub fn validate_user(&self, id: &str) -> Result<ValidateResponse> {
        if id.trim().is_empty() {
            return Err(Error::validation("an identifier is required"));
        }

        let user = self.validator.validate(id).map(crate::directory::User::public);
        Ok(ValidateResponse {
            authorized: user.is_some(),
            user,
        })
    }

    /// Validate, authorize and store a check-in.
    ///
    /// # Errors
    ///
    /// - `Validation` if the id, display name or location is blank
    /// - `NotAuthorized` if the id is not on the roster; nothing is stored
    /// - `BackendUnavailable` if the store fails
    pub async fn submit_check_in(&self, request: CheckInRequest) -> Result<CheckIn> {
        let user_id = request.user_id.trim();
        let display_name = request.display_name.trim();
        let location = request.location.trim();
        if user_id.is_empty() || display_name.is_empty() || location.is_empty() {
            return Err(Error::validation(
                "identifier, name, and location are required",
            ));
        }

        let user = self.validator.authorize(user_id)?;
        let input = CheckInInput {
            user_id: user.id.clone(),
            display_name: display_name.to_string(),
            email: user.email.clone(),
            location: location.to_string(),
            notes: request
                .notes
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            submitted_at: request.submitted_at,
        };

        let record = self.store.append(input).await?;
        info!(
            "Check-in recorded for {} at {} (ID: {})",
            record.display_name, record.location, record.sequence_id
        );
        Ok(record)
    }

    /// Every stored check-in, newest first.
    ///
    /// # Errors
    ///
    /// Returns `BackendUnavailable` if the store fails.
    pub async fn list_check_ins(&self) -> Result<Vec<CheckIn>> {
        self.store.list_all().await
    }

    /// Remove every stored check-in.
    ///
    /// # Errors
    ///
    /// Returns `BackendUnavailable` if the store fails.
    pub async fn clear_check_ins(&self) -> Result<ClearResponse> {
        let deleted_count = self.store.clear_all().await?;
        Ok(ClearResponse {
            deleted_count,
            message: format!("Successfully cleared {deleted_count} check-ins"),
        })
    }

    /// Build the accountability report from the current store contents.
    ///
    /// # Errors
    ///
    /// Returns `BackendUnavailable` if the store fails.
    pub async fn build_accountability_report(&self) -> Result<Report> {
        let check_ins = self.store.list_all().await?;
        let report = build_report(&self.roster, &self.staff, &check_ins);
        info!(
            "Accountability report: {}/{} checked in",
            report.stats.total_checked_in, report.stats.total_users
        );
        Ok(report)
    }

    /// Summarize the service state.
    ///
    /// # Errors
    ///
    /// Returns `BackendUnavailable` if the store fails.
    pub async fn status(&self) -> Result<ServiceStatus> {
        Ok(ServiceStatus {
            backend: self.store.backend(),
            database_path: self.store.database_path().map(Path::to_path_buf),
            roster_size: self.roster.len(),
            staff_size: self.staff.len(),
            check_in_count: self.store.count().await?,
        })
    }
}
