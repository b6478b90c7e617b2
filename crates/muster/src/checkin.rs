//! Core check-in types for muster.
//!
//! A check-in moves through three shapes: the [`CheckInRequest`] a member
//! submits, the [`CheckInInput`] handed to the store once the member has been
//! authorized, and the stored [`CheckIn`] record with its sequence number.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::directory::normalize_id;

/// A check-in as submitted by a member, before authorization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    /// Identifier as typed by the member, any casing.
    pub user_id: String,
    /// Name the member entered on the form.
    pub display_name: String,
    /// Where the member is.
    pub location: String,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Client-side submission time. The server clock is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

/// An authorized check-in ready to be appended to a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInInput {
    /// Roster identifier in its canonical casing.
    pub user_id: String,
    /// Name the member entered on the form.
    pub display_name: String,
    /// Email from the roster.
    pub email: String,
    /// Where the member is.
    pub location: String,
    /// Free-form notes, empty when none were given.
    pub notes: String,
    /// Client-side submission time, if supplied.
    pub submitted_at: Option<DateTime<Utc>>,
}

/// A stored check-in.
///
/// Records are immutable once appended. A member may have several; the one
/// with the latest `submitted_at` is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    /// Store-assigned sequence number, starting at 1.
    pub sequence_id: u64,
    /// Roster identifier in its canonical casing.
    pub user_id: String,
    /// Name the member entered on the form.
    pub display_name: String,
    /// Email from the roster.
    pub email: String,
    /// Where the member is.
    pub location: String,
    /// Free-form notes, possibly empty.
    #[serde(default)]
    pub notes: String,
    /// When the member submitted the check-in.
    pub submitted_at: DateTime<Utc>,
    /// When the store received it.
    pub received_at: DateTime<Utc>,
}

impl CheckIn {
    /// Build a record from an input, stamping `received_at` with `now`.
    #[must_use]
    pub fn from_input(sequence_id: u64, input: CheckInInput, now: DateTime<Utc>) -> Self {
        Self {
            sequence_id,
            user_id: input.user_id,
            display_name: input.display_name,
            email: input.email,
            location: input.location,
            notes: input.notes,
            submitted_at: input.submitted_at.unwrap_or(now),
            received_at: now,
        }
    }

    /// The user id in lookup form.
    #[must_use]
    pub fn normalized_user_id(&self) -> String {
        normalize_id(&self.user_id)
    }
}

/// Sort records newest submission first.
///
/// The sort is stable, so records with equal `submitted_at` keep the order
/// they were given in.
pub fn sort_newest_first(records: &mut [CheckIn]) {
    records.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
}
