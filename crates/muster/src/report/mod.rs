//! Accountability reporting.
//!
//! Cross-references the roster and the staff/faculty set against every
//! stored check-in, producing four name-sorted buckets (staff and students,
//! each split into checked-in and not-checked-in) plus summary counts.

mod collate;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checkin::CheckIn;
use crate::directory::{Roster, StaffSet, User};

pub use collate::compare_names;

/// Which half of the report a roster member belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Listed in one of the staff or faculty exports.
    Staff,
    /// Everyone else on the roster.
    Student,
}

impl Category {
    /// Classify a normalized id against the staff set.
    #[must_use]
    pub fn classify(normalized_id: &str, staff: &StaffSet) -> Self {
        if staff.contains(normalized_id) {
            Self::Staff
        } else {
            Self::Student
        }
    }
}

/// The check-in surfaced for a member: their most recent one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestCheckIn {
    /// Sequence number of the chosen record.
    pub sequence_id: u64,
    /// Reported location.
    pub location: String,
    /// Reported notes.
    pub notes: String,
    /// When it was submitted.
    pub submitted_at: DateTime<Utc>,
}

impl From<&CheckIn> for LatestCheckIn {
    fn from(record: &CheckIn) -> Self {
        Self {
            sequence_id: record.sequence_id,
            location: record.location.clone(),
            notes: record.notes.clone(),
            submitted_at: record.submitted_at,
        }
    }
}

/// One roster member in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    /// Identifier as written in the roster.
    pub id: String,
    /// Name from the roster.
    pub display_name: String,
    /// Email from the roster.
    pub email: String,
    /// Most recent check-in, if any.
    #[serde(flatten)]
    pub check_in: Option<LatestCheckIn>,
}

impl ReportEntry {
    fn new(user: &User, check_in: Option<LatestCheckIn>) -> Self {
        Self {
            id: user.id.clone(),
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            check_in,
        }
    }
}

/// Checked-in and not-checked-in members of one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBuckets {
    /// Members with at least one check-in.
    pub checked_in: Vec<ReportEntry>,
    /// Members with none.
    pub not_checked_in: Vec<ReportEntry>,
}

impl CategoryBuckets {
    fn sort(&mut self) {
        let by_name = |a: &ReportEntry, b: &ReportEntry| {
            compare_names(&a.display_name, &b.display_name).then_with(|| a.id.cmp(&b.id))
        };
        self.checked_in.sort_by(by_name);
        self.not_checked_in.sort_by(by_name);
    }

    fn stats(&self) -> CategoryStats {
        CategoryStats {
            total: self.checked_in.len() + self.not_checked_in.len(),
            checked_in: self.checked_in.len(),
            not_checked_in: self.not_checked_in.len(),
        }
    }
}

/// Report buckets by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportUsers {
    /// Staff and faculty.
    pub staff: CategoryBuckets,
    /// Students.
    pub students: CategoryBuckets,
}

/// Counts for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    /// Members in the category.
    pub total: usize,
    /// Members with a check-in.
    pub checked_in: usize,
    /// Members without one.
    pub not_checked_in: usize,
}

/// Summary counts.
///
/// `total_checked_in` counts distinct ids across all check-ins, including
/// ids that are no longer on the roster, so it can exceed
/// `staff.checked_in + students.checked_in`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    /// Roster size.
    pub total_users: usize,
    /// Distinct ids with at least one check-in.
    pub total_checked_in: usize,
    /// Roster members without a check-in.
    pub total_not_checked_in: usize,
    /// Staff and faculty counts.
    pub staff: CategoryStats,
    /// Student counts.
    pub students: CategoryStats,
}

/// The accountability report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Summary counts.
    pub stats: ReportStats,
    /// Members by category and status.
    pub users: ReportUsers,
}

/// Pick each member's authoritative check-in: latest `submitted_at`, then
/// highest `sequence_id`.
fn latest_by_user(check_ins: &[CheckIn]) -> HashMap<String, &CheckIn> {
    let mut latest: HashMap<String, &CheckIn> = HashMap::new();
    for record in check_ins {
        let key = record.normalized_user_id();
        let newer = latest.get(&key).map_or(true, |current| {
            (record.submitted_at, record.sequence_id) > (current.submitted_at, current.sequence_id)
        });
        if newer {
            latest.insert(key, record);
        }
    }
    latest
}

/// Build the report from the roster, the staff set and every check-in.
#[must_use]
pub fn build_report(roster: &Roster, staff: &StaffSet, check_ins: &[CheckIn]) -> Report {
    let latest = latest_by_user(check_ins);
    let mut users = ReportUsers::default();

    for (id, user) in roster.iter() {
        let buckets = match Category::classify(id, staff) {
            Category::Staff => &mut users.staff,
            Category::Student => &mut users.students,
        };

        match latest.get(id) {
            Some(record) => buckets
                .checked_in
                .push(ReportEntry::new(user, Some(LatestCheckIn::from(*record)))),
            None => buckets.not_checked_in.push(ReportEntry::new(user, None)),
        }
    }

    users.staff.sort();
    users.students.sort();

    let staff_stats = users.staff.stats();
    let student_stats = users.students.stats();

    Report {
        stats: ReportStats {
            total_users: roster.len(),
            total_checked_in: latest.len(),
            total_not_checked_in: staff_stats.not_checked_in + student_stats.not_checked_in,
            staff: staff_stats,
            students: student_stats,
        },
        users,
    }
}
