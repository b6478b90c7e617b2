//! Staff and faculty membership, used to split the report by category.

use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use tracing::{debug, info, warn};

use super::{field, normalize_id, read_export, read_records};
use crate::error::{Error, Result};

/// Normalized ids of everyone who counts as staff or faculty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaffSet {
    ids: HashSet<String>,
}

/// Rules for telling member rows from the header and group rows that the
/// export tool scatters through its files.
#[derive(Debug, Clone, Copy)]
struct RowFilter<'a> {
    header_token: &'a str,
    group_marker: &'a str,
}

impl RowFilter<'_> {
    fn member_id<'r>(&self, record: &'r StringRecord) -> Option<&'r str> {
        let id = field(record, 0)?;
        if id == self.header_token {
            return None;
        }
        if !self.group_marker.is_empty() && id.contains(self.group_marker) {
            return None;
        }
        Some(id)
    }
}

impl StaffSet {
    /// Load and merge every membership export in `paths`.
    ///
    /// Missing files contribute nothing. Unparsable files are logged and
    /// skipped. The result does not depend on the order of `paths`.
    #[must_use]
    pub fn load(paths: &[PathBuf], header_token: &str, group_marker: &str) -> Self {
        let mut set = Self::default();

        for path in paths {
            if !path.exists() {
                debug!("Membership export {} not found, skipping", path.display());
                continue;
            }
            match Self::try_load(path, header_token, group_marker) {
                Ok(members) => {
                    debug!("{} members in {}", members.len(), path.display());
                    set.union_with(members);
                }
                Err(err) => warn!("{err}; skipping"),
            }
        }

        info!("Loaded {} staff/faculty members", set.len());
        set
    }

    /// Load a single membership export, reporting failures.
    ///
    /// # Errors
    ///
    /// Returns `MalformedSource` if the file cannot be read or parsed.
    pub fn try_load(path: impl AsRef<Path>, header_token: &str, group_marker: &str) -> Result<Self> {
        let records = read_export(path.as_ref())?;
        let mut set = Self::default();
        set.extend_from(
            &records,
            RowFilter {
                header_token,
                group_marker,
            },
        );
        Ok(set)
    }

    /// Parse one membership export from any reader.
    ///
    /// # Errors
    ///
    /// Returns `MalformedSource` if the data cannot be parsed.
    pub fn from_reader<R: Read>(reader: R, header_token: &str, group_marker: &str) -> Result<Self> {
        let records =
            read_records(reader).map_err(|e| Error::malformed_source("<reader>", e.to_string()))?;
        let mut set = Self::default();
        set.extend_from(
            &records,
            RowFilter {
                header_token,
                group_marker,
            },
        );
        Ok(set)
    }

    fn extend_from(&mut self, records: &[StringRecord], filter: RowFilter<'_>) {
        for record in records {
            if let Some(id) = filter.member_id(record) {
                self.ids.insert(normalize_id(id));
            }
        }
    }

    /// Merge another set into this one.
    pub fn union_with(&mut self, other: Self) {
        self.ids.extend(other.ids);
    }

    /// Whether `id` (any casing) is staff or faculty.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(&normalize_id(id))
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for StaffSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(|id| normalize_id(id.as_ref())).collect(),
        }
    }
}
