//! The community roster: who may check in.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{field, normalize_id, read_export, read_records};
use crate::error::{Error, Result};

/// A roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identifier as written in the export.
    pub id: String,
    /// Full name.
    pub display_name: String,
    /// Email address.
    pub email: String,
    /// University ID number, possibly empty.
    pub university_id: String,
}

/// The fields of a [`User`] that are returned to the member who validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    /// Identifier as written in the export.
    pub id: String,
    /// Full name.
    pub display_name: String,
    /// Email address.
    pub email: String,
}

impl User {
    /// The public view of this user.
    #[must_use]
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            email: self.email.clone(),
        }
    }

    /// Parse a roster row: id, email, university ID, display name.
    ///
    /// Returns `None` for rows that are too short or lack an id, email or
    /// display name.
    fn from_record(record: &StringRecord) -> Option<Self> {
        if record.len() < 4 {
            return None;
        }
        let id = field(record, 0)?;
        let email = field(record, 1)?;
        let display_name = field(record, 3)?;
        let university_id = field(record, 2).unwrap_or_default();

        Some(Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            email: email.to_string(),
            university_id: university_id.to_string(),
        })
    }
}

/// Roster entries keyed by normalized id.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    users: BTreeMap<String, User>,
}

impl Roster {
    /// Load the roster export at `path`.
    ///
    /// An unreadable or unparsable export yields an empty roster and a
    /// warning.
    #[must_use]
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(roster) => {
                info!(
                    "Loaded {} authorized users from {}",
                    roster.len(),
                    path.display()
                );
                roster
            }
            Err(err) => {
                warn!("{err}; no users are authorized");
                Self::default()
            }
        }
    }

    /// Load the roster export at `path`, reporting failures.
    ///
    /// # Errors
    ///
    /// Returns `MalformedSource` if the file cannot be read or parsed.
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self> {
        let records = read_export(path.as_ref())?;
        Ok(Self::from_records(&records))
    }

    /// Parse a roster export from any reader.
    ///
    /// # Errors
    ///
    /// Returns `MalformedSource` if the data cannot be parsed.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let records =
            read_records(reader).map_err(|e| Error::malformed_source("<reader>", e.to_string()))?;
        Ok(Self::from_records(&records))
    }

    /// Build a roster from already-constructed users. Later duplicates win.
    #[must_use]
    pub fn from_users(users: impl IntoIterator<Item = User>) -> Self {
        let mut roster = Self::default();
        for user in users {
            roster.insert(user);
        }
        roster
    }

    fn from_records(records: &[StringRecord]) -> Self {
        let mut roster = Self::default();
        for record in records {
            match User::from_record(record) {
                Some(user) => roster.insert(user),
                None => debug!("Skipping incomplete roster row: {:?}", record),
            }
        }
        roster
    }

    fn insert(&mut self, user: User) {
        self.users.insert(normalize_id(&user.id), user);
    }

    /// Look up a user by identifier in any casing.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&User> {
        self.users.get(&normalize_id(id))
    }

    /// Iterate over `(normalized id, user)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &User)> {
        self.users.iter().map(|(id, user)| (id.as_str(), user))
    }

    /// Number of users on the roster.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
