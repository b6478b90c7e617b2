//! Roster membership checks.

use std::sync::Arc;

use tracing::debug;

use crate::directory::{Roster, User};
use crate::error::{Error, Result};

/// Confirms that an identifier belongs to someone on the roster.
#[derive(Debug, Clone)]
pub struct IdentityValidator {
    roster: Arc<Roster>,
}

impl IdentityValidator {
    /// Create a validator over `roster`.
    #[must_use]
    pub fn new(roster: Arc<Roster>) -> Self {
        Self { roster }
    }

    /// Look up `submitted_id` in any casing, ignoring surrounding whitespace.
    #[must_use]
    pub fn validate(&self, submitted_id: &str) -> Option<&User> {
        let user = self.roster.get(submitted_id);
        if user.is_none() {
            debug!("Identifier '{}' not found in roster", submitted_id.trim());
        }
        user
    }

    /// Like [`validate`](Self::validate), but an unknown id is an error.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthorized` if `submitted_id` is not on the roster.
    pub fn authorize(&self, submitted_id: &str) -> Result<&User> {
        self.validate(submitted_id)
            .ok_or_else(|| Error::not_authorized(submitted_id.trim()))
    }
}
