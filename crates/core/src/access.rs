//! Access tiers a user may hold over a patient record.
//!
//! Tiers are totally ordered from least to most permissive:
//!
//! ```text
//! none < view < edit < manage < owner
//! ```
//!
//! Checks only ever ask "is the held tier at least the required one", so deriving `Ord` in
//! declaration order is the whole comparison.

use crate::error::{AccessError, AccessResult};
use crate::right::Right;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    #[default]
    #[serde(rename = "none")]
    NoAccess,
    View,
    Edit,
    Manage,
    Owner,
}

impl AccessLevel {
    /// All tiers in increasing order.
    pub const ALL: [AccessLevel; 5] = [
        AccessLevel::NoAccess,
        AccessLevel::View,
        AccessLevel::Edit,
        AccessLevel::Manage,
        AccessLevel::Owner,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AccessLevel::NoAccess => "none",
            AccessLevel::View => "view",
            AccessLevel::Edit => "edit",
            AccessLevel::Manage => "manage",
            AccessLevel::Owner => "owner",
        }
    }

    /// Whether this tier can be handed to a collaborator. Ownership comes only from being the
    /// record's reporter.
    pub fn is_assignable(self) -> bool {
        self != AccessLevel::Owner
    }

    /// Returns `true` when holding `self` satisfies a requirement of `required`.
    pub fn satisfies(self, required: AccessLevel) -> bool {
        self >= required
    }

    /// Whether this tier implies `right` on the patient's own document.
    pub fn allows(self, right: Right) -> bool {
        match right {
            Right::View | Right::Comment => self.satisfies(AccessLevel::View),
            Right::Edit => self.satisfies(AccessLevel::Edit),
            Right::Delete => self.satisfies(AccessLevel::Manage),
            _ => false,
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AccessLevel {
    type Err = AccessError;

    fn from_str(s: &str) -> AccessResult<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| AccessError::UnknownAccessLevel(s.to_string()))
    }
}
