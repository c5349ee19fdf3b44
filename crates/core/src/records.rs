//! Records the checks operate on: patients, families and users.
//!
//! These are read-only views handed out by the repositories. They carry just enough to
//! answer permission questions.

use crate::reference::DocumentReference;
use kindred_types::RecordId;
use serde::{Deserialize, Serialize};

/// How widely a patient record is shared beyond its reporter and collaborators.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Only the reporter, collaborators and administrators.
    #[default]
    Private,
    /// Everyone may view the record.
    Public,
    /// Everyone may view the record and signed-in users may edit it.
    Open,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patient {
    pub id: RecordId,
    pub document: DocumentReference,
    /// Username of the user who created the record.
    pub reporter: Option<RecordId>,
    pub visibility: Visibility,
    /// Family the patient currently belongs to, if any.
    pub family: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Family {
    pub id: RecordId,
    pub document: DocumentReference,
    pub members: Vec<RecordId>,
}

/// A signed-in user. Guests are represented by the absence of a `User`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: RecordId,
    pub profile: DocumentReference,
    pub admin: bool,
}
