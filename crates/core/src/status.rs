//! Status results reported by family checks.
//!
//! [`StatusResponse`] is the caller-facing shape (code, error kind, message). [`FamilyStatus`]
//! is the verdict a family repository gives for one patient, each verdict carrying a fixed
//! code and kind.

use crate::constants::{
    FAMILY_EDIT_DENIED_MESSAGE, PERMISSIONS_ERROR_TYPE, STATUS_OK, STATUS_UNAUTHORIZED,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status_code: STATUS_OK,
            error_type: None,
            message: None,
        }
    }

    /// Fixed response for an actor who may not edit a family record.
    pub fn family_edit_denied() -> Self {
        Self {
            status_code: STATUS_UNAUTHORIZED,
            error_type: Some(PERMISSIONS_ERROR_TYPE.into()),
            message: Some(FAMILY_EDIT_DENIED_MESSAGE.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }
}

/// Verdict on whether one patient may join a family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FamilyStatus {
    CanBeAdded,
    AlreadyHasFamily(String),
    InsufficientPermissionsOnPatient(String),
    InvalidPatientId(String),
    InvalidFamilyId(String),
}

impl FamilyStatus {
    pub fn is_addable(&self) -> bool {
        matches!(self, FamilyStatus::CanBeAdded)
    }

    pub fn status_code(&self) -> u16 {
        match self {
            FamilyStatus::CanBeAdded => STATUS_OK,
            FamilyStatus::AlreadyHasFamily(_) => 501,
            FamilyStatus::InsufficientPermissionsOnPatient(_) => STATUS_UNAUTHORIZED,
            FamilyStatus::InvalidPatientId(_) | FamilyStatus::InvalidFamilyId(_) => 404,
        }
    }

    pub fn error_type(&self) -> Option<&'static str> {
        match self {
            FamilyStatus::CanBeAdded => None,
            FamilyStatus::AlreadyHasFamily(_) => Some("familyConflict"),
            FamilyStatus::InsufficientPermissionsOnPatient(_) => Some(PERMISSIONS_ERROR_TYPE),
            FamilyStatus::InvalidPatientId(_) => Some("invalidPatientId"),
            FamilyStatus::InvalidFamilyId(_) => Some("invalidFamilyId"),
        }
    }

    pub fn message(&self) -> Option<String> {
        match self {
            FamilyStatus::CanBeAdded => None,
            FamilyStatus::AlreadyHasFamily(patient) => {
                Some(format!("Patient {patient} belongs to a different family."))
            }
            FamilyStatus::InsufficientPermissionsOnPatient(patient) => Some(format!(
                "Insufficient permissions to edit the patient record {patient}."
            )),
            FamilyStatus::InvalidPatientId(patient) => {
                Some(format!("Could not find patient {patient}."))
            }
            FamilyStatus::InvalidFamilyId(family) => {
                Some(format!("There is no family with id {family}."))
            }
        }
    }
}

impl From<FamilyStatus> for StatusResponse {
    fn from(status: FamilyStatus) -> Self {
        Self {
            status_code: status.status_code(),
            error_type: status.error_type().map(str::to_string),
            message: status.message(),
        }
    }
}
