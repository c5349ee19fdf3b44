//! Repository seams.
//!
//! The permission checks never touch storage directly. They ask a [`PatientRepository`] and a
//! [`FamilyRepository`] for records and verdicts, so production backends and the in-memory
//! [`crate::store::RecordStore`] are interchangeable.

use crate::error::AccessResult;
use crate::records::{Family, Patient, User};
use crate::status::FamilyStatus;
use kindred_types::RecordId;

pub trait PatientRepository: Send + Sync {
    /// Looks a patient up by identifier. `Ok(None)` means no such patient.
    fn patient_by_id(&self, id: &RecordId) -> AccessResult<Option<Patient>>;
}

pub trait FamilyRepository: Send + Sync {
    /// Looks a family up by identifier. `Ok(None)` means no such family.
    fn family_by_id(&self, id: &RecordId) -> AccessResult<Option<Family>>;

    /// Decides whether `actor` may add `patient` to `family`.
    ///
    /// Returns [`FamilyStatus::CanBeAdded`] or the specific reason the patient cannot join.
    fn can_patient_be_added_to_family(
        &self,
        patient: &Patient,
        family: &Family,
        actor: Option<&User>,
    ) -> AccessResult<FamilyStatus>;
}
