//! Permission checks for family and patient editing workflows.
//!
//! [`ValidationService`] is a thin facade over the injected collaborators. Each check asks the
//! relevant collaborator and turns its answer into a boolean or a [`StatusResponse`]; there is
//! no retry and no aggregation of errors.

use crate::access::AccessLevel;
use crate::error::AccessResult;
use crate::permissions::{AuthorizationService, PermissionsManager};
use crate::records::{Patient, User};
use crate::reference::DocumentReference;
use crate::repositories::{FamilyRepository, PatientRepository};
use crate::right::Right;
use crate::status::{FamilyStatus, StatusResponse};
use crate::store::RecordStore;
use crate::users::UserManager;
use kindred_types::RecordId;
use std::sync::Arc;

#[derive(Clone)]
pub struct ValidationService {
    patients: Arc<dyn PatientRepository>,
    families: Arc<dyn FamilyRepository>,
    permissions: Arc<dyn PermissionsManager>,
    authorization: Arc<dyn AuthorizationService>,
    users: Arc<dyn UserManager>,
}

impl ValidationService {
    pub fn new(
        patients: Arc<dyn PatientRepository>,
        families: Arc<dyn FamilyRepository>,
        permissions: Arc<dyn PermissionsManager>,
        authorization: Arc<dyn AuthorizationService>,
        users: Arc<dyn UserManager>,
    ) -> Self {
        Self {
            patients,
            families,
            permissions,
            authorization,
            users,
        }
    }

    /// Uses `store` for every collaborator except the user manager.
    pub fn from_store(store: Arc<RecordStore>, users: Arc<dyn UserManager>) -> Self {
        Self::new(store.clone(), store.clone(), store.clone(), store, users)
    }

    /// The same collaborators acting on behalf of a different user manager.
    pub fn with_user_manager(&self, users: Arc<dyn UserManager>) -> Self {
        Self {
            users,
            ..self.clone()
        }
    }

    /// Checks whether every candidate may be added to the family stored in `family_document`.
    ///
    /// Candidates are checked in order and the first negative verdict is returned unchanged.
    /// `None` or an empty list succeeds without consulting the family repository's verdicts.
    ///
    /// # Errors
    ///
    /// Returns an `AccessError` if a collaborator fails; check failures are reported through
    /// the returned `StatusResponse`, not as errors.
    pub fn can_add_every_member(
        &self,
        family_document: &DocumentReference,
        candidates: Option<&[String]>,
    ) -> AccessResult<StatusResponse> {
        let family_id = family_document.name();
        let family = self.families.family_by_id(family_id)?;
        let actor = self.users.current_user()?;

        for candidate in candidates.unwrap_or_default() {
            let Some(family) = family.as_ref() else {
                return Ok(FamilyStatus::InvalidFamilyId(family_id.to_string()).into());
            };

            let Some(patient) = self.lookup_patient(candidate)? else {
                tracing::debug!(candidate = %candidate, "candidate patient does not exist");
                return Ok(FamilyStatus::InvalidPatientId(candidate.trim().to_string()).into());
            };

            let verdict =
                self.families
                    .can_patient_be_added_to_family(&patient, family, actor.as_ref())?;
            if !verdict.is_addable() {
                tracing::debug!(
                    family = %family.id,
                    patient = %patient.id,
                    ?verdict,
                    "patient cannot be added to family"
                );
                return Ok(verdict.into());
            }
        }

        Ok(StatusResponse::ok())
    }

    /// Checks whether the current actor may edit the family record in `family_document`.
    ///
    /// A collaborator failure is reported as the same 401 response as a refusal.
    pub fn check_family_access(&self, family_document: &DocumentReference) -> StatusResponse {
        let granted = self.users.current_user().and_then(|actor| {
            self.authorization
                .has_access(actor.as_ref(), Right::Edit, family_document)
        });

        match granted {
            Ok(true) => StatusResponse::ok(),
            Ok(false) => StatusResponse::family_edit_denied(),
            Err(e) => {
                tracing::warn!(document = %family_document, "family access check failed: {e}");
                StatusResponse::family_edit_denied()
            }
        }
    }

    /// Whether the current actor may edit the patient with identifier `patient_id`.
    ///
    /// Unknown or malformed identifiers are denied. Not meant for the family save path,
    /// which goes through [`ValidationService::can_add_every_member`].
    pub fn has_patient_edit_access_by_id(&self, patient_id: &str) -> AccessResult<bool> {
        let Some(patient) = self.lookup_patient(patient_id)? else {
            tracing::debug!(patient = %patient_id, "edit access denied for unknown patient");
            return Ok(false);
        };
        self.has_patient_edit_access(&patient)
    }

    pub fn has_patient_edit_access(&self, patient: &Patient) -> AccessResult<bool> {
        let actor = self.users.current_user()?;
        self.has_patient_access(patient, AccessLevel::Edit, actor.as_ref())
    }

    pub fn has_patient_edit_access_for(&self, patient: &Patient, user: &User) -> AccessResult<bool> {
        self.has_patient_access(patient, AccessLevel::Edit, Some(user))
    }

    pub fn has_patient_view_access(&self, patient: &Patient) -> AccessResult<bool> {
        let actor = self.users.current_user()?;
        self.has_patient_access(patient, AccessLevel::View, actor.as_ref())
    }

    pub fn has_patient_view_access_for(&self, patient: &Patient, user: &User) -> AccessResult<bool> {
        self.has_patient_access(patient, AccessLevel::View, Some(user))
    }

    /// Whether the current actor holds the permission named `permission` on `document`.
    ///
    /// Equivalent to [`ValidationService::has_right`] with `Right::from_name(permission)`;
    /// unknown names are never granted.
    pub fn has_access(&self, document: &DocumentReference, permission: &str) -> AccessResult<bool> {
        self.has_right(document, Right::from_name(permission))
    }

    pub fn has_right(&self, document: &DocumentReference, right: Right) -> AccessResult<bool> {
        let actor = self.users.current_user()?;
        self.authorization.has_access(actor.as_ref(), right, document)
    }

    fn has_patient_access(
        &self,
        patient: &Patient,
        required: AccessLevel,
        user: Option<&User>,
    ) -> AccessResult<bool> {
        let held = self.permissions.access_level(patient, user)?;
        tracing::debug!(patient = %patient.id, %held, %required, "patient access check");
        Ok(held.satisfies(required))
    }

    fn lookup_patient(&self, patient_id: &str) -> AccessResult<Option<Patient>> {
        match RecordId::parse(patient_id) {
            Ok(id) => self.patients.patient_by_id(&id),
            Err(_) => Ok(None),
        }
    }
}
