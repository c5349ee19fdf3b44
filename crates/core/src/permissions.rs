//! Permission seams: patient access tiers and document rights.

use crate::access::AccessLevel;
use crate::error::AccessResult;
use crate::records::{Patient, User};
use crate::reference::DocumentReference;
use crate::right::Right;

/// Computes the effective access tier a user holds over a patient record.
pub trait PermissionsManager: Send + Sync {
    /// `user` is `None` for a guest.
    fn access_level(&self, patient: &Patient, user: Option<&User>) -> AccessResult<AccessLevel>;
}

/// Answers whether a user holds a right on an arbitrary document.
pub trait AuthorizationService: Send + Sync {
    /// `user` is `None` for a guest. [`Right::Illegal`] must never be granted.
    fn has_access(
        &self,
        user: Option<&User>,
        right: Right,
        document: &DocumentReference,
    ) -> AccessResult<bool>;
}
