//! # Kindred Core
//!
//! Permission checks for family-study records.
//!
//! This crate contains the checks a family or patient editing workflow runs before it saves:
//! - whether a list of patients may be added to a family,
//! - whether the current actor may edit a family record,
//! - whether an actor holds at least a given access tier over a patient,
//! - whether the current actor holds a named right on any document.
//!
//! The checks live in [`ValidationService`], which delegates every decision to collaborators
//! behind traits ([`PatientRepository`], [`FamilyRepository`], [`PermissionsManager`],
//! [`AuthorizationService`], [`UserManager`]). [`RecordStore`] implements all of them over a
//! YAML fixture for local use and tests.
//!
//! **No API concerns**: HTTP servers and command-line handling belong in `api-rest` and
//! `kindred-cli`.

pub mod access;
pub mod config;
pub mod constants;
pub mod error;
pub mod permissions;
pub mod records;
pub mod reference;
pub mod repositories;
pub mod right;
pub mod status;
pub mod store;
pub mod users;
pub mod validation;

pub use access::AccessLevel;
pub use config::CoreConfig;
pub use constants::*;
pub use error::{AccessError, AccessResult};
pub use kindred_types::{RecordId, TextError};
pub use permissions::{AuthorizationService, PermissionsManager};
pub use records::{Family, Patient, User, Visibility};
pub use reference::{DocumentReference, DocumentReferenceResolver};
pub use repositories::{FamilyRepository, PatientRepository};
pub use right::Right;
pub use status::{FamilyStatus, StatusResponse};
pub use store::RecordStore;
pub use users::{FixedUserManager, UserManager};
pub use validation::ValidationService;
