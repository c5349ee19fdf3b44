//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services. The
//! intent is to avoid reading process-wide environment variables during request handling, which
//! can lead to inconsistent behaviour in multi-threaded runtimes and test harnesses.

use crate::constants::{
    DEFAULT_DATA_FILE, DEFAULT_FAMILY_SPACE, DEFAULT_PATIENT_SPACE, DEFAULT_WIKI,
    USER_PROFILE_SPACE,
};
use crate::error::{AccessError, AccessResult};
use crate::reference::{DocumentReference, DocumentReferenceResolver};
use kindred_types::RecordId;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_file: PathBuf,
    wiki: RecordId,
    patient_space: RecordId,
    family_space: RecordId,
    user_space: RecordId,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// Patient and family records must live in distinct spaces, otherwise a document could not
    /// be classified as one or the other.
    pub fn new(
        data_file: PathBuf,
        wiki: RecordId,
        patient_space: RecordId,
        family_space: RecordId,
    ) -> AccessResult<Self> {
        if patient_space == family_space {
            return Err(AccessError::InvalidInput(
                "patient and family spaces must differ".into(),
            ));
        }

        Ok(Self {
            data_file,
            wiki,
            patient_space,
            family_space,
            user_space: RecordId::parse(USER_PROFILE_SPACE)?,
        })
    }

    /// Configuration with every setting at its default.
    pub fn with_data_file(data_file: PathBuf) -> AccessResult<Self> {
        Self::new(
            data_file,
            RecordId::parse(DEFAULT_WIKI)?,
            RecordId::parse(DEFAULT_PATIENT_SPACE)?,
            RecordId::parse(DEFAULT_FAMILY_SPACE)?,
        )
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub fn wiki(&self) -> &RecordId {
        &self.wiki
    }

    pub fn patient_space(&self) -> &RecordId {
        &self.patient_space
    }

    pub fn family_space(&self) -> &RecordId {
        &self.family_space
    }

    pub fn patient_reference(&self, id: &RecordId) -> DocumentReference {
        DocumentReference::new(self.wiki.clone(), self.patient_space.clone(), id.clone())
    }

    pub fn family_reference(&self, id: &RecordId) -> DocumentReference {
        DocumentReference::new(self.wiki.clone(), self.family_space.clone(), id.clone())
    }

    pub fn profile_reference(&self, username: &RecordId) -> DocumentReference {
        DocumentReference::new(self.wiki.clone(), self.user_space.clone(), username.clone())
    }

    /// Resolver for references supplied by callers; bare names land in the patient space.
    pub fn resolver(&self) -> DocumentReferenceResolver {
        DocumentReferenceResolver::new(self.wiki.clone(), self.patient_space.clone())
    }
}

/// Parse an identifier-valued setting from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns `default`.
pub fn identifier_from_env_value(
    setting: &str,
    value: Option<String>,
    default: &str,
) -> AccessResult<RecordId> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string());

    RecordId::parse(&value)
        .map_err(|e| AccessError::InvalidInput(format!("{setting} is not a valid name: {e}")))
}

/// Resolve the record fixture file without reading environment variables.
///
/// If `override_path` is provided, it must be an existing file. Otherwise the default file name
/// is looked up relative to the current working directory.
pub fn resolve_data_file(override_path: Option<PathBuf>) -> AccessResult<PathBuf> {
    if let Some(path) = override_path {
        if path.is_file() {
            return Ok(path);
        }
        return Err(AccessError::InvalidInput(format!(
            "record fixture {} does not exist or is not a file",
            path.display()
        )));
    }

    let default = PathBuf::from(DEFAULT_DATA_FILE);
    if default.is_file() {
        return Ok(default);
    }

    Err(AccessError::InvalidInput(format!(
        "could not locate {DEFAULT_DATA_FILE} in the working directory"
    )))
}
