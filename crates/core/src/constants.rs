//! Constants used throughout the Kindred core crate.

/// Default record fixture file when no explicit path is configured.
pub const DEFAULT_DATA_FILE: &str = "kindred.yaml";

/// Default wiki used to resolve partial document references.
pub const DEFAULT_WIKI: &str = "xwiki";

/// Default space holding patient record documents.
pub const DEFAULT_PATIENT_SPACE: &str = "data";

/// Default space holding family record documents.
pub const DEFAULT_FAMILY_SPACE: &str = "Families";

/// Space holding user profile documents.
pub const USER_PROFILE_SPACE: &str = "XWiki";

/// Status code reported for a successful check.
pub const STATUS_OK: u16 = 200;

/// Status code reported when the actor lacks the required permission.
pub const STATUS_UNAUTHORIZED: u16 = 401;

/// Error kind label for permission failures.
pub const PERMISSIONS_ERROR_TYPE: &str = "permissions";

/// Message reported when the actor may not edit a family record.
pub const FAMILY_EDIT_DENIED_MESSAGE: &str = "Insufficient permissions to edit the family record.";
