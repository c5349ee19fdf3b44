//! YAML layout of a record fixture.
//!
//! ```yaml
//! users:
//!   - username: alice
//!   - username: root
//!     admin: true
//! patients:
//!   - id: P0000001
//!     reporter: alice
//!     visibility: private        # private | public | open
//!     collaborators:
//!       - user: bob
//!         access: edit           # none | view | edit | manage
//! families:
//!   - id: FAM0000001
//!     members: [P0000001]
//! rights:
//!   - user: carol                # omit to grant to every actor, guests included
//!     document: Families.FAM0000001
//!     rights: [view]
//! ```
//!
//! Documents in `rights` are resolved relative to the configured wiki and patient space.

use crate::access::AccessLevel;
use crate::error::{AccessError, AccessResult};
use crate::records::Visibility;
use crate::right::Right;
use kindred_types::RecordId;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordFixture {
    #[serde(default)]
    pub users: Vec<UserEntry>,
    #[serde(default)]
    pub patients: Vec<PatientEntry>,
    #[serde(default)]
    pub families: Vec<FamilyEntry>,
    #[serde(default)]
    pub rights: Vec<RightGrantEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserEntry {
    pub username: RecordId,
    #[serde(default)]
    pub admin: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatientEntry {
    pub id: RecordId,
    #[serde(default)]
    pub reporter: Option<RecordId>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub collaborators: Vec<CollaboratorEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollaboratorEntry {
    pub user: RecordId,
    pub access: AccessLevel,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FamilyEntry {
    pub id: RecordId,
    #[serde(default)]
    pub members: Vec<RecordId>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RightGrantEntry {
    #[serde(default)]
    pub user: Option<RecordId>,
    pub document: String,
    pub rights: Vec<Right>,
}

impl RecordFixture {
    pub fn parse(yaml: &str) -> AccessResult<Self> {
        serde_yaml::from_str(yaml).map_err(AccessError::FixtureParse)
    }

    pub fn read(path: &Path) -> AccessResult<Self> {
        let yaml = std::fs::read_to_string(path).map_err(AccessError::FixtureRead)?;
        Self::parse(&yaml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_layout() {
        let fixture = RecordFixture::parse(
            r#"
users:
  - username: alice
  - username: root
    admin: true
patients:
  - id: P0000001
    reporter: alice
    visibility: public
    collaborators:
      - user: root
        access: edit
families:
  - id: FAM0000001
    members: [P0000001]
rights:
  - document: Families.FAM0000001
    rights: [view, comment]
"#,
        )
        .expect("fixture should parse");

        assert_eq!(fixture.users.len(), 2);
        assert!(fixture.users[1].admin);
        assert_eq!(fixture.patients[0].visibility, Visibility::Public);
        assert_eq!(fixture.patients[0].collaborators[0].access, AccessLevel::Edit);
        assert_eq!(fixture.families[0].members.len(), 1);
        assert_eq!(fixture.rights[0].user, None);
        assert_eq!(fixture.rights[0].rights, vec![Right::View, Right::Comment]);
    }

    #[test]
    fn empty_document_is_an_empty_fixture() {
        let fixture = RecordFixture::parse("{}").expect("empty mapping should parse");
        assert!(fixture.users.is_empty());
        assert!(fixture.patients.is_empty());
    }

    #[test]
    fn rejects_unknown_fields_and_bad_identifiers() {
        assert!(matches!(
            RecordFixture::parse("users:\n  - username: alice\n    role: nurse\n"),
            Err(AccessError::FixtureParse(_))
        ));
        assert!(matches!(
            RecordFixture::parse("patients:\n  - id: 'data.P1'\n"),
            Err(AccessError::FixtureParse(_))
        ));
    }
}
