//! In-memory record store.
//!
//! [`RecordStore`] loads a YAML [`RecordFixture`] once and then answers every collaborator
//! question the permission checks ask: it is a [`PatientRepository`], a [`FamilyRepository`],
//! a [`PermissionsManager`] and an [`AuthorizationService`]. It is immutable after loading and
//! is shared behind an `Arc`.
//!
//! ## Access rules
//!
//! Patient access tiers:
//! - the reporter owns the record,
//! - otherwise the higher of the collaborator grant and the visibility floor applies
//!   (`public` gives `view`; `open` gives `edit` to signed-in users and `view` to guests),
//! - administrators hold at least `manage`.
//!
//! Document rights:
//! - `illegal` is never granted and administrators hold every other right,
//! - explicit grants from the fixture apply to their document only,
//! - on a patient document, a right is held when the patient access tier allows it,
//! - on a family document, a right is held when it is held on every member's document; a
//!   family without members grants nothing.

pub mod fixture;

pub use fixture::RecordFixture;

use crate::access::AccessLevel;
use crate::config::CoreConfig;
use crate::error::{AccessError, AccessResult};
use crate::permissions::{AuthorizationService, PermissionsManager};
use crate::records::{Family, Patient, User, Visibility};
use crate::reference::DocumentReference;
use crate::repositories::{FamilyRepository, PatientRepository};
use crate::right::Right;
use crate::status::FamilyStatus;
use kindred_types::RecordId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct DocumentGrant {
    /// `None` applies to every actor, guests included.
    user: Option<RecordId>,
    document: DocumentReference,
    rights: Vec<Right>,
}

#[derive(Debug)]
pub struct RecordStore {
    cfg: Arc<CoreConfig>,
    users: HashMap<RecordId, User>,
    patients: HashMap<RecordId, Patient>,
    collaborators: HashMap<RecordId, HashMap<RecordId, AccessLevel>>,
    families: HashMap<RecordId, Family>,
    grants: Vec<DocumentGrant>,
}

fn inconsistent(message: String) -> AccessError {
    AccessError::FixtureInconsistent(message)
}

impl RecordStore {
    /// Reads and validates the fixture named by `cfg.data_file()`.
    pub fn load(cfg: Arc<CoreConfig>) -> AccessResult<Self> {
        let fixture = RecordFixture::read(cfg.data_file())?;
        Self::from_fixture(cfg, fixture)
    }

    pub fn from_yaml(cfg: Arc<CoreConfig>, yaml: &str) -> AccessResult<Self> {
        Self::from_fixture(cfg, RecordFixture::parse(yaml)?)
    }

    /// Builds the store, rejecting fixtures whose records reference each other inconsistently.
    pub fn from_fixture(cfg: Arc<CoreConfig>, fixture: RecordFixture) -> AccessResult<Self> {
        let mut users = HashMap::new();
        for entry in fixture.users {
            let user = User {
                profile: cfg.profile_reference(&entry.username),
                username: entry.username,
                admin: entry.admin,
            };
            if let Some(previous) = users.insert(user.username.clone(), user) {
                return Err(inconsistent(format!(
                    "duplicate user {}",
                    previous.username
                )));
            }
        }

        let mut family_of: HashMap<RecordId, RecordId> = HashMap::new();
        let mut families = HashMap::new();
        for entry in fixture.families {
            let mut seen = HashSet::new();
            for member in &entry.members {
                if !seen.insert(member) {
                    return Err(inconsistent(format!(
                        "family {} lists patient {member} twice",
                        entry.id
                    )));
                }
                if let Some(other) = family_of.insert(member.clone(), entry.id.clone()) {
                    return Err(inconsistent(format!(
                        "patient {member} belongs to both {other} and {}",
                        entry.id
                    )));
                }
            }

            let family = Family {
                document: cfg.family_reference(&entry.id),
                id: entry.id,
                members: entry.members,
            };
            if families.contains_key(&family.id) {
                return Err(inconsistent(format!("duplicate family {}", family.id)));
            }
            families.insert(family.id.clone(), family);
        }

        let mut patients = HashMap::new();
        let mut collaborators = HashMap::new();
        for entry in fixture.patients {
            if patients.contains_key(&entry.id) {
                return Err(inconsistent(format!("duplicate patient {}", entry.id)));
            }
            if let Some(reporter) = &entry.reporter {
                if !users.contains_key(reporter) {
                    return Err(inconsistent(format!(
                        "patient {} is reported by unknown user {reporter}",
                        entry.id
                    )));
                }
            }

            let mut grants = HashMap::new();
            for collaborator in entry.collaborators {
                if !users.contains_key(&collaborator.user) {
                    return Err(inconsistent(format!(
                        "patient {} names unknown collaborator {}",
                        entry.id, collaborator.user
                    )));
                }
                if !collaborator.access.is_assignable() {
                    return Err(inconsistent(format!(
                        "patient {} grants non-assignable access {} to {}",
                        entry.id, collaborator.access, collaborator.user
                    )));
                }
                grants.insert(collaborator.user, collaborator.access);
            }

            let patient = Patient {
                document: cfg.patient_reference(&entry.id),
                family: family_of.get(&entry.id).cloned(),
                id: entry.id,
                reporter: entry.reporter,
                visibility: entry.visibility,
            };
            collaborators.insert(patient.id.clone(), grants);
            patients.insert(patient.id.clone(), patient);
        }

        if let Some(unknown) = family_of.keys().find(|id| !patients.contains_key(*id)) {
            return Err(inconsistent(format!(
                "family {} lists unknown patient {unknown}",
                family_of[unknown]
            )));
        }

        let resolver = cfg.resolver();
        let mut grants = Vec::with_capacity(fixture.rights.len());
        for entry in fixture.rights {
            if let Some(user) = &entry.user {
                if !users.contains_key(user) {
                    return Err(inconsistent(format!("right granted to unknown user {user}")));
                }
            }
            if entry.rights.iter().any(|right| right.is_illegal()) {
                return Err(inconsistent(format!(
                    "the illegal right cannot be granted on {}",
                    entry.document
                )));
            }
            grants.push(DocumentGrant {
                user: entry.user,
                document: resolver.resolve(&entry.document)?,
                rights: entry.rights,
            });
        }

        tracing::debug!(
            users = users.len(),
            patients = patients.len(),
            families = families.len(),
            grants = grants.len(),
            "loaded record fixture"
        );

        Ok(Self {
            cfg,
            users,
            patients,
            collaborators,
            families,
            grants,
        })
    }

    pub fn config(&self) -> &Arc<CoreConfig> {
        &self.cfg
    }

    pub fn user(&self, username: &RecordId) -> Option<&User> {
        self.users.get(username)
    }

    /// Looks up a user by a caller-supplied name.
    pub fn user_by_name(&self, username: &str) -> AccessResult<User> {
        let id = RecordId::parse(username)
            .map_err(|_| AccessError::UnknownUser(username.trim().to_string()))?;
        self.users
            .get(&id)
            .cloned()
            .ok_or_else(|| AccessError::UnknownUser(id.to_string()))
    }

    fn explicitly_granted(
        &self,
        user: Option<&User>,
        right: Right,
        document: &DocumentReference,
    ) -> bool {
        self.grants.iter().any(|grant| {
            &grant.document == document
                && grant.rights.contains(&right)
                && match &grant.user {
                    None => true,
                    Some(username) => user.is_some_and(|u| &u.username == username),
                }
        })
    }

    fn patient_document_access(
        &self,
        user: Option<&User>,
        right: Right,
        patient: &Patient,
    ) -> AccessResult<bool> {
        if self.explicitly_granted(user, right, &patient.document) {
            return Ok(true);
        }
        Ok(self.access_level(patient, user)?.allows(right))
    }
}

fn visibility_floor(visibility: Visibility, signed_in: bool) -> AccessLevel {
    match visibility {
        Visibility::Private => AccessLevel::NoAccess,
        Visibility::Public => AccessLevel::View,
        Visibility::Open if signed_in => AccessLevel::Edit,
        Visibility::Open => AccessLevel::View,
    }
}

impl PatientRepository for RecordStore {
    fn patient_by_id(&self, id: &RecordId) -> AccessResult<Option<Patient>> {
        Ok(self.patients.get(id).cloned())
    }
}

impl FamilyRepository for RecordStore {
    fn family_by_id(&self, id: &RecordId) -> AccessResult<Option<Family>> {
        Ok(self.families.get(id).cloned())
    }

    fn can_patient_be_added_to_family(
        &self,
        patient: &Patient,
        family: &Family,
        actor: Option<&User>,
    ) -> AccessResult<FamilyStatus> {
        if let Some(current) = &patient.family {
            if current != &family.id {
                return Ok(FamilyStatus::AlreadyHasFamily(patient.id.to_string()));
            }
        }

        if !self.has_access(actor, Right::Edit, &patient.document)? {
            return Ok(FamilyStatus::InsufficientPermissionsOnPatient(
                patient.id.to_string(),
            ));
        }

        Ok(FamilyStatus::CanBeAdded)
    }
}

impl PermissionsManager for RecordStore {
    fn access_level(&self, patient: &Patient, user: Option<&User>) -> AccessResult<AccessLevel> {
        let Some(user) = user else {
            return Ok(visibility_floor(patient.visibility, false));
        };

        if patient.reporter.as_ref() == Some(&user.username) {
            return Ok(AccessLevel::Owner);
        }

        let granted = self
            .collaborators
            .get(&patient.id)
            .and_then(|grants| grants.get(&user.username))
            .copied()
            .unwrap_or_default();
        let mut level = granted.max(visibility_floor(patient.visibility, true));
        if user.admin {
            level = level.max(AccessLevel::Manage);
        }

        Ok(level)
    }
}

impl AuthorizationService for RecordStore {
    fn has_access(
        &self,
        user: Option<&User>,
        right: Right,
        document: &DocumentReference,
    ) -> AccessResult<bool> {
        if right.is_illegal() {
            return Ok(false);
        }
        if user.is_some_and(|u| u.admin) {
            return Ok(true);
        }
        if self.explicitly_granted(user, right, document) {
            return Ok(true);
        }

        let wiki = self.cfg.wiki();
        if document.is_in(wiki, self.cfg.patient_space()) {
            if let Some(patient) = self.patients.get(document.name()) {
                return self.patient_document_access(user, right, patient);
            }
        } else if document.is_in(wiki, self.cfg.family_space()) {
            if let Some(family) = self.families.get(document.name()) {
                if family.members.is_empty() {
                    return Ok(false);
                }
                for member in &family.members {
                    let Some(patient) = self.patients.get(member) else {
                        return Ok(false);
                    };
                    if !self.patient_document_access(user, right, patient)? {
                        return Ok(false);
                    }
                }
                return Ok(true);
            }
        }

        Ok(false)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    pub(crate) const FIXTURE: &str = r#"
users:
  - username: alice
  - username: bob
  - username: carol
  - username: root
    admin: true
patients:
  - id: P0000001
    reporter: alice
  - id: P0000002
    reporter: alice
    collaborators:
      - user: bob
        access: edit
  - id: P0000003
    reporter: carol
    visibility: public
  - id: P0000004
    reporter: carol
    visibility: open
  - id: P0000005
    reporter: bob
families:
  - id: FAM0000001
    members: [P0000001, P0000002]
  - id: FAM0000002
    members: [P0000005]
  - id: FAM0000003
rights:
  - user: carol
    document: Families.FAM0000003
    rights: [view, edit]
  - document: P0000003
    rights: [comment]
"#;

    pub(crate) fn test_cfg() -> Arc<CoreConfig> {
        Arc::new(
            CoreConfig::with_data_file(PathBuf::from("kindred.yaml"))
                .expect("CoreConfig::with_data_file should succeed"),
        )
    }

    pub(crate) fn test_store() -> RecordStore {
        RecordStore::from_yaml(test_cfg(), FIXTURE).expect("fixture should load")
    }

    fn id(s: &str) -> RecordId {
        RecordId::parse(s).unwrap()
    }

    fn user(store: &RecordStore, name: &str) -> User {
        store.user_by_name(name).expect("user should exist")
    }

    fn patient(store: &RecordStore, patient_id: &str) -> Patient {
        store
            .patient_by_id(&id(patient_id))
            .unwrap()
            .expect("patient should exist")
    }

    fn doc(s: &str) -> DocumentReference {
        DocumentReference::parse(s).unwrap()
    }

    #[test]
    fn load_reads_fixture_from_configured_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("kindred.yaml");
        std::fs::write(&path, FIXTURE).unwrap();

        let cfg = Arc::new(CoreConfig::with_data_file(path).unwrap());
        let store = RecordStore::load(cfg).expect("load should succeed");
        assert!(store.user(&id("alice")).is_some());
    }

    #[test]
    fn load_reports_missing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = Arc::new(CoreConfig::with_data_file(temp_dir.path().join("none.yaml")).unwrap());
        assert!(matches!(
            RecordStore::load(cfg),
            Err(AccessError::FixtureRead(_))
        ));
    }

    #[test]
    fn patients_know_their_family_and_document() {
        let store = test_store();
        let p1 = patient(&store, "P0000001");
        assert_eq!(p1.family, Some(id("FAM0000001")));
        assert_eq!(p1.document.to_string(), "xwiki:data.P0000001");
        assert_eq!(patient(&store, "P0000003").family, None);
    }

    #[test]
    fn user_by_name_rejects_unknown_and_malformed_names() {
        let store = test_store();
        assert!(user(&store, "root").admin);
        assert!(matches!(
            store.user_by_name("mallory"),
            Err(AccessError::UnknownUser(_))
        ));
        assert!(matches!(
            store.user_by_name("a.b"),
            Err(AccessError::UnknownUser(_))
        ));
    }

    #[test]
    fn access_level_follows_reporter_grants_visibility_and_admin() {
        let store = test_store();
        let alice = user(&store, "alice");
        let bob = user(&store, "bob");
        let carol = user(&store, "carol");
        let root = user(&store, "root");

        let p1 = patient(&store, "P0000001");
        assert_eq!(store.access_level(&p1, Some(&alice)).unwrap(), AccessLevel::Owner);
        assert_eq!(store.access_level(&p1, Some(&bob)).unwrap(), AccessLevel::NoAccess);
        assert_eq!(store.access_level(&p1, Some(&root)).unwrap(), AccessLevel::Manage);
        assert_eq!(store.access_level(&p1, None).unwrap(), AccessLevel::NoAccess);

        let p2 = patient(&store, "P0000002");
        assert_eq!(store.access_level(&p2, Some(&bob)).unwrap(), AccessLevel::Edit);

        let p3 = patient(&store, "P0000003");
        assert_eq!(store.access_level(&p3, Some(&bob)).unwrap(), AccessLevel::View);
        assert_eq!(store.access_level(&p3, None).unwrap(), AccessLevel::View);

        let p4 = patient(&store, "P0000004");
        assert_eq!(store.access_level(&p4, Some(&alice)).unwrap(), AccessLevel::Edit);
        assert_eq!(store.access_level(&p4, None).unwrap(), AccessLevel::View);
        assert_eq!(store.access_level(&p4, Some(&carol)).unwrap(), AccessLevel::Owner);
    }

    #[test]
    fn illegal_right_is_never_granted_even_to_admins() {
        let store = test_store();
        let root = user(&store, "root");
        assert!(!store
            .has_access(Some(&root), Right::Illegal, &doc("xwiki:data.P0000001"))
            .unwrap());
        assert!(store
            .has_access(Some(&root), Right::Programming, &doc("xwiki:data.P0000001"))
            .unwrap());
    }

    #[test]
    fn patient_document_rights_follow_access_level() {
        let store = test_store();
        let bob = user(&store, "bob");

        assert!(store
            .has_access(Some(&bob), Right::Edit, &doc("xwiki:data.P0000002"))
            .unwrap());
        assert!(!store
            .has_access(Some(&bob), Right::Delete, &doc("xwiki:data.P0000002"))
            .unwrap());
        assert!(!store
            .has_access(Some(&bob), Right::View, &doc("xwiki:data.P0000001"))
            .unwrap());
        assert!(!store
            .has_access(Some(&bob), Right::View, &doc("xwiki:data.P9999999"))
            .unwrap());
    }

    #[test]
    fn explicit_grants_apply_to_their_document_and_audience() {
        let store = test_store();
        let carol = user(&store, "carol");
        let bob = user(&store, "bob");

        let empty_family = doc("xwiki:Families.FAM0000003");
        assert!(store.has_access(Some(&carol), Right::Edit, &empty_family).unwrap());
        assert!(!store.has_access(Some(&bob), Right::Edit, &empty_family).unwrap());

        let public_patient = doc("xwiki:data.P0000003");
        assert!(store.has_access(None, Right::Comment, &public_patient).unwrap());
        assert!(!store.has_access(None, Right::Edit, &public_patient).unwrap());
    }

    #[test]
    fn family_document_rights_require_every_member() {
        let store = test_store();
        let alice = user(&store, "alice");
        let bob = user(&store, "bob");
        let family = doc("xwiki:Families.FAM0000001");

        assert!(store.has_access(Some(&alice), Right::Edit, &family).unwrap());
        // bob may edit P0000002 but not P0000001
        assert!(!store.has_access(Some(&bob), Right::Edit, &family).unwrap());
        assert!(!store
            .has_access(Some(&alice), Right::View, &doc("xwiki:Families.FAM0000003"))
            .unwrap());
    }

    #[test]
    fn can_patient_be_added_reports_conflicts_then_permissions() {
        let store = test_store();
        let alice = user(&store, "alice");
        let fam1 = store.family_by_id(&id("FAM0000001")).unwrap().unwrap();
        let fam3 = store.family_by_id(&id("FAM0000003")).unwrap().unwrap();

        let p1 = patient(&store, "P0000001");
        assert_eq!(
            store.can_patient_be_added_to_family(&p1, &fam1, Some(&alice)).unwrap(),
            FamilyStatus::CanBeAdded
        );
        assert_eq!(
            store.can_patient_be_added_to_family(&p1, &fam3, Some(&alice)).unwrap(),
            FamilyStatus::AlreadyHasFamily("P0000001".into())
        );

        let p3 = patient(&store, "P0000003");
        assert_eq!(
            store.can_patient_be_added_to_family(&p3, &fam3, Some(&alice)).unwrap(),
            FamilyStatus::InsufficientPermissionsOnPatient("P0000003".into())
        );
    }

    #[test]
    fn rejects_inconsistent_fixtures() {
        let cases = [
            "users:\n  - username: a\n  - username: a\n",
            "patients:\n  - id: P1\n  - id: P1\n",
            "patients:\n  - id: P1\n    reporter: ghost\n",
            "users:\n  - username: a\npatients:\n  - id: P1\n    collaborators:\n      - user: a\n        access: owner\n",
            "families:\n  - id: F1\n    members: [P1]\n",
            "patients:\n  - id: P1\nfamilies:\n  - id: F1\n    members: [P1, P1]\n",
            "patients:\n  - id: P1\nfamilies:\n  - id: F1\n    members: [P1]\n  - id: F2\n    members: [P1]\n",
            "families:\n  - id: F1\n  - id: F1\n",
            "rights:\n  - user: ghost\n    document: P1\n    rights: [view]\n",
            "rights:\n  - document: P1\n    rights: [illegal]\n",
        ];

        for yaml in cases {
            let err = RecordStore::from_yaml(test_cfg(), yaml)
                .expect_err("inconsistent fixture should be rejected");
            assert!(
                matches!(err, AccessError::FixtureInconsistent(_)),
                "unexpected error {err:?} for {yaml}"
            );
        }
    }
}
