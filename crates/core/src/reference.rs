//! Document references.
//!
//! Every record (patient, family, user profile) lives in a document addressed as
//! `wiki:space.name`. Callers frequently hold only part of that address, so
//! [`DocumentReferenceResolver`] fills in the missing wiki and space from defaults.

use crate::error::{AccessError, AccessResult};
use kindred_types::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentReference {
    wiki: RecordId,
    space: RecordId,
    name: RecordId,
}

impl DocumentReference {
    pub fn new(wiki: RecordId, space: RecordId, name: RecordId) -> Self {
        Self { wiki, space, name }
    }

    /// Parses a fully qualified `wiki:space.name` reference.
    pub fn parse(input: &str) -> AccessResult<Self> {
        let input = input.trim();
        let (wiki, rest) = input.split_once(':').ok_or_else(|| {
            AccessError::InvalidReference(format!("'{input}' is missing the wiki part"))
        })?;
        let (space, name) = rest.split_once('.').ok_or_else(|| {
            AccessError::InvalidReference(format!("'{input}' is missing the space part"))
        })?;

        Ok(Self {
            wiki: reference_part(input, wiki)?,
            space: reference_part(input, space)?,
            name: reference_part(input, name)?,
        })
    }

    pub fn wiki(&self) -> &RecordId {
        &self.wiki
    }

    pub fn space(&self) -> &RecordId {
        &self.space
    }

    pub fn name(&self) -> &RecordId {
        &self.name
    }

    /// Whether this reference points into `space` of `wiki`.
    pub fn is_in(&self, wiki: &RecordId, space: &RecordId) -> bool {
        &self.wiki == wiki && &self.space == space
    }
}

fn reference_part(input: &str, part: &str) -> AccessResult<RecordId> {
    RecordId::parse(part)
        .map_err(|e| AccessError::InvalidReference(format!("'{input}': {e}")))
}

impl fmt::Display for DocumentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}.{}", self.wiki, self.space, self.name)
    }
}

impl FromStr for DocumentReference {
    type Err = AccessError;

    fn from_str(s: &str) -> AccessResult<Self> {
        Self::parse(s)
    }
}

impl Serialize for DocumentReference {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DocumentReference {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DocumentReference::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Resolves partial references relative to a current wiki and space.
///
/// Accepted forms:
/// - `name` resolves into the default wiki and space,
/// - `space.name` resolves into the default wiki,
/// - `wiki:space.name` is taken as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReferenceResolver {
    default_wiki: RecordId,
    default_space: RecordId,
}

impl DocumentReferenceResolver {
    pub fn new(default_wiki: RecordId, default_space: RecordId) -> Self {
        Self {
            default_wiki,
            default_space,
        }
    }

    pub fn resolve(&self, input: &str) -> AccessResult<DocumentReference> {
        let input = input.trim();
        if input.contains(':') {
            return DocumentReference::parse(input);
        }

        match input.split_once('.') {
            Some((space, name)) => Ok(DocumentReference::new(
                self.default_wiki.clone(),
                reference_part(input, space)?,
                reference_part(input, name)?,
            )),
            None => Ok(DocumentReference::new(
                self.default_wiki.clone(),
                self.default_space.clone(),
                reference_part(input, input)?,
            )),
        }
    }
}
