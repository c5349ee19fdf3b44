//! # Kindred Types
//!
//! Validated identifiers shared by the Kindred crates.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input was not a usable record identifier
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

/// Identifier of a stored record (patient, family or user), e.g. `P0000001` or `FAM0000002`.
///
/// Identifiers end up as the name part of a document reference (`wiki:space.name`), so they are
/// restricted to a conservative ASCII set: alphanumerics, `-` and `_`. The `.` and `:`
/// separators are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    /// Maximum accepted identifier length.
    pub const MAX_LEN: usize = 255;

    /// Parses and validates a record identifier. Surrounding whitespace is trimmed.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();

        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }

        if trimmed.len() > Self::MAX_LEN {
            return Err(TextError::InvalidIdentifier(format!(
                "identifier exceeds maximum length of {} characters",
                Self::MAX_LEN
            )));
        }

        let ok = trimmed
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'-' | b'_'));
        if !ok {
            return Err(TextError::InvalidIdentifier(format!(
                "'{trimmed}' contains invalid characters (only alphanumeric, '-', '_' allowed)"
            )));
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for RecordId {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RecordId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_trims_and_rejects_blank() {
        assert_eq!(RecordId::parse("  P0000001 ").unwrap().as_str(), "P0000001");
        assert_eq!(RecordId::parse(" \t ").unwrap_err(), TextError::Empty);
    }

    #[test]
    fn record_id_accepts_typical_identifiers() {
        for id in ["P0000001", "FAM0000002", "jane_doe", "user-42"] {
            let parsed = RecordId::parse(id).expect("identifier should be valid");
            assert_eq!(parsed.as_str(), id);
        }
    }

    #[test]
    fn record_id_rejects_reference_separators() {
        for id in ["data.P0000001", "xwiki:P1", "a b", "P\u{e9}"] {
            assert!(
                matches!(RecordId::parse(id), Err(TextError::InvalidIdentifier(_))),
                "{id} should be rejected"
            );
        }
    }

    #[test]
    fn record_id_rejects_overlong_input() {
        let long = "a".repeat(RecordId::MAX_LEN + 1);
        assert!(matches!(
            RecordId::parse(long),
            Err(TextError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn record_id_deserialises_with_validation() {
        let id: RecordId = serde_json::from_str("\"P0000001\"").unwrap();
        assert_eq!(id.to_string(), "P0000001");
        assert!(serde_json::from_str::<RecordId>("\"\"").is_err());
    }
}
