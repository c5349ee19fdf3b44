use kindred_types::TextError;

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(#[from] TextError),
    #[error("unknown access level: {0}")]
    UnknownAccessLevel(String),
    #[error("invalid document reference: {0}")]
    InvalidReference(String),
    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("failed to read record fixture: {0}")]
    FixtureRead(std::io::Error),
    #[error("failed to parse record fixture YAML: {0}")]
    FixtureParse(serde_yaml::Error),
    #[error("inconsistent record fixture: {0}")]
    FixtureInconsistent(String),

    #[error("{collaborator} failed: {message}")]
    Collaborator {
        collaborator: &'static str,
        message: String,
    },
}

pub type AccessResult<T> = std::result::Result<T, AccessError>;
