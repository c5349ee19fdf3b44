//! Who is acting.

use crate::error::AccessResult;
use crate::records::User;

pub trait UserManager: Send + Sync {
    /// The actor of the current call, or `None` for a guest.
    fn current_user(&self) -> AccessResult<Option<User>>;
}

/// A user manager bound to one actor, e.g. for a single request or CLI invocation.
#[derive(Debug, Clone, Default)]
pub struct FixedUserManager {
    user: Option<User>,
}

impl FixedUserManager {
    pub fn new(user: Option<User>) -> Self {
        Self { user }
    }

    pub fn guest() -> Self {
        Self { user: None }
    }
}

impl UserManager for FixedUserManager {
    fn current_user(&self) -> AccessResult<Option<User>> {
        Ok(self.user.clone())
    }
}
