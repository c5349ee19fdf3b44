//! Named document rights.
//!
//! A [`Right`] is what an authorization service grants on a single document. Rights arrive
//! either typed or as a permission name (`"edit"`, `"View"`, ...); [`Right::from_name`]
//! converts the latter without failing, mapping anything unrecognised to [`Right::Illegal`].

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Right {
    View,
    Edit,
    Delete,
    Comment,
    Admin,
    Login,
    Register,
    Programming,
    Script,
    /// Stands in for any unrecognised permission name. Never granted.
    Illegal,
}

impl Right {
    /// Every grantable right, i.e. all but [`Right::Illegal`].
    pub const GRANTABLE: [Right; 9] = [
        Right::View,
        Right::Edit,
        Right::Delete,
        Right::Comment,
        Right::Admin,
        Right::Login,
        Right::Register,
        Right::Programming,
        Right::Script,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Right::View => "view",
            Right::Edit => "edit",
            Right::Delete => "delete",
            Right::Comment => "comment",
            Right::Admin => "admin",
            Right::Login => "login",
            Right::Register => "register",
            Right::Programming => "programming",
            Right::Script => "script",
            Right::Illegal => "illegal",
        }
    }

    /// Converts a permission name into a right, ignoring case and surrounding whitespace.
    pub fn from_name(name: &str) -> Right {
        let name = name.trim();
        Self::GRANTABLE
            .into_iter()
            .find(|right| right.name().eq_ignore_ascii_case(name))
            .unwrap_or(Right::Illegal)
    }

    pub fn is_illegal(self) -> bool {
        self == Right::Illegal
    }
}

impl fmt::Display for Right {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for Right {
    fn from(name: &str) -> Self {
        Right::from_name(name)
    }
}
