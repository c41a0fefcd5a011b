use std::fmt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of an issued session.
///
/// Inserted into request extensions by `require_session`; the CSRF layer
/// binds tokens to its string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generates a new random session id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Repository key holding this session.
    pub fn storage_key(&self) -> String {
        format!("session:{}", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
