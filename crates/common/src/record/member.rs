use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A member of a test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Member {
    pub fn new(name: &str, email: &str, role: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Whether this member and `other` collide under the case-insensitive
    /// (name, email) uniqueness rule
    pub fn same_identity(&self, other: &Member) -> bool {
        self.name.eq_ignore_ascii_case(&other.name) && self.email.eq_ignore_ascii_case(&other.email)
    }
}
