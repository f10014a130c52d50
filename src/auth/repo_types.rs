use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Which side of a donation an account is on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[serde(alias = "restaurant")]
    Restaurant,
    #[serde(alias = "ngo")]
    Ngo,
}

/// Editable contact details shown on the profile page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Account record held by the user directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,                   // unique user ID
    pub email: String,              // normalized email
    #[serde(skip_serializing)]
    pub password_hash: String,      // Argon2 hash, not exposed in JSON
    pub role: Role,
    pub organization: String,       // restaurant or NGO display name
    pub profile: Profile,
    pub created_at: OffsetDateTime, // creation timestamp
}

/// The authenticated account a request acts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Uuid,
    pub role: Role,
    pub organization: String,
}
