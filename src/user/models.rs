use serde::{Deserialize, Serialize};

/// Stored account. `hashed_password` never leaves the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
}

/// Everything needed to create a user; all fields required
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAttrs {
    pub id: String,
    pub username: String,
    pub email: String,
    pub hashed_password: String,
}

impl From<UserAttrs> for User {
    fn from(attrs: UserAttrs) -> Self {
        Self {
            id: attrs.id,
            username: attrs.username,
            email: attrs.email,
            hashed_password: attrs.hashed_password,
        }
    }
}

/// Selects users by every present field (AND-combined)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilterAttrs {
    pub id: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
}

impl UserFilterAttrs {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }

    pub fn by_username(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Self::default()
        }
    }
}

/// Fields to overwrite; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdateAttrs {
    pub username: Option<String>,
    pub email: Option<String>,
    pub hashed_password: Option<String>,
}
