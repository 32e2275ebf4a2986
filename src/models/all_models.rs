use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

//  ROLES
// Closed set of authorization tags. Travels on the wire as its variant name.
#[derive(Debug, Serialize, Deserialize, Display, EnumString, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Role {
    Admin,
    User,
}

//  USERS
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub roles: Vec<Role>,
}

impl User {
    /// Creates a user with a freshly assigned id. Repeated roles are dropped,
    /// keeping the first occurrence.
    pub fn new(username: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        let mut unique: Vec<Role> = Vec::new();
        for role in roles {
            if !unique.contains(&role) {
                unique.push(role);
            }
        }

        User {
            id: Uuid::new_v4(),
            username: username.into(),
            roles: unique,
        }
    }
}

//Add User Request
// The id is never taken from the client.
#[derive(Debug, Deserialize, Serialize)]
pub struct NewUser {
    pub username: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl From<NewUser> for User {
    fn from(payload: NewUser) -> Self {
        User::new(payload.username, payload.roles)
    }
}
