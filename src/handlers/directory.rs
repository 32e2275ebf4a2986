use crate::models::all_models::{Role, User};
use log::debug;
use std::sync::{PoisonError, RwLock};

/// In-memory user store. Usernames are not unique; lookups return the
/// first user inserted under a given name.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: RwLock<Vec<User>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Demo users available right after startup.
    pub fn seeded() -> Self {
        let directory = Self::new();
        directory.add(User::new("kelly", [Role::Admin, Role::User]));
        directory.add(User::new("john", [Role::Admin]));
        directory.add(User::new("adam", [Role::User]));
        directory
    }

    pub fn lookup(&self, username: &str) -> Option<User> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        users.iter().find(|user| user.username == username).cloned()
    }

    // Snapshot in insertion order
    pub fn list_all(&self) -> Vec<User> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn add(&self, user: User) {
        debug!("Adding user '{}' ({})", user.username, user.id);
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(user);
    }
}
