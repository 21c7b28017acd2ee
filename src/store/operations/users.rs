use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::store::{files, guard, read, unix_timestamp, write, Store, StoreError};

/// A user record as stored in the users file. Field names match the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Argon2 PHC string, or a legacy SHA-256 hex digest.
    pub password: String,
    pub created_at: f64,
    pub last_login: f64,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub tag_permissions: Vec<String>,
    #[serde(default)]
    pub banned: bool,
}

impl User {
    pub fn new(password_digest: String) -> Self {
        let now = unix_timestamp();
        Self {
            password: password_digest,
            created_at: now,
            last_login: now,
            is_admin: false,
            tag_permissions: Vec::new(),
            banned: false,
        }
    }

    /// Admins edit any problem's metadata; others need a tag permission that
    /// is a substring of the title.
    pub fn can_edit(&self, title: &str) -> bool {
        self.is_admin
            || self
                .tag_permissions
                .iter()
                .any(|tag| !tag.is_empty() && title.contains(tag.as_str()))
    }
}

pub(crate) fn load_users(path: &Path) -> Result<BTreeMap<String, User>, StoreError> {
    match files::read_optional(path)? {
        Some(text) => Ok(serde_json::from_str(&text)?),
        None => {
            files::write_atomic(path, b"{}")?;
            Ok(BTreeMap::new())
        }
    }
}

impl Store {
    pub fn get_user(&self, username: &str) -> Option<User> {
        read(&self.users).get(username).cloned()
    }

    pub fn create_user(&self, username: &str, user: User) -> Result<(), StoreError> {
        {
            let mut users = write(&self.users);
            if users.contains_key(username) {
                return Err(StoreError::Conflict {
                    entity: "user".to_string(),
                    key: username.to_string(),
                });
            }
            users.insert(username.to_string(), user);
        }
        self.save_users()
    }

    /// Apply `f` to the stored user and persist. Returns the updated record.
    pub fn update_user<F>(&self, username: &str, f: F) -> Result<User, StoreError>
    where
        F: FnOnce(&mut User),
    {
        let updated = {
            let mut users = write(&self.users);
            let user = users
                .get_mut(username)
                .ok_or_else(|| StoreError::not_found("user", username))?;
            f(user);
            user.clone()
        };
        self.save_users()?;
        Ok(updated)
    }

    pub fn remove_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        let removed = write(&self.users).remove(username);
        if removed.is_some() {
            self.save_users()?;
        }
        Ok(removed)
    }

    pub fn list_users(&self) -> Vec<(String, User)> {
        read(&self.users)
            .iter()
            .map(|(name, user)| (name.clone(), user.clone()))
            .collect()
    }

    pub fn count_users(&self) -> usize {
        read(&self.users).len()
    }

    pub fn save_users(&self) -> Result<(), StoreError> {
        let _save = guard(&self.users_save_lock);
        let bytes = {
            let users = read(&self.users);
            serde_json::to_vec_pretty(&*users)?
        };
        files::write_atomic(&self.paths.users, &bytes)
    }
}
