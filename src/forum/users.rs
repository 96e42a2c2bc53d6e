//! User account management.

use std::sync::Arc;

use tracing::debug;

use crate::auth;
use crate::error::Result;
use crate::forum::permissions;
use crate::forum::types::{Role, User};
use crate::store::SnapshotStore;

/// Service for creating, editing, removing and authenticating users.
pub struct UserService {
    users: Arc<SnapshotStore<String, User>>,
}

impl UserService {
    pub fn new(users: Arc<SnapshotStore<String, User>>) -> Self {
        Self { users }
    }

    /// Creates a user with the given role, hashing the raw password.
    ///
    /// Returns `false` when the username is already taken. The existence
    /// check and the insert run inside one critical section, so two
    /// concurrent signups for the same name cannot both succeed.
    pub fn create_user(&self, username: &str, raw_password: &str, role: Role) -> Result<bool> {
        self.users.update(|map| {
            if map.contains_key(username) {
                debug!(username, "signup rejected, username taken");
                return Ok(false);
            }
            let digest = auth::hash_password(raw_password)?;
            map.insert(username.to_string(), User::new(username, digest, role));
            Ok(true)
        })
    }

    /// Replaces a user's password and role.
    ///
    /// Permitted for an admin editor, or for the user themselves with the
    /// old password verified. The stored record is replaced wholesale with a
    /// freshly hashed `new_raw_password` and `new_role`, also under the admin
    /// override where the old password was never checked.
    pub fn edit_user(
        &self,
        editor_name: &str,
        username: &str,
        old_raw_password: &str,
        new_raw_password: &str,
        new_role: Role,
    ) -> Result<bool> {
        self.users.update(|map| {
            let Some(target) = map.get(username) else {
                return Ok(false);
            };

            let editor = map.get(editor_name);
            let editor_role = editor.map(|u| u.role);
            let editor_is_target = editor.is_some() && editor_name == username;
            let old_password_ok = auth::verify_password(old_raw_password, &target.password_digest);

            if !permissions::can_edit_user(editor_role, editor_is_target, old_password_ok) {
                return Ok(false);
            }

            let digest = auth::hash_password(new_raw_password)?;
            map.insert(username.to_string(), User::new(username, digest, new_role));
            Ok(true)
        })
    }

    /// Deletes a user account.
    ///
    /// Permitted for an admin remover, or for the user themselves with their
    /// password verified.
    pub fn remove_user(&self, remover_name: &str, username: &str, raw_password: &str) -> Result<bool> {
        self.users.update(|map| {
            let Some(target) = map.get(username) else {
                return Ok(false);
            };

            let remover = map.get(remover_name);
            let remover_role = remover.map(|u| u.role);
            let remover_is_target = remover.is_some() && remover_name == username;
            let password_ok = auth::verify_password(raw_password, &target.password_digest);

            if !permissions::can_remove_user(remover_role, remover_is_target, password_ok) {
                return Ok(false);
            }

            map.remove(username);
            Ok(true)
        })
    }

    /// Checks a username and raw password pair. Absent users fail.
    pub fn authenticate(&self, username: &str, raw_password: &str) -> Result<bool> {
        self.users.read(|map| {
            map.get(username)
                .map(|user| auth::verify_password(raw_password, &user.password_digest))
                .unwrap_or(false)
        })
    }

    /// Returns the user record, but only with correct credentials.
    ///
    /// Absent user and wrong password are indistinguishable to the caller.
    pub fn get_user(&self, username: &str, raw_password: &str) -> Result<Option<User>> {
        self.users.read(|map| {
            map.get(username)
                .filter(|user| auth::verify_password(raw_password, &user.password_digest))
                .cloned()
        })
    }
}
