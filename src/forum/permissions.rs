//! Permission checks for forum operations.
//!
//! Every service consults these predicates instead of repeating the boolean
//! logic inline. The model is:
//! - **Content editing** is ownership-only: a post or comment can be edited
//!   by its author and nobody else, regardless of role.
//! - **Content removal** extends to staff: admins and moderators may remove
//!   anyone's post or comment.
//! - **Account editing and removal** require either the admin role or the
//!   account holder acting on themselves with a verified password.
//!
//! All predicates are pure. Roles come in as `Option<Role>` because a
//! requester may not exist in the user store; an absent requester simply
//! contributes no role-based authority (ownership is judged separately).

use crate::forum::types::Role;

/// Returns true if the actor may edit an owned resource (post or comment).
///
/// Editing is ownership-only. There is deliberately no role override:
/// moderation can remove content but never rewrite it under the author's
/// name.
pub fn can_edit_owned(actor_is_owner: bool) -> bool {
    actor_is_owner
}

/// Returns true if the actor may remove an owned resource (post or comment).
///
/// The author may always remove their own content; admins and moderators may
/// remove anyone's.
pub fn can_remove_owned(actor_role: Option<Role>, actor_is_owner: bool) -> bool {
    actor_is_owner || matches!(actor_role, Some(Role::Admin) | Some(Role::Moderator))
}

/// Returns true if the editor may replace a user account's password and role.
///
/// Admins may edit any account without knowing the old password. Everyone
/// else may only edit their own account, and only with the old password
/// verified.
pub fn can_edit_user(editor_role: Option<Role>, editor_is_target: bool, old_password_ok: bool) -> bool {
    matches!(editor_role, Some(Role::Admin)) || (editor_is_target && old_password_ok)
}

/// Returns true if the remover may delete a user account.
///
/// Same shape as [`can_edit_user`]: admin override, or self-removal with a
/// verified password.
pub fn can_remove_user(
    remover_role: Option<Role>,
    remover_is_target: bool,
    password_ok: bool,
) -> bool {
    matches!(remover_role, Some(Role::Admin)) || (remover_is_target && password_ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_owned_is_ownership_only() {
        assert!(can_edit_owned(true));
        assert!(!can_edit_owned(false));
    }

    #[test]
    fn test_remove_owned_by_owner() {
        assert!(can_remove_owned(Some(Role::User), true));
        assert!(can_remove_owned(None, true));
    }

    #[test]
    fn test_remove_owned_by_staff() {
        assert!(can_remove_owned(Some(Role::Admin), false));
        assert!(can_remove_owned(Some(Role::Moderator), false));
    }

    #[test]
    fn test_remove_owned_denied_for_plain_user() {
        assert!(!can_remove_owned(Some(Role::User), false));
        assert!(!can_remove_owned(None, false));
    }

    #[test]
    fn test_edit_user_admin_override() {
        // Admins do not need the old password, even for other accounts.
        assert!(can_edit_user(Some(Role::Admin), false, false));
        assert!(can_edit_user(Some(Role::Admin), true, false));
    }

    #[test]
    fn test_edit_user_self_requires_password() {
        assert!(can_edit_user(Some(Role::User), true, true));
        assert!(!can_edit_user(Some(Role::User), true, false));
    }

    #[test]
    fn test_edit_user_denied_for_others() {
        // Moderators get no special authority over accounts.
        assert!(!can_edit_user(Some(Role::Moderator), false, true));
        assert!(!can_edit_user(Some(Role::User), false, true));
        assert!(!can_edit_user(None, false, true));
    }

    #[test]
    fn test_remove_user_matrix() {
        assert!(can_remove_user(Some(Role::Admin), false, false));
        assert!(can_remove_user(Some(Role::User), true, true));
        assert!(!can_remove_user(Some(Role::User), true, false));
        assert!(!can_remove_user(Some(Role::Moderator), false, true));
        assert!(!can_remove_user(None, false, false));
    }
}
