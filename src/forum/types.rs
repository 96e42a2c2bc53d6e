//! Domain records for the forum: users, posts and comments.
//!
//! Each record type maps one-to-one onto an entry in its entity snapshot.
//! Posts and comments are associated only by `post_id` value equality; there
//! is no structural ownership between the two stores.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::CorkboardError;

/// Returns the current time in milliseconds since the Unix epoch.
pub fn current_timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// A user's authorization role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// May edit or remove any user, post or comment.
    Admin,
    /// May remove any post or comment.
    Moderator,
    /// May only act on content they authored.
    User,
}

impl FromStr for Role {
    type Err = CorkboardError;

    /// Parses a role name case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "MODERATOR" => Ok(Role::Moderator),
            "USER" => Ok(Role::User),
            other => Err(CorkboardError::invalid_request(format!(
                "Unknown role: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "ADMIN"),
            Role::Moderator => write!(f, "MODERATOR"),
            Role::User => write!(f, "USER"),
        }
    }
}

/// A registered user. Keyed by `username` in the user snapshot.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique username, immutable once created.
    pub username: String,
    /// Opaque password digest (PHC string). Never the raw password.
    pub password_digest: String,
    /// Authorization role.
    pub role: Role,
}

impl User {
    /// Creates a user record from an already-hashed digest.
    pub fn new(username: impl Into<String>, password_digest: String, role: Role) -> Self {
        Self {
            username: username.into(),
            password_digest,
            role,
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keep the digest out of logs.
        f.debug_struct("User")
            .field("username", &self.username)
            .field("role", &self.role)
            .finish()
    }
}

/// A post. Keyed by `id` in the post snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Unique monotonic id, never reused.
    pub id: u64,
    /// Post title.
    pub title: String,
    /// Username of the author, set at creation and never changed.
    pub author_username: String,
    /// Post body.
    pub content: String,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: u64,
    /// True once the post has been edited.
    pub edited: bool,
}

impl Post {
    /// Creates a fresh, unedited post.
    pub fn new(
        id: u64,
        title: impl Into<String>,
        author_username: impl Into<String>,
        content: impl Into<String>,
        created_at: u64,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            author_username: author_username.into(),
            content: content.into(),
            created_at,
            edited: false,
        }
    }
}

/// A comment on a post. Keyed by `id` in the comment snapshot.
///
/// `post_id` is a plain value reference: removing a post cascades over the
/// comment store at the service level, and a comment created against a
/// missing post is stored as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Unique monotonic id from a sequence independent of post ids.
    pub id: u64,
    /// Id of the post this comment belongs to.
    pub post_id: u64,
    /// Username of the author, set at creation and never changed.
    pub author_username: String,
    /// Comment body.
    pub content: String,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: u64,
    /// True once the comment has been edited.
    pub edited: bool,
}

impl Comment {
    /// Creates a fresh, unedited comment.
    pub fn new(
        id: u64,
        post_id: u64,
        author_username: impl Into<String>,
        content: impl Into<String>,
        created_at: u64,
    ) -> Self {
        Self {
            id,
            post_id,
            author_username: author_username.into(),
            content: content.into(),
            created_at,
            edited: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parses_case_insensitively() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Moderator".parse::<Role>().unwrap(), Role::Moderator);
        assert_eq!("USER".parse::<Role>().unwrap(), Role::User);
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_wire_format_is_uppercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        let parsed: Role = serde_json::from_str("\"MODERATOR\"").unwrap();
        assert_eq!(parsed, Role::Moderator);
    }

    #[test]
    fn test_new_post_is_unedited() {
        let post = Post::new(1, "Title", "alice", "Body", 123);
        assert!(!post.edited);
        assert_eq!(post.author_username, "alice");
    }

    #[test]
    fn test_user_debug_hides_digest() {
        let user = User::new("alice", "$argon2id$secret".to_string(), Role::User);
        let rendered = format!("{:?}", user);
        assert!(!rendered.contains("argon2"));
        assert!(rendered.contains("alice"));
    }

    #[test]
    fn test_entity_wire_field_names() {
        let comment = Comment::new(2, 1, "bob", "hi", 456);
        let json = serde_json::to_value(&comment).unwrap();
        assert!(json.get("postId").is_some());
        assert!(json.get("authorUsername").is_some());
        assert!(json.get("createdAt").is_some());
    }
}
