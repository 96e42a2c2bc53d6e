//! Comment management.

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::forum::permissions;
use crate::forum::types::{current_timestamp_millis, Comment, User};
use crate::search::{self, SearchResult};
use crate::store::{IdAllocator, SnapshotStore};

/// Service for creating, editing, removing and searching comments.
pub struct CommentService {
    comments: Arc<SnapshotStore<u64, Comment>>,
    users: Arc<SnapshotStore<String, User>>,
    ids: IdAllocator,
}

impl CommentService {
    /// Builds the service, seeding the id allocator from the comment
    /// snapshot. Comment ids form their own sequence, independent of posts.
    pub fn new(
        comments: Arc<SnapshotStore<u64, Comment>>,
        users: Arc<SnapshotStore<String, User>>,
    ) -> Result<Self> {
        let existing = comments.read(|map| map.keys().copied().collect::<Vec<u64>>())?;
        Ok(Self {
            comments,
            users,
            ids: IdAllocator::seeded(existing),
        })
    }

    /// Creates a comment and returns the stored record.
    ///
    /// The referenced post is not checked: a comment against a missing post
    /// is stored as-is and only disappears through the removal cascade.
    pub fn create_comment(&self, post_id: u64, username: &str, content: &str) -> Result<Comment> {
        let comment = Comment::new(
            self.ids.next(),
            post_id,
            username,
            content,
            current_timestamp_millis(),
        );
        self.comments.put(comment.id, comment.clone())?;
        debug!(comment_id = comment.id, post_id, author = username, "comment created");
        Ok(comment)
    }

    /// Overwrites a comment's content and marks it edited. Author-only.
    pub fn edit_comment(&self, comment_id: u64, username: &str, content: &str) -> Result<bool> {
        self.comments.update(|map| {
            let Some(comment) = map.get_mut(&comment_id) else {
                return Ok(false);
            };
            if !permissions::can_edit_owned(comment.author_username == username) {
                return Ok(false);
            }
            comment.content = content.to_string();
            comment.edited = true;
            Ok(true)
        })
    }

    /// Removes a comment. Permitted for the author, or for an admin or
    /// moderator requester.
    pub fn remove_comment(&self, comment_id: u64, username: &str) -> Result<bool> {
        let requester_role = self.users.read(|map| map.get(username).map(|u| u.role))?;

        self.comments.update(|map| {
            let Some(comment) = map.get(&comment_id) else {
                return Ok(false);
            };
            let is_owner = comment.author_username == username;
            if !permissions::can_remove_owned(requester_role, is_owner) {
                return Ok(false);
            }
            map.remove(&comment_id);
            Ok(true)
        })
    }

    /// Returns the comment with the given id, if any.
    pub fn get_comment(&self, comment_id: u64) -> Result<Option<Comment>> {
        self.comments.get(&comment_id)
    }

    /// Returns every comment. Order is unspecified.
    pub fn all_comments(&self) -> Result<Vec<Comment>> {
        self.comments.values()
    }

    /// Searches every comment body for the pattern.
    pub fn search_contents(&self, pattern: &str) -> Result<SearchResult<Comment>> {
        let mut result = SearchResult::new(pattern);
        for comment in self.comments.values()? {
            let offsets = search::find_all(&comment.content, pattern);
            if !offsets.is_empty() {
                result.add_match(comment, offsets);
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forum::types::Role;
    use crate::forum::users::UserService;
    use tempfile::TempDir;

    fn fixture(dir: &TempDir) -> (UserService, CommentService) {
        let user_store = Arc::new(SnapshotStore::open(dir.path().join("users.json")).unwrap());
        let comment_store = Arc::new(SnapshotStore::open(dir.path().join("comments.json")).unwrap());
        (
            UserService::new(Arc::clone(&user_store)),
            CommentService::new(comment_store, user_store).unwrap(),
        )
    }

    #[test]
    fn test_create_comment_assigns_increasing_ids() {
        let dir = TempDir::new().unwrap();
        let (_, comments) = fixture(&dir);

        let a = comments.create_comment(1, "alice", "first").unwrap();
        let b = comments.create_comment(1, "bob", "second").unwrap();
        assert!(a.id < b.id);
        assert_eq!(a.post_id, 1);
        assert!(!a.edited);
    }

    #[test]
    fn test_edit_comment_owner_only() {
        let dir = TempDir::new().unwrap();
        let (users, comments) = fixture(&dir);
        users.create_user("root", "pw", Role::Admin).unwrap();
        let comment = comments.create_comment(1, "alice", "original").unwrap();

        assert!(!comments.edit_comment(comment.id, "root", "hijacked").unwrap());
        assert_eq!(
            comments.get_comment(comment.id).unwrap().unwrap().content,
            "original"
        );

        assert!(comments.edit_comment(comment.id, "alice", "updated").unwrap());
        let edited = comments.get_comment(comment.id).unwrap().unwrap();
        assert_eq!(edited.content, "updated");
        assert!(edited.edited);
    }

    #[test]
    fn test_remove_comment_authorization_matrix() {
        let dir = TempDir::new().unwrap();
        let (users, comments) = fixture(&dir);
        users.create_user("author", "pw", Role::User).unwrap();
        users.create_user("bystander", "pw", Role::User).unwrap();
        users.create_user("mod", "pw", Role::Moderator).unwrap();
        users.create_user("root", "pw", Role::Admin).unwrap();

        let c1 = comments.create_comment(1, "author", "one").unwrap();
        let c2 = comments.create_comment(1, "author", "two").unwrap();
        let c3 = comments.create_comment(1, "author", "three").unwrap();

        assert!(!comments.remove_comment(c1.id, "bystander").unwrap());
        assert!(comments.remove_comment(c1.id, "author").unwrap());
        assert!(comments.remove_comment(c2.id, "mod").unwrap());
        assert!(comments.remove_comment(c3.id, "root").unwrap());
        assert!(comments.all_comments().unwrap().is_empty());
    }

    #[test]
    fn test_remove_absent_comment() {
        let dir = TempDir::new().unwrap();
        let (users, comments) = fixture(&dir);
        users.create_user("root", "pw", Role::Admin).unwrap();
        assert!(!comments.remove_comment(404, "root").unwrap());
    }

    #[test]
    fn test_search_contents_reports_all_offsets() {
        let dir = TempDir::new().unwrap();
        let (_, comments) = fixture(&dir);
        comments
            .create_comment(1, "u1", "This is a test comment with pattern")
            .unwrap();
        comments
            .create_comment(1, "u2", "Another comment without it")
            .unwrap();
        comments
            .create_comment(1, "u3", "Yet another test comment for testing")
            .unwrap();

        let result = comments.search_contents("test").unwrap();
        assert_eq!(result.matches.len(), 2);
        assert_eq!(result.count_matches(), 3);

        for matched in &result.matches {
            match matched.item.author_username.as_str() {
                "u1" => assert_eq!(matched.indexes, vec![10]),
                "u3" => assert_eq!(matched.indexes, vec![12, 29]),
                other => panic!("unexpected match author {}", other),
            }
        }
    }

    #[test]
    fn test_ids_continue_after_restart() {
        let dir = TempDir::new().unwrap();
        let max_before = {
            let (_, comments) = fixture(&dir);
            comments.create_comment(1, "alice", "a").unwrap();
            comments.create_comment(1, "alice", "b").unwrap().id
        };

        let (_, comments) = fixture(&dir);
        assert!(comments.create_comment(1, "alice", "c").unwrap().id > max_before);
    }
}
