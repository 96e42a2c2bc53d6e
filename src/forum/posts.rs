//! Post management, including the comment cascade on removal.

use std::sync::Arc;

use tracing::{debug, error};

use crate::error::Result;
use crate::forum::permissions;
use crate::forum::types::{current_timestamp_millis, Comment, Post, User};
use crate::search::{self, SearchResult};
use crate::store::{IdAllocator, SnapshotStore};

/// Service for creating, editing, removing and searching posts.
///
/// Holds the comment store as well: removing a post deletes its comments,
/// and that cascade belongs to the post lifecycle rather than to the
/// comment service.
pub struct PostService {
    posts: Arc<SnapshotStore<u64, Post>>,
    comments: Arc<SnapshotStore<u64, Comment>>,
    users: Arc<SnapshotStore<String, User>>,
    ids: IdAllocator,
}

impl PostService {
    /// Builds the service, seeding the id allocator from the post snapshot
    /// so ids keep increasing across restarts.
    pub fn new(
        posts: Arc<SnapshotStore<u64, Post>>,
        comments: Arc<SnapshotStore<u64, Comment>>,
        users: Arc<SnapshotStore<String, User>>,
    ) -> Result<Self> {
        let existing = posts.read(|map| map.keys().copied().collect::<Vec<u64>>())?;
        Ok(Self {
            posts,
            comments,
            users,
            ids: IdAllocator::seeded(existing),
        })
    }

    /// Creates a post and returns the stored record.
    pub fn create_post(&self, title: &str, username: &str, content: &str) -> Result<Post> {
        let post = Post::new(
            self.ids.next(),
            title,
            username,
            content,
            current_timestamp_millis(),
        );
        self.posts.put(post.id, post.clone())?;
        debug!(post_id = post.id, author = username, "post created");
        Ok(post)
    }

    /// Overwrites a post's title and content and marks it edited.
    ///
    /// Only the author may edit; everyone else (including staff) gets
    /// `false`, as does an absent post id.
    pub fn edit_post(&self, post_id: u64, title: &str, username: &str, content: &str) -> Result<bool> {
        self.posts.update(|map| {
            let Some(post) = map.get_mut(&post_id) else {
                return Ok(false);
            };
            if !permissions::can_edit_owned(post.author_username == username) {
                return Ok(false);
            }
            post.title = title.to_string();
            post.content = content.to_string();
            post.edited = true;
            Ok(true)
        })
    }

    /// Removes a post and every comment that references it.
    ///
    /// Permitted for the author, or for an admin or moderator requester.
    /// The cascade holds both stores' critical sections, comment section
    /// first with the post section nested inside, the one fixed acquisition
    /// order used anywhere in the crate. Concurrent readers therefore see
    /// either the post with all its comments or neither. The two snapshot
    /// writes themselves are not transactional: the post snapshot is
    /// persisted before the comment snapshot, and a failure between the two
    /// is logged so an operator can clean up orphaned comments.
    pub fn remove_post(&self, post_id: u64, username: &str) -> Result<bool> {
        let requester_role = self.users.read(|map| map.get(username).map(|u| u.role))?;

        let result = self.comments.update(|comments| {
            let removed = self.posts.update(|posts| {
                let Some(post) = posts.get(&post_id) else {
                    return Ok(false);
                };
                let is_owner = post.author_username == username;
                if !permissions::can_remove_owned(requester_role, is_owner) {
                    return Ok(false);
                }
                posts.remove(&post_id);
                Ok(true)
            })?;

            if removed {
                comments.retain(|_, comment| comment.post_id != post_id);
            }
            Ok(removed)
        });

        match result {
            Ok(removed) => {
                if removed {
                    debug!(post_id, requester = username, "post removed with its comments");
                }
                Ok(removed)
            }
            Err(err) => {
                error!(
                    post_id,
                    error = %err,
                    "post removal failed; the post snapshot may already lack the post while its comments remain"
                );
                Err(err)
            }
        }
    }

    /// Returns the post with the given id, if any.
    pub fn get_post(&self, post_id: u64) -> Result<Option<Post>> {
        self.posts.get(&post_id)
    }

    /// Returns every post. Order is unspecified.
    pub fn all_posts(&self) -> Result<Vec<Post>> {
        self.posts.values()
    }

    /// Returns every comment referencing the given post.
    ///
    /// A full scan of the comment store; fine at this store's scale.
    pub fn post_comments(&self, post_id: u64) -> Result<Vec<Comment>> {
        self.comments.read(|map| {
            map.values()
                .filter(|comment| comment.post_id == post_id)
                .cloned()
                .collect()
        })
    }

    /// Searches every post title for the pattern.
    pub fn search_titles(&self, pattern: &str) -> Result<SearchResult<Post>> {
        let mut result = SearchResult::new(pattern);
        for post in self.posts.values()? {
            let offsets = search::find_all(&post.title, pattern);
            if !offsets.is_empty() {
                result.add_match(post, offsets);
            }
        }
        Ok(result)
    }

    /// Searches every post body for the pattern.
    pub fn search_contents(&self, pattern: &str) -> Result<SearchResult<Post>> {
        let mut result = SearchResult::new(pattern);
        for post in self.posts.values()? {
            let offsets = search::find_all(&post.content, pattern);
            if !offsets.is_empty() {
                result.add_match(post, offsets);
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

    struct Fixture {
        users: UserService,
        posts: PostService,
        comment_store: Arc<SnapshotStore<u64, Comment>>,
    }

    fn fixture(dir: &TempDir) -> Fixture {
        let user_store = Arc::new(SnapshotStore::open(dir.path().join("users.json")).unwrap());
        let post_store = Arc::new(SnapshotStore::open(dir.path().join("posts.json")).unwrap());
        let comment_store = Arc::new(SnapshotStore::open(dir.path().join("comments.json")).unwrap());
        Fixture {
            users: UserService::new(Arc::clone(&user_store)),
            posts: PostService::new(post_store, Arc::clone(&comment_store), user_store).unwrap(),
            comment_store,
        }
    }

    fn seed_comment(store: &SnapshotStore<u64, Comment>, id: u64, post_id: u64, author: &str) {
        store
            .put(id, Comment::new(id, post_id, author, "a comment", 0))
            .unwrap();
    }

    #[test]
    fn test_create_post_assigns_increasing_ids() {
        let dir = TempDir::new().unwrap();
        let fx = fixture(&dir);

        let a = fx.posts.create_post("First", "alice", "body").unwrap();
        let b = fx.posts.create_post("Second", "alice", "body").unwrap();
        let c = fx.posts.create_post("Third", "bob", "body").unwrap();

        assert!(a.id < b.id && b.id < c.id);
        assert!(!a.edited);
        assert_eq!(fx.posts.all_posts().unwrap().len(), 3);
    }

    #[test]
    fn test_edit_post_owner_only() {
        let dir = TempDir::new().unwrap();
        let fx = fixture(&dir);
        fx.users.create_user("root", "pw", Role::Admin).unwrap();
        let post = fx.posts.create_post("Title", "alice", "original").unwrap();

        // Even an admin cannot edit someone else's post.
        assert!(!fx.posts.edit_post(post.id, "X", "root", "hijacked").unwrap());
        assert_eq!(
            fx.posts.get_post(post.id).unwrap().unwrap().content,
            "original"
        );

        assert!(fx.posts.edit_post(post.id, "New", "alice", "updated").unwrap());
        let edited = fx.posts.get_post(post.id).unwrap().unwrap();
        assert_eq!(edited.title, "New");
        assert_eq!(edited.content, "updated");
        assert!(edited.edited);
    }

    #[test]
    fn test_edit_absent_post() {
        let dir = TempDir::new().unwrap();
        let fx = fixture(&dir);
        assert!(!fx.posts.edit_post(999, "T", "alice", "c").unwrap());
    }

    #[test]
    fn test_remove_post_authorization_matrix() {
        let dir = TempDir::new().unwrap();
        let fx = fixture(&dir);
        fx.users.create_user("author", "pw", Role::User).unwrap();
        fx.users.create_user("bystander", "pw", Role::User).unwrap();
        fx.users.create_user("mod", "pw", Role::Moderator).unwrap();
        fx.users.create_user("root", "pw", Role::Admin).unwrap();

        let p1 = fx.posts.create_post("One", "author", "body").unwrap();
        let p2 = fx.posts.create_post("Two", "author", "body").unwrap();
        let p3 = fx.posts.create_post("Three", "author", "body").unwrap();

        // A plain user who is not the author is denied.
        assert!(!fx.posts.remove_post(p1.id, "bystander").unwrap());
        assert!(fx.posts.get_post(p1.id).unwrap().is_some());

        assert!(fx.posts.remove_post(p1.id, "author").unwrap());
        assert!(fx.posts.remove_post(p2.id, "mod").unwrap());
        assert!(fx.posts.remove_post(p3.id, "root").unwrap());
        assert!(fx.posts.all_posts().unwrap().is_empty());
    }

    #[test]
    fn test_remove_post_cascades_comments() {
        let dir = TempDir::new().unwrap();
        let fx = fixture(&dir);
        let doomed = fx.posts.create_post("Doomed", "alice", "body").unwrap();
        let kept = fx.posts.create_post("Kept", "alice", "body").unwrap();

        seed_comment(&fx.comment_store, 1, doomed.id, "bob");
        seed_comment(&fx.comment_store, 2, doomed.id, "carol");
        seed_comment(&fx.comment_store, 3, kept.id, "bob");

        assert!(fx.posts.remove_post(doomed.id, "alice").unwrap());

        assert!(fx.posts.post_comments(doomed.id).unwrap().is_empty());
        let survivors = fx.comment_store.values().unwrap();
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].post_id, kept.id);
    }

    #[test]
    fn test_remove_absent_post() {
        let dir = TempDir::new().unwrap();
        let fx = fixture(&dir);
        fx.users.create_user("root", "pw", Role::Admin).unwrap();
        assert!(!fx.posts.remove_post(42, "root").unwrap());
    }

    #[test]
    fn test_ids_continue_after_restart() {
        let dir = TempDir::new().unwrap();
        let max_before = {
            let fx = fixture(&dir);
            fx.posts.create_post("A", "alice", "x").unwrap();
            fx.posts.create_post("B", "alice", "x").unwrap().id
        };

        let fx = fixture(&dir);
        let next = fx.posts.create_post("C", "alice", "x").unwrap();
        assert!(next.id > max_before);
    }

    #[test]
    fn test_search_titles_and_contents() {
        let dir = TempDir::new().unwrap();
        let fx = fixture(&dir);
        fx.posts.create_post("Rust tips", "alice", "borrow checker").unwrap();
        fx.posts.create_post("Cooking", "bob", "rust removal from pans").unwrap();

        let titles = fx.posts.search_titles("rust").unwrap();
        assert_eq!(titles.matches.len(), 1);
        assert_eq!(titles.matches[0].indexes, vec![0]);

        let contents = fx.posts.search_contents("rust").unwrap();
        assert_eq!(contents.matches.len(), 1);
        assert_eq!(contents.matches[0].item.author_username, "bob");

        let none = fx.posts.search_titles("haskell").unwrap();
        assert!(!none.has_matches());
    }
}
