//! The forum domain: entities, permissions and services.
//!
//! Three entity types live in three independent snapshots:
//!
//! ```text
//! User (keyed by username)
//! Post (keyed by id)
//! Comment (keyed by id, references a Post by post_id)
//! ```
//!
//! Services orchestrate the stores with the permission predicates. Mutations
//! answer `true`/`false` rather than raising on denial, and edit/remove
//! deliberately report an absent entity and an unauthorized requester the
//! same way.

mod comments;
pub mod permissions;
mod posts;
mod types;
mod users;

pub use comments::CommentService;
pub use posts::PostService;
pub use types::{current_timestamp_millis, Comment, Post, Role, User};
pub use users::UserService;
