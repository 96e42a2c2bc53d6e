//! # corkboard
//!
//! A small multi-user forum backend. Users, posts and comments live in three
//! durable JSON snapshots, mutations are gated by ownership and role checks,
//! and free-text fields are searchable with a linear substring scan.
//!
//! ## Architecture
//!
//! - **`store`**: one whole-file snapshot per entity type, serialized behind
//!   a per-store lock, plus monotonic id allocation seeded from disk.
//! - **`forum`**: the domain records, the permission predicates, and the
//!   user/post/comment services (including the comment cascade when a post
//!   is removed).
//! - **`search`**: Knuth-Morris-Pratt substring matching with per-occurrence
//!   offsets, used by the search operations.
//! - **`auth`**: opaque Argon2 password hashing and verification.
//! - **`rpc`**: the one-request-per-connection TCP protocol and dispatcher.
//!
//! ## Protocol
//!
//! A client connects, writes one JSON line such as
//! `{"action": "post/create", "body": {"title": "Hi", "userName": "alice",
//! "content": "First post"}}`, and reads back one JSON line of the form
//! `{"status": 200, "body": {"result": ...}}` before the server closes the
//! connection.

pub mod auth;
pub mod error;
pub mod forum;
pub mod rpc;
pub mod search;
pub mod store;

pub use error::{CorkboardError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
