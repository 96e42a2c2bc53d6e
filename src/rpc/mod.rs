//! Wire protocol and request dispatch.

mod server;
pub mod types;

pub use server::{AppState, Server};
pub use types::{Request, Response};
