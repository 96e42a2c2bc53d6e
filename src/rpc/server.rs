//! The TCP request dispatcher.
//!
//! Per connection: read one JSON request line, decode it, route it to the
//! matching service call, write one JSON response line, close. Every
//! connection gets exactly one response, including when decoding fails, when
//! the request names an unknown action, and when a service call fails
//! internally (a generic 500 is substituted and the failure is logged).
//!
//! Each accepted connection runs on its own task; the dispatcher itself does
//! no cross-connection coordination. Consistency is owed entirely to the
//! per-store critical sections underneath the services.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::error::{CorkboardError, Result};
use crate::forum::{CommentService, PostService, UserService};
use crate::rpc::types::{ApiRequest, Request, Response};
use crate::store::SnapshotStore;

/// How long a connection may sit idle before we give up on reading from it.
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// The three services shared by every connection task.
pub struct AppState {
    pub users: UserService,
    pub posts: PostService,
    pub comments: CommentService,
}

impl AppState {
    /// Opens the entity snapshots under `data_dir` and wires up the services.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let user_store = Arc::new(SnapshotStore::open(data_dir.join("users.json"))?);
        let post_store = Arc::new(SnapshotStore::open(data_dir.join("posts.json"))?);
        let comment_store = Arc::new(SnapshotStore::open(data_dir.join("comments.json"))?);

        Ok(Self {
            users: UserService::new(Arc::clone(&user_store)),
            posts: PostService::new(
                post_store,
                Arc::clone(&comment_store),
                Arc::clone(&user_store),
            )?,
            comments: CommentService::new(comment_store, user_store)?,
        })
    }
}

/// Accepts connections and answers one request on each.
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Serves connections from `listener` until the process exits.
    pub async fn run(self, listener: TcpListener) -> Result<()> {
        loop {
            let (socket, peer) = listener.accept().await?;
            debug!(%peer, "accepted connection");
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                if let Err(err) = handle_connection(socket, state).await {
                    warn!(%peer, error = %err, "connection failed");
                }
            });
        }
    }
}

/// Reads one request, produces one response, closes the connection.
async fn handle_connection(socket: TcpStream, state: Arc<AppState>) -> Result<()> {
    let (read_half, mut write_half) = socket.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();

    let response = match timeout(READ_TIMEOUT, reader.read_line(&mut line)).await {
        Err(_) => Response::bad_request("Request read timed out"),
        Ok(Err(err)) => {
            error!(error = %err, "failed to read request");
            Response::internal_error("Internal server error")
        }
        Ok(Ok(0)) => Response::bad_request("Empty request"),
        Ok(Ok(_)) => dispatch(&line, &state).await,
    };

    let mut payload = serde_json::to_vec(&response).unwrap_or_else(|_| {
        // The fallback payload is a constant and always serializes.
        br#"{"status":500,"body":{"error":"Internal server error"}}"#.to_vec()
    });
    payload.push(b'\n');
    write_half.write_all(&payload).await?;
    write_half.shutdown().await?;
    Ok(())
}

/// Decodes a request line and routes it to the matching service call.
async fn dispatch(line: &str, state: &Arc<AppState>) -> Response {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(err) => return Response::bad_request(format!("Malformed request: {}", err)),
    };

    let action = match request.action.parse() {
        Ok(action) => action,
        Err(err) => return error_response(&err),
    };

    let api_request = match ApiRequest::decode(&action, request.body) {
        Ok(api_request) => api_request,
        Err(err) => return error_response(&err),
    };

    info!(action = %request.action, "dispatching request");

    // Service calls do blocking file I/O under store locks, so they run off
    // the async worker threads.
    let state = Arc::clone(state);
    match tokio::task::spawn_blocking(move || execute(&state, api_request)).await {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => error_response(&err),
        Err(join_err) => {
            error!(error = %join_err, "request task panicked");
            Response::internal_error("Internal server error")
        }
    }
}

/// Executes one decoded request against the services.
fn execute(state: &AppState, request: ApiRequest) -> Result<Response> {
    match request {
        ApiRequest::UserCreate { body, role } => {
            let created = state.users.create_user(&body.user_name, &body.password, role)?;
            Ok(Response::ok(created))
        }
        ApiRequest::UserEdit { body, new_role } => {
            let edited = state.users.edit_user(
                &body.editor_name,
                &body.user_name,
                &body.old_password,
                &body.new_password,
                new_role,
            )?;
            Ok(Response::ok(edited))
        }
        ApiRequest::UserRemove(body) => {
            let removed =
                state
                    .users
                    .remove_user(&body.remover_name, &body.user_name, &body.password)?;
            Ok(Response::ok(removed))
        }
        ApiRequest::UserAuthenticate(body) => {
            let authenticated = state.users.authenticate(&body.user_name, &body.password)?;
            Ok(Response::ok(authenticated))
        }
        ApiRequest::UserGet(body) => {
            let user = state
                .users
                .get_user(&body.user_name, &body.password)?
                .ok_or_else(|| CorkboardError::not_found("User not found"))?;
            Ok(Response::ok(user))
        }

        ApiRequest::PostCreate(body) => {
            let post = state
                .posts
                .create_post(&body.title, &body.user_name, &body.content)?;
            Ok(Response::ok(post))
        }
        ApiRequest::PostEdit(body) => {
            let edited =
                state
                    .posts
                    .edit_post(body.post_id, &body.title, &body.user_name, &body.content)?;
            Ok(Response::ok(edited))
        }
        ApiRequest::PostRemove(body) => {
            let removed = state.posts.remove_post(body.post_id, &body.user_name)?;
            Ok(Response::ok(removed))
        }
        ApiRequest::PostGet(body) => {
            let post = state
                .posts
                .get_post(body.post_id)?
                .ok_or_else(|| CorkboardError::not_found("Post not found"))?;
            Ok(Response::ok(post))
        }
        ApiRequest::PostGetAll => Ok(Response::ok(state.posts.all_posts()?)),
        ApiRequest::PostGetComments(body) => {
            Ok(Response::ok(state.posts.post_comments(body.post_id)?))
        }
        ApiRequest::PostSearchTitles(body) => {
            Ok(Response::ok(state.posts.search_titles(&body.search_pattern)?))
        }
        ApiRequest::PostSearchContents(body) => Ok(Response::ok(
            state.posts.search_contents(&body.search_pattern)?,
        )),

        ApiRequest::CommentCreate(body) => {
            let comment =
                state
                    .comments
                    .create_comment(body.post_id, &body.user_name, &body.content)?;
            Ok(Response::ok(comment))
        }
        ApiRequest::CommentEdit(body) => {
            let edited =
                state
                    .comments
                    .edit_comment(body.comment_id, &body.user_name, &body.content)?;
            Ok(Response::ok(edited))
        }
        ApiRequest::CommentRemove(body) => {
            let removed = state
                .comments
                .remove_comment(body.comment_id, &body.user_name)?;
            Ok(Response::ok(removed))
        }
        ApiRequest::CommentGet(body) => {
            let comment = state
                .comments
                .get_comment(body.comment_id)?
                .ok_or_else(|| CorkboardError::not_found("Comment not found"))?;
            Ok(Response::ok(comment))
        }
        ApiRequest::CommentGetAll => Ok(Response::ok(state.comments.all_comments()?)),
        ApiRequest::CommentSearchContents(body) => Ok(Response::ok(
            state.comments.search_contents(&body.search_pattern)?,
        )),
    }
}

/// Maps an error to its wire response.
fn error_response(err: &CorkboardError) -> Response {
    match err {
        CorkboardError::InvalidRequest(message) => Response::bad_request(message.clone()),
        CorkboardError::NotFound(message) => Response::not_found(message.clone()),
        other => {
            error!(error = %other, "request failed internally");
            Response::internal_error("Internal server error")
        }
    }
}
