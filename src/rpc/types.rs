//! Wire protocol types.
//!
//! One request per connection: the client sends a single JSON object
//! `{"action": "<resource>/<verb>", "body": {...}}` and receives a single
//! `{"status": <code>, "body": {...}}` object back.
//!
//! Bodies are decoded into typed per-action structs here, once, before any
//! service is invoked. A request that survives decoding carries well-formed
//! fields; a request that does not is answered with a 400 and never reaches
//! a service.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::error::{CorkboardError, Result};
use crate::forum::Role;

/// Success.
pub const STATUS_OK: u16 = 200;
/// Malformed or invalid request.
pub const STATUS_BAD_REQUEST: u16 = 400;
/// Entity absent for a singular fetch.
pub const STATUS_NOT_FOUND: u16 = 404;
/// Unexpected internal failure.
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// An inbound request envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Action selector in `resource/verb` form, e.g. `"post/create"`.
    pub action: String,
    /// Verb-specific fields.
    #[serde(default)]
    pub body: Value,
}

impl Request {
    /// Builds a request envelope (used by clients and tests).
    pub fn new(action: impl Into<String>, body: Value) -> Self {
        Self {
            action: action.into(),
            body,
        }
    }
}

/// An outbound response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Status code: 200, 400, 404 or 500.
    pub status: u16,
    /// Result payload on success, `{"error": ...}` otherwise.
    pub body: Map<String, Value>,
}

impl Response {
    /// A 200 response carrying the value under `"result"`.
    pub fn ok(result: impl Serialize) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => {
                let mut body = Map::new();
                body.insert("result".to_string(), value);
                Self {
                    status: STATUS_OK,
                    body,
                }
            }
            Err(e) => Self::internal_error(format!("Failed to encode response: {}", e)),
        }
    }

    /// A 400 response carrying the message under `"error"`.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::error(STATUS_BAD_REQUEST, message)
    }

    /// A 404 response carrying the message under `"error"`.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::error(STATUS_NOT_FOUND, message)
    }

    /// A 500 response carrying the message under `"error"`.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::error(STATUS_INTERNAL_ERROR, message)
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        let mut body = Map::new();
        body.insert("error".to_string(), Value::String(message.into()));
        Self { status, body }
    }
}

/// A parsed action selector.
///
/// Both halves are lowercased, so `"Post/Get-All"` routes like
/// `"post/get-all"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub resource: String,
    pub verb: String,
}

impl FromStr for Action {
    type Err = CorkboardError;

    fn from_str(s: &str) -> Result<Self> {
        let (resource, verb) = s
            .split_once('/')
            .ok_or_else(|| CorkboardError::invalid_request("Invalid action format"))?;
        if resource.is_empty() || verb.is_empty() {
            return Err(CorkboardError::invalid_request("Invalid action format"));
        }
        Ok(Self {
            resource: resource.to_ascii_lowercase(),
            verb: verb.to_ascii_lowercase(),
        })
    }
}

/// Accepts an id as either a JSON number or a numeric string.
fn id_number_or_string<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid id: {:?}", s))),
    }
}

// Per-action body schemas. Field names follow the wire's camelCase
// convention; unknown extra fields are ignored.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreateBody {
    pub user_name: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEditBody {
    pub editor_name: String,
    pub user_name: String,
    pub old_password: String,
    pub new_password: String,
    pub new_role: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRemoveBody {
    pub remover_name: String,
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCredentialsBody {
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCreateBody {
    pub title: String,
    pub user_name: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostEditBody {
    #[serde(deserialize_with = "id_number_or_string")]
    pub post_id: u64,
    pub title: String,
    pub user_name: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRemoveBody {
    #[serde(deserialize_with = "id_number_or_string")]
    pub post_id: u64,
    pub user_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostIdBody {
    #[serde(deserialize_with = "id_number_or_string")]
    pub post_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBody {
    pub search_pattern: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCreateBody {
    #[serde(deserialize_with = "id_number_or_string")]
    pub post_id: u64,
    pub user_name: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentEditBody {
    #[serde(deserialize_with = "id_number_or_string")]
    pub comment_id: u64,
    pub user_name: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRemoveBody {
    #[serde(deserialize_with = "id_number_or_string")]
    pub comment_id: u64,
    pub user_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentIdBody {
    #[serde(deserialize_with = "id_number_or_string")]
    pub comment_id: u64,
}

/// A fully decoded, well-formed request, ready to dispatch.
#[derive(Debug)]
pub enum ApiRequest {
    UserCreate { body: UserCreateBody, role: Role },
    UserEdit { body: UserEditBody, new_role: Role },
    UserRemove(UserRemoveBody),
    UserAuthenticate(UserCredentialsBody),
    UserGet(UserCredentialsBody),
    PostCreate(PostCreateBody),
    PostEdit(PostEditBody),
    PostRemove(PostRemoveBody),
    PostGet(PostIdBody),
    PostGetAll,
    PostGetComments(PostIdBody),
    PostSearchTitles(SearchBody),
    PostSearchContents(SearchBody),
    CommentCreate(CommentCreateBody),
    CommentEdit(CommentEditBody),
    CommentRemove(CommentRemoveBody),
    CommentGet(CommentIdBody),
    CommentGetAll,
    CommentSearchContents(SearchBody),
}

impl ApiRequest {
    /// Decodes an action and body into a typed request.
    ///
    /// Unknown resources, unknown verbs and malformed bodies all come back
    /// as `InvalidRequest`.
    pub fn decode(action: &Action, body: Value) -> Result<Self> {
        match (action.resource.as_str(), action.verb.as_str()) {
            ("user", "create") => {
                let body: UserCreateBody = decode_body(body)?;
                let role = body.role.parse()?;
                Ok(Self::UserCreate { body, role })
            }
            ("user", "edit") => {
                let body: UserEditBody = decode_body(body)?;
                let new_role = body.new_role.parse()?;
                Ok(Self::UserEdit { body, new_role })
            }
            ("user", "remove") => Ok(Self::UserRemove(decode_body(body)?)),
            ("user", "authenticate") => Ok(Self::UserAuthenticate(decode_body(body)?)),
            ("user", "get") => Ok(Self::UserGet(decode_body(body)?)),

            ("post", "create") => Ok(Self::PostCreate(decode_body(body)?)),
            ("post", "edit") => Ok(Self::PostEdit(decode_body(body)?)),
            ("post", "remove") => Ok(Self::PostRemove(decode_body(body)?)),
            ("post", "get") => Ok(Self::PostGet(decode_body(body)?)),
            ("post", "get-all") => Ok(Self::PostGetAll),
            ("post", "get-comments") => Ok(Self::PostGetComments(decode_body(body)?)),
            ("post", "search-titles") => Ok(Self::PostSearchTitles(decode_body(body)?)),
            ("post", "search-contents") => Ok(Self::PostSearchContents(decode_body(body)?)),

            ("comment", "create") => Ok(Self::CommentCreate(decode_body(body)?)),
            ("comment", "edit") => Ok(Self::CommentEdit(decode_body(body)?)),
            ("comment", "remove") => Ok(Self::CommentRemove(decode_body(body)?)),
            ("comment", "get") => Ok(Self::CommentGet(decode_body(body)?)),
            ("comment", "get-all") => Ok(Self::CommentGetAll),
            ("comment", "search-contents") => Ok(Self::CommentSearchContents(decode_body(body)?)),

            ("user", verb) | ("post", verb) | ("comment", verb) => {
                Err(CorkboardError::invalid_request(format!(
                    "Unknown action for {} resource: {}",
                    action.resource, verb
                )))
            }
            (resource, _) => Err(CorkboardError::invalid_request(format!(
                "Unknown resource: {}",
                resource
            ))),
        }
    }
}

fn decode_body<T: DeserializeOwned>(body: Value) -> Result<T> {
    serde_json::from_value(body)
        .map_err(|e| CorkboardError::invalid_request(format!("Invalid request body: {}", e)))
}
