//! User management API handlers
//!
//! Contains HTTP request handlers for user CRUD operations and the typed
//! extractors they rely on.

use crate::error::AppError;
use crate::state::AppState;
use crate::users::{User, UserChanges, UserId};
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Query, Request, State},
    http::{header::CONTENT_TYPE, request::Parts, StatusCode},
    response::Json,
    Form,
};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::info;

/// User response type
///
/// The external shape of a user. Internal bookkeeping fields stay out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserResponse {
    /// Unique identifier for the user
    pub id: UserId,
    /// User name
    pub name: String,
    /// User email
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// Message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable message
    pub message: String,
}

/// Arguments accepted by create and update requests
///
/// Both fields are optional at parse time; each handler decides what it
/// requires. Values come from a JSON or form-encoded body, with the query
/// string filling any field the body leaves out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserArgs {
    /// Requested name
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub name: Option<String>,
    /// Requested email
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub email: Option<String>,
}

impl UserArgs {
    /// Parse arguments from a raw JSON body
    pub fn from_json(body: &[u8]) -> Result<Self, AppError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| AppError::InvalidBody(e.to_string()))
    }

    /// Fill fields missing here from `fallback`
    pub fn or(self, fallback: Self) -> Self {
        Self {
            name: self.name.or(fallback.name),
            email: self.email.or(fallback.email),
        }
    }
}

/// Accept strings as they are and render numbers and booleans as text
fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(if b { "True" } else { "False" }.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a string, found {}",
            other
        ))),
    }
}

fn is_form_encoded(parts: &Parts) -> bool {
    parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

#[async_trait]
impl<S> FromRequest<S> for UserArgs
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();
        let Query(query_args) = Query::<UserArgs>::from_request_parts(&mut parts, state)
            .await
            .map_err(|e| AppError::InvalidBody(e.body_text()))?;
        let form_encoded = is_form_encoded(&parts);
        let req = Request::from_parts(parts, body);

        let body_args = if form_encoded {
            let Form(args) = Form::<UserArgs>::from_request(req, state)
                .await
                .map_err(|e| AppError::InvalidBody(e.body_text()))?;
            args
        } else {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|e| AppError::InvalidBody(e.body_text()))?;
            Self::from_json(&body)?
        };

        Ok(body_args.or(query_args))
    }
}

/// The `{id}` segment of an item path
///
/// Only unsigned decimal integers match; anything else is treated as an
/// unknown route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserIdPath(pub UserId);

impl UserIdPath {
    /// Parse a raw path segment
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::RouteNotFound);
        }
        // an integer too large to be stored matches the route but no user
        raw.parse()
            .map(Self)
            .map_err(|_| AppError::UserIdOutOfRange(raw.to_string()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for UserIdPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::RouteNotFound)?;
        Self::parse(&raw)
    }
}

/// Keep a field only when it carries a non-empty value
fn supplied(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// GET /api/users/ - List all users
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state.users.list_all().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// POST /api/users/ - Create a new user
pub async fn create_user(
    State(state): State<AppState>,
    args: UserArgs,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let (Some(name), Some(email)) = (supplied(args.name), supplied(args.email)) else {
        return Err(AppError::Validation(
            "Both name and email are required.".to_string(),
        ));
    };

    let user = state.users.create(&name, &email).await?;
    info!(user_id = user.id, "User created");

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// GET /api/users/:id - Get a specific user
pub async fn get_user(
    State(state): State<AppState>,
    UserIdPath(id): UserIdPath,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.users.get_by_id(id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// DELETE /api/users/:id - Delete a user
pub async fn delete_user(
    State(state): State<AppState>,
    UserIdPath(id): UserIdPath,
) -> Result<Json<MessageResponse>, AppError> {
    state.users.get_by_id(id).await?;
    state.users.delete(id).await?;
    info!(user_id = id, "User deleted");

    Ok(Json(MessageResponse {
        message: format!("User with ID {} deleted successfully.", id),
    }))
}

/// PATCH /api/users/:id - Update the supplied fields of a user
pub async fn update_user(
    State(state): State<AppState>,
    UserIdPath(id): UserIdPath,
    args: UserArgs,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.users.get_by_id(id).await?;

    let changes = UserChanges {
        name: supplied(args.name),
        email: supplied(args.email),
    };
    if changes.is_empty() {
        return Ok(Json(UserResponse::from(user)));
    }

    let user = state.users.update(id, &changes).await?;
    info!(user_id = id, "User updated");

    Ok(Json(UserResponse::from(user)))
}
