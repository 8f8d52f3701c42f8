use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::auth;
use crate::database::{Record, RecordExt, RecordStore, Table};
use crate::error::ApiError;
use crate::state::AppState;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_CHANNEL_ADMIN: &str = "channelAdmin";
pub const ROLE_CHANNEL_USER: &str = "channelUser";
pub const ROLE_OFFICE_ADMIN: &str = "officeAdmin";

/// Group policies attached to route groups.
pub const ADMIN: &[&str] = &[ROLE_ADMIN];
pub const CHANNEL_ADMIN: &[&str] = &[ROLE_ADMIN, ROLE_CHANNEL_ADMIN];
pub const CHANNEL_MEMBER: &[&str] = &[ROLE_ADMIN, ROLE_CHANNEL_ADMIN, ROLE_CHANNEL_USER];
pub const USER_DIRECTORY: &[&str] = &[ROLE_ADMIN, ROLE_CHANNEL_ADMIN, ROLE_OFFICE_ADMIN];
pub const ANY_MEMBER: &[&str] = &[ROLE_ADMIN, ROLE_CHANNEL_ADMIN, ROLE_CHANNEL_USER, ROLE_OFFICE_ADMIN];

const NO_TOKEN: &str = "No authorization token was found";
const INVALID_TOKEN: &str = "Invalid token";
const UNAUTHORIZED: &str = "Unauthorized";

/// Caller identity loaded from `auth_user` and its memberships
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub channel_id: Option<i64>,
    pub language: Option<String>,
    pub roles: Vec<String>,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    fn from_row(row: &Record, roles: Vec<String>) -> Self {
        let text = |key: &str| row.str_field(key).unwrap_or_default().to_string();
        Self {
            id: row.id().unwrap_or_default(),
            email: text("email"),
            first_name: text("first_name"),
            last_name: text("last_name"),
            channel_id: row.i64_field("channelId"),
            language: row.str_field("language").map(str::to_string),
            roles,
        }
    }
}

/// State for [`authorize`]: the app plus the roles a route group admits.
#[derive(Clone)]
pub struct GroupGuard {
    pub state: AppState,
    pub groups: &'static [&'static str],
}

impl GroupGuard {
    pub fn new(state: AppState, groups: &'static [&'static str]) -> Self {
        Self { state, groups }
    }
}

/// Bearer JWT guard. Loads the active user and its group roles, then checks
/// them against the route group's policy.
pub async fn authorize(
    State(guard): State<GroupGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(request.headers())?;

    let claims = auth::decode_token(&guard.state.config.security, token).map_err(|e| {
        warn!("Rejected token: {}", e);
        ApiError::unauthorized(INVALID_TOKEN)
    })?;

    let user = load_user(guard.state.store.as_ref(), claims.id)
        .await?
        .ok_or_else(|| {
            warn!("Token for unknown or inactive user #{}", claims.id);
            ApiError::unauthorized(UNAUTHORIZED)
        })?;

    if !guard.groups.iter().any(|g| user.has_role(g)) {
        warn!("User #{} with roles {:?} denied, route admits {:?}", user.id, user.roles, guard.groups);
        return Err(ApiError::unauthorized(UNAUTHORIZED));
    }

    debug!("Authorized user #{} ({:?})", user.id, user.roles);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized(NO_TOKEN))?
        .to_str()
        .map_err(|_| ApiError::unauthorized(INVALID_TOKEN))?;

    match header.split_once(' ') {
        Some(("Bearer", token)) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(ApiError::unauthorized(INVALID_TOKEN)),
    }
}

/// The active user with id `user_id` and the roles of its groups.
pub async fn load_user(store: &dyn RecordStore, user_id: i64) -> Result<Option<AuthUser>, ApiError> {
    let Some(row) = store.select_by_id(Table::AuthUser, user_id).await? else {
        return Ok(None);
    };
    if row.bool_field("is_active") != Some(true) {
        return Ok(None);
    }

    let group_ids: Vec<Value> = store
        .select_where(Table::AuthMembership, json!({ "user_id": user_id }))
        .await?
        .iter()
        .filter_map(|m| m.i64_field("group_id").map(Value::from))
        .collect();

    let roles = if group_ids.is_empty() {
        Vec::new()
    } else {
        store
            .select_where(Table::AuthGroup, json!({ "id": { "$in": group_ids } }))
            .await?
            .iter()
            .filter_map(|g| g.str_field("role").map(str::to_string))
            .collect()
    };

    Ok(Some(AuthUser::from_row(&row, roles)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(extract_bearer(&HeaderMap::new()).unwrap_err().message(), NO_TOKEN);
        assert_eq!(extract_bearer(&headers("BearerS abc")).unwrap_err().message(), INVALID_TOKEN);
        assert_eq!(extract_bearer(&headers("Bearer ")).unwrap_err().message(), INVALID_TOKEN);
    }

    #[test]
    fn policies_nest() {
        for role in CHANNEL_ADMIN {
            assert!(CHANNEL_MEMBER.contains(role));
        }
        assert!(ANY_MEMBER.contains(&ROLE_OFFICE_ADMIN));
        assert!(!CHANNEL_MEMBER.contains(&ROLE_OFFICE_ADMIN));
    }
}
