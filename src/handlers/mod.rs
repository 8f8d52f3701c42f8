// handlers/mod.rs - Handler tiers
//
// Public handlers need no token. Protected handlers sit behind the group
// guard and read the caller from the `AuthUser` request extension.

pub mod health;
pub mod onboarding;
pub mod protected;
pub mod public;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// JSON request body that degrades to `{}` when absent or unparsable, so
/// handlers can answer with their own validation messages.
#[derive(Debug, Clone)]
pub struct JsonBody(pub Value);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                tracing::debug!("Treating request body as empty: {}", rejection);
                Ok(JsonBody(Value::Object(Map::new())))
            }
        }
    }
}
