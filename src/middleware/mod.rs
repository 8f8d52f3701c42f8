pub mod auth;
pub mod response;
pub mod tenant;

pub use auth::{authorize, AuthUser, GroupGuard};
pub use response::{ok, ok_with_id, ApiResponse, ApiResult};
pub use tenant::Tenant;
