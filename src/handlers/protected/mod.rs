// handlers/protected/mod.rs - endpoints behind the group guard
//
// Each route group is wrapped with `authorize` and a group policy in
// `routes.rs`; handlers read the caller via `Extension<AuthUser>`.

pub mod channel;
pub mod gps;
pub mod log;
pub mod masterdata;
pub mod project_media;
pub mod sites;

pub use gps::gps;
pub use log::project_inventory_sync_audit;
pub use project_media::{delete_media, list_media, save_media};
