// handlers/protected/channel/mod.rs - /api/channel/* for signed-in members

pub mod agreements;
pub mod block_user;
pub mod create_user;
pub mod get_users;
pub mod profile;
pub mod representative;
pub mod sales;
pub mod update_role;

pub use agreements::list_agreements;
pub use block_user::block_user;
pub use create_user::create_user;
pub use get_users::get_users;
pub use profile::get_profile;
pub use sales::list_all_sales;
pub use update_role::update_role;
