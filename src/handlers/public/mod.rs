// handlers/public/mod.rs - endpoints reachable without a token

pub mod confirm_email;
pub mod login;
pub mod register;
pub mod template;

pub use confirm_email::confirm_email;
pub use login::login;
pub use register::register;
pub use template::get_template_by_code;
