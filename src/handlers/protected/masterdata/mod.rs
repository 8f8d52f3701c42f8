// handlers/protected/masterdata/mod.rs - /api/masterdata/* (admin)

pub mod commission_scheme;
pub mod project;
pub mod project_inventory;
pub mod project_marketing;
pub mod region;
pub mod sync_airtable;
pub mod templates;

pub use commission_scheme::{get_commission_schemes, save_commission_schemes};
pub use project::{get_projects, save_project};
pub use project_inventory::get_project_inventory;
pub use project_marketing::{get_project_marketing, save_project_marketing};
pub use region::get_regions;
pub use sync_airtable::sync_airtable;
pub use templates::{add_template, delete_template, edit_template, list_templates};
