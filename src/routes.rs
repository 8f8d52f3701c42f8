use axum::{
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Environment;
use crate::handlers::{health, protected, public};
use crate::middleware::auth::{self, authorize, GroupGuard};
use crate::state::AppState;

/// The full HTTP surface.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/live", get(health::live))
        .route("/ready", get(health::ready))
        .merge(public_routes())
        .merge(guarded(&state, auth::ADMIN, admin_routes()))
        .merge(guarded(&state, auth::CHANNEL_ADMIN, channel_admin_routes()))
        .merge(guarded(&state, auth::CHANNEL_MEMBER, channel_member_routes()))
        .merge(guarded(&state, auth::USER_DIRECTORY, user_directory_routes()))
        .merge(guarded(&state, auth::ANY_MEMBER, any_member_routes()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state)),
        )
        .with_state(state)
}

fn guarded(state: &AppState, groups: &'static [&'static str], routes: Router<AppState>) -> Router<AppState> {
    routes.route_layer(from_fn_with_state(GroupGuard::new(state.clone(), groups), authorize))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    if state.config.environment == Environment::Development {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = state
        .config
        .security
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/channel/register", post(public::register))
        .route("/api/channel/login", post(public::login))
        .route("/api/channel/confirmEmail", post(public::confirm_email))
        .route("/api/masterdata/getTemplate/:code", get(public::get_template_by_code))
}

fn admin_routes() -> Router<AppState> {
    use protected::{masterdata, sites};

    Router::new()
        .route("/api/log/projectInventorySyncAudit", get(protected::project_inventory_sync_audit))
        .route("/api/masterdata/region", get(masterdata::get_regions))
        .route(
            "/api/masterdata/commissionScheme",
            get(masterdata::get_commission_schemes).post(masterdata::save_commission_schemes),
        )
        .route("/api/masterdata/project", get(masterdata::get_projects).post(masterdata::save_project))
        .route("/api/masterdata/project/syncAirtable", post(masterdata::sync_airtable))
        .route("/api/masterdata/projectInventory", get(masterdata::get_project_inventory))
        .route(
            "/api/masterdata/projectMarketing",
            get(masterdata::get_project_marketing).post(masterdata::save_project_marketing),
        )
        .route("/api/masterdata/getTemplate", get(masterdata::list_templates))
        .route("/api/masterdata/addTemplate", post(masterdata::add_template))
        .route("/api/masterdata/editTemplate", post(masterdata::edit_template))
        .route("/api/masterdata/deleteTemplate", post(masterdata::delete_template))
        .route("/api/project/media", get(protected::list_media).post(protected::save_media))
        .route("/api/project/media/:id", delete(protected::delete_media))
        .route("/api/sites/cmp/projects", get(sites::get_cmp_projects).post(sites::save_cmp_projects))
        .route("/api/sites/cmp/region/:country", get(sites::get_cmp_region).post(sites::save_cmp_region))
        .route("/api/sites/cmp/project/:id", get(sites::get_cmp_project).post(sites::save_cmp_project))
        .route("/api/sites/cmp/projectInventory", post(sites::save_inventory_unit_pages))
}

fn channel_admin_routes() -> Router<AppState> {
    use protected::channel;

    Router::new()
        .route("/api/channel/createUser", post(channel::create_user))
        .route("/api/channel/updateRole", post(channel::update_role))
        .route("/api/channel/blockUser", post(channel::block_user))
}

fn channel_member_routes() -> Router<AppState> {
    use protected::channel;

    Router::new()
        .route("/api/channel/getProfile", get(channel::get_profile))
        .route("/api/channel/listAgreements", get(channel::list_agreements))
        .route("/api/channel/listAllSales", get(channel::list_all_sales))
}

fn user_directory_routes() -> Router<AppState> {
    Router::new().route("/api/channel/getUsers", post(protected::channel::get_users))
}

fn any_member_routes() -> Router<AppState> {
    Router::new().route("/api/gps", get(protected::gps))
}
