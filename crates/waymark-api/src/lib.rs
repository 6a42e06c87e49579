//! # waymark-api
//!
//! HTTP API server for waymark: trips, locations, tags, search, bulk
//! import, admin reporting, and the browser-extension save endpoints.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod services;
pub mod state;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub use state::AppState;

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically — useful
/// for log correlation and debugging production incidents.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// CORS policy for the extension endpoints: `chrome-extension://*`
/// origins only, with credentialed requests allowed.
fn extension_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin, _| {
            origin.as_bytes().starts_with(b"chrome-extension://")
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Build the application router over the shared state.
pub fn app(state: AppState) -> Router {
    let extension_routes = Router::new()
        .route(
            "/api/extension/save-location",
            post(handlers::extension::save_location),
        )
        .route("/api/extension/status", get(handlers::extension::status))
        .layer(extension_cors());

    Router::new()
        .route("/health", get(handlers::health))
        // Trips
        .route(
            "/api/trips",
            get(handlers::trips::list_trips).post(handlers::trips::create_trip),
        )
        .route(
            "/api/trips/:id",
            get(handlers::trips::get_trip)
                .put(handlers::trips::update_trip)
                .delete(handlers::trips::delete_trip),
        )
        .route("/api/public/trips/:token", get(handlers::share::public_trip))
        // Locations
        .route(
            "/api/locations",
            get(handlers::locations::list_locations).post(handlers::locations::create_location),
        )
        .route(
            "/api/locations/:id",
            get(handlers::locations::get_location)
                .put(handlers::locations::update_location)
                .delete(handlers::locations::delete_location),
        )
        .route(
            "/api/locations/:id/audio",
            post(handlers::audio::process_audio),
        )
        // Search
        .route("/api/search", get(handlers::search::search))
        // Bulk import
        .route("/api/import", post(handlers::import::import_locations))
        .route("/api/import/parse-text", post(handlers::import::parse_text))
        // Admin
        .route(
            "/api/admin/tags",
            get(handlers::tags_admin::list_tags)
                .post(handlers::tags_admin::create_tag)
                .put(handlers::tags_admin::update_tag)
                .delete(handlers::tags_admin::delete_tag),
        )
        .route("/api/admin/tags/merge", post(handlers::tags_admin::merge_tags))
        .route("/api/admin/costs", get(handlers::costs::costs))
        .route(
            "/api/admin/settings",
            get(handlers::settings::list_settings).put(handlers::settings::put_setting),
        )
        // Extension (own CORS policy)
        .merge(extension_routes)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
