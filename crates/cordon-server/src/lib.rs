//! CORDON Server — The HTTP surface in front of the authorization
//! core: bearer authentication guards, tenant-scoped user routes, and
//! the public webhook/tracking endpoints.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use state::AppState;

use axum::Router;
use axum::routing::{get, post};

/// Assemble the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/users", get(routes::users::list).post(routes::users::create))
        .route(
            "/users/:id",
            get(routes::users::get).patch(routes::users::update),
        )
        .route("/webhooks/events", post(routes::webhooks::ingest))
        .route(
            "/track/click/:campaign_id/:user_id",
            get(routes::track::click),
        )
        .route("/track/open/:campaign_id/:user_id", get(routes::track::open))
        .with_state(state)
}
