use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};

pub mod auth;
pub mod chat;
pub mod event;
pub mod integration;
pub mod message;
pub mod model;
pub mod state;
pub mod sync;
pub mod user;

mod error;

pub use error::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
pub(crate) mod testkit;

use crate::state::AppState;

/// Assembles the application router: the authenticated REST api under `/api`,
/// the websocket gateway at `/ws` and a liveness probe.
pub fn app(state: AppState, config: &integration::Config) -> Router {
    let api = chat::api(state.clone())
        .merge(message::api(state.clone()))
        .layer(from_fn_with_state(
            state.clone(),
            auth::middleware::authenticate,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(event::endpoints(state))
        .nest("/api", api)
        .layer(
            CorsLayer::new()
                .allow_origin(config.env.allow_origin())
                .allow_methods(AllowMethods::any())
                .allow_headers(AllowHeaders::any()),
        )
}

async fn health() -> &'static str {
    "OK"
}
