use super::auth;
use super::handlers;
use super::state::AppState;
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Speech session control
        .route("/speech/start", post(handlers::speech_start))
        .route("/speech/stop", post(handlers::speech_stop))
        .route("/speech/reset", post(handlers::speech_reset))
        .route("/speech/status", get(handlers::speech_status))
        // Shopping list
        .route(
            "/list",
            get(handlers::get_list).delete(handlers::clear_list),
        )
        .route("/list/items", post(handlers::add_item))
        .route("/list/items/:item_id", delete(handlers::delete_item))
        .route("/list/items/:item_id/toggle", post(handlers::toggle_item))
        .route("/list/completed", delete(handlers::clear_completed))
        .route("/list/progress", get(handlers::get_progress))
        .route("/list/suggestions", get(handlers::get_suggestions))
        // Recipes
        .route("/recipes", get(handlers::get_recipes))
        .route("/recipes/generate", post(handlers::generate_recipe))
        // Token check applies to the API, not the health probe
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ));

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(api)
        // Browser clients talk to this API directly
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
