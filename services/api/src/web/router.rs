//! services/api/src/web/router.rs
//!
//! Builds the route table. CORS and Swagger UI are layered on by the binary.

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::web::auth::{login_handler, logout_handler, valid_handler};
use crate::web::middleware::require_auth;
use crate::web::rest::{
    change_state_handler, create_item_handler, delete_item_handler, list_items_handler,
};
use crate::web::state::AppState;

pub fn app_router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/valid", get(valid_handler))
        .route("/get_data", get(list_items_handler))
        .route("/add_data", post(create_item_handler))
        .route("/add", post(create_item_handler))
        .route("/change_state", post(change_state_handler))
        .route("/delete_data", delete(delete_item_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
