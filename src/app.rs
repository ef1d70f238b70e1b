use axum::{
    Router, middleware,
    routing::get,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    cors::{cors_layer, enforce_origin},
    handlers::{create_movie, delete_movie, get_movie, healthcheck, list_movies, patch_movie},
    state::AppState,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/movies", get(list_movies).post(create_movie))
        .route(
            "/movies/:id",
            get(get_movie).patch(patch_movie).delete(delete_movie),
        )
        // outermost first: the origin check runs before CORS and routing
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(state.clone(), enforce_origin))
                .layer(cors_layer(state.origins.clone())),
        )
        .with_state(state)
}
