use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    error::AppResult,
    models::{ApiMessage, ListMoviesQuery, Movie},
    state::AppState,
};

pub const DELETED_MESSAGE: &str = "Movie deleted";

pub async fn healthcheck() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn list_movies(
    State(state): State<AppState>,
    Query(query): Query<ListMoviesQuery>,
) -> Json<Vec<Movie>> {
    let store = state.store.read().await;

    // `?genre=` lists everything
    let movies = match query.genre.as_deref().filter(|genre| !genre.is_empty()) {
        Some(genre) => {
            let movies = store.filter_by_genre(genre);
            debug!(genre, matched = movies.len(), "filtered movies by genre");
            movies
        }
        None => store.list_all().to_vec(),
    };

    Json(movies)
}

pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Movie>> {
    let store = state.store.read().await;
    let movie = store.find_by_id(&id)?.clone();
    Ok(Json(movie))
}

pub async fn create_movie(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Movie>)> {
    let Json(payload) = payload?;
    let data = state.schema.validate_full(&payload)?;

    let movie = state.store.write().await.insert(data);
    info!(movie_id = %movie.id, title = %movie.title, "movie created");

    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn delete_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiMessage>> {
    let removed = state.store.write().await.delete_by_id(&id)?;
    info!(movie_id = %removed.id, "movie deleted");

    Ok(Json(ApiMessage::new(DELETED_MESSAGE)))
}

pub async fn patch_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<Movie>> {
    let Json(payload) = payload?;
    let patch = state.schema.validate_partial(&payload)?;

    if !patch.has_changes() {
        debug!(movie_id = %id, "empty patch");
    }

    let movie = state.store.write().await.merge_update(&id, patch)?;
    info!(movie_id = %movie.id, "movie updated");

    Ok(Json(movie))
}
