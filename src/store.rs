//! In-memory movie collection.
//!
//! Records keep insertion order. The store trusts its callers: data handed
//! to [`MovieStore::insert`] and [`MovieStore::merge_update`] has already
//! passed the schema.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{Movie, MovieId, MoviePatch, NewMovie};
use crate::schema::{MovieSchema, ValidationErrors};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("movie '{id}' not found")]
    NotFound { id: String },
}

impl StoreError {
    fn not_found(id: &str) -> Self {
        Self::NotFound { id: id.to_string() }
    }
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("seed data is not a JSON array of movies: {0}")]
    Format(#[from] serde_json::Error),
    #[error("seed movie #{index} ('{id}') is invalid: {source}")]
    Invalid {
        index: usize,
        id: String,
        #[source]
        source: ValidationErrors,
    },
    #[error("seed movie id '{0}' appears more than once")]
    DuplicateId(String),
}

#[derive(Debug, Deserialize)]
struct SeedMovie {
    id: MovieId,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct MovieStore {
    movies: Vec<Movie>,
}

impl MovieStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_movies(movies: Vec<Movie>) -> Self {
        Self { movies }
    }

    /// Builds a store from a JSON array of movies. Each entry keeps its own
    /// `id`; every other field must pass full validation.
    pub fn from_seed(json: &str, schema: &MovieSchema) -> Result<Self, SeedError> {
        let entries: Vec<SeedMovie> = serde_json::from_str(json)?;
        let mut store = Self::new();

        for (index, entry) in entries.into_iter().enumerate() {
            if store.contains(entry.id.as_str()) {
                return Err(SeedError::DuplicateId(entry.id.to_string()));
            }
            let data = schema
                .validate_full(&Value::Object(entry.fields))
                .map_err(|source| SeedError::Invalid {
                    index,
                    id: entry.id.to_string(),
                    source,
                })?;
            store.movies.push(Movie::from_new(entry.id, data));
        }

        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn list_all(&self) -> &[Movie] {
        &self.movies
    }

    /// Case-insensitive on both sides. No match is an empty result.
    pub fn filter_by_genre(&self, genre: &str) -> Vec<Movie> {
        self.movies
            .iter()
            .filter(|movie| movie.has_genre(genre))
            .cloned()
            .collect()
    }

    pub fn find_by_id(&self, id: &str) -> Result<&Movie, StoreError> {
        self.movies
            .iter()
            .find(|movie| movie.id == *id)
            .ok_or_else(|| StoreError::not_found(id))
    }

    pub fn insert(&mut self, data: NewMovie) -> Movie {
        let movie = Movie::from_new(self.fresh_id(), data);
        self.movies.push(movie.clone());
        movie
    }

    pub fn delete_by_id(&mut self, id: &str) -> Result<Movie, StoreError> {
        let index = self.position(id)?;
        Ok(self.movies.remove(index))
    }

    pub fn merge_update(&mut self, id: &str, patch: MoviePatch) -> Result<Movie, StoreError> {
        let index = self.position(id)?;
        let movie = &mut self.movies[index];
        movie.apply(patch);
        Ok(movie.clone())
    }

    fn contains(&self, id: &str) -> bool {
        self.movies.iter().any(|movie| movie.id == *id)
    }

    fn position(&self, id: &str) -> Result<usize, StoreError> {
        self.movies
            .iter()
            .position(|movie| movie.id == *id)
            .ok_or_else(|| StoreError::not_found(id))
    }

    fn fresh_id(&self) -> MovieId {
        loop {
            let id = MovieId::generate();
            if !self.contains(id.as_str()) {
                return id;
            }
        }
    }
}
