//! In-memory movie catalogue served over HTTP.
//!
//! [`store::MovieStore`] owns the records, [`schema::MovieSchema`] decides
//! what may be written to it, and [`app::build_router`] exposes both behind
//! an origin allow-list.

pub mod app;
pub mod config;
pub mod cors;
pub mod error;
pub mod handlers;
pub mod models;
pub mod schema;
pub mod state;
pub mod store;

pub use app::build_router;
pub use models::{Genre, Movie, MovieId, MoviePatch, NewMovie};
pub use schema::{MovieSchema, ValidationErrors, Violation};
pub use store::{MovieStore, StoreError};

/// Movies loaded at startup when no seed file is configured.
pub const BUNDLED_SEED: &str = include_str!("../data/movies.json");
