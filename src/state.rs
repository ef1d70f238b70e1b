use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    cors::{AllowList, OriginPolicy},
    schema::MovieSchema,
    store::MovieStore,
};

/// Shared handler state. Every read and write to the collection goes
/// through the one lock.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<MovieStore>>,
    pub schema: MovieSchema,
    pub origins: Arc<dyn OriginPolicy>,
}

impl AppState {
    pub fn new(store: MovieStore, schema: MovieSchema, origins: Arc<dyn OriginPolicy>) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            schema,
            origins,
        }
    }

    /// Default schema window and allow-list.
    pub fn with_store(store: MovieStore) -> Self {
        Self::new(store, MovieSchema::default(), Arc::new(AllowList::default()))
    }
}
