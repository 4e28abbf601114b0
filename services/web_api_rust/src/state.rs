//! Shared application state, constructed once at process start.

use crate::auth::UserRecord;
use quiniela_rust_core::store::PredictionStore;
use std::sync::Arc;

/// Everything a handler needs, injected explicitly so tests can substitute
/// a store double. No teardown required; the state lives for the process.
pub struct AppState {
    pub store: Arc<dyn PredictionStore>,
    pub users: Vec<UserRecord>,
    pub season: String,
}

impl AppState {
    pub fn new(
        store: Arc<dyn PredictionStore>,
        users: Vec<UserRecord>,
        season: String,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            users,
            season,
        })
    }
}
