//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::pipeline::{Pipeline, UploadStore};
use health_assistant_core::ports::{DatabaseService, GenerativeModel};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub pipeline: Pipeline,
}

impl AppState {
    /// Wires the pipeline from explicitly constructed service handles.
    pub fn new(
        db: Arc<dyn DatabaseService>,
        model: Arc<dyn GenerativeModel>,
        config: Arc<Config>,
    ) -> Self {
        let uploads = UploadStore::new(config.upload_dir.clone());
        let pipeline = Pipeline::new(db.clone(), model, uploads);
        Self {
            db,
            config,
            pipeline,
        }
    }
}
