//! Itero board server.
//!
//! REST API over boards, lists, tasks and attachments. Handlers share one
//! [`AppState`] carrying the repository and the upload store.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod store;
pub mod uploads;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::store::KanbanRepository;
use crate::uploads::{UploadStore, UPLOADS_ROUTE};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn KanbanRepository>,
    pub uploads: UploadStore,
}

impl AppState {
    pub fn new(repo: Arc<dyn KanbanRepository>, uploads: UploadStore) -> Self {
        Self { repo, uploads }
    }
}

/// The `/api` router plus uploaded files and the compiled frontend. Paths the
/// frontend routes itself fall back to its `index.html`.
pub fn app(state: AppState, config: &Config) -> Router {
    let uploads_dir = state.uploads.dir().to_path_buf();

    Router::new()
        .nest("/api", routes::router())
        .nest_service(UPLOADS_ROUTE, ServeDir::new(uploads_dir))
        .fallback_service(
            ServeDir::new(&config.static_dir)
                .fallback(ServeFile::new(config.static_dir.join("index.html"))),
        )
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
