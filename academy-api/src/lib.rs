//! academy-api library
//!
//! HTTP backend for lecture materials and wrong-answer notes.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod notes;
pub mod storage;

use db::Catalog;
use notes::NoteAssembler;
use storage::DocumentStore;

/// Upper bound on uploaded material size
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Object store holding material documents
    pub documents: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(db: SqlitePool, documents: Arc<dyn DocumentStore>) -> Self {
        Self { db, documents }
    }

    /// Note pipeline wired to this state's database and storage
    pub fn note_assembler(&self) -> NoteAssembler {
        let catalog = Arc::new(Catalog::new(self.db.clone()));
        NoteAssembler::new(catalog.clone(), catalog, Arc::clone(&self.documents))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let materials = Router::new()
        .route(
            "/upload",
            post(api::upload_material).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/list", get(api::list_materials))
        .route("/define-regions", post(api::define_regions))
        .route("/generate-note-images", get(api::generate_note_images))
        .route("/:id", get(api::get_material));

    Router::new()
        .nest("/api/materials", materials)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the admin frontend; no origin configured means no cross-origin access
pub fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .expose_headers([api::SKIPPED_QUESTIONS_HEADER]);

    match origin.and_then(|o| HeaderValue::from_str(o).ok()) {
        Some(origin) => layer.allow_origin(origin).allow_credentials(true),
        None => layer,
    }
}
