//! HTTP API handlers for academy-api

pub mod error;
pub mod health;
pub mod materials;
pub mod notes;

pub use error::ApiError;
pub use health::health_routes;
pub use materials::{define_regions, get_material, list_materials, upload_material};
pub use notes::{generate_note_images, SKIPPED_QUESTIONS_HEADER};
