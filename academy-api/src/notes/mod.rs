//! Wrong-answer note image pipeline
//!
//! For one student and one round:
//! 1. read the student's wrong-question text and parse it into question numbers
//! 2. find the round's material and the regions drawn for those questions
//! 3. fetch the material document from storage once and parse it once
//! 4. cut every region out as a standalone one-page PDF, concurrently
//! 5. return the crops as data URIs, ascending by question number
//!
//! "Nothing to show" (no score row, empty or unparsable text, no material,
//! no matching regions) is an empty result, not an error. A region pointing
//! past the end of the document is skipped and reported in
//! [`NoteSet::skipped`]; storage and document failures fail the request.

pub mod extract;
pub mod geometry;
pub mod wrong_questions;

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::storage::{DocumentStore, StorageError};
use extract::SourceDocument;
use geometry::Rect;
pub use wrong_questions::parse_wrong_questions;

/// Request-level failures; no partial result is returned
#[derive(Error, Debug)]
pub enum NoteError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Stored bytes could not be parsed as a PDF
    #[error("Material document unreadable ({storage_key}): {reason}")]
    Document { storage_key: String, reason: String },

    #[error("Extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Failure confined to one region; the rest of the batch proceeds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegionError {
    #[error("question {question_number}: page {page_number} is outside the document ({page_count} pages)")]
    PageOutOfRange {
        question_number: i64,
        page_number: i64,
        page_count: usize,
    },

    #[error("question {question_number}: {reason}")]
    Extraction { question_number: i64, reason: String },
}

impl RegionError {
    pub fn question_number(&self) -> i64 {
        match self {
            RegionError::PageOutOfRange {
                question_number, ..
            }
            | RegionError::Extraction {
                question_number, ..
            } => *question_number,
        }
    }
}

/// One stored question region joined with its material's storage key
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RegionRecord {
    pub storage_key: String,
    pub question_number: i64,
    pub page_number: i64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RegionRecord {
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// Cropped question, ready for inline display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteImage {
    pub question_number: i64,
    /// `data:application/pdf;base64,...`
    #[serde(rename = "imageData")]
    pub image_data: String,
}

/// Result of one generation request
#[derive(Debug, Default)]
pub struct NoteSet {
    /// Ascending by question number
    pub images: Vec<NoteImage>,
    pub skipped: Vec<RegionError>,
}

/// Student wrong-answer lookup
#[async_trait]
pub trait ScoreSource: Send + Sync {
    /// Raw wrong-question text for a student in a round, `None` when no
    /// score row exists
    async fn wrong_questions(&self, phone: &str, round_id: i64) -> Result<Option<String>, NoteError>;
}

/// Material and question region lookup
#[async_trait]
pub trait RegionSource: Send + Sync {
    /// Material id owning the round, if one was uploaded
    async fn material_for_round(&self, round_id: i64) -> Result<Option<i64>, NoteError>;

    /// Regions of `material_id` whose question number is in `questions`
    async fn regions_for_questions(
        &self,
        material_id: i64,
        questions: &BTreeSet<i64>,
    ) -> Result<Vec<RegionRecord>, NoteError>;
}

/// Encode a PDF as an inlineable data URI
pub fn pdf_data_uri(bytes: &[u8]) -> String {
    format!(
        "data:application/pdf;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Orchestrates the note pipeline over injected collaborators
#[derive(Clone)]
pub struct NoteAssembler {
    scores: Arc<dyn ScoreSource>,
    regions: Arc<dyn RegionSource>,
    documents: Arc<dyn DocumentStore>,
}

impl NoteAssembler {
    pub fn new(
        scores: Arc<dyn ScoreSource>,
        regions: Arc<dyn RegionSource>,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            scores,
            regions,
            documents,
        }
    }

    /// Generate note images for `phone` in `round_id`
    pub async fn generate(&self, phone: &str, round_id: i64) -> Result<NoteSet, NoteError> {
        let Some(text) = self.scores.wrong_questions(phone, round_id).await? else {
            debug!(round_id, "No score record, nothing to generate");
            return Ok(NoteSet::default());
        };

        let questions = parse_wrong_questions(&text);
        if questions.is_empty() {
            debug!(round_id, "No wrong questions recorded");
            return Ok(NoteSet::default());
        }

        let Some(material_id) = self.regions.material_for_round(round_id).await? else {
            debug!(round_id, "Round has no material");
            return Ok(NoteSet::default());
        };

        let mut regions = self
            .regions
            .regions_for_questions(material_id, &questions)
            .await?;
        if regions.is_empty() {
            debug!(round_id, material_id, "No regions match the wrong questions");
            return Ok(NoteSet::default());
        }
        regions.sort_by_key(|r| r.question_number);
        regions.dedup_by_key(|r| r.question_number);

        // Every region of a round points at the same material document
        let storage_key = regions[0].storage_key.clone();
        let bytes = self.documents.get(&storage_key).await?;

        let source = {
            let storage_key = storage_key.clone();
            tokio::task::spawn_blocking(move || {
                SourceDocument::load(&bytes).map_err(|e| NoteError::Document {
                    storage_key,
                    reason: e.to_string(),
                })
            })
            .await??
        };
        let source = Arc::new(source);

        let tasks = regions.into_iter().map(|region| {
            let source = Arc::clone(&source);
            tokio::task::spawn_blocking(move || render_note(&source, &region))
        });

        let mut notes = NoteSet::default();
        for outcome in join_all(tasks).await {
            match outcome? {
                Ok(image) => notes.images.push(image),
                Err(region_error) => {
                    warn!(
                        question_number = region_error.question_number(),
                        storage_key = %storage_key,
                        "Skipping region: {}",
                        region_error
                    );
                    notes.skipped.push(region_error);
                }
            }
        }

        info!(
            round_id,
            material_id,
            generated = notes.images.len(),
            skipped = notes.skipped.len(),
            "Generated note images"
        );

        Ok(notes)
    }
}

fn render_note(source: &SourceDocument, region: &RegionRecord) -> Result<NoteImage, RegionError> {
    let pdf = source.extract_region(region.question_number, region.page_number, &region.rect())?;
    Ok(NoteImage {
        question_number: region.question_number,
        image_data: pdf_data_uri(&pdf),
    })
}
