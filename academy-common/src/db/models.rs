//! Database models
//!
//! Row shapes for the tables created in [`super::init`]. Serialized field
//! names follow the column names, which is what the admin frontend consumes.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One test round of a class (e.g. "정규 5회차" of class "A1")
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Round {
    pub id: i64,
    pub class_name: String,
    pub round_number: i64,
    pub round_name: Option<String>,
}

/// Uploaded exam/lecture document. At most one per round.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Material {
    pub id: i64,
    pub round_id: i64,
    pub material_name: String,
    /// Object storage key of the original document
    pub file_key: String,
    pub file_url: Option<String>,
    pub total_pages: Option<i64>,
    pub uploaded_at: NaiveDateTime,
}

/// Material listing row joined with its round
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MaterialSummary {
    pub id: i64,
    pub round_id: i64,
    pub material_name: String,
    pub file_key: String,
    pub file_url: Option<String>,
    pub total_pages: Option<i64>,
    pub uploaded_at: NaiveDateTime,
    pub class_name: String,
    pub round_number: i64,
}

/// Location of one question on one page of a material
///
/// Coordinates are top-left origin, in points calibrated against an
/// A4-portrait reference width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct QuestionRegion {
    pub id: i64,
    pub material_id: i64,
    pub question_number: i64,
    /// 1-based page index
    pub page_number: i64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A student's score for one round
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Score {
    pub id: i64,
    pub round_id: i64,
    pub phone: String,
    pub student_name: Option<String>,
    pub test_score: Option<f64>,
    pub total_question: Option<i64>,
    /// Comma-separated incorrectly answered question numbers, e.g. "3,7,15"
    pub wrong_questions: Option<String>,
}
