//! Wrong-answer note generation endpoint

use axum::{
    extract::{Query, State},
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::ApiError;
use crate::db::rounds::{resolve_round_id, RoundScope};
use crate::notes::NoteImage;
use crate::AppState;

/// Comma-separated question numbers whose regions could not be cropped
pub const SKIPPED_QUESTIONS_HEADER: HeaderName = HeaderName::from_static("x-skipped-questions");

/// Query parameters: the student plus either `roundId` or `className` + `round`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteQuery {
    pub student_phone: Option<String>,
    pub round_id: Option<i64>,
    pub class_name: Option<String>,
    pub round: Option<i64>,
}

impl NoteQuery {
    fn scope(&self) -> Result<RoundScope, ApiError> {
        if let Some(id) = self.round_id {
            return Ok(RoundScope::Id(id));
        }
        match (self.class_name.as_deref().map(str::trim), self.round) {
            (Some(class_name), Some(round_number)) if !class_name.is_empty() => {
                Ok(RoundScope::ClassRound {
                    class_name: class_name.to_string(),
                    round_number,
                })
            }
            _ => Err(ApiError::BadRequest(
                "roundId or className and round are required".to_string(),
            )),
        }
    }
}

/// GET /api/materials/generate-note-images
///
/// Returns `[{ question_number, imageData }]` ascending by question number.
/// An unknown round, a missing score, or no matching regions all yield `[]`.
pub async fn generate_note_images(
    State(state): State<AppState>,
    Query(query): Query<NoteQuery>,
) -> Result<Response, ApiError> {
    let phone = query
        .student_phone
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("studentPhone is required".to_string()))?
        .to_string();
    let scope = query.scope()?;

    let Some(round_id) = resolve_round_id(&state.db, &scope).await? else {
        return Ok(Json(Vec::<NoteImage>::new()).into_response());
    };

    let notes = state.note_assembler().generate(&phone, round_id).await?;

    let mut response = Json(notes.images).into_response();
    if !notes.skipped.is_empty() {
        let skipped = notes
            .skipped
            .iter()
            .map(|e| e.question_number().to_string())
            .collect::<Vec<_>>()
            .join(",");
        if let Ok(value) = HeaderValue::from_str(&skipped) {
            response.headers_mut().insert(SKIPPED_QUESTIONS_HEADER, value);
        }
    }

    Ok(response)
}
