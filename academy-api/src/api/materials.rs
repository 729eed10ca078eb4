//! Lecture material endpoints: upload, listing, detail, region editor save

use std::collections::HashSet;

use academy_common::db::{Material, MaterialSummary, QuestionRegion};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::ApiError;
use crate::db::materials::{self, NewMaterial, NewRegion};
use crate::notes::extract::SourceDocument;
use crate::AppState;

/// Multipart field carrying the PDF
const FILE_FIELD: &str = "materialFile";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub material_id: i64,
    pub material_url: String,
}

#[derive(Debug, Serialize)]
pub struct MaterialDetail {
    pub material: Material,
    pub regions: Vec<QuestionRegion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefineRegionsRequest {
    pub material_id: Option<i64>,
    pub regions: Option<Vec<NewRegion>>,
}

#[derive(Debug, Default)]
struct UploadForm {
    round_id: Option<i64>,
    material_name: Option<String>,
    total_pages: Option<i64>,
    file_name: Option<String>,
    data: Option<Vec<u8>>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let bad_form = |e: axum::extract::multipart::MultipartError| {
        ApiError::BadRequest(format!("Invalid multipart body: {}", e))
    };
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "roundId" => {
                let text = field.text().await.map_err(bad_form)?;
                form.round_id = Some(text.trim().parse().map_err(|_| {
                    ApiError::BadRequest(format!("roundId must be an integer, got '{}'", text))
                })?);
            }
            "materialName" => {
                let text = field.text().await.map_err(bad_form)?;
                form.material_name = Some(text.trim().to_string()).filter(|t| !t.is_empty());
            }
            "totalPages" => {
                let text = field.text().await.map_err(bad_form)?;
                form.total_pages = text.trim().parse().ok();
            }
            FILE_FIELD => {
                form.file_name = field.file_name().map(str::to_string);
                form.data = Some(field.bytes().await.map_err(bad_form)?.to_vec());
            }
            other => warn!("Ignoring unexpected upload field '{}'", other),
        }
    }

    Ok(form)
}

/// Object key for an upload: `materials/<unix-millis>_<file name>`
fn storage_key(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("materials/{}_{}", chrono::Utc::now().timestamp_millis(), safe)
}

/// POST /api/materials/upload
///
/// Stores the PDF, then records it as the round's material. The page count
/// is read from the document itself.
pub async fn upload_material(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let form = read_upload_form(multipart).await?;

    let round_id = form
        .round_id
        .ok_or_else(|| ApiError::BadRequest("roundId is required".to_string()))?;
    let data = form
        .data
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", FILE_FIELD)))?;
    let file_name = form.file_name.unwrap_or_else(|| "material.pdf".to_string());
    let material_name = form.material_name.unwrap_or_else(|| file_name.clone());

    if !materials::round_exists(&state.db, round_id).await? {
        return Err(ApiError::NotFound(format!("Round {} not found", round_id)));
    }
    if materials::material_id_for_round(&state.db, round_id).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "Round {} already has a material",
            round_id
        )));
    }

    let (data, page_count) = tokio::task::spawn_blocking(move || {
        let pages = SourceDocument::load(&data).map(|doc| doc.page_count());
        (data, pages)
    })
    .await
    .map_err(|e| ApiError::Notes(e.into()))?;
    let page_count = page_count
        .map_err(|e| ApiError::BadRequest(format!("Uploaded file is not a readable PDF: {}", e)))?
        as i64;
    if let Some(claimed) = form.total_pages.filter(|c| *c != page_count) {
        warn!(claimed, page_count, "totalPages differs from document, using document");
    }

    let key = storage_key(&file_name);
    let url = state.documents.put(&key, data, "application/pdf").await?;

    let material_id = materials::insert_material(
        &state.db,
        &NewMaterial {
            round_id,
            material_name,
            file_key: key.clone(),
            file_url: Some(url.clone()),
            total_pages: Some(page_count),
        },
    )
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApiError::Conflict(format!("Round {} already has a material", round_id))
        }
        _ => ApiError::Database(e),
    })?;

    info!(material_id, round_id, storage_key = %key, page_count, "Material uploaded");

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "Material uploaded".to_string(),
            material_id,
            material_url: url,
        }),
    ))
}

/// GET /api/materials/list
pub async fn list_materials(
    State(state): State<AppState>,
) -> Result<Json<Vec<MaterialSummary>>, ApiError> {
    Ok(Json(materials::list_materials(&state.db).await?))
}

/// GET /api/materials/:id
pub async fn get_material(
    State(state): State<AppState>,
    Path(material_id): Path<i64>,
) -> Result<Json<MaterialDetail>, ApiError> {
    let material = materials::get_material(&state.db, material_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Material {} not found", material_id)))?;
    let regions = materials::regions_for_material(&state.db, material_id).await?;

    Ok(Json(MaterialDetail { material, regions }))
}

fn validate_regions(regions: &[NewRegion], total_pages: Option<i64>) -> Result<(), ApiError> {
    let mut seen = HashSet::new();

    for region in regions {
        let q = region.question_number;
        if q <= 0 {
            return Err(ApiError::BadRequest(format!(
                "questionNumber must be positive, got {}",
                q
            )));
        }
        if !seen.insert(q) {
            return Err(ApiError::BadRequest(format!("Duplicate questionNumber {}", q)));
        }
        if region.page_number <= 0 {
            return Err(ApiError::BadRequest(format!(
                "Question {}: pageNumber must be positive",
                q
            )));
        }
        if let Some(total) = total_pages {
            if region.page_number > total {
                return Err(ApiError::BadRequest(format!(
                    "Question {}: page {} exceeds the material's {} pages",
                    q, region.page_number, total
                )));
            }
        }
        let finite = [region.x, region.y, region.width, region.height]
            .iter()
            .all(|v| v.is_finite());
        if !finite || region.x < 0.0 || region.y < 0.0 || region.width <= 0.0 || region.height <= 0.0 {
            return Err(ApiError::BadRequest(format!(
                "Question {}: region must have non-negative origin and positive size",
                q
            )));
        }
    }

    Ok(())
}

/// POST /api/materials/define-regions
///
/// Replaces all regions of the material with the submitted set.
pub async fn define_regions(
    State(state): State<AppState>,
    Json(request): Json<DefineRegionsRequest>,
) -> Result<Json<Value>, ApiError> {
    let (Some(material_id), Some(regions)) = (request.material_id, request.regions) else {
        return Err(ApiError::BadRequest(
            "materialId and regions are required".to_string(),
        ));
    };

    let material = materials::get_material(&state.db, material_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Material {} not found", material_id)))?;

    validate_regions(&regions, material.total_pages)?;
    materials::replace_regions(&state.db, material_id, &regions).await?;

    Ok(Json(json!({ "message": "Question regions saved" })))
}
