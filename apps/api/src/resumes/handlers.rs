use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::storage::archive_export;
use crate::models::resume::{merge_skills, ResumeData};
use crate::render::{render_page, Page, RenderMode, Template};
use crate::resumes::validation::{describe, validate_resume, WriteKind};
use crate::state::AppState;
use crate::viewport::{Transform, ViewportFit};

#[derive(Deserialize)]
pub struct OwnerQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct PreviewQuery {
    pub user_id: Uuid,
    pub template: Option<String>,
    /// Width of the element the preview is shown in. Defaults to the page width.
    pub container_width: Option<f32>,
    /// Overrides the fit-to-screen default for the container width.
    pub fit: Option<bool>,
}

#[derive(Deserialize)]
pub struct ExportQuery {
    pub user_id: Uuid,
    pub template: Option<String>,
}

#[derive(Deserialize)]
pub struct SkillsRequest {
    pub skills: Vec<String>,
}

#[derive(Serialize)]
pub struct ResumeListResponse {
    pub count: usize,
    pub resumes: Vec<ResumeData>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub page: Page,
    pub transform: Transform,
    pub fit_to_screen: bool,
    /// Height the scaled page occupies in its container.
    pub reserved_height: f32,
    pub overflows: bool,
}

/// POST /api/v1/resumes
pub async fn handle_create(
    State(state): State<AppState>,
    Query(params): Query<OwnerQuery>,
    Json(input): Json<ResumeData>,
) -> Result<(StatusCode, Json<ResumeData>), AppError> {
    let mut resume = ResumeData {
        id: Uuid::new_v4(),
        user_id: params.user_id,
        ..input
    };
    resume.created_at = chrono::Utc::now();
    resume.updated_at = resume.created_at;

    validate_resume(&resume, WriteKind::Create).map_err(|e| AppError::Validation(describe(&e)))?;
    state.resumes.create(&resume).await?;
    Ok((StatusCode::CREATED, Json(resume)))
}

/// GET /api/v1/resumes
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<OwnerQuery>,
) -> Result<Json<ResumeListResponse>, AppError> {
    let resumes = state.resumes.list_by_owner(params.user_id).await?;
    Ok(Json(ResumeListResponse {
        count: resumes.len(),
        resumes,
    }))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<OwnerQuery>,
) -> Result<Json<ResumeData>, AppError> {
    Ok(Json(load(&state, id, params.user_id).await?))
}

/// PUT /api/v1/resumes/:id
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<OwnerQuery>,
    Json(input): Json<ResumeData>,
) -> Result<Json<ResumeData>, AppError> {
    let existing = load(&state, id, params.user_id).await?;
    let mut resume = ResumeData {
        id: existing.id,
        user_id: existing.user_id,
        created_at: existing.created_at,
        ..input
    };
    resume.touch();

    validate_resume(&resume, WriteKind::Update).map_err(|e| AppError::Validation(describe(&e)))?;
    save(&state, &resume).await?;
    Ok(Json(resume))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<OwnerQuery>,
) -> Result<StatusCode, AppError> {
    if !state.resumes.delete(id, params.user_id).await? {
        return Err(not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/resumes/:id/skills
/// Appends suggested skills the resume does not list yet.
/// Refused for a degraded document, which would otherwise lose the entries
/// that could not be read.
pub async fn handle_merge_skills(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<OwnerQuery>,
    Json(req): Json<SkillsRequest>,
) -> Result<Json<ResumeData>, AppError> {
    let mut resume = load(&state, id, params.user_id).await?;
    if resume.degraded {
        return Err(AppError::Conflict(
            "Resume has entries that could not be read; save the full document first"
                .to_string(),
        ));
    }
    let merged = merge_skills(&resume.skills, &req.skills);
    if merged.len() != resume.skills.len() {
        info!(
            "Added {} skill(s) to resume {id}",
            merged.len() - resume.skills.len()
        );
        resume.skills = merged;
        resume.touch();
        save(&state, &resume).await?;
    }
    Ok(Json(resume))
}

/// GET /api/v1/resumes/:id/preview
/// Renders the on-screen page and the transform that fits it to the container.
pub async fn handle_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<PreviewQuery>,
) -> Result<Json<PreviewResponse>, AppError> {
    let resume = load(&state, id, params.user_id).await?;
    let template = pick_template(params.template.as_deref(), &resume);
    let page = render_page(&resume, template, RenderMode::Interactive, state.page_size);

    let container = params
        .container_width
        .filter(|w| w.is_finite() && *w > 0.0)
        .unwrap_or(page.width_px);
    let mut viewport = ViewportFit::new(container, page.width_px);
    if let Some(fit) = params.fit {
        viewport.set_fit_to_screen(fit);
    }

    Ok(Json(PreviewResponse {
        transform: viewport.transform(),
        fit_to_screen: viewport.fit_to_screen(),
        reserved_height: viewport.reserved_height(page.height_px),
        overflows: page.overflows(),
        page,
    }))
}

/// GET /api/v1/resumes/:id/export
/// Exports the resume as a PDF attachment and archives a copy.
pub async fn handle_export(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let resume = load(&state, id, params.user_id).await?;
    let template = pick_template(params.template.as_deref(), &resume);

    let doc = state.exports.export(&resume, template).await?;
    archive_export(state.archive.as_ref(), resume.user_id, resume.id, &doc).await;

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", doc.file_name))
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        doc.bytes,
    )
        .into_response())
}

/// The `template` query parameter wins over the stored choice.
fn pick_template(requested: Option<&str>, resume: &ResumeData) -> Template {
    match requested {
        Some(id) => Template::from_id(Some(id)),
        None => resume.template,
    }
}

async fn load(state: &AppState, id: Uuid, owner: Uuid) -> Result<ResumeData, AppError> {
    state
        .resumes
        .fetch_by_id(id, owner)
        .await?
        .ok_or_else(not_found)
}

async fn save(state: &AppState, resume: &ResumeData) -> Result<(), AppError> {
    if !state.resumes.update(resume).await? {
        return Err(not_found());
    }
    Ok(())
}

fn not_found() -> AppError {
    AppError::NotFound("Resume not found".to_string())
}
