use std::sync::Arc;

use crate::export::storage::ExportArchive;
use crate::export::ExportPipeline;
use crate::profile::ProfileRepository;
use crate::render::PageSize;
use crate::resumes::ResumeRepository;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Every collaborator is passed in here explicitly; tests swap in in-memory
/// implementations.
#[derive(Clone)]
pub struct AppState {
    pub resumes: Arc<dyn ResumeRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    /// Object storage copy of every exported document.
    pub archive: Arc<dyn ExportArchive>,
    /// Export pipeline. Holds the per-resume single-flight map.
    pub exports: Arc<ExportPipeline>,
    /// Physical page size used for previews and exports.
    pub page_size: PageSize,
}
