//! Export Pipeline — turns a rendered page into a downloadable PDF.
//!
//! Stages run strictly in order within one task:
//! Idle → Prepare → Stabilize → Capture → Assemble → Restore → Idle.
//! Restore is a drop guard, so it also runs on error and cancellation.

use thiserror::Error;

use crate::errors::RenderError;
use crate::layout::FontFamily;

pub mod assemble;
pub mod capture;
pub mod pipeline;
pub mod stabilize;
pub mod storage;
pub mod surface;

pub use pipeline::{ExportPipeline, ExportSettings};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Render surface is not mounted")]
    NotMounted,

    #[error("An export for resume {resume_id} is already in progress")]
    Busy { resume_id: String },

    #[error("Failed to load font {family:?}: {reason}")]
    FontLoad { family: FontFamily, reason: String },

    #[error("Layout did not settle within {frames} frames")]
    LayoutUnsettled { frames: u32 },

    #[error("Layout failed: {0}")]
    Layout(#[from] RenderError),

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("PDF assembly failed: {0}")]
    Assemble(String),
}
