//! Resume persistence, write validation and the HTTP surface for documents,
//! previews and exports.

pub mod handlers;
pub mod repository;
pub mod validation;

pub use repository::{PgResumeRepository, ResumeRepository};
