//! Template Renderer — maps (resume, template, mode) to a fixed-size page.
//!
//! Rendering is a pure function of its inputs: the exported document is
//! captured from the same `Page` value the preview shows. `render_page` is the
//! outermost boundary and never fails; any error below it becomes an inline
//! notice page.

pub mod dates;
pub mod page;
pub mod sections;
pub mod style;
pub mod template;

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::error;

use crate::errors::RenderError;
use crate::models::resume::ResumeData;

pub use page::{Page, PageSize, RenderMode};
pub use template::Template;

use style::StyleTokens;

/// Renders `resume` with `template`. Always returns a page.
pub fn render_page(
    resume: &ResumeData,
    template: Template,
    mode: RenderMode,
    size: PageSize,
) -> Page {
    render_with(resume, template, mode, size, || {
        build_page(resume, template, mode, size)
    })
}

/// Runs `build` behind the error boundary: an error or a panic yields the
/// notice page for (`template`, `mode`, `size`).
fn render_with<F>(
    resume: &ResumeData,
    template: Template,
    mode: RenderMode,
    size: PageSize,
    build: F,
) -> Page
where
    F: FnOnce() -> Result<Page, RenderError>,
{
    match catch_unwind(AssertUnwindSafe(build)) {
        Ok(Ok(page)) => page,
        Ok(Err(e)) => {
            error!(
                "Rendering resume {} with {} template failed: {e}",
                resume.id,
                template.as_str()
            );
            Page::notice(template, mode, size)
        }
        Err(_) => {
            error!(
                "Rendering resume {} with {} template panicked",
                resume.id,
                template.as_str()
            );
            Page::notice(template, mode, size)
        }
    }
}

/// Fallible inner render. Prefer `render_page` outside of tests.
pub fn build_page(
    resume: &ResumeData,
    template: Template,
    mode: RenderMode,
    size: PageSize,
) -> Result<Page, RenderError> {
    let tokens = StyleTokens::new(template, mode);
    let root = template.layout(resume, &tokens, size);
    Page::new(template, mode, size, root)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
