use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info};

use crate::export::assemble::{export_file_name, ExportDocument, PdfAssembler};
use crate::export::capture::{CaptureOptions, Rasterizer};
use crate::export::stabilize::{settle, FontSource};
use crate::export::surface::{RenderSurface, SurfaceStyle};
use crate::export::ExportError;
use crate::models::resume::ResumeData;
use crate::render::{render_page, Page, PageSize, RenderMode, Template};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Idle,
    Prepare,
    Stabilize,
    Capture,
    Assemble,
    Restore,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportSettings {
    pub page_size: PageSize,
    /// Capture oversampling factor.
    pub scale: f32,
    /// Re-arrangements allowed before the layout must have settled.
    pub frame_budget: u32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        ExportSettings {
            page_size: PageSize::A4,
            scale: 2.0,
            frame_budget: 8,
        }
    }
}

/// Turns a rendered page into a PDF download.
///
/// At most one export per resume runs at a time; the in-flight map is the
/// only state shared between requests.
pub struct ExportPipeline {
    rasterizer: Arc<dyn Rasterizer>,
    fonts: Arc<dyn FontSource>,
    settings: ExportSettings,
    in_flight: Mutex<HashMap<String, ExportStage>>,
}

impl ExportPipeline {
    pub fn new(
        rasterizer: Arc<dyn Rasterizer>,
        fonts: Arc<dyn FontSource>,
        settings: ExportSettings,
    ) -> Self {
        ExportPipeline {
            rasterizer,
            fonts,
            settings,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Stage of the export running for `key`, or `Idle`.
    #[cfg(test)]
    pub fn stage(&self, key: &str) -> ExportStage {
        self.lock()
            .get(key)
            .copied()
            .unwrap_or(ExportStage::Idle)
    }

    /// Renders `resume` in export mode and exports it from a fresh surface.
    pub async fn export(
        &self,
        resume: &ResumeData,
        template: Template,
    ) -> Result<ExportDocument, ExportError> {
        let page = render_page(resume, template, RenderMode::Export, self.settings.page_size);
        let mut surface = RenderSurface::mounted(page);
        self.export_surface(&resume.id.to_string(), &resume.title, &mut surface)
            .await
    }

    /// Runs Prepare → Stabilize → Capture → Assemble → Restore on `surface`.
    ///
    /// The surface is captured at the physical size of its mounted page and
    /// handed back with the page, style and viewport mode it had on entry,
    /// whether the export succeeds, fails, or the future is dropped.
    pub async fn export_surface(
        &self,
        key: &str,
        title: &str,
        surface: &mut RenderSurface,
    ) -> Result<ExportDocument, ExportError> {
        let flight = self.begin(key)?;
        let result = self.run(&flight, title, surface).await;
        flight.advance(ExportStage::Restore);
        match &result {
            Ok(doc) => info!(
                "Exported {} ({} page(s), {} bytes)",
                doc.file_name,
                doc.page_count,
                doc.bytes.len()
            ),
            Err(e) => error!("Export of resume {key} failed: {e}"),
        }
        result
    }

    async fn run(
        &self,
        flight: &InFlight<'_>,
        title: &str,
        surface: &mut RenderSurface,
    ) -> Result<ExportDocument, ExportError> {
        flight.advance(ExportStage::Prepare);
        let mut pinned = PinnedSurface::pin(surface)?;
        let page_size = pinned.page_size;

        flight.advance(ExportStage::Stabilize);
        let measured = settle(&mut pinned, self.fonts.as_ref(), self.settings.frame_budget).await?;

        flight.advance(ExportStage::Capture);
        let options = CaptureOptions::new(
            self.settings.scale,
            measured,
            page_size.pixels(),
        );
        let capture = self
            .rasterizer
            .capture(&pinned, &options)
            .await
            .map_err(|e| ExportError::Capture(e.to_string()))?;

        flight.advance(ExportStage::Assemble);
        let file_name = export_name(&flight.key, title);
        let doc = PdfAssembler::new(page_size).assemble(&capture, title, file_name)?;

        drop(pinned);
        Ok(doc)
    }

    fn begin(&self, key: &str) -> Result<InFlight<'_>, ExportError> {
        let mut map = self.lock();
        if map.contains_key(key) {
            return Err(ExportError::Busy {
                resume_id: key.to_string(),
            });
        }
        map.insert(key.to_string(), ExportStage::Idle);
        Ok(InFlight {
            pipeline: self,
            key: key.to_string(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ExportStage>> {
        // A panic while holding the lock cannot leave the map inconsistent.
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn export_name(key: &str, title: &str) -> String {
    match uuid::Uuid::parse_str(key) {
        Ok(id) => export_file_name(title, id),
        Err(_) => format!("resume-{key}.pdf"),
    }
}

/// Registration of one running export. Removes itself on drop.
struct InFlight<'a> {
    pipeline: &'a ExportPipeline,
    key: String,
}

impl InFlight<'_> {
    fn advance(&self, stage: ExportStage) {
        debug!("Export {}: {:?}", self.key, stage);
        if let Some(slot) = self.pipeline.lock().get_mut(&self.key) {
            *slot = stage;
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.pipeline.lock().remove(&self.key);
    }
}

/// A surface pinned to the physical size of its mounted page for capture.
///
/// Dropping the guard restores the previous page arrangement, inline style
/// and viewport mode.
struct PinnedSurface<'a> {
    surface: &'a mut RenderSurface,
    page_size: PageSize,
    prior_page: Option<Page>,
    prior_style: SurfaceStyle,
    prior_fit: bool,
}

impl<'a> PinnedSurface<'a> {
    fn pin(surface: &'a mut RenderSurface) -> Result<Self, ExportError> {
        let prior_page = surface.page().cloned().ok_or(ExportError::NotMounted)?;
        let page_size = prior_page.size;
        let prior_style = surface.style;
        let prior_fit = surface.viewport.force_actual_size();
        let (width, height) = page_size.pixels();
        surface.style = SurfaceStyle {
            width: Some(width),
            height: Some(height),
            print_color_exact: true,
        };
        Ok(PinnedSurface {
            surface,
            page_size,
            prior_page: Some(prior_page),
            prior_style,
            prior_fit,
        })
    }
}

impl Deref for PinnedSurface<'_> {
    type Target = RenderSurface;

    fn deref(&self) -> &RenderSurface {
        self.surface
    }
}

impl DerefMut for PinnedSurface<'_> {
    fn deref_mut(&mut self) -> &mut RenderSurface {
        self.surface
    }
}

impl Drop for PinnedSurface<'_> {
    fn drop(&mut self) {
        // Stabilize re-arranges at the pinned width.
        if let Some(page) = self.prior_page.take() {
            self.surface.mount(page);
        }
        self.surface.style = self.prior_style;
        self.surface.viewport.restore(self.prior_fit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::capture::{Capture, DisplayListRasterizer};
    use crate::export::stabilize::BuiltinFonts;
    use crate::render::tests::sample_resume;
    use crate::viewport::ViewportFit;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use tokio::sync::Notify;

    struct FailingRasterizer;

    #[async_trait]
    impl Rasterizer for FailingRasterizer {
        async fn capture(&self, _: &RenderSurface, _: &CaptureOptions) -> Result<Capture> {
            Err(anyhow!("canvas unavailable"))
        }
    }

    /// Signals `started`, then waits for `release` before capturing.
    struct GatedRasterizer {
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl Rasterizer for GatedRasterizer {
        async fn capture(&self, surface: &RenderSurface, options: &CaptureOptions) -> Result<Capture> {
            self.started.notify_one();
            self.release.notified().await;
            DisplayListRasterizer.capture(surface, options).await
        }
    }

    /// Remembers the options of the last capture.
    #[derive(Default)]
    struct RecordingRasterizer {
        seen: Mutex<Option<CaptureOptions>>,
    }

    #[async_trait]
    impl Rasterizer for RecordingRasterizer {
        async fn capture(&self, surface: &RenderSurface, options: &CaptureOptions) -> Result<Capture> {
            *self.seen.lock().unwrap() = Some(*options);
            DisplayListRasterizer.capture(surface, options).await
        }
    }

    fn pipeline(rasterizer: Arc<dyn Rasterizer>) -> ExportPipeline {
        ExportPipeline::new(
            rasterizer,
            Arc::new(BuiltinFonts::default()),
            ExportSettings::default(),
        )
    }

    /// A surface as a narrow preview leaves it: fitted and unpinned.
    fn preview_surface() -> RenderSurface {
        let page = render_page(
            &sample_resume(),
            Template::Professional,
            RenderMode::Export,
            PageSize::A4,
        );
        let mut surface = RenderSurface::new(ViewportFit::new(400.0, page.width_px));
        surface.mount(page);
        surface.style.width = Some(600.0);
        surface
    }

    #[tokio::test]
    async fn test_export_produces_named_pdf() {
        let resume = sample_resume();
        let doc = pipeline(Arc::new(DisplayListRasterizer))
            .export(&resume, Template::Executive)
            .await
            .unwrap();
        assert!(doc.bytes.starts_with(b"%PDF"));
        assert_eq!(doc.file_name, format!("jane-doe-{}.pdf", resume.id));
    }

    #[tokio::test]
    async fn test_successful_export_restores_surface() {
        let mut surface = preview_surface();
        let (style, viewport) = (surface.style, surface.viewport.clone());
        pipeline(Arc::new(DisplayListRasterizer))
            .export_surface("r1", "Jane", &mut surface)
            .await
            .unwrap();
        assert_eq!(surface.style, style);
        assert_eq!(surface.viewport, viewport);
    }

    #[tokio::test]
    async fn test_letter_page_is_captured_at_its_own_size() {
        // Pipeline defaults to A4; the mounted page is Letter.
        let page = render_page(
            &sample_resume(),
            Template::Creative,
            RenderMode::Interactive,
            PageSize::Letter,
        );
        let mut surface = RenderSurface::mounted(page);
        let before = surface.page().cloned();
        let recorder = Arc::new(RecordingRasterizer::default());

        let doc = pipeline(recorder.clone())
            .export_surface("r1", "Jane", &mut surface)
            .await
            .unwrap();

        let options = recorder.seen.lock().unwrap().unwrap();
        assert_eq!(options.width_px, 816.0);
        assert!(options.height_px >= 1056.0);
        assert!(doc.page_count >= 1);
        assert_eq!(surface.page().cloned(), before);
    }

    #[tokio::test]
    async fn test_capture_failure_restores_surface() {
        let mut surface = preview_surface();
        let (style, viewport) = (surface.style, surface.viewport.clone());
        let page = surface.page().cloned();
        let pipeline = pipeline(Arc::new(FailingRasterizer));

        let err = pipeline
            .export_surface("r1", "Jane", &mut surface)
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::Capture(_)));
        assert_eq!(surface.page().cloned(), page);
        assert_eq!(surface.style, style);
        assert_eq!(surface.viewport, viewport);
        assert_eq!(pipeline.stage("r1"), ExportStage::Idle);
    }

    #[tokio::test]
    async fn test_unmounted_surface_fails_without_pinning() {
        let mut surface = preview_surface();
        surface.unmount();
        let err = pipeline(Arc::new(DisplayListRasterizer))
            .export_surface("r1", "Jane", &mut surface)
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::NotMounted));
        assert_eq!(surface.style.width, Some(600.0));
    }

    #[tokio::test]
    async fn test_concurrent_export_of_same_resume_is_rejected() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let pipeline = Arc::new(pipeline(Arc::new(GatedRasterizer {
            started: started.clone(),
            release: release.clone(),
        })));
        let resume = sample_resume();
        let key = resume.id.to_string();

        let first = {
            let pipeline = pipeline.clone();
            let resume = resume.clone();
            tokio::spawn(async move { pipeline.export(&resume, Template::Creative).await })
        };
        started.notified().await;
        assert_eq!(pipeline.stage(&key), ExportStage::Capture);

        let mut other = preview_surface();
        let second = pipeline.export_surface(&key, "Jane", &mut other).await;
        assert!(matches!(second, Err(ExportError::Busy { .. })));
        // The rejected request never pinned its surface.
        assert_eq!(other.style.width, Some(600.0));

        release.notify_one();
        assert!(first.await.unwrap().is_ok());
        assert_eq!(pipeline.stage(&key), ExportStage::Idle);
    }

    #[tokio::test]
    async fn test_different_resumes_export_independently() {
        let pipeline = pipeline(Arc::new(DisplayListRasterizer));
        let mut a = preview_surface();
        let mut b = preview_surface();
        let (first, second) = tokio::join!(
            pipeline.export_surface("a", "A", &mut a),
            pipeline.export_surface("b", "B", &mut b),
        );
        assert!(first.is_ok());
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_dropped_export_releases_slot_and_surface() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let pipeline = pipeline(Arc::new(GatedRasterizer {
            started: started.clone(),
            release,
        }));
        let mut surface = preview_surface();
        let (style, viewport) = (surface.style, surface.viewport.clone());

        {
            let export = pipeline.export_surface("r1", "Jane", &mut surface);
            tokio::pin!(export);
            tokio::select! {
                _ = &mut export => panic!("export must block on the gate"),
                _ = started.notified() => {}
            }
        }

        assert_eq!(pipeline.stage("r1"), ExportStage::Idle);
        assert_eq!(surface.style, style);
        assert_eq!(surface.viewport, viewport);
    }
}
