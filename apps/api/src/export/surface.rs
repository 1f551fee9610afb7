use crate::export::ExportError;
use crate::layout::arrange;
use crate::render::Page;
use crate::viewport::ViewportFit;

/// Inline style of the surface element. `None` means the dimension follows
/// the mounted page.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SurfaceStyle {
    pub width: Option<f32>,
    pub height: Option<f32>,
    /// Backgrounds are kept when printing instead of being dropped to save ink.
    pub print_color_exact: bool,
}

/// The element a rendered page is mounted into, together with the viewport
/// transform it is displayed through.
#[derive(Debug, Clone)]
pub struct RenderSurface {
    page: Option<Page>,
    pub style: SurfaceStyle,
    pub viewport: ViewportFit,
}

impl RenderSurface {
    pub fn new(viewport: ViewportFit) -> Self {
        RenderSurface {
            page: None,
            style: SurfaceStyle::default(),
            viewport,
        }
    }

    /// A surface with `page` mounted in a container as wide as the page.
    pub fn mounted(page: Page) -> Self {
        let viewport = ViewportFit::new(page.width_px, page.width_px);
        let mut surface = RenderSurface::new(viewport);
        surface.mount(page);
        surface
    }

    pub fn mount(&mut self, page: Page) {
        self.page = Some(page);
    }

    pub fn unmount(&mut self) -> Option<Page> {
        self.page.take()
    }

    pub fn page(&self) -> Option<&Page> {
        self.page.as_ref()
    }

    /// Current (width, height) in CSS pixels. Height grows with content that
    /// runs past the pinned or physical page height.
    pub fn measure(&self) -> Result<(f32, f32), ExportError> {
        let page = self.page.as_ref().ok_or(ExportError::NotMounted)?;
        let width = self.style.width.unwrap_or(page.width_px);
        let height = self
            .style
            .height
            .unwrap_or(page.height_px)
            .max(page.content_height());
        Ok((width, height))
    }

    /// Re-arranges the mounted page at the current surface width.
    pub fn relayout(&mut self) -> Result<(), ExportError> {
        let width = self.measure()?.0;
        let page = self.page.as_mut().ok_or(ExportError::NotMounted)?;
        if page.is_fallback {
            return Ok(());
        }
        page.arrangement = arrange(&page.root, width)?;
        Ok(())
    }
}
