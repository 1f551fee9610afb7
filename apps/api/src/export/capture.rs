use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::export::surface::RenderSurface;
use crate::layout::Fragment;
use crate::render::style::Rgb;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureOptions {
    /// Oversampling factor. 2.0 captures at twice the CSS pixel density.
    pub scale: f32,
    pub width_px: f32,
    pub height_px: f32,
}

impl CaptureOptions {
    /// Capture at the measured size, or at `nominal` when either measured
    /// dimension is zero.
    pub fn new(scale: f32, measured: (f32, f32), nominal: (f32, f32)) -> Self {
        let (width_px, height_px) = if measured.0 <= 0.0 || measured.1 <= 0.0 {
            nominal
        } else {
            measured
        };
        CaptureOptions {
            scale,
            width_px,
            height_px,
        }
    }
}

/// The captured image as a display list in device pixels
/// (`CSS px × scale`), painted back to front.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub scale: f32,
    pub width_px: f32,
    pub height_px: f32,
    pub fragments: Vec<Fragment>,
}

impl Capture {
    /// Size in CSS pixels, with oversampling undone.
    pub fn css_size(&self) -> (f32, f32) {
        (self.width_px / self.scale, self.height_px / self.scale)
    }
}

/// Turns a settled surface into pixels.
///
/// Carried by the pipeline as `Arc<dyn Rasterizer>`.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn capture(&self, surface: &RenderSurface, options: &CaptureOptions) -> Result<Capture>;
}

/// Captures the mounted page's arrangement as a scaled display list on a
/// white background.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayListRasterizer;

#[async_trait]
impl Rasterizer for DisplayListRasterizer {
    async fn capture(&self, surface: &RenderSurface, options: &CaptureOptions) -> Result<Capture> {
        let page = surface
            .page()
            .ok_or_else(|| anyhow!("nothing mounted on the surface"))?;
        if !(options.scale.is_finite() && options.scale > 0.0) {
            return Err(anyhow!("invalid capture scale {}", options.scale));
        }

        let width_px = options.width_px * options.scale;
        let height_px = options.height_px * options.scale;
        let mut fragments = Vec::with_capacity(page.arrangement.fragments.len() + 1);
        fragments.push(Fragment::Rect {
            x: 0.0,
            y: 0.0,
            width: width_px,
            height: height_px,
            radius: 0.0,
            fill: Rgb::WHITE,
        });
        fragments.extend(
            page.arrangement
                .fragments
                .iter()
                .map(|f| f.transformed(0.0, options.scale)),
        );

        Ok(Capture {
            scale: options.scale,
            width_px,
            height_px,
            fragments,
        })
    }
}
