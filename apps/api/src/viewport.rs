//! Viewport Fit Controller — scales a fixed-size page to its container.
//!
//! The page itself never changes size; only the display transform does. The
//! export pipeline forces actual size for the duration of a capture and puts
//! the previous mode back afterwards.

use serde::Serialize;

/// Horizontal room reserved around the page inside its container, in px.
pub const PADDING_ALLOWANCE_PX: f32 = 32.0;
/// Containers at least this wide show the page at actual size by default.
pub const WIDE_VIEWPORT_PX: f32 = 1024.0;
/// Lower bound so a degenerate container never collapses the page to nothing.
pub const MIN_SCALE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformOrigin {
    TopCenter,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub scale: f32,
    pub origin: TransformOrigin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportFit {
    container_width: f32,
    base_width: f32,
    fit_to_screen: bool,
    scale: f32,
}

impl ViewportFit {
    /// Fit-to-screen starts on for narrow containers and off for wide ones.
    pub fn new(container_width: f32, base_width: f32) -> Self {
        let mut fit = ViewportFit {
            container_width,
            base_width,
            fit_to_screen: container_width < WIDE_VIEWPORT_PX,
            scale: 1.0,
        };
        fit.recompute();
        fit
    }

    pub fn resize(&mut self, container_width: f32) {
        self.container_width = container_width;
        self.recompute();
    }

    pub fn set_fit_to_screen(&mut self, on: bool) {
        self.fit_to_screen = on;
        self.recompute();
    }

    pub fn toggle(&mut self) {
        self.set_fit_to_screen(!self.fit_to_screen);
    }

    pub fn fit_to_screen(&self) -> bool {
        self.fit_to_screen
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn transform(&self) -> Transform {
        Transform {
            scale: self.scale,
            origin: TransformOrigin::TopCenter,
        }
    }

    /// Layout height the scaled page occupies, so nothing overlaps it.
    pub fn reserved_height(&self, page_height_px: f32) -> f32 {
        page_height_px * self.scale
    }

    /// Switches to actual size and returns the mode to hand back to `restore`.
    pub fn force_actual_size(&mut self) -> bool {
        let prior = self.fit_to_screen;
        self.set_fit_to_screen(false);
        prior
    }

    pub fn restore(&mut self, prior: bool) {
        self.set_fit_to_screen(prior);
    }

    fn recompute(&mut self) {
        self.scale = if self.fit_to_screen {
            fit_scale(self.container_width, self.base_width)
        } else {
            1.0
        };
    }
}

/// `min(1, (container − allowance) / base)`, clamped to `MIN_SCALE`.
pub fn fit_scale(container_width: f32, base_width: f32) -> f32 {
    if !container_width.is_finite() || !base_width.is_finite() || base_width <= 0.0 {
        return 1.0;
    }
    ((container_width - PADDING_ALLOWANCE_PX) / base_width).clamp(MIN_SCALE, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const A4_WIDTH: f32 = 794.0;

    #[test]
    fn test_narrow_container_scales_down() {
        let fit = ViewportFit::new(400.0, A4_WIDTH);
        assert!(fit.fit_to_screen());
        assert!((fit.scale() - 0.4635).abs() < 1e-3);
        assert_eq!(fit.transform().origin, TransformOrigin::TopCenter);
    }

    #[test]
    fn test_wide_container_never_upscales() {
        let mut fit = ViewportFit::new(2000.0, A4_WIDTH);
        assert!(!fit.fit_to_screen());
        assert_eq!(fit.scale(), 1.0);
        fit.set_fit_to_screen(true);
        assert_eq!(fit.scale(), 1.0);
    }

    #[test]
    fn test_resize_recomputes() {
        let mut fit = ViewportFit::new(400.0, A4_WIDTH);
        fit.resize(600.0);
        assert!((fit.scale() - (568.0 / A4_WIDTH)).abs() < 1e-4);
        assert!((fit.reserved_height(1123.0) - 1123.0 * fit.scale()).abs() < 1e-3);
    }

    #[test]
    fn test_toggle_switches_to_actual_size() {
        let mut fit = ViewportFit::new(400.0, A4_WIDTH);
        fit.toggle();
        assert_eq!(fit.scale(), 1.0);
        fit.toggle();
        assert!(fit.scale() < 1.0);
    }

    #[test]
    fn test_force_and_restore_round_trip() {
        let mut fit = ViewportFit::new(400.0, A4_WIDTH);
        let before = fit.clone();
        let prior = fit.force_actual_size();
        assert_eq!(fit.scale(), 1.0);
        fit.restore(prior);
        assert_eq!(fit, before);
    }

    #[test]
    fn test_tiny_container_hits_floor() {
        assert_eq!(fit_scale(10.0, A4_WIDTH), MIN_SCALE);
        assert_eq!(fit_scale(f32::NAN, A4_WIDTH), 1.0);
    }
}
