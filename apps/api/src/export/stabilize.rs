use std::collections::BTreeSet;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::export::surface::RenderSurface;
use crate::export::ExportError;
use crate::layout::FontFamily;

/// Resolves the font files a page needs before it is captured.
///
/// Carried by the pipeline as `Arc<dyn FontSource>`.
#[async_trait]
pub trait FontSource: Send + Sync {
    async fn load(&self, family: FontFamily) -> Result<()>;
}

/// Fonts embedded in every PDF viewer (Helvetica and Times). Loading is a
/// lookup; nothing touches the network.
#[derive(Debug, Clone)]
pub struct BuiltinFonts {
    available: BTreeSet<FontFamily>,
}

impl Default for BuiltinFonts {
    fn default() -> Self {
        BuiltinFonts {
            available: FontFamily::ALL.into_iter().collect(),
        }
    }
}

impl BuiltinFonts {
    /// A source that only knows `families`.
    pub fn only(families: &[FontFamily]) -> Self {
        BuiltinFonts {
            available: families.iter().copied().collect(),
        }
    }
}

#[async_trait]
impl FontSource for BuiltinFonts {
    async fn load(&self, family: FontFamily) -> Result<()> {
        if !self.available.contains(&family) {
            bail!("no builtin face for {family:?}");
        }
        Ok(())
    }
}

/// Loads every font the mounted page uses, then re-arranges until two
/// consecutive measurements agree. Returns the settled (width, height).
///
/// Each re-arrangement is one frame; running out of `frame_budget` frames
/// before the layout settles is an error.
pub async fn settle(
    surface: &mut RenderSurface,
    fonts: &dyn FontSource,
    frame_budget: u32,
) -> Result<(f32, f32), ExportError> {
    let families = surface
        .page()
        .ok_or(ExportError::NotMounted)?
        .font_families();
    for family in families {
        fonts
            .load(family)
            .await
            .map_err(|e| ExportError::FontLoad {
                family,
                reason: e.to_string(),
            })?;
    }

    let mut previous = surface.measure()?;
    for frame in 1..=frame_budget {
        tokio::task::yield_now().await;
        surface.relayout()?;
        let current = surface.measure()?;
        if current == previous {
            debug!("Layout settled after {frame} frame(s) at {current:?}");
            return Ok(current);
        }
        previous = current;
    }
    Err(ExportError::LayoutUnsettled {
        frames: frame_budget,
    })
}
