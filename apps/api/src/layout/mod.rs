// Layout: font metrics and the flow engine that positions render nodes on a page.
// Arrangement is CPU-bound but small (one page of text); callers run it inline.

pub mod flow;
pub mod font_metrics;

pub use flow::{arrange, Arrangement, Fragment};
pub use font_metrics::FontFamily;
