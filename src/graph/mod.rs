//! SVG charts of the dashboard.
//!
//! Every renderer is split in two: a pure layout function that maps the
//! statistics to geometry (unit-testable, no drawing involved) and a
//! `render_svg` function that draws that geometry with plotters'
//! [`SVGBackend`].

pub mod boxplot;
pub mod error_bars;
pub mod heatmap;
pub mod labels;
pub mod palette;

use crate::error::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::Serialize;

/// Configuration options for chart generation
#[derive(Clone, Debug)]
pub struct ChartOptions {
    /// Title displayed at the top of the chart
    pub title: String,

    /// Width of the chart in pixels
    pub width: u32,

    /// Height of the chart in pixels
    pub height: u32,
}

impl Default for ChartOptions {
    /// # Returns
    /// * `ChartOptions` - Untitled 900x500 chart
    fn default() -> Self {
        Self {
            title: String::new(),
            width: 900,
            height: 500,
        }
    }
}

impl ChartOptions {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Something in the input the renderer refused to draw
///
/// Warnings travel with the layout so callers can log or display them; the
/// rest of the chart is still drawn.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderWarning {
    /// Label of the bar, cell or series concerned
    pub subject: String,
    pub message: String,
}

impl RenderWarning {
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        RenderWarning {
            subject: subject.into(),
            message: message.into(),
        }
    }
}

/// Run `draw` on a white SVG canvas and return the document
///
/// # Arguments
/// * `width`, `height` - Canvas size in pixels
/// * `draw` - Callback receiving the root drawing area
///
/// # Returns
/// * `Result<String>` - The SVG markup
pub fn svg_document<F>(width: u32, height: u32, draw: F) -> Result<String>
where
    F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> Result<()>,
{
    let mut buffer = String::new();
    {
        let root = SVGBackend::with_string(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()?;
    }
    Ok(buffer)
}

/// Trim a label to `max` characters, adding an ellipsis when cut
pub fn shorten(label: &str, max: usize) -> String {
    if label.chars().count() <= max {
        label.to_string()
    } else {
        let cut: String = label.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut.trim_end())
    }
}
