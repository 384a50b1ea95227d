//! Box-and-whisker plot of one or more quartile series on a shared scale.

use super::palette::{self, MEAN_MARKER};
use super::{ChartOptions, RenderWarning, shorten, svg_document};
use crate::error::Result;
use crate::model::{LabeledQuartiles, QuartileStats, Validate};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::Serialize;

/// Fixed domain of the 1–7 Likert scale
pub const LIKERT_DOMAIN: Domain = Domain { min: 0.0, max: 7.0 };

const BOX_WIDTH: f64 = 60.0;
const PADDING_RATIO: f64 = 0.1;
const DEGENERATE_PADDING: f64 = 0.5;

const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 70.0;
const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 20.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Domain {
    pub min: f64,
    pub max: f64,
}

impl Domain {
    pub fn fixed(min: f64, max: f64) -> Self {
        Domain { min, max }.widened()
    }

    /// Domain covering every value of every series, outliers included
    ///
    /// The range is padded by 10% on both sides. The lower bound never goes
    /// below 0 when all the data is non-negative. Returns `None` when the
    /// series hold no finite value.
    pub fn auto<'a>(series: impl IntoIterator<Item = &'a QuartileStats>) -> Option<Self> {
        let values: Vec<f64> = series
            .into_iter()
            .flat_map(|s| s.extent_values())
            .filter(|v| v.is_finite())
            .collect();
        let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !lo.is_finite() || !hi.is_finite() {
            return None;
        }

        let pad = (hi - lo) * PADDING_RATIO;
        let mut min = lo - pad;
        if lo >= 0.0 {
            min = min.max(0.0);
        }
        Some(Domain { min, max: hi + pad }.widened())
    }

    fn widened(self) -> Self {
        if self.max > self.min {
            self
        } else {
            Domain {
                min: self.min - DEGENERATE_PADDING,
                max: self.min + DEGENERATE_PADDING,
            }
        }
    }
}

/// Domain selection of a plot
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DomainMode {
    Fixed(Domain),
    Auto,
}

impl Default for DomainMode {
    fn default() -> Self {
        DomainMode::Fixed(LIKERT_DOMAIN)
    }
}

/// Linear map from data values to pixel rows
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct YScale {
    pub domain: Domain,
    /// Pixel row of the domain minimum
    pub bottom: f64,
    pub height: f64,
}

impl YScale {
    /// # Examples
    /// ```
    /// use survey_dashboard::graph::boxplot::{LIKERT_DOMAIN, YScale};
    /// let scale = YScale { domain: LIKERT_DOMAIN, bottom: 420.0, height: 390.0 };
    /// assert_eq!(scale.y(0.0), 420.0);
    /// assert_eq!(scale.y(7.0), 30.0);
    /// ```
    pub fn y(&self, v: f64) -> f64 {
        self.bottom - (v - self.domain.min) / (self.domain.max - self.domain.min) * self.height
    }
}

/// One series to draw
#[derive(Clone, Debug, PartialEq)]
pub struct BoxSeries {
    pub key: String,
    pub label: String,
    pub color: RGBColor,
    pub stats: QuartileStats,
}

impl BoxSeries {
    /// Series of a labelled group, coloured by its key
    pub fn from_group(group: &LabeledQuartiles) -> Self {
        BoxSeries {
            key: group.key.clone(),
            label: group.label.clone(),
            color: palette::group_color(&group.key),
            stats: group.stats.clone(),
        }
    }
}

/// Pixel geometry of one box
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BoxGeometry {
    pub key: String,
    pub label: String,
    #[serde(skip)]
    pub color: RGBColor,
    pub x_center: f64,
    pub half_width: f64,
    pub cap_half_width: f64,
    pub y_min: f64,
    pub y_q1: f64,
    pub y_median: f64,
    pub y_q3: f64,
    pub y_max: f64,
    pub y_mean: f64,
    pub y_outliers: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BoxPlotLayout {
    pub scale: YScale,
    pub boxes: Vec<BoxGeometry>,
    pub warnings: Vec<RenderWarning>,
}

/// Lay out the boxes of `series` on a canvas of `options.width × options.height`
///
/// # Arguments
/// * `series` - Boxes to draw, left to right
/// * `options` - Canvas size
/// * `mode` - Fixed domain or auto domain over all series
///
/// # Returns
/// * `BoxPlotLayout` - Series with out-of-order quartiles are skipped and
///   reported in `warnings`
pub fn layout(series: &[BoxSeries], options: &ChartOptions, mode: DomainMode) -> BoxPlotLayout {
    let mut warnings = Vec::new();
    let valid: Vec<&BoxSeries> = series
        .iter()
        .filter(|s| match s.stats.validate() {
            Ok(()) => true,
            Err(e) => {
                warnings.push(RenderWarning::new(s.label.clone(), e.to_string()));
                false
            }
        })
        .collect();

    let domain = match mode {
        DomainMode::Fixed(d) => d,
        DomainMode::Auto => Domain::auto(valid.iter().map(|s| &s.stats)).unwrap_or(LIKERT_DOMAIN),
    };
    let height = options.height as f64;
    let scale = YScale {
        domain,
        bottom: height - MARGIN_BOTTOM,
        height: height - MARGIN_BOTTOM - MARGIN_TOP,
    };

    let plot_width = options.width as f64 - MARGIN_LEFT - MARGIN_RIGHT;
    let spacing = plot_width / (valid.len() as f64 + 1.0);
    let half_width = (BOX_WIDTH / 2.0).min(spacing / 3.0);

    let boxes = valid
        .iter()
        .enumerate()
        .map(|(k, s)| BoxGeometry {
            key: s.key.clone(),
            label: s.label.clone(),
            color: s.color,
            x_center: MARGIN_LEFT + spacing * (k as f64 + 1.0),
            half_width,
            cap_half_width: half_width * 2.0 / 3.0,
            y_min: scale.y(s.stats.min),
            y_q1: scale.y(s.stats.q1),
            y_median: scale.y(s.stats.q2),
            y_q3: scale.y(s.stats.q3),
            y_max: scale.y(s.stats.max),
            y_mean: scale.y(s.stats.mean),
            y_outliers: s.stats.outliers.iter().map(|&o| scale.y(o)).collect(),
        })
        .collect();

    BoxPlotLayout { scale, boxes, warnings }
}

/// Tick values of the y axis: integers for narrow domains, five steps otherwise
fn ticks(domain: &Domain) -> Vec<f64> {
    let span = domain.max - domain.min;
    if span <= 10.0 {
        let first = domain.min.ceil() as i64;
        let last = domain.max.floor() as i64;
        (first..=last).map(|v| v as f64).collect()
    } else {
        (0..=5).map(|k| domain.min + span * k as f64 / 5.0).collect()
    }
}

/// Draw box plots as SVG
///
/// # Arguments
/// * `series` - Boxes to draw, left to right
/// * `options` - Title and canvas size
/// * `mode` - Domain selection
///
/// # Returns
/// * `Result<String>` - SVG markup
pub fn render_svg(series: &[BoxSeries], options: &ChartOptions, mode: DomainMode) -> Result<String> {
    let plot = layout(series, options, mode);
    let px = |v: f64| v.round() as i32;

    svg_document(options.width, options.height, |root| {
        let label_style = |size: i32, color: &RGBColor, h: HPos, v: VPos| {
            ("sans-serif", size).into_font().color(color).pos(Pos::new(h, v))
        };

        if !options.title.is_empty() {
            root.draw(&Text::new(
                options.title.clone(),
                (options.width as i32 / 2, 20),
                label_style(20, &BLACK, HPos::Center, VPos::Center),
            ))?;
        }

        let left = px(MARGIN_LEFT);
        let right = px(options.width as f64 - MARGIN_RIGHT);
        for tick in ticks(&plot.scale.domain) {
            let y = px(plot.scale.y(tick));
            root.draw(&PathElement::new(vec![(left, y), (right, y)], palette::GRID))?;
            let text = if tick.fract() == 0.0 {
                format!("{}", tick as i64)
            } else {
                format!("{:.1}", tick)
            };
            root.draw(&Text::new(
                text,
                (left - 8, y),
                label_style(12, &palette::MUTED_TEXT, HPos::Right, VPos::Center),
            ))?;
        }
        let bottom = px(plot.scale.bottom);
        root.draw(&PathElement::new(vec![(left, px(MARGIN_TOP)), (left, bottom)], palette::AXIS))?;

        for b in &plot.boxes {
            let color = b.color;
            let x = px(b.x_center);
            let hw = px(b.half_width);
            let cap = px(b.cap_half_width);
            let line = color.stroke_width(2);

            // Whiskers and caps
            root.draw(&PathElement::new(vec![(x, px(b.y_min)), (x, px(b.y_q1))], line))?;
            root.draw(&PathElement::new(vec![(x, px(b.y_q3)), (x, px(b.y_max))], line))?;
            root.draw(&PathElement::new(vec![(x - cap, px(b.y_min)), (x + cap, px(b.y_min))], line))?;
            root.draw(&PathElement::new(vec![(x - cap, px(b.y_max)), (x + cap, px(b.y_max))], line))?;

            root.draw(&Rectangle::new(
                [(x - hw, px(b.y_q3)), (x + hw, px(b.y_q1))],
                color.mix(0.2).filled(),
            ))?;
            root.draw(&Rectangle::new([(x - hw, px(b.y_q3)), (x + hw, px(b.y_q1))], line))?;
            root.draw(&PathElement::new(
                vec![(x - hw, px(b.y_median)), (x + hw, px(b.y_median))],
                color.stroke_width(4),
            ))?;

            for &oy in &b.y_outliers {
                root.draw(&Circle::new((x, px(oy)), 4, color.stroke_width(1)))?;
            }
            root.draw(&Circle::new((x, px(b.y_mean)), 5, MEAN_MARKER.filled()))?;

            root.draw(&Text::new(
                shorten(&b.label, 24),
                (x, bottom + 12),
                label_style(13, &BLACK, HPos::Center, VPos::Top),
            ))?;
        }

        root.draw(&Circle::new((left + 10, options.height as i32 - 14), 5, MEAN_MARKER.filled()))?;
        root.draw(&Text::new(
            "Media",
            (left + 20, options.height as i32 - 14),
            label_style(12, &palette::MUTED_TEXT, HPos::Left, VPos::Center),
        ))?;
        Ok(())
    })
}
