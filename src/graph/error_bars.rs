//! Grouped bar chart of students vs teachers with 95% confidence intervals.

use super::palette::{self, STUDENTS, STUDENTS_DARK};
use super::{ChartOptions, RenderWarning, shorten, svg_document};
use crate::error::Result;
use crate::model::{ComparisonSummary, GroupStat, TeacherCategory};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::Serialize;

/// Axis domain of the 1–7 scale
pub const DOMAIN: (f64, f64) = (0.0, 7.0);

/// Scale midpoint, drawn as a reference line
pub const MIDPOINT: f64 = 4.0;

/// Above this many labels the bars are laid out horizontally
pub const MAX_VERTICAL_LABELS: usize = 6;

const BAR_SPAN: f64 = 0.35;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Labels on the x axis, bars grow upwards
    Vertical,
    /// Labels on the y axis, bars grow to the right
    Horizontal,
}

impl Orientation {
    pub fn for_label_count(count: usize) -> Self {
        if count > MAX_VERTICAL_LABELS {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    Students,
    Teachers,
}

impl Group {
    pub fn label(&self) -> &'static str {
        match self {
            Group::Students => "Studenti",
            Group::Teachers => "Insegnanti",
        }
    }
}

/// Distance from the mean to each end of the interval
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ErrorExtent {
    pub below: f64,
    pub above: f64,
}

/// `[mean − ci_lower, ci_upper − mean]` of a group
///
/// # Returns
/// * `Ok(None)` - The group has no observations, no interval to draw
/// * `Ok(Some(extent))` - Both sides non-negative
/// * `Err(message)` - The interval does not contain the mean
pub fn error_extent(stat: &GroupStat) -> std::result::Result<Option<ErrorExtent>, String> {
    if stat.n == 0 {
        return Ok(None);
    }
    let extent = ErrorExtent {
        below: stat.mean - stat.ci_lower,
        above: stat.ci_upper - stat.mean,
    };
    if extent.below < 0.0 || extent.above < 0.0 || !extent.below.is_finite() || !extent.above.is_finite() {
        return Err(format!(
            "intervallo [{}, {}] non contiene la media {}",
            stat.ci_lower, stat.ci_upper, stat.mean
        ));
    }
    Ok(Some(extent))
}

/// One bar of the chart
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BarGeometry {
    /// Index of the label the bar belongs to
    pub slot: usize,
    pub group: Group,
    pub mean: f64,
    pub n: u32,
    pub error: Option<ErrorExtent>,
    /// Set when `n == 0`: the bar carries an "n=0" marker instead of an error bar
    pub no_data: bool,
}

/// Geometry of the whole chart, independent of the drawing backend
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ErrorBarLayout {
    pub orientation: Orientation,
    pub labels: Vec<String>,
    pub domain: (f64, f64),
    pub reference_line: f64,
    pub bars: Vec<BarGeometry>,
    pub warnings: Vec<RenderWarning>,
}

fn bar(slot: usize, label: &str, group: Group, stat: &GroupStat, warnings: &mut Vec<RenderWarning>) -> BarGeometry {
    let error = match error_extent(stat) {
        Ok(extent) => extent,
        Err(message) => {
            warnings.push(RenderWarning::new(format!("{} ({})", label, group.label()), message));
            None
        }
    };
    BarGeometry {
        slot,
        group,
        mean: stat.mean,
        n: stat.n,
        error,
        no_data: stat.n == 0,
    }
}

/// Lay out the bars of a comparison
///
/// # Arguments
/// * `comparisons` - One entry per label, in display order
///
/// # Returns
/// * `ErrorBarLayout` - Two bars per label; intervals that do not contain
///   their mean are reported in `warnings` and left undrawn
pub fn layout(comparisons: &[ComparisonSummary]) -> ErrorBarLayout {
    let mut warnings = Vec::new();
    let mut bars = Vec::with_capacity(comparisons.len() * 2);

    for (slot, c) in comparisons.iter().enumerate() {
        bars.push(bar(slot, &c.label, Group::Students, &c.students, &mut warnings));
        bars.push(bar(slot, &c.label, Group::Teachers, &c.teachers, &mut warnings));
    }

    ErrorBarLayout {
        orientation: Orientation::for_label_count(comparisons.len()),
        labels: comparisons.iter().map(|c| c.label.clone()).collect(),
        domain: DOMAIN,
        reference_line: MIDPOINT,
        bars,
        warnings,
    }
}

/// Centre of a bar along the category axis
fn bar_center(bar: &BarGeometry) -> f64 {
    let offset = match bar.group {
        Group::Students => -BAR_SPAN / 2.0,
        Group::Teachers => BAR_SPAN / 2.0,
    };
    bar.slot as f64 + offset
}

/// Draw a laid-out comparison as SVG
///
/// # Arguments
/// * `layout` - Output of [`layout`]
/// * `teachers` - Teacher category, picks the teacher bar colour
/// * `options` - Title and canvas size
///
/// # Returns
/// * `Result<String>` - SVG markup
pub fn render_svg(layout: &ErrorBarLayout, teachers: TeacherCategory, options: &ChartOptions) -> Result<String> {
    let slots = layout.labels.len().max(1) as f64;
    let category_range = -0.5..slots - 0.5;
    let value_range = layout.domain.0..layout.domain.1;
    let horizontal = layout.orientation == Orientation::Horizontal;
    let height = if horizontal {
        options.height.max(layout.labels.len() as u32 * 80)
    } else {
        options.height
    };

    let fill = move |group: Group| match group {
        Group::Students => STUDENTS,
        Group::Teachers => palette::teacher_color(teachers),
    };
    let stroke = move |group: Group| match group {
        Group::Students => STUDENTS_DARK,
        Group::Teachers => palette::teacher_color_dark(teachers),
    };
    // Horizontal layouts list the first label at the top
    let slot_pos = |slot: f64| if horizontal { slots - 1.0 - slot } else { slot };
    let point = |slot: f64, value: f64| {
        if horizontal {
            (value, slot_pos(slot))
        } else {
            (slot_pos(slot), value)
        }
    };

    svg_document(options.width, height, |root| {
        let (x_range, y_range) = if horizontal {
            (value_range.clone(), category_range.clone())
        } else {
            (category_range.clone(), value_range.clone())
        };
        let label_area = if horizontal { 180 } else { 40 };

        let mut chart = ChartBuilder::on(root)
            .caption(&options.title, ("sans-serif", 22).into_font())
            .margin(20)
            .x_label_area_size(if horizontal { 40 } else { 90 })
            .y_label_area_size(if horizontal { label_area } else { 60 })
            .build_cartesian_2d(x_range, y_range)?;

        let axis_desc = "Punteggio (1-7)";
        let blank = |_: &f64| String::new();
        let mut mesh = chart.configure_mesh();
        mesh.light_line_style(palette::GRID);
        if horizontal {
            mesh.disable_y_mesh().y_label_formatter(&blank).x_desc(axis_desc);
        } else {
            mesh.disable_x_mesh().x_label_formatter(&blank).y_desc(axis_desc);
        }
        mesh.draw()?;

        // Midpoint reference line
        let (a, b) = if horizontal {
            ((layout.reference_line, -0.5), (layout.reference_line, slots - 0.5))
        } else {
            ((-0.5, layout.reference_line), (slots - 0.5, layout.reference_line))
        };
        chart.draw_series(std::iter::once(PathElement::new(
            vec![a, b],
            palette::REFERENCE_LINE.stroke_width(2),
        )))?;

        for group in [Group::Students, Group::Teachers] {
            let bars: Vec<&BarGeometry> = layout.bars.iter().filter(|b| b.group == group).collect();
            chart
                .draw_series(bars.iter().map(|b| {
                    let c = bar_center(b);
                    Rectangle::new(
                        [point(c - BAR_SPAN / 2.0 + 0.02, 0.0), point(c + BAR_SPAN / 2.0 - 0.02, b.mean)],
                        fill(group).filled(),
                    )
                }))?
                .label(group.label())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], fill(group).filled()));

            for b in &bars {
                let c = bar_center(b);
                if let Some(e) = b.error {
                    let low = b.mean - e.below;
                    let high = b.mean + e.above;
                    let cap = BAR_SPAN / 6.0;
                    let style = stroke(group).stroke_width(2);
                    chart.draw_series([
                        PathElement::new(vec![point(c, low), point(c, high)], style),
                        PathElement::new(vec![point(c - cap, low), point(c + cap, low)], style),
                        PathElement::new(vec![point(c - cap, high), point(c + cap, high)], style),
                    ])?;
                } else if b.no_data {
                    let (px, py) = chart.backend_coord(&point(c, b.mean.max(0.0)));
                    root.draw(&Text::new(
                        "n=0",
                        (px, py - 12),
                        ("sans-serif", 12)
                            .into_font()
                            .color(&palette::MUTED_TEXT)
                            .pos(Pos::new(HPos::Center, VPos::Bottom)),
                    ))?;
                }
            }
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(palette::AXIS)
            .position(SeriesLabelPosition::UpperRight)
            .draw()?;

        // Category labels, placed in pixel space next to the axis
        for (slot, label) in layout.labels.iter().enumerate() {
            let text = shorten(label, if horizontal { 28 } else { 22 });
            if horizontal {
                let (px, py) = chart.backend_coord(&(layout.domain.0, slot_pos(slot as f64)));
                root.draw(&Text::new(
                    text,
                    (px - 8, py),
                    ("sans-serif", 12)
                        .into_font()
                        .color(&BLACK)
                        .pos(Pos::new(HPos::Right, VPos::Center)),
                ))?;
            } else {
                let (px, py) = chart.backend_coord(&(slot as f64, layout.domain.0));
                root.draw(&Text::new(
                    text,
                    (px, py + 10),
                    ("sans-serif", 12)
                        .into_font()
                        .color(&BLACK)
                        .pos(Pos::new(HPos::Center, VPos::Top)),
                ))?;
            }
        }

        root.draw(&Text::new(
            "Le barre di errore rappresentano gli intervalli di confidenza al 95% (t di Student)",
            (options.width as i32 / 2, height as i32 - 8),
            ("sans-serif", 12)
                .into_font()
                .color(&palette::MUTED_TEXT)
                .pos(Pos::new(HPos::Center, VPos::Bottom)),
        ))?;
        Ok(())
    })
}
