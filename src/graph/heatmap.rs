//! Correlation heatmap with threshold and significance filters.
//!
//! [`build_grid`] turns a matrix and a filter into a grid of display cells;
//! it is a pure function, so equal inputs always give equal grids.
//! [`render_svg`] draws a grid, [`render_grouped_svg`] draws one sub-grid per
//! variable kind.

use super::labels::{VariableKind, short_label};
use super::palette::{self, CorrelationBucket};
use super::{ChartOptions, svg_document};
use crate::error::Result;
use crate::model::CorrelationMatrix;
use crate::stats::ALPHA;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::Serialize;

/// Highest |r| threshold the filter accepts
pub const MAX_MIN_CORRELATION: f64 = 0.7;

/// Placeholder of cells below the |r| threshold
pub const BELOW_THRESHOLD: &str = "–";

/// Placeholder of non-significant cells
pub const NOT_SIGNIFICANT: &str = "n.s.";

/// Display filters of the heatmap
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct HeatmapFilter {
    /// Cells with |r| below this value are hidden; clamped to [0, 0.7]
    pub min_correlation: f64,
    /// Hide off-diagonal cells with p ≥ 0.05
    pub show_only_significant: bool,
}

impl HeatmapFilter {
    pub fn new(min_correlation: f64, show_only_significant: bool) -> Self {
        let min_correlation = if min_correlation.is_finite() {
            min_correlation.clamp(0.0, MAX_MIN_CORRELATION)
        } else {
            0.0
        };
        HeatmapFilter {
            min_correlation,
            show_only_significant,
        }
    }
}

/// p strictly below 0.05
pub fn is_significant(p: f64) -> bool {
    p < ALPHA
}

/// `***` below 0.001, `**` below 0.01, `*` below 0.05
pub fn significance_stars(p: f64) -> &'static str {
    if p < 0.001 {
        "***"
    } else if p < 0.01 {
        "**"
    } else if p < ALPHA {
        "*"
    } else {
        ""
    }
}

/// What a cell shows
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellDisplay {
    Value {
        r: f64,
        p: Option<f64>,
        stars: &'static str,
        bucket: CorrelationBucket,
    },
    BelowThreshold,
    NotSignificant,
}

impl CellDisplay {
    /// Text written in the cell
    pub fn text(&self) -> String {
        match self {
            CellDisplay::Value { r, stars, .. } => format!("{:.2}{}", r, stars),
            CellDisplay::BelowThreshold => BELOW_THRESHOLD.to_string(),
            CellDisplay::NotSignificant => NOT_SIGNIFICANT.to_string(),
        }
    }

    pub fn bucket(&self) -> Option<CorrelationBucket> {
        match self {
            CellDisplay::Value { bucket, .. } => Some(*bucket),
            _ => None,
        }
    }
}

/// Display of cell (i, j)
///
/// The diagonal always shows 1.00 in the top bucket, unstarred and
/// unfiltered. A missing off-diagonal p-value counts as not significant.
pub fn cell_display(matrix: &CorrelationMatrix, i: usize, j: usize, filter: &HeatmapFilter) -> CellDisplay {
    if i == j {
        return CellDisplay::Value {
            r: 1.0,
            p: None,
            stars: "",
            bucket: CorrelationBucket::StrongPositive,
        };
    }

    let r = matrix.r(i, j);
    let p = matrix.p(i, j);
    if r.abs() < filter.min_correlation {
        return CellDisplay::BelowThreshold;
    }
    let significant = p.is_some_and(is_significant);
    if filter.show_only_significant && !significant {
        return CellDisplay::NotSignificant;
    }
    CellDisplay::Value {
        r,
        p,
        stars: p.map(significance_stars).unwrap_or(""),
        bucket: CorrelationBucket::from_r(r),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HeatmapGrid {
    /// Variable names, rows and columns in the same order
    pub variables: Vec<String>,
    pub labels: Vec<String>,
    pub cells: Vec<Vec<CellDisplay>>,
}

impl HeatmapGrid {
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

fn grid_over(matrix: &CorrelationMatrix, indices: &[usize], filter: &HeatmapFilter) -> HeatmapGrid {
    HeatmapGrid {
        variables: indices.iter().map(|&i| matrix.variables[i].clone()).collect(),
        labels: indices
            .iter()
            .map(|&i| short_label(&matrix.variables[i]).to_string())
            .collect(),
        cells: indices
            .iter()
            .map(|&i| {
                indices
                    .iter()
                    .map(|&j| cell_display(matrix, i, j, filter))
                    .collect()
            })
            .collect(),
    }
}

/// Grid of every variable against every other
pub fn build_grid(matrix: &CorrelationMatrix, filter: &HeatmapFilter) -> HeatmapGrid {
    let all: Vec<usize> = (0..matrix.dimension()).collect();
    grid_over(matrix, &all, filter)
}

/// Indices of the variables of each kind, in display order, empty kinds skipped
pub fn group_variables(variables: &[String]) -> Vec<(VariableKind, Vec<usize>)> {
    VariableKind::ORDER
        .iter()
        .map(|kind| {
            let members = variables
                .iter()
                .enumerate()
                .filter(|(_, v)| VariableKind::classify(v) == *kind)
                .map(|(i, _)| i)
                .collect::<Vec<_>>();
            (*kind, members)
        })
        .filter(|(_, members)| !members.is_empty())
        .collect()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HeatmapGroup {
    pub kind: VariableKind,
    pub title: String,
    pub grid: HeatmapGrid,
}

/// One sub-grid per variable kind, intra-kind correlations only
pub fn build_grouped(matrix: &CorrelationMatrix, filter: &HeatmapFilter) -> Vec<HeatmapGroup> {
    group_variables(&matrix.variables)
        .into_iter()
        .map(|(kind, members)| HeatmapGroup {
            kind,
            title: kind.title().to_string(),
            grid: grid_over(matrix, &members, filter),
        })
        .collect()
}

const LABEL_WIDTH: i32 = 150;
const HEADER_HEIGHT: i32 = 110;
const TITLE_HEIGHT: i32 = 40;

fn cell_size(count: usize) -> i32 {
    if count > 10 { 70 } else { 100 }
}

/// Pixel size needed by a grid
fn grid_extent(grid: &HeatmapGrid) -> (i32, i32) {
    let n = grid.len() as i32;
    let size = cell_size(grid.len());
    (LABEL_WIDTH + n * size, HEADER_HEIGHT + n * size)
}

fn draw_grid(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    grid: &HeatmapGrid,
    title: &str,
    origin: (i32, i32),
) -> Result<()> {
    let (ox, oy) = origin;
    let size = cell_size(grid.len());
    let text = |color: &RGBColor, size: i32, h: HPos| {
        ("sans-serif", size).into_font().color(color).pos(Pos::new(h, VPos::Center))
    };

    if !title.is_empty() {
        root.draw(&Text::new(
            title.to_string(),
            (ox, oy + TITLE_HEIGHT / 2),
            text(&palette::STUDENTS_DARK, 18, HPos::Left),
        ))?;
    }
    let top = oy + TITLE_HEIGHT + HEADER_HEIGHT;
    let left = ox + LABEL_WIDTH;

    for (k, label) in grid.labels.iter().enumerate() {
        let k = k as i32;
        // Column header, rotated to fit long labels
        let header = ("sans-serif", 12)
            .into_font()
            .transform(FontTransform::Rotate270)
            .color(&BLACK)
            .pos(Pos::new(HPos::Left, VPos::Center));
        root.draw(&Text::new(label.clone(), (left + k * size + size / 2, top - 6), header))?;
        root.draw(&Text::new(
            label.clone(),
            (left - 8, top + k * size + size / 2),
            text(&BLACK, 12, HPos::Right),
        ))?;
    }

    for (i, row) in grid.cells.iter().enumerate() {
        for (j, cell) in row.iter().enumerate() {
            let x0 = left + j as i32 * size;
            let y0 = top + i as i32 * size;
            let (fill, ink) = match cell {
                CellDisplay::Value { r, bucket, .. } => (bucket.color(), palette::text_color(*r)),
                _ => (palette::PLACEHOLDER, palette::MUTED_TEXT),
            };
            root.draw(&Rectangle::new([(x0, y0), (x0 + size - 1, y0 + size - 1)], fill.filled()))?;
            root.draw(&Text::new(
                cell.text(),
                (x0 + size / 2, y0 + size / 2),
                text(&ink, 13, HPos::Center),
            ))?;
        }
    }
    Ok(())
}

fn legend_height() -> i32 {
    40
}

fn draw_legend(root: &DrawingArea<SVGBackend<'_>, Shift>, origin: (i32, i32)) -> Result<()> {
    let (ox, oy) = origin;
    for (k, bucket) in CorrelationBucket::ALL.iter().enumerate() {
        let x = ox + k as i32 * 70;
        root.draw(&Rectangle::new([(x, oy), (x + 24, oy + 14)], bucket.color().filled()))?;
        root.draw(&Text::new(
            bucket.label(),
            (x + 28, oy + 7),
            ("sans-serif", 11)
                .into_font()
                .color(&palette::MUTED_TEXT)
                .pos(Pos::new(HPos::Left, VPos::Center)),
        ))?;
    }
    root.draw(&Text::new(
        "* p<0.05, ** p<0.01, *** p<0.001",
        (ox, oy + 30),
        ("sans-serif", 11)
            .into_font()
            .color(&palette::MUTED_TEXT)
            .pos(Pos::new(HPos::Left, VPos::Center)),
    ))?;
    Ok(())
}

/// Draw one grid as SVG
///
/// The canvas grows with the number of variables; `options.width` and
/// `options.height` act as minimums.
pub fn render_svg(grid: &HeatmapGrid, options: &ChartOptions) -> Result<String> {
    let (w, h) = grid_extent(grid);
    let width = (w + 40).max(options.width as i32).max(9 * 70 + 40) as u32;
    let height = (h + TITLE_HEIGHT + legend_height() + 40).max(options.height as i32) as u32;

    svg_document(width, height, |root| {
        draw_grid(root, grid, &options.title, (20, 10))?;
        draw_legend(root, (20, 10 + TITLE_HEIGHT + h + 15))
    })
}

/// Draw the grouped variant: sub-grids stacked vertically
pub fn render_grouped_svg(groups: &[HeatmapGroup], options: &ChartOptions) -> Result<String> {
    let extents: Vec<(i32, i32)> = groups.iter().map(|g| grid_extent(&g.grid)).collect();
    let width = extents
        .iter()
        .map(|(w, _)| w + 40)
        .max()
        .unwrap_or(0)
        .max(options.width as i32)
        .max(9 * 70 + 40) as u32;
    let body: i32 = extents.iter().map(|(_, h)| h + TITLE_HEIGHT + 20).sum();
    let height = (TITLE_HEIGHT + body + legend_height() + 40).max(options.height as i32) as u32;

    svg_document(width, height, |root| {
        if !options.title.is_empty() {
            root.draw(&Text::new(
                options.title.clone(),
                (20, TITLE_HEIGHT / 2),
                ("sans-serif", 22)
                    .into_font()
                    .color(&palette::STUDENTS_DARK)
                    .pos(Pos::new(HPos::Left, VPos::Center)),
            ))?;
        }
        let mut y = TITLE_HEIGHT;
        for (group, (_, h)) in groups.iter().zip(&extents) {
            let title = format!("{} ({})", group.title, group.grid.len());
            draw_grid(root, &group.grid, &title, (20, y))?;
            y += h + TITLE_HEIGHT + 20;
        }
        draw_legend(root, (20, y + 10))
    })
}
