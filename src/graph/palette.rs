//! Fixed colours shared by every chart.

use crate::model::TeacherCategory;
use plotters::style::RGBColor;
use serde::Serialize;

pub const STUDENTS: RGBColor = RGBColor(0x3b, 0x82, 0xf6);
pub const STUDENTS_DARK: RGBColor = RGBColor(0x1e, 0x40, 0xaf);
pub const MEAN_MARKER: RGBColor = RGBColor(0xef, 0x44, 0x44);
pub const GRID: RGBColor = RGBColor(0xe2, 0xe8, 0xf0);
pub const AXIS: RGBColor = RGBColor(0xcb, 0xd5, 0xe1);
pub const MUTED_TEXT: RGBColor = RGBColor(0x64, 0x74, 0x8b);
pub const REFERENCE_LINE: RGBColor = RGBColor(0x94, 0xa3, 0xb8);
pub const PLACEHOLDER: RGBColor = RGBColor(0xf8, 0xfa, 0xfc);

/// Fill colour of a teacher category
pub fn teacher_color(category: TeacherCategory) -> RGBColor {
    match category {
        TeacherCategory::All => RGBColor(0x8b, 0x5c, 0xf6),
        TeacherCategory::Active => RGBColor(0x10, 0xb9, 0x81),
        TeacherCategory::Training => RGBColor(0xf5, 0x9e, 0x0b),
    }
}

/// Stroke colour of a teacher category, used for error bars and borders
pub fn teacher_color_dark(category: TeacherCategory) -> RGBColor {
    match category {
        TeacherCategory::All => RGBColor(0x6d, 0x28, 0xd9),
        TeacherCategory::Active => RGBColor(0x05, 0x96, 0x69),
        TeacherCategory::Training => RGBColor(0xd9, 0x77, 0x06),
    }
}

/// Colour of a respondent group by its key (`students`, `teachers_active`...)
pub fn group_color(key: &str) -> RGBColor {
    match key {
        "teachers_all" => teacher_color(TeacherCategory::All),
        "teachers_active" => teacher_color(TeacherCategory::Active),
        "teachers_training" => teacher_color(TeacherCategory::Training),
        _ => STUDENTS,
    }
}

/// `#rrggbb` form of a colour
pub fn hex(color: RGBColor) -> String {
    format!("#{:02x}{:02x}{:02x}", color.0, color.1, color.2)
}

/// The nine diverging buckets of the correlation heatmap
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CorrelationBucket {
    StrongPositive,
    Positive,
    ModeratePositive,
    WeakPositive,
    Neutral,
    WeakNegative,
    ModerateNegative,
    Negative,
    StrongNegative,
}

impl CorrelationBucket {
    pub const ALL: [CorrelationBucket; 9] = [
        CorrelationBucket::StrongPositive,
        CorrelationBucket::Positive,
        CorrelationBucket::ModeratePositive,
        CorrelationBucket::WeakPositive,
        CorrelationBucket::Neutral,
        CorrelationBucket::WeakNegative,
        CorrelationBucket::ModerateNegative,
        CorrelationBucket::Negative,
        CorrelationBucket::StrongNegative,
    ];

    /// Bucket of a coefficient; thresholds are inclusive lower bounds
    pub fn from_r(r: f64) -> Self {
        if r >= 0.7 {
            CorrelationBucket::StrongPositive
        } else if r >= 0.5 {
            CorrelationBucket::Positive
        } else if r >= 0.3 {
            CorrelationBucket::ModeratePositive
        } else if r >= 0.1 {
            CorrelationBucket::WeakPositive
        } else if r >= -0.1 {
            CorrelationBucket::Neutral
        } else if r >= -0.3 {
            CorrelationBucket::WeakNegative
        } else if r >= -0.5 {
            CorrelationBucket::ModerateNegative
        } else if r >= -0.7 {
            CorrelationBucket::Negative
        } else {
            CorrelationBucket::StrongNegative
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CorrelationBucket::StrongPositive => "≥0.7",
            CorrelationBucket::Positive => "≥0.5",
            CorrelationBucket::ModeratePositive => "≥0.3",
            CorrelationBucket::WeakPositive => "≥0.1",
            CorrelationBucket::Neutral => "≥−0.1",
            CorrelationBucket::WeakNegative => "≥−0.3",
            CorrelationBucket::ModerateNegative => "≥−0.5",
            CorrelationBucket::Negative => "≥−0.7",
            CorrelationBucket::StrongNegative => "<−0.7",
        }
    }

    pub fn color(&self) -> RGBColor {
        match self {
            CorrelationBucket::StrongPositive => RGBColor(0x1e, 0x40, 0xaf),
            CorrelationBucket::Positive => RGBColor(0x60, 0xa5, 0xfa),
            CorrelationBucket::ModeratePositive => RGBColor(0x93, 0xc5, 0xfd),
            CorrelationBucket::WeakPositive => RGBColor(0xdb, 0xea, 0xfe),
            CorrelationBucket::Neutral => RGBColor(0xf3, 0xf4, 0xf6),
            CorrelationBucket::WeakNegative => RGBColor(0xfe, 0xca, 0xca),
            CorrelationBucket::ModerateNegative => RGBColor(0xf8, 0x71, 0x71),
            CorrelationBucket::Negative => RGBColor(0xdc, 0x26, 0x26),
            CorrelationBucket::StrongNegative => RGBColor(0xb9, 0x1c, 0x1c),
        }
    }
}

/// White text on dark cells (|r| > 0.5), black elsewhere
pub fn text_color(r: f64) -> RGBColor {
    if r.abs() > 0.5 {
        RGBColor(0xff, 0xff, 0xff)
    } else {
        RGBColor(0x00, 0x00, 0x00)
    }
}
