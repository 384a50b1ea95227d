use crate::error::{DashboardError, Result};
use crate::graph::labels::short_label;
use crate::graph::palette::{CorrelationBucket, text_color};
use crate::model::{
    ComparisonWithCi, CorrelationDirection, CorrelationMatrix, CorrelationStrength, GroupStat,
};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxColor};
use serde::Serialize;

/// One CSV row of the comparison export
#[derive(Serialize)]
struct ComparisonRow<'a> {
    variable: &'a str,
    label: &'a str,
    students_mean: f64,
    students_sd: f64,
    students_n: u32,
    students_ci_lower: f64,
    students_ci_upper: f64,
    teachers_mean: f64,
    teachers_sd: f64,
    teachers_n: u32,
    teachers_ci_lower: f64,
    teachers_ci_upper: f64,
    difference: Option<f64>,
}

/// Convert a students-vs-teachers comparison to CSV
///
/// One row per variable with mean, sd, n and confidence interval of both
/// groups. Quoting and escaping are left to the csv writer.
///
/// # Arguments
/// * `comparison` - Output of the comparison-with-ci endpoint
///
/// # Returns
/// * `Result<String>` - CSV content, header row first
pub fn comparison_csv(comparison: &ComparisonWithCi) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for c in &comparison.comparisons {
        let (s, t): (&GroupStat, &GroupStat) = (&c.students, &c.teachers);
        writer.serialize(ComparisonRow {
            variable: c.variable.as_deref().unwrap_or(""),
            label: &c.label,
            students_mean: s.mean,
            students_sd: s.sd,
            students_n: s.n,
            students_ci_lower: s.ci_lower,
            students_ci_upper: s.ci_upper,
            teachers_mean: t.mean,
            teachers_sd: t.sd,
            teachers_n: t.n,
            teachers_ci_lower: t.ci_lower,
            teachers_ci_upper: t.ci_upper,
            difference: c.difference,
        })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DashboardError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| DashboardError::Export(e.to_string()))
}

fn rgb(color: plotters::style::RGBColor) -> XlsxColor {
    XlsxColor::RGB(((color.0 as u32) << 16) | ((color.1 as u32) << 8) | color.2 as u32)
}

fn strength_label(strength: CorrelationStrength) -> &'static str {
    match strength {
        CorrelationStrength::VeryStrong => "molto forte",
        CorrelationStrength::Strong => "forte",
        CorrelationStrength::Moderate => "moderata",
        CorrelationStrength::Weak => "debole",
    }
}

fn direction_label(direction: CorrelationDirection) -> &'static str {
    match direction {
        CorrelationDirection::Positive => "positiva",
        CorrelationDirection::Negative => "negativa",
    }
}

/// Header row and column of a matrix sheet
fn write_headers(sheet: &mut Worksheet, matrix: &CorrelationMatrix, header: &Format) -> Result<()> {
    for (k, variable) in matrix.variables.iter().enumerate() {
        let pos = k as u16 + 1;
        sheet.write_string_with_format(0, pos, short_label(variable), header)?;
        sheet.write_string_with_format(pos as u32, 0, short_label(variable), header)?;
    }
    sheet.set_column_width(0, 22)?;
    Ok(())
}

/// Convert a correlation matrix to XLSX
///
/// The workbook has three sheets: `r` with coefficients coloured by heatmap
/// bucket, `p` with the p-values (blank on the diagonal) and `Significative`
/// with the significant pairs.
///
/// # Arguments
/// * `matrix` - Matrix to export
///
/// # Returns
/// * `Result<Vec<u8>>` - XLSX file content
pub fn correlation_xlsx(matrix: &CorrelationMatrix) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let n = matrix.dimension();

    let mut r_sheet = Worksheet::new();
    r_sheet.set_name("r")?;
    write_headers(&mut r_sheet, matrix, &header)?;
    for i in 0..n {
        for j in 0..n {
            let r = if i == j { 1.0 } else { matrix.r(i, j) };
            let format = Format::new()
                .set_num_format("0.00")
                .set_background_color(rgb(CorrelationBucket::from_r(r).color()))
                .set_font_color(rgb(text_color(r)));
            r_sheet.write_number_with_format(i as u32 + 1, j as u16 + 1, r, &format)?;
        }
    }

    let mut p_sheet = Worksheet::new();
    p_sheet.set_name("p")?;
    write_headers(&mut p_sheet, matrix, &header)?;
    let p_format = Format::new().set_num_format("0.0000");
    for i in 0..n {
        for j in 0..n {
            if let Some(p) = matrix.p(i, j) {
                p_sheet.write_number_with_format(i as u32 + 1, j as u16 + 1, p, &p_format)?;
            }
        }
    }

    let mut pairs = Worksheet::new();
    pairs.set_name("Significative")?;
    for (col, title) in ["Variabile 1", "Variabile 2", "r", "p", "Forza", "Direzione"]
        .iter()
        .enumerate()
    {
        pairs.write_string_with_format(0, col as u16, *title, &header)?;
    }
    for (k, pair) in matrix.significant_correlations.iter().enumerate() {
        let row = k as u32 + 1;
        pairs.write_string(row, 0, short_label(&pair.var1))?;
        pairs.write_string(row, 1, short_label(&pair.var2))?;
        pairs.write_number(row, 2, pair.correlation)?;
        pairs.write_number(row, 3, pair.p_value)?;
        pairs.write_string(row, 4, strength_label(pair.strength))?;
        pairs.write_string(row, 5, direction_label(pair.direction))?;
    }

    workbook.push_worksheet(r_sheet);
    workbook.push_worksheet(p_sheet);
    workbook.push_worksheet(pairs);

    let buffer = workbook.save_to_buffer()?;
    Ok(buffer)
}
