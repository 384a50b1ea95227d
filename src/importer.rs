#![cfg(not(tarpaulin_include))]

use crate::dataset::{Dataset, StudentResponse, TeacherResponse};
use crate::error::{DashboardError, Result};
use crate::questions::{STUDENT_COLUMNS, TEACHER_COLUMNS};
use csv::{ReaderBuilder, StringRecord};
use log::{info, warn};
use std::io::Read;
use std::path::Path;

/// File name of the student export inside the data directory
pub const STUDENTS_FILE: &str = "students.csv";

/// File name of the teacher export inside the data directory
pub const TEACHERS_FILE: &str = "teachers.csv";

/// Import both questionnaires from a data directory
///
/// Reads `students.csv` and `teachers.csv`, one response per row, columns in
/// questionnaire order (timestamp first, then the respondent code). The first
/// row holds the question texts and is skipped.
///
/// # Arguments
/// * `data_dir` - Directory containing the two CSV exports
///
/// # Returns
/// * `Result<Dataset>` - Both populations, stamped with the import time
///
/// # Examples
/// ```no_run
/// use survey_dashboard::importer::import_dir;
///
/// match import_dir("data") {
///     Ok(ds) => println!("{} studenti, {} insegnanti", ds.students.len(), ds.teachers.len()),
///     Err(e) => eprintln!("Import fallito: {}", e),
/// }
/// ```
pub fn import_dir(data_dir: impl AsRef<Path>) -> Result<Dataset> {
    let data_dir = data_dir.as_ref();
    let students_path = data_dir.join(STUDENTS_FILE);
    let teachers_path = data_dir.join(TEACHERS_FILE);

    let students = read_students(std::fs::File::open(&students_path)?, STUDENTS_FILE)?;
    let teachers = read_teachers(std::fs::File::open(&teachers_path)?, TEACHERS_FILE)?;

    info!(
        "Imported {} student and {} teacher responses from {}",
        students.len(),
        teachers.len(),
        data_dir.display()
    );
    Ok(Dataset::new(students, teachers))
}

/// Parse the student export
///
/// # Arguments
/// * `input` - CSV source with a header row
/// * `source` - Name used in error messages
pub fn read_students<R: Read>(input: R, source: &str) -> Result<Vec<StudentResponse>> {
    read_rows(input, source, STUDENT_COLUMNS, |row| {
        Ok(StudentResponse {
            timestamp: row.text(0),
            code: row.text(1),
            age: row.number_capped(2, 150.0),
            gender: row.text(3),
            school_type: row.text(4),
            education_level: row.text(5),
            study_path: row.text(6),
            practical_competence: row.likert(7, "practical_competence")?,
            theoretical_competence: row.likert(8, "theoretical_competence")?,
            ai_change_study: row.likert(9, "ai_change_study")?,
            training_adequacy: row.likert(10, "training_adequacy")?,
            trust_integration: row.likert(11, "trust_integration")?,
            teacher_preparation: row.likert(12, "teacher_preparation")?,
            concern_ai_school: row.likert(13, "concern_ai_school")?,
            concern_ai_peers: row.likert(14, "concern_ai_peers")?,
            uses_ai_daily: row.text(15),
            hours_daily: row.number(16),
            uses_ai_study: row.text(18),
            hours_study: row.number(20),
            hours_learning_tools: row.number(21),
            hours_saved: row.number(22),
            ai_tools: row.text(23),
            ai_purposes: row.text(24),
            not_use_for: row.text(25),
        })
    })
}

/// Parse the teacher export
///
/// # Arguments
/// * `input` - CSV source with a header row
/// * `source` - Name used in error messages
pub fn read_teachers<R: Read>(input: R, source: &str) -> Result<Vec<TeacherResponse>> {
    read_rows(input, source, TEACHER_COLUMNS, |row| {
        Ok(TeacherResponse {
            timestamp: row.text(0),
            code: row.text(1),
            currently_teaching: row.text(2),
            age: row.number_capped(3, 150.0),
            gender: row.text(4),
            education_level: row.text(5),
            school_level: row.text(6),
            subject_type: row.text(7),
            subject_area: row.text(8),
            practical_competence: row.likert(9, "practical_competence")?,
            theoretical_competence: row.likert(10, "theoretical_competence")?,
            ai_change_teaching: row.likert(11, "ai_change_teaching")?,
            ai_change_my_teaching: row.likert(12, "ai_change_my_teaching")?,
            training_adequacy: row.likert(13, "training_adequacy")?,
            trust_integration: row.likert(14, "trust_integration")?,
            trust_students_responsible: row.likert(15, "trust_students_responsible")?,
            concern_ai_education: row.likert(16, "concern_ai_education")?,
            concern_ai_students: row.likert(17, "concern_ai_students")?,
            not_use_for: row.text(18),
            uses_ai_daily: row.text(19),
            hours_daily: row.number(20),
            uses_ai_teaching: row.text(22),
            hours_training: row.number(23),
            hours_lesson_planning: row.number(24),
            ai_tools: row.text(25),
            ai_purposes: row.text(26),
        })
    })
}

fn read_rows<R, T, F>(input: R, source: &str, expected_columns: usize, mut parse: F) -> Result<Vec<T>>
where
    R: Read,
    F: FnMut(&Row<'_>) -> Result<T>,
{
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let headers = reader.headers()?.len();
    if headers < expected_columns {
        warn!(
            "{}: {} colonne nell'intestazione, attese {}",
            source, headers, expected_columns
        );
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let row = Row {
            record: &record,
            source,
            line,
        };
        rows.push(parse(&row)?);
    }
    Ok(rows)
}

/// One CSV record with typed accessors; missing or blank cells read as `None`
struct Row<'a> {
    record: &'a StringRecord,
    source: &'a str,
    line: u64,
}

impl Row<'_> {
    fn raw(&self, index: usize) -> Option<&str> {
        self.record
            .get(index)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn text(&self, index: usize) -> Option<String> {
        self.raw(index).map(str::to_string)
    }

    /// Finite number, decimal comma accepted; junk reads as missing
    fn number(&self, index: usize) -> Option<f64> {
        self.raw(index)
            .and_then(|value| value.replace(',', ".").parse::<f64>().ok())
            .filter(|value| value.is_finite() && value.abs() < 1e10)
    }

    fn number_capped(&self, index: usize, max: f64) -> Option<f64> {
        self.number(index).filter(|value| *value <= max)
    }

    /// Answer on the 1–7 scale; anything else on a filled cell is an error
    fn likert(&self, index: usize, field: &str) -> Result<Option<f64>> {
        let Some(raw) = self.raw(index) else {
            return Ok(None);
        };
        match raw.replace(',', ".").parse::<f64>() {
            Ok(value) if (1.0..=7.0).contains(&value) => Ok(Some(value)),
            _ => Err(DashboardError::InvalidRecord {
                file: self.source.to_string(),
                line: self.line,
                reason: format!("{}: '{}' non è nella scala 1-7", field, raw),
            }),
        }
    }
}
