//! Survey records and the in-memory dataset they live in.
//!
//! Records mirror the two questionnaires column by column. Likert answers are
//! kept as `f64` on the 1–7 scale, hours as `f64`, free-choice answers as raw
//! text. Nothing here knows about HTTP or charts.

use crate::model::{RespondentType, TeacherCategory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Exact answer given by teachers who are currently teaching
pub const CURRENTLY_TEACHING: &str = "Attualmente insegno.";

/// Exact "yes" answer of the yes/no questions
pub const YES: &str = "Sì";

/// Field lookup by name, shared by students and teachers
///
/// Statistics are computed over named columns, so analytics code only needs
/// to know a field's name to pull its values out of either population.
pub trait Respondent {
    fn code(&self) -> Option<&str>;

    /// Numeric value of a Likert, hours, age or encoded (`*_code`) field
    fn numeric(&self, field: &str) -> Option<f64>;

    /// Raw text answer of a categorical or multiple-choice field
    fn text(&self, field: &str) -> Option<&str>;
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentResponse {
    pub timestamp: Option<String>,
    pub code: Option<String>,
    pub age: Option<f64>,
    pub gender: Option<String>,
    pub school_type: Option<String>,
    pub education_level: Option<String>,
    pub study_path: Option<String>,

    pub practical_competence: Option<f64>,
    pub theoretical_competence: Option<f64>,
    pub ai_change_study: Option<f64>,
    pub training_adequacy: Option<f64>,
    pub trust_integration: Option<f64>,
    pub teacher_preparation: Option<f64>,
    pub concern_ai_school: Option<f64>,
    pub concern_ai_peers: Option<f64>,

    pub uses_ai_daily: Option<String>,
    pub hours_daily: Option<f64>,
    pub uses_ai_study: Option<String>,
    pub hours_study: Option<f64>,
    pub hours_learning_tools: Option<f64>,
    pub hours_saved: Option<f64>,

    pub ai_tools: Option<String>,
    pub ai_purposes: Option<String>,
    pub not_use_for: Option<String>,
}

impl StudentResponse {
    pub const LIKERT_FIELDS: [&'static str; 8] = [
        "practical_competence",
        "theoretical_competence",
        "ai_change_study",
        "training_adequacy",
        "trust_integration",
        "teacher_preparation",
        "concern_ai_school",
        "concern_ai_peers",
    ];
}

impl Respondent for StudentResponse {
    fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    fn numeric(&self, field: &str) -> Option<f64> {
        match field {
            "age" => self.age,
            "practical_competence" => self.practical_competence,
            "theoretical_competence" => self.theoretical_competence,
            "ai_change_study" => self.ai_change_study,
            "training_adequacy" => self.training_adequacy,
            "trust_integration" => self.trust_integration,
            "teacher_preparation" => self.teacher_preparation,
            "concern_ai_school" => self.concern_ai_school,
            "concern_ai_peers" => self.concern_ai_peers,
            "hours_daily" => self.hours_daily,
            "hours_study" => self.hours_study,
            "hours_learning_tools" => self.hours_learning_tools,
            "hours_saved" => self.hours_saved,
            "gender_code" => self.gender.as_deref().map(encode_gender),
            "uses_ai_daily_code" => self.uses_ai_daily.as_deref().map(encode_yes_no),
            "uses_ai_study_code" => self.uses_ai_study.as_deref().map(encode_yes_no),
            "school_type_code" => self.school_type.as_deref().map(encode_school_type),
            _ => None,
        }
    }

    fn text(&self, field: &str) -> Option<&str> {
        match field {
            "code" => self.code.as_deref(),
            "gender" => self.gender.as_deref(),
            "school_type" => self.school_type.as_deref(),
            "education_level" => self.education_level.as_deref(),
            "study_path" => self.study_path.as_deref(),
            "uses_ai_daily" => self.uses_ai_daily.as_deref(),
            "uses_ai_study" => self.uses_ai_study.as_deref(),
            "ai_tools" => self.ai_tools.as_deref(),
            "ai_purposes" => self.ai_purposes.as_deref(),
            "not_use_for" => self.not_use_for.as_deref(),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TeacherResponse {
    pub timestamp: Option<String>,
    pub code: Option<String>,
    pub currently_teaching: Option<String>,
    pub age: Option<f64>,
    pub gender: Option<String>,
    pub education_level: Option<String>,
    pub school_level: Option<String>,
    pub subject_type: Option<String>,
    pub subject_area: Option<String>,

    pub practical_competence: Option<f64>,
    pub theoretical_competence: Option<f64>,
    pub ai_change_teaching: Option<f64>,
    pub ai_change_my_teaching: Option<f64>,
    pub training_adequacy: Option<f64>,
    pub trust_integration: Option<f64>,
    pub trust_students_responsible: Option<f64>,
    pub concern_ai_education: Option<f64>,
    pub concern_ai_students: Option<f64>,

    pub not_use_for: Option<String>,
    pub uses_ai_daily: Option<String>,
    pub hours_daily: Option<f64>,
    pub uses_ai_teaching: Option<String>,
    pub hours_training: Option<f64>,
    pub hours_lesson_planning: Option<f64>,

    pub ai_tools: Option<String>,
    pub ai_purposes: Option<String>,
}

impl TeacherResponse {
    pub const LIKERT_FIELDS: [&'static str; 9] = [
        "practical_competence",
        "theoretical_competence",
        "ai_change_teaching",
        "ai_change_my_teaching",
        "training_adequacy",
        "trust_integration",
        "trust_students_responsible",
        "concern_ai_education",
        "concern_ai_students",
    ];

    pub fn is_active(&self) -> bool {
        self.currently_teaching.as_deref() == Some(CURRENTLY_TEACHING)
    }

    pub fn in_category(&self, category: TeacherCategory) -> bool {
        match category {
            TeacherCategory::All => true,
            TeacherCategory::Active => self.is_active(),
            TeacherCategory::Training => !self.is_active(),
        }
    }
}

impl Respondent for TeacherResponse {
    fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    fn numeric(&self, field: &str) -> Option<f64> {
        match field {
            "age" => self.age,
            "practical_competence" => self.practical_competence,
            "theoretical_competence" => self.theoretical_competence,
            "ai_change_teaching" => self.ai_change_teaching,
            "ai_change_my_teaching" => self.ai_change_my_teaching,
            "training_adequacy" => self.training_adequacy,
            "trust_integration" => self.trust_integration,
            "trust_students_responsible" => self.trust_students_responsible,
            "concern_ai_education" => self.concern_ai_education,
            "concern_ai_students" => self.concern_ai_students,
            "hours_daily" => self.hours_daily,
            "hours_training" => self.hours_training,
            "hours_lesson_planning" => self.hours_lesson_planning,
            "gender_code" => self.gender.as_deref().map(encode_gender),
            "uses_ai_daily_code" => self.uses_ai_daily.as_deref().map(encode_yes_no),
            "uses_ai_teaching_code" => self.uses_ai_teaching.as_deref().map(encode_yes_no),
            "school_level_code" => self.school_level.as_deref().map(encode_school_level),
            "currently_teaching_code" => self
                .currently_teaching
                .as_deref()
                .map(encode_currently_teaching),
            "subject_type_code" => self.subject_type.as_deref().map(encode_subject_type),
            _ => None,
        }
    }

    fn text(&self, field: &str) -> Option<&str> {
        match field {
            "code" => self.code.as_deref(),
            "currently_teaching" => self.currently_teaching.as_deref(),
            "gender" => self.gender.as_deref(),
            "education_level" => self.education_level.as_deref(),
            "school_level" => self.school_level.as_deref(),
            "subject_type" => self.subject_type.as_deref(),
            "subject_area" => self.subject_area.as_deref(),
            "not_use_for" => self.not_use_for.as_deref(),
            "uses_ai_daily" => self.uses_ai_daily.as_deref(),
            "uses_ai_teaching" => self.uses_ai_teaching.as_deref(),
            "ai_tools" => self.ai_tools.as_deref(),
            "ai_purposes" => self.ai_purposes.as_deref(),
            _ => None,
        }
    }
}

/// Both populations as imported, plus the import time
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub students: Vec<StudentResponse>,
    pub teachers: Vec<TeacherResponse>,
    pub imported_at: Option<DateTime<Utc>>,
}

impl Dataset {
    pub fn new(students: Vec<StudentResponse>, teachers: Vec<TeacherResponse>) -> Self {
        Dataset {
            students,
            teachers,
            imported_at: Some(Utc::now()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty() && self.teachers.is_empty()
    }

    pub fn teachers_in(&self, category: TeacherCategory) -> impl Iterator<Item = &TeacherResponse> {
        self.teachers.iter().filter(move |t| t.in_category(category))
    }

    pub fn count(&self, respondent_type: RespondentType) -> usize {
        match respondent_type {
            RespondentType::Student => self.students.len(),
            RespondentType::Teacher => self.teachers.len(),
        }
    }

    pub fn find_student(&self, code: &str) -> Option<&StudentResponse> {
        self.students.iter().find(|s| s.code.as_deref() == Some(code))
    }

    pub fn find_teacher(&self, code: &str) -> Option<&TeacherResponse> {
        self.teachers.iter().find(|t| t.code.as_deref() == Some(code))
    }
}

/// Values of one numeric field, skipping respondents who left it blank
pub fn numeric_values<'a, R, I>(respondents: I, field: &str) -> Vec<f64>
where
    R: Respondent + 'a,
    I: IntoIterator<Item = &'a R>,
{
    respondents
        .into_iter()
        .filter_map(|r| r.numeric(field))
        .collect()
}

/// Values of one numeric field, `None` kept in place so columns stay aligned
pub fn numeric_column<'a, R, I>(respondents: I, field: &str) -> Vec<Option<f64>>
where
    R: Respondent + 'a,
    I: IntoIterator<Item = &'a R>,
{
    respondents.into_iter().map(|r| r.numeric(field)).collect()
}

/// Splits a multiple-choice answer on commas and semicolons
pub fn split_options(answer: &str) -> impl Iterator<Item = &str> {
    answer
        .split([',', ';'])
        .map(str::trim)
        .filter(|opt| !opt.is_empty())
}

// ---------------------------------------------------------------------------
// Categorical encoders
// ---------------------------------------------------------------------------

pub fn encode_gender(gender: &str) -> f64 {
    match gender.trim() {
        "Maschio" => 1.0,
        "Femmina" => 2.0,
        "Altro" => 3.0,
        "Preferisco non rispondere" => 4.0,
        _ => 0.0,
    }
}

pub fn encode_yes_no(value: &str) -> f64 {
    if value.trim() == YES { 1.0 } else { 0.0 }
}

pub fn encode_school_type(school_type: &str) -> f64 {
    match school_type.trim() {
        "Liceo" => 1.0,
        "Istituto Tecnico" => 2.0,
        "Istituto Professionale" => 3.0,
        "Altro" => 4.0,
        _ => 0.0,
    }
}

pub fn encode_school_level(school_level: &str) -> f64 {
    match school_level.trim() {
        "Scuola Primaria" => 1.0,
        "Scuola Secondaria di Primo Grado" => 2.0,
        "Scuola Secondaria di Secondo Grado" => 3.0,
        "Università" => 4.0,
        "Altro" => 5.0,
        _ => 0.0,
    }
}

pub fn encode_currently_teaching(value: &str) -> f64 {
    if value.trim() == CURRENTLY_TEACHING { 1.0 } else { 0.0 }
}

/// 1 for STEM subjects, 0 for everything else
pub fn encode_subject_type(subject_type: &str) -> f64 {
    if subject_type.contains("STEM") { 1.0 } else { 0.0 }
}

/// Folds the spelling variants of the school levels into one label each
pub fn normalize_school_level(level: &str) -> String {
    let trimmed = level.trim();
    let lower = trimmed.to_lowercase();

    if lower.contains("infanzia") {
        "Scuola dell'Infanzia".to_string()
    } else if lower.contains("primaria") {
        "Scuola Primaria".to_string()
    } else if lower.contains("secondaria")
        && (lower.contains("ii grado") || lower.contains("secondo grado") || lower.contains("superiori"))
    {
        "Scuola Secondaria di II Grado".to_string()
    } else if lower.contains("secondaria")
        && (lower.contains("i grado") || lower.contains("primo grado") || lower.contains("medie"))
    {
        "Scuola Secondaria di I Grado".to_string()
    } else {
        trimmed.to_string()
    }
}
