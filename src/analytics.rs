//! Builds every API payload from an imported [`Dataset`].
//!
//! Functions here are pure: same dataset in, same payload out. Caching and
//! transport live in the server module.

use crate::dataset::{
    Dataset, Respondent, StudentResponse, TeacherResponse, YES, normalize_school_level, numeric_column,
    numeric_values, split_options,
};
use crate::error::{DashboardError, Result};
use crate::model::*;
use crate::questions::{self, MIRRORED, STUDENT_SECTIONS, TEACHER_SECTIONS};
use crate::stats::{self, DEFAULT_CONFIDENCE, round_to};
use std::collections::{BTreeMap, HashMap};

/// Note attached to the confidence-interval comparison
pub const CI_NOTE: &str = "IC 95% calcolati usando distribuzione t di Student";

/// Columns with this many valid values or fewer are left out of the matrix
pub const MIN_VALID_VALUES: usize = 10;

/// Variables of the confidence-interval comparison and their labels
pub const CI_VARIABLES: [(&str, &str); 4] = [
    ("practical_competence", "Competenza Pratica"),
    ("theoretical_competence", "Competenza Teorica"),
    ("trust_integration", "Fiducia Integrazione AI"),
    ("training_adequacy", "Adeguatezza Formazione"),
];

pub const STUDENT_CORRELATION_VARIABLES: [&str; 14] = [
    "practical_competence",
    "theoretical_competence",
    "ai_change_study",
    "training_adequacy",
    "trust_integration",
    "concern_ai_school",
    "concern_ai_peers",
    "age",
    "hours_daily",
    "hours_study",
    "gender_code",
    "uses_ai_daily_code",
    "uses_ai_study_code",
    "school_type_code",
];

pub const TEACHER_CORRELATION_VARIABLES: [&str; 16] = [
    "practical_competence",
    "theoretical_competence",
    "ai_change_teaching",
    "training_adequacy",
    "trust_integration",
    "concern_ai_education",
    "concern_ai_students",
    "age",
    "hours_daily",
    "hours_training",
    "hours_lesson_planning",
    "gender_code",
    "uses_ai_daily_code",
    "school_level_code",
    "currently_teaching_code",
    "subject_type_code",
];

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        round_to(part as f64 / total as f64 * 100.0, 1)
    }
}

fn count_by<'a, I: IntoIterator<Item = &'a str>>(values: I) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for value in values {
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Counts sorted by frequency, then alphabetically
fn ranked(counts: HashMap<&str, u32>) -> Vec<ToolCount> {
    let mut ranked: Vec<ToolCount> = counts
        .into_iter()
        .map(|(name, count)| ToolCount {
            name: name.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    ranked
}

fn option_counts<'a, I: IntoIterator<Item = &'a str>>(answers: I, split: bool) -> Vec<ToolCount> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for answer in answers {
        if split {
            for option in split_options(answer) {
                *counts.entry(option).or_insert(0) += 1;
            }
        } else {
            *counts.entry(answer.trim()).or_insert(0) += 1;
        }
    }
    ranked(counts)
}

// ---------------------------------------------------------------------------
// Header counts
// ---------------------------------------------------------------------------

pub fn health(ds: &Dataset) -> HealthStatus {
    HealthStatus {
        status: "healthy".to_string(),
        student_responses: ds.students.len() as u64,
        teacher_responses: ds.teachers.len() as u64,
    }
}

pub fn overview(ds: &Dataset) -> Overview {
    let active = ds.teachers_in(TeacherCategory::Active).count() as u32;
    let training = ds.teachers_in(TeacherCategory::Training).count() as u32;
    Overview {
        students: ds.students.len() as u32,
        active_teachers: active,
        training_teachers: training,
        total_teachers: active + training,
    }
}

// ---------------------------------------------------------------------------
// Population summaries
// ---------------------------------------------------------------------------

fn likert_item<R: Respondent>(respondents: &[&R], field: &str) -> LikertItem {
    let values = numeric_values(respondents.iter().copied(), field);
    LikertItem {
        field: field.to_string(),
        label: questions::field_label(field).to_string(),
        n: values.len() as u32,
        mean: stats::mean(&values).map(|m| round_to(m, 2)).unwrap_or(0.0),
        median: stats::median(&values).unwrap_or(0.0),
        distribution: stats::likert_distribution(&values),
    }
}

fn sections<R: Respondent>(respondents: &[&R], layout: &[(&str, &str, &[&str])]) -> Vec<LikertSection> {
    layout
        .iter()
        .map(|(key, title, fields)| LikertSection {
            key: key.to_string(),
            title: title.to_string(),
            items: fields.iter().map(|f| likert_item(respondents, f)).collect(),
        })
        .collect()
}

fn hours_average<R: Respondent>(respondents: &[&R], field: &str) -> HoursAverage {
    let values: Vec<f64> = numeric_values(respondents.iter().copied(), field)
        .into_iter()
        .filter(|v| *v > 0.0)
        .collect();
    HoursAverage {
        field: field.to_string(),
        label: questions::field_label(field).to_string(),
        average: stats::mean(&values).map(|m| round_to(m, 2)).unwrap_or(0.0),
    }
}

fn usage<R: Respondent>(respondents: &[&R], work_field: &str, hours: &[&str]) -> UsageSummary {
    let total = respondents.len();
    let daily = respondents
        .iter()
        .filter(|r| r.text("uses_ai_daily") == Some(YES))
        .count();
    let work = respondents
        .iter()
        .filter(|r| r.text(work_field) == Some(YES))
        .count();
    UsageSummary {
        uses_ai_daily_count: daily as u32,
        uses_ai_daily_percentage: percentage(daily, total),
        uses_ai_work_count: work as u32,
        uses_ai_work_percentage: percentage(work, total),
        hours: hours.iter().map(|h| hours_average(respondents, h)).collect(),
    }
}

fn age_summary<R: Respondent>(respondents: &[&R]) -> (f64, u32, u32) {
    let ages: Vec<f64> = numeric_values(respondents.iter().copied(), "age")
        .into_iter()
        .filter(|a| *a > 0.0)
        .collect();
    let avg = stats::mean(&ages).map(|m| round_to(m, 1)).unwrap_or(0.0);
    let min = ages.iter().copied().fold(f64::INFINITY, f64::min);
    let max = ages.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if ages.is_empty() {
        (avg, 0, 0)
    } else {
        (avg, min as u32, max as u32)
    }
}

/// Aggregate statistics of all students (`/api/students`)
pub fn student_summary(ds: &Dataset) -> GroupSummary {
    let students: Vec<&StudentResponse> = ds.students.iter().collect();
    let (age_avg, age_min, age_max) = age_summary(&students);

    GroupSummary {
        respondent_type: RespondentType::Student,
        total_responses: students.len() as u32,
        sections: sections(&students, STUDENT_SECTIONS),
        usage: usage(&students, "uses_ai_study", &["hours_daily", "hours_study"]),
        demographics: Demographics {
            age_avg,
            age_min,
            age_max,
            gender_distribution: count_by(students.iter().filter_map(|s| s.gender.as_deref())),
            school_distribution: count_by(students.iter().filter_map(|s| s.school_type.as_deref())),
            teaching_status_distribution: None,
        },
    }
}

/// Aggregate statistics of one teacher category (`/api/teachers`)
pub fn teacher_summary(ds: &Dataset, category: TeacherCategory) -> GroupSummary {
    let teachers: Vec<&TeacherResponse> = ds.teachers_in(category).collect();
    let (age_avg, age_min, age_max) = age_summary(&teachers);
    let school_levels: Vec<String> = teachers
        .iter()
        .filter_map(|t| t.school_level.as_deref())
        .map(normalize_school_level)
        .collect();

    GroupSummary {
        respondent_type: RespondentType::Teacher,
        total_responses: teachers.len() as u32,
        sections: sections(&teachers, TEACHER_SECTIONS),
        usage: usage(
            &teachers,
            "uses_ai_teaching",
            &["hours_daily", "hours_training", "hours_lesson_planning"],
        ),
        demographics: Demographics {
            age_avg,
            age_min,
            age_max,
            gender_distribution: count_by(teachers.iter().filter_map(|t| t.gender.as_deref())),
            school_distribution: count_by(school_levels.iter().map(String::as_str)),
            teaching_status_distribution: Some(count_by(
                teachers.iter().filter_map(|t| t.currently_teaching.as_deref()),
            )),
        },
    }
}

/// Students against one teacher category on the mirrored questions
pub fn comparison(ds: &Dataset, category: TeacherCategory) -> ComparisonReport {
    let students: Vec<&StudentResponse> = ds.students.iter().collect();
    let teachers: Vec<&TeacherResponse> = ds.teachers_in(category).collect();

    let comparisons = MIRRORED
        .iter()
        .filter_map(|(field, label, section)| {
            let s = likert_item(&students, field);
            let t = likert_item(&teachers, field);
            if s.n == 0 || t.n == 0 {
                return None;
            }
            let difference = round_to(t.mean - s.mean, 2);
            Some(LikertComparison {
                field: field.to_string(),
                question: label.to_string(),
                category: section.to_string(),
                students: s,
                teachers: t,
                difference,
            })
        })
        .collect();

    ComparisonReport {
        teacher_category: category,
        comparisons,
        summary: ComparisonTotals {
            total_students: students.len() as u32,
            total_teachers: teachers.len() as u32,
        },
    }
}

/// AI tools cited by each population, most cited first
pub fn tools(ds: &Dataset) -> ToolsSummary {
    ToolsSummary {
        student_tools: option_counts(ds.students.iter().filter_map(|s| s.ai_tools.as_deref()), true),
        teacher_tools: option_counts(ds.teachers.iter().filter_map(|t| t.ai_tools.as_deref()), true),
    }
}

// ---------------------------------------------------------------------------
// Inferential views
// ---------------------------------------------------------------------------

/// Means with 95% intervals for the variables asked to both populations
pub fn comparison_with_ci(ds: &Dataset, category: TeacherCategory) -> ComparisonWithCi {
    let comparisons = CI_VARIABLES
        .iter()
        .filter_map(|(field, label)| {
            let student_values = numeric_values(&ds.students, field);
            let teacher_values = numeric_values(ds.teachers_in(category), field);
            if student_values.is_empty() || teacher_values.is_empty() {
                return None;
            }
            let students = stats::mean_with_ci(&student_values, DEFAULT_CONFIDENCE);
            let teachers = stats::mean_with_ci(&teacher_values, DEFAULT_CONFIDENCE);
            let difference = round_to(students.mean - teachers.mean, 2);
            Some(ComparisonSummary {
                variable: Some(field.to_string()),
                label: label.to_string(),
                students,
                teachers,
                difference: Some(difference),
            })
        })
        .collect();

    ComparisonWithCi {
        comparisons,
        note: CI_NOTE.to_string(),
    }
}

fn keep_dense(columns: Vec<(String, Vec<Option<f64>>)>) -> Vec<(String, Vec<Option<f64>>)> {
    columns
        .into_iter()
        .filter(|(_, values)| values.iter().flatten().count() > MIN_VALID_VALUES)
        .collect()
}

/// Correlation matrix of one population
///
/// Teachers are filtered by `category`; students ignore it. Columns with ten
/// valid values or fewer are dropped before the matrix is computed.
pub fn correlation_matrix(
    ds: &Dataset,
    respondent_type: RespondentType,
    method: CorrelationMethod,
    category: TeacherCategory,
) -> CorrelationMatrix {
    let (columns, n_total) = match respondent_type {
        RespondentType::Student => (
            STUDENT_CORRELATION_VARIABLES
                .iter()
                .map(|f| (f.to_string(), numeric_column(&ds.students, f)))
                .collect::<Vec<_>>(),
            ds.students.len(),
        ),
        RespondentType::Teacher => {
            let teachers: Vec<&TeacherResponse> = ds.teachers_in(category).collect();
            (
                TEACHER_CORRELATION_VARIABLES
                    .iter()
                    .map(|f| (f.to_string(), numeric_column(teachers.iter().copied(), f)))
                    .collect::<Vec<_>>(),
                teachers.len(),
            )
        }
    };

    let mut matrix = stats::correlation_matrix(&keep_dense(columns), method);
    matrix.respondent_type = Some(respondent_type);
    matrix.n_total = Some(n_total as u32);
    matrix
}

/// Significant pairs of both populations, Pearson, active teachers
pub fn correlation_highlights(ds: &Dataset) -> CorrelationHighlights {
    let pick = |rt| {
        correlation_matrix(ds, rt, CorrelationMethod::Pearson, TeacherCategory::Active)
            .significant_correlations
    };
    CorrelationHighlights {
        student: pick(RespondentType::Student),
        teacher: pick(RespondentType::Teacher),
    }
}

// ---------------------------------------------------------------------------
// Per-question statistics
// ---------------------------------------------------------------------------

fn numeric_answers(ds: &Dataset, respondent_type: RespondentType, field: &str, teachers: Option<TeacherCategory>) -> Vec<f64> {
    match respondent_type {
        RespondentType::Student => numeric_values(&ds.students, field),
        RespondentType::Teacher => match teachers {
            Some(category) => numeric_values(ds.teachers_in(category), field),
            None => numeric_values(&ds.teachers, field),
        },
    }
}

fn text_answers<'a>(
    ds: &'a Dataset,
    respondent_type: RespondentType,
    field: &str,
    teachers: Option<TeacherCategory>,
) -> Vec<&'a str> {
    let non_blank = |v: &&str| !v.trim().is_empty();
    match respondent_type {
        RespondentType::Student => ds
            .students
            .iter()
            .filter_map(|s| s.text(field))
            .filter(non_blank)
            .collect(),
        RespondentType::Teacher => ds
            .teachers
            .iter()
            .filter(|t| teachers.is_none_or(|c| t.in_category(c)))
            .filter_map(|t| t.text(field))
            .filter(non_blank)
            .collect(),
    }
}

fn histogram(values: &[f64]) -> Vec<HistogramBin> {
    const BINS: usize = 10;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if max - min <= 20.0 {
        let mut counts: BTreeMap<i64, (f64, u32)> = BTreeMap::new();
        for v in values {
            let entry = counts.entry((v * 1000.0).round() as i64).or_insert((*v, 0));
            entry.1 += 1;
        }
        return counts
            .into_values()
            .map(|(v, count)| HistogramBin {
                lower: v,
                upper: v,
                count,
            })
            .collect();
    }

    let width = (max - min) / BINS as f64;
    let mut counts = [0u32; BINS];
    for v in values {
        let idx = (((v - min) / width) as usize).min(BINS - 1);
        counts[idx] += 1;
    }
    counts
        .iter()
        .enumerate()
        .filter(|(_, c)| **c > 0)
        .map(|(i, c)| HistogramBin {
            lower: round_to(min + i as f64 * width, 2),
            upper: round_to(min + (i + 1) as f64 * width, 2),
            count: *c,
        })
        .collect()
}

/// Statistics of a single question, shaped by its answer format
///
/// # Arguments
/// * `respondent_type` - Questionnaire the column belongs to
/// * `column_index` - Column of the question in the export
/// * `teachers` - Optional teacher category; ignored for students
///
/// # Returns
/// * `Result<QuestionStatsResponse>` - `NotFound` for unknown columns or
///   numeric questions nobody answered
pub fn question_stats(
    ds: &Dataset,
    respondent_type: RespondentType,
    column_index: u32,
    teachers: Option<TeacherCategory>,
) -> Result<QuestionStatsResponse> {
    let question = questions::find(respondent_type, column_index)
        .ok_or_else(|| {
            DashboardError::NotFound(format!(
                "Domanda {} non trovata per {}",
                column_index, respondent_type
            ))
        })?
        .clone();

    let Some(field) = question.field_name.clone() else {
        return Ok(QuestionStatsResponse::Text {
            question,
            response_count: 0,
            message: "Statistiche non disponibili per le domande aperte".to_string(),
        });
    };
    let no_answers = || DashboardError::NotFound("Nessuna risposta per questa domanda".to_string());

    match question.response_format {
        ResponseFormat::Scale1To7 => {
            let values = numeric_answers(ds, respondent_type, &field, teachers);
            let boxplot = stats::quartiles(&values).ok_or_else(no_answers)?;
            let total = values.len();
            let distribution = stats::likert_distribution(&values)
                .iter()
                .enumerate()
                .map(|(i, count)| DistributionBucket {
                    value: i as u8 + 1,
                    count: *count,
                    percentage: round_to(*count as f64 / total as f64 * 100.0, 2),
                })
                .collect();
            let statistics = ScaleStatistics {
                mean: boxplot.mean,
                median: boxplot.q2,
                std_dev: round_to(stats::sample_sd(&values), 2),
                min: values.iter().copied().fold(f64::INFINITY, f64::min),
                max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                mode: stats::mode(&values),
                q1: boxplot.q1,
                q3: boxplot.q3,
                iqr: round_to(boxplot.q3 - boxplot.q1, 2),
            };
            Ok(QuestionStatsResponse::Scale {
                question,
                response_count: total as u32,
                statistics,
                boxplot,
                distribution,
            })
        }
        ResponseFormat::Numeric => {
            let values: Vec<f64> = numeric_answers(ds, respondent_type, &field, teachers)
                .into_iter()
                .filter(|v| *v > 0.0)
                .collect();
            let boxplot = stats::quartiles(&values).ok_or_else(no_answers)?;
            let statistics = NumericStatistics {
                mean: boxplot.mean,
                median: boxplot.q2,
                std_dev: round_to(stats::sample_sd(&values), 2),
                min: round_to(values.iter().copied().fold(f64::INFINITY, f64::min), 2),
                max: round_to(values.iter().copied().fold(f64::NEG_INFINITY, f64::max), 2),
            };
            Ok(QuestionStatsResponse::Numeric {
                question,
                response_count: values.len() as u32,
                statistics,
                boxplot,
                histogram: histogram(&values),
            })
        }
        ResponseFormat::YesNo => {
            let answers = text_answers(ds, respondent_type, &field, teachers);
            let yes = answers
                .iter()
                .filter(|a| {
                    let lower = a.to_lowercase();
                    lower.contains("sì") || lower.contains("si")
                })
                .count() as u32;
            let total = answers.len() as u32;
            Ok(QuestionStatsResponse::YesNo {
                question,
                response_count: total,
                yes,
                no: total - yes,
                yes_percentage: if total == 0 {
                    0.0
                } else {
                    round_to(yes as f64 / total as f64 * 100.0, 2)
                },
            })
        }
        ResponseFormat::SingleChoice => {
            let answers = text_answers(ds, respondent_type, &field, teachers);
            let normalized: Vec<String> = if field == "school_level" {
                answers.iter().map(|a| normalize_school_level(a)).collect()
            } else {
                answers.iter().map(|a| a.trim().to_string()).collect()
            };
            let options = option_counts(normalized.iter().map(String::as_str), false)
                .into_iter()
                .map(|t| OptionCount {
                    option: t.name,
                    count: t.count,
                })
                .collect();
            Ok(QuestionStatsResponse::SingleChoice {
                question,
                response_count: answers.len() as u32,
                options,
            })
        }
        ResponseFormat::MultipleChoice => {
            let answers = text_answers(ds, respondent_type, &field, teachers);
            let options = option_counts(answers.iter().copied(), true)
                .into_iter()
                .map(|t| OptionCount {
                    option: t.name,
                    count: t.count,
                })
                .collect();
            Ok(QuestionStatsResponse::MultipleChoice {
                question,
                response_count: answers.len() as u32,
                options,
            })
        }
        ResponseFormat::Text => Ok(QuestionStatsResponse::Text {
            question,
            response_count: 0,
            message: "Statistiche non disponibili per le domande aperte".to_string(),
        }),
    }
}

fn labeled(key: &str, label: &str, values: &[f64]) -> Option<LabeledQuartiles> {
    stats::quartiles(values).map(|stats| LabeledQuartiles {
        key: key.to_string(),
        label: label.to_string(),
        n: values.len() as u32,
        stats,
    })
}

/// Every Likert question with box-plot data per respondent group
///
/// Student questions carry one group; teacher questions carry the active and
/// in-training groups side by side.
pub fn likert_questions(ds: &Dataset) -> Vec<LikertQuestion> {
    questions::all()
        .iter()
        .filter(|q| q.response_format == ResponseFormat::Scale1To7)
        .filter_map(|q| {
            let field = q.field_name.as_deref()?;
            let groups: Vec<LabeledQuartiles> = match q.respondent_type {
                RespondentType::Student => {
                    labeled("students", "Studenti", &numeric_values(&ds.students, field))
                        .into_iter()
                        .collect()
                }
                RespondentType::Teacher => [TeacherCategory::Active, TeacherCategory::Training]
                    .iter()
                    .filter_map(|c| {
                        labeled(c.key(), c.label(), &numeric_values(ds.teachers_in(*c), field))
                    })
                    .collect(),
            };
            Some(LikertQuestion {
                question: q.clone(),
                groups,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Profiles and respondents
// ---------------------------------------------------------------------------

fn age_ranges(ages: &[f64]) -> BTreeMap<String, u32> {
    let bands: [(&str, f64, f64); 5] = [
        ("18-25", 18.0, 25.0),
        ("26-35", 26.0, 35.0),
        ("36-45", 36.0, 45.0),
        ("46-55", 46.0, 55.0),
        ("56+", 56.0, f64::INFINITY),
    ];
    bands
        .iter()
        .map(|(name, lo, hi)| {
            let n = ages.iter().filter(|a| **a >= *lo && **a <= *hi).count() as u32;
            (name.to_string(), n)
        })
        .collect()
}

fn group_demographics<R: Respondent>(key: &str, label: &str, respondents: &[&R]) -> GroupDemographics {
    let ages = numeric_values(respondents.iter().copied(), "age");
    GroupDemographics {
        key: key.to_string(),
        label: label.to_string(),
        n: respondents.len() as u32,
        age: stats::quartiles(&ages),
        age_ranges: age_ranges(&ages),
        gender_distribution: count_by(respondents.iter().filter_map(|r| r.text("gender"))),
        education_distribution: count_by(respondents.iter().filter_map(|r| r.text("education_level"))),
    }
}

/// Demographic profiles of students, active and in-training teachers
pub fn demographics(ds: &Dataset) -> DemographicsReport {
    let students: Vec<&StudentResponse> = ds.students.iter().collect();
    let active: Vec<&TeacherResponse> = ds.teachers_in(TeacherCategory::Active).collect();
    let training: Vec<&TeacherResponse> = ds.teachers_in(TeacherCategory::Training).collect();

    DemographicsReport {
        total: (students.len() + active.len() + training.len()) as u32,
        groups: vec![
            group_demographics("students", "Studenti", &students),
            group_demographics(TeacherCategory::Active.key(), TeacherCategory::Active.label(), &active),
            group_demographics(
                TeacherCategory::Training.key(),
                TeacherCategory::Training.label(),
                &training,
            ),
        ],
    }
}

fn usage_group<R: Respondent>(
    key: &str,
    label: &str,
    respondents: &[&R],
    work_field: &str,
    work_hours: &str,
) -> UsageGroup {
    let summary = usage(respondents, work_field, &[]);
    let positive = |field: &str| -> Vec<f64> {
        numeric_values(respondents.iter().copied(), field)
            .into_iter()
            .filter(|v| *v > 0.0)
            .collect()
    };
    let mut purposes = option_counts(respondents.iter().filter_map(|r| r.text("ai_purposes")), true);
    purposes.truncate(5);

    UsageGroup {
        key: key.to_string(),
        label: label.to_string(),
        n: respondents.len() as u32,
        uses_ai_daily_percentage: summary.uses_ai_daily_percentage,
        uses_ai_work_percentage: summary.uses_ai_work_percentage,
        hours_daily: stats::mean_with_ci(&positive("hours_daily"), DEFAULT_CONFIDENCE),
        hours_work: stats::mean_with_ci(&positive(work_hours), DEFAULT_CONFIDENCE),
        top_purposes: purposes,
    }
}

/// Usage rates, hours with intervals and top purposes per group
pub fn usage_analysis(ds: &Dataset) -> UsageAnalysis {
    let students: Vec<&StudentResponse> = ds.students.iter().collect();
    let active: Vec<&TeacherResponse> = ds.teachers_in(TeacherCategory::Active).collect();
    let training: Vec<&TeacherResponse> = ds.teachers_in(TeacherCategory::Training).collect();

    UsageAnalysis {
        groups: vec![
            usage_group("students", "Studenti", &students, "uses_ai_study", "hours_study"),
            usage_group(
                TeacherCategory::Active.key(),
                TeacherCategory::Active.label(),
                &active,
                "uses_ai_teaching",
                "hours_training",
            ),
            usage_group(
                TeacherCategory::Training.key(),
                TeacherCategory::Training.label(),
                &training,
                "uses_ai_teaching",
                "hours_training",
            ),
        ],
    }
}

fn student_summary_row(s: &StudentResponse) -> Option<RespondentSummary> {
    Some(RespondentSummary {
        code: s.code.clone()?,
        respondent_type: RespondentType::Student,
        category: "student".to_string(),
        age: s.age.map(|a| a as u32),
        gender: s.gender.clone(),
    })
}

fn teacher_summary_row(t: &TeacherResponse) -> Option<RespondentSummary> {
    Some(RespondentSummary {
        code: t.code.clone()?,
        respondent_type: RespondentType::Teacher,
        category: if t.is_active() {
            "teacher_active".to_string()
        } else {
            "teacher_training".to_string()
        },
        age: t.age.map(|a| a as u32),
        gender: t.gender.clone(),
    })
}

/// Respondent codes, optionally restricted to `student`, `teacher`,
/// `teacher_active` or `teacher_training`
pub fn respondents(ds: &Dataset, filter: Option<&str>) -> Result<RespondentList> {
    let mut rows: Vec<RespondentSummary> = match filter {
        None => ds
            .students
            .iter()
            .filter_map(student_summary_row)
            .chain(ds.teachers.iter().filter_map(teacher_summary_row))
            .collect(),
        Some("student") => ds.students.iter().filter_map(student_summary_row).collect(),
        Some("teacher") => ds.teachers.iter().filter_map(teacher_summary_row).collect(),
        Some(category @ ("teacher_active" | "teacher_training")) => ds
            .teachers
            .iter()
            .filter_map(teacher_summary_row)
            .filter(|r| r.category == category)
            .collect(),
        Some(other) => {
            return Err(DashboardError::BadRequest(format!(
                "respondent_type non valido: '{}'",
                other
            )));
        }
    };
    rows.sort_by(|a, b| a.code.cmp(&b.code));

    Ok(RespondentList {
        total: rows.len() as u32,
        respondents: rows,
    })
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

fn answers<R: Respondent>(respondent: &R, respondent_type: RespondentType) -> Vec<Answer> {
    questions::all()
        .iter()
        .filter(|q| q.respondent_type == respondent_type)
        .filter_map(|q| {
            let field = q.field_name.as_deref()?;
            let value = respondent
                .text(field)
                .map(str::to_string)
                .or_else(|| respondent.numeric(field).map(format_value))?;
            Some(Answer {
                column_index: q.column_index,
                question_text: q.question_text.clone(),
                value,
            })
        })
        .collect()
}

/// Every recorded answer of one respondent, looked up by code
pub fn respondent(ds: &Dataset, code: &str) -> Result<RespondentDetail> {
    if let Some(s) = ds.find_student(code) {
        if let Some(summary) = student_summary_row(s) {
            return Ok(RespondentDetail {
                respondent: summary,
                answers: answers(s, RespondentType::Student),
            });
        }
    }
    if let Some(t) = ds.find_teacher(code) {
        if let Some(summary) = teacher_summary_row(t) {
            return Ok(RespondentDetail {
                respondent: summary,
                answers: answers(t, RespondentType::Teacher),
            });
        }
    }
    Err(DashboardError::NotFound(format!(
        "Rispondente '{}' non trovato",
        code
    )))
}
