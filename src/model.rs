//! Payloads exchanged between the statistics server and the dashboard.
//!
//! Every response type implements [`Validate`]. The client runs it right after
//! decoding so a malformed payload is rejected at the boundary instead of
//! degrading into zeros deeper in the renderers.

use crate::error::{DashboardError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Tolerance used when checking ordering and symmetry invariants
pub const EPSILON: f64 = 1e-6;

/// Post-deserialization invariant check
pub trait Validate {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<()> {
        self.iter().try_for_each(Validate::validate)
    }
}

fn ensure_finite(entity: &'static str, field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DashboardError::invalid(
            entity,
            format!("{} non è un numero finito ({})", field, value),
        ))
    }
}

// ---------------------------------------------------------------------------
// Shared enums
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RespondentType {
    Student,
    Teacher,
}

impl RespondentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RespondentType::Student => "student",
            RespondentType::Teacher => "teacher",
        }
    }
}

impl fmt::Display for RespondentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RespondentType {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "student" | "students" => Ok(RespondentType::Student),
            "teacher" | "teachers" => Ok(RespondentType::Teacher),
            other => Err(DashboardError::BadRequest(format!(
                "respondent_type deve essere 'student' o 'teacher', ricevuto '{}'",
                other
            ))),
        }
    }
}

/// Subset of teachers a statistic is computed over
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeacherCategory {
    /// Every teacher, active or in training
    All,
    /// Currently teaching
    #[default]
    Active,
    /// In initial training, not teaching yet
    Training,
}

impl TeacherCategory {
    pub fn key(&self) -> &'static str {
        match self {
            TeacherCategory::All => "teachers_all",
            TeacherCategory::Active => "teachers_active",
            TeacherCategory::Training => "teachers_training",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TeacherCategory::All => "Insegnanti Totali",
            TeacherCategory::Active => "Insegnanti Attivi",
            TeacherCategory::Training => "Insegnanti in Formazione",
        }
    }
}

/// Query flags accepted by the teacher-filtered endpoints
///
/// `only_non_teaching` wins over `include_non_teaching`; with neither set only
/// active teachers are considered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherFilter {
    #[serde(default)]
    pub include_non_teaching: bool,
    #[serde(default)]
    pub only_non_teaching: bool,
}

impl TeacherFilter {
    pub fn category(&self) -> TeacherCategory {
        if self.only_non_teaching {
            TeacherCategory::Training
        } else if self.include_non_teaching {
            TeacherCategory::All
        } else {
            TeacherCategory::Active
        }
    }

    pub fn for_category(category: TeacherCategory) -> Self {
        match category {
            TeacherCategory::All => TeacherFilter {
                include_non_teaching: true,
                only_non_teaching: false,
            },
            TeacherCategory::Active => TeacherFilter::default(),
            TeacherCategory::Training => TeacherFilter {
                include_non_teaching: false,
                only_non_teaching: true,
            },
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if self.include_non_teaching {
            pairs.push(("include_non_teaching", "true".to_string()));
        }
        if self.only_non_teaching {
            pairs.push(("only_non_teaching", "true".to_string()));
        }
        pairs
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    #[default]
    Pearson,
    Spearman,
}

impl CorrelationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationMethod::Pearson => "pearson",
            CorrelationMethod::Spearman => "spearman",
        }
    }
}

impl FromStr for CorrelationMethod {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pearson" => Ok(CorrelationMethod::Pearson),
            "spearman" => Ok(CorrelationMethod::Spearman),
            other => Err(DashboardError::BadRequest(format!(
                "method deve essere 'pearson' o 'spearman', ricevuto '{}'",
                other
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Confidence-interval comparisons
// ---------------------------------------------------------------------------

/// Descriptive statistics of one group with a confidence interval on the mean
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupStat {
    pub mean: f64,
    pub sd: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub se: Option<f64>,
    pub n: u32,
    pub ci_lower: f64,
    pub ci_upper: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_level: Option<f64>,
}

impl GroupStat {
    /// Statistic of a group without any observation
    pub fn empty(confidence_level: f64) -> Self {
        GroupStat {
            mean: 0.0,
            sd: 0.0,
            se: Some(0.0),
            n: 0,
            ci_lower: 0.0,
            ci_upper: 0.0,
            median: Some(0.0),
            confidence_level: Some(confidence_level),
        }
    }
}

impl Validate for GroupStat {
    fn validate(&self) -> Result<()> {
        const ENTITY: &str = "GroupStat";
        ensure_finite(ENTITY, "mean", self.mean)?;
        ensure_finite(ENTITY, "sd", self.sd)?;
        ensure_finite(ENTITY, "ci_lower", self.ci_lower)?;
        ensure_finite(ENTITY, "ci_upper", self.ci_upper)?;
        if self.sd < 0.0 {
            return Err(DashboardError::invalid(ENTITY, "sd negativa"));
        }
        if self.ci_lower > self.mean + EPSILON || self.mean > self.ci_upper + EPSILON {
            return Err(DashboardError::invalid(
                ENTITY,
                format!(
                    "intervallo [{}, {}] non contiene la media {}",
                    self.ci_lower, self.ci_upper, self.mean
                ),
            ));
        }
        Ok(())
    }
}

/// Students vs teachers on one variable
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    pub label: String,
    pub students: GroupStat,
    pub teachers: GroupStat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difference: Option<f64>,
}

impl Validate for ComparisonSummary {
    fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(DashboardError::invalid("ComparisonSummary", "label vuota"));
        }
        self.students.validate()?;
        self.teachers.validate()
    }
}

/// Envelope of `/api/statistics/comparison-with-ci`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparisonWithCi {
    pub comparisons: Vec<ComparisonSummary>,
    #[serde(default)]
    pub note: String,
}

impl Validate for ComparisonWithCi {
    fn validate(&self) -> Result<()> {
        self.comparisons.validate()
    }
}

// ---------------------------------------------------------------------------
// Correlation matrix
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationStrength {
    #[serde(rename = "very strong")]
    VeryStrong,
    #[serde(rename = "strong")]
    Strong,
    #[serde(rename = "moderate")]
    Moderate,
    #[serde(rename = "weak")]
    Weak,
}

impl CorrelationStrength {
    /// Cohen (1988) thresholds on |r|
    pub fn from_r(r: f64) -> Self {
        let magnitude = r.abs();
        if magnitude >= 0.7 {
            CorrelationStrength::VeryStrong
        } else if magnitude >= 0.5 {
            CorrelationStrength::Strong
        } else if magnitude >= 0.3 {
            CorrelationStrength::Moderate
        } else {
            CorrelationStrength::Weak
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationDirection {
    Positive,
    Negative,
}

impl CorrelationDirection {
    pub fn from_r(r: f64) -> Self {
        if r > 0.0 {
            CorrelationDirection::Positive
        } else {
            CorrelationDirection::Negative
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignificantCorrelation {
    pub var1: String,
    pub var2: String,
    pub correlation: f64,
    pub p_value: f64,
    pub strength: CorrelationStrength,
    pub direction: CorrelationDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_observations: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrelationInterpretation {
    pub total_comparisons: u32,
    pub significant_count: u32,
    pub percentage_significant: f64,
    #[serde(default)]
    pub strongest_correlation: Option<SignificantCorrelation>,
}

/// Square correlation matrix with the matching p-values
///
/// Diagonal p-values may be absent (`null`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<CorrelationMethod>,
    pub variables: Vec<String>,
    pub correlation_matrix: Vec<Vec<f64>>,
    pub p_value_matrix: Vec<Vec<Option<f64>>>,
    #[serde(default)]
    pub significant_correlations: Vec<SignificantCorrelation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<CorrelationInterpretation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respondent_type: Option<RespondentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_total: Option<u32>,
}

impl CorrelationMatrix {
    pub fn dimension(&self) -> usize {
        self.variables.len()
    }

    pub fn r(&self, i: usize, j: usize) -> f64 {
        self.correlation_matrix[i][j]
    }

    /// p-value of a cell; the diagonal and missing cells yield `None`
    pub fn p(&self, i: usize, j: usize) -> Option<f64> {
        if i == j {
            return None;
        }
        self.p_value_matrix[i][j]
    }

    pub fn index_of(&self, variable: &str) -> Option<usize> {
        self.variables.iter().position(|v| v == variable)
    }
}

impl Validate for CorrelationMatrix {
    fn validate(&self) -> Result<()> {
        const ENTITY: &str = "CorrelationMatrix";
        let n = self.variables.len();

        let mut seen = HashSet::with_capacity(n);
        for name in &self.variables {
            if !seen.insert(name.as_str()) {
                return Err(DashboardError::invalid(
                    ENTITY,
                    format!("variabile duplicata '{}'", name),
                ));
            }
        }

        if self.correlation_matrix.len() != n || self.correlation_matrix.iter().any(|row| row.len() != n)
        {
            return Err(DashboardError::invalid(
                ENTITY,
                format!("correlation_matrix non è {}x{}", n, n),
            ));
        }
        if self.p_value_matrix.len() != n || self.p_value_matrix.iter().any(|row| row.len() != n) {
            return Err(DashboardError::invalid(
                ENTITY,
                format!("p_value_matrix non è {}x{}", n, n),
            ));
        }

        for i in 0..n {
            for j in 0..n {
                let r = self.correlation_matrix[i][j];
                if !r.is_finite() || !(-1.0 - EPSILON..=1.0 + EPSILON).contains(&r) {
                    return Err(DashboardError::invalid(
                        ENTITY,
                        format!("r[{}][{}] = {} fuori da [-1, 1]", i, j, r),
                    ));
                }
                if i == j {
                    if (r - 1.0).abs() > EPSILON {
                        return Err(DashboardError::invalid(
                            ENTITY,
                            format!("diagonale r[{}][{}] = {} diversa da 1", i, i, r),
                        ));
                    }
                    if let Some(p) = self.p_value_matrix[i][j] {
                        if p.abs() > EPSILON {
                            return Err(DashboardError::invalid(
                                ENTITY,
                                format!("diagonale p[{}][{}] = {} diversa da 0", i, i, p),
                            ));
                        }
                    }
                    continue;
                }
                if (r - self.correlation_matrix[j][i]).abs() > EPSILON {
                    return Err(DashboardError::invalid(
                        ENTITY,
                        format!("matrice non simmetrica in ({}, {})", i, j),
                    ));
                }
                match (self.p_value_matrix[i][j], self.p_value_matrix[j][i]) {
                    (Some(p), Some(q)) => {
                        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                            return Err(DashboardError::invalid(
                                ENTITY,
                                format!("p[{}][{}] = {} fuori da [0, 1]", i, j, p),
                            ));
                        }
                        if (p - q).abs() > EPSILON {
                            return Err(DashboardError::invalid(
                                ENTITY,
                                format!("p-value non simmetrici in ({}, {})", i, j),
                            ));
                        }
                    }
                    _ => {
                        return Err(DashboardError::invalid(
                            ENTITY,
                            format!("p-value mancante in ({}, {})", i, j),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Quartiles
// ---------------------------------------------------------------------------

/// Five-number summary plus mean and outliers, ready for a box plot
///
/// `min` and `max` are the whisker ends, so they exclude outliers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuartileStats {
    pub min: f64,
    pub q1: f64,
    #[serde(alias = "median")]
    pub q2: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
    #[serde(default)]
    pub outliers: Vec<f64>,
}

impl QuartileStats {
    /// Every value the plot has to fit inside its domain
    pub fn extent_values(&self) -> impl Iterator<Item = f64> + '_ {
        [self.min, self.q1, self.q2, self.q3, self.max, self.mean]
            .into_iter()
            .chain(self.outliers.iter().copied())
    }
}

impl Validate for QuartileStats {
    fn validate(&self) -> Result<()> {
        const ENTITY: &str = "QuartileStats";
        for (name, value) in [
            ("min", self.min),
            ("q1", self.q1),
            ("q2", self.q2),
            ("q3", self.q3),
            ("max", self.max),
            ("mean", self.mean),
        ] {
            ensure_finite(ENTITY, name, value)?;
        }
        if self.outliers.iter().any(|o| !o.is_finite()) {
            return Err(DashboardError::invalid(ENTITY, "outlier non finito"));
        }
        let ordered = self.min <= self.q1 + EPSILON
            && self.q1 <= self.q2 + EPSILON
            && self.q2 <= self.q3 + EPSILON
            && self.q3 <= self.max + EPSILON;
        if !ordered {
            return Err(DashboardError::invalid(
                ENTITY,
                format!(
                    "ordine violato: min {} q1 {} q2 {} q3 {} max {}",
                    self.min, self.q1, self.q2, self.q3, self.max
                ),
            ));
        }
        Ok(())
    }
}

/// Quartiles of one named group, as drawn side by side in a box plot
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabeledQuartiles {
    pub key: String,
    pub label: String,
    pub n: u32,
    pub stats: QuartileStats,
}

impl Validate for LabeledQuartiles {
    fn validate(&self) -> Result<()> {
        self.stats.validate()
    }
}

// ---------------------------------------------------------------------------
// Question statistics
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    #[serde(rename = "scale_1_7")]
    Scale1To7,
    YesNo,
    SingleChoice,
    MultipleChoice,
    Numeric,
    Text,
}

/// Chart a question is best displayed with
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    BoxPlot,
    Pie,
    Bar,
    Histogram,
    None,
}

impl ResponseFormat {
    pub fn chart_kind(&self) -> ChartKind {
        match self {
            ResponseFormat::Scale1To7 => ChartKind::BoxPlot,
            ResponseFormat::YesNo => ChartKind::Pie,
            ResponseFormat::SingleChoice | ResponseFormat::MultipleChoice => ChartKind::Bar,
            ResponseFormat::Numeric => ChartKind::Histogram,
            ResponseFormat::Text => ChartKind::None,
        }
    }

    pub fn is_closed(&self) -> bool {
        !matches!(self, ResponseFormat::Text)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestionInfo {
    pub column_index: u32,
    pub respondent_type: RespondentType,
    pub question_text: String,
    pub category: String,
    pub response_format: ResponseFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaleStatistics {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub mode: Option<f64>,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NumericStatistics {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistributionBucket {
    pub value: u8,
    pub count: u32,
    pub percentage: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionCount {
    pub option: String,
    pub count: u32,
}

/// Statistics of one survey question
///
/// The `response_format` tag decides which statistics are present.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "response_format")]
pub enum QuestionStatsResponse {
    #[serde(rename = "scale_1_7")]
    Scale {
        question: QuestionInfo,
        response_count: u32,
        statistics: ScaleStatistics,
        boxplot: QuartileStats,
        distribution: Vec<DistributionBucket>,
    },
    #[serde(rename = "yes_no")]
    YesNo {
        question: QuestionInfo,
        response_count: u32,
        yes: u32,
        no: u32,
        yes_percentage: f64,
    },
    #[serde(rename = "single_choice")]
    SingleChoice {
        question: QuestionInfo,
        response_count: u32,
        options: Vec<OptionCount>,
    },
    #[serde(rename = "multiple_choice")]
    MultipleChoice {
        question: QuestionInfo,
        response_count: u32,
        options: Vec<OptionCount>,
    },
    #[serde(rename = "numeric")]
    Numeric {
        question: QuestionInfo,
        response_count: u32,
        statistics: NumericStatistics,
        boxplot: QuartileStats,
        histogram: Vec<HistogramBin>,
    },
    #[serde(rename = "text")]
    Text {
        question: QuestionInfo,
        response_count: u32,
        message: String,
    },
}

impl QuestionStatsResponse {
    pub fn question(&self) -> &QuestionInfo {
        match self {
            QuestionStatsResponse::Scale { question, .. }
            | QuestionStatsResponse::YesNo { question, .. }
            | QuestionStatsResponse::SingleChoice { question, .. }
            | QuestionStatsResponse::MultipleChoice { question, .. }
            | QuestionStatsResponse::Numeric { question, .. }
            | QuestionStatsResponse::Text { question, .. } => question,
        }
    }

    pub fn response_count(&self) -> u32 {
        match self {
            QuestionStatsResponse::Scale { response_count, .. }
            | QuestionStatsResponse::YesNo { response_count, .. }
            | QuestionStatsResponse::SingleChoice { response_count, .. }
            | QuestionStatsResponse::MultipleChoice { response_count, .. }
            | QuestionStatsResponse::Numeric { response_count, .. }
            | QuestionStatsResponse::Text { response_count, .. } => *response_count,
        }
    }

    pub fn response_format(&self) -> ResponseFormat {
        match self {
            QuestionStatsResponse::Scale { .. } => ResponseFormat::Scale1To7,
            QuestionStatsResponse::YesNo { .. } => ResponseFormat::YesNo,
            QuestionStatsResponse::SingleChoice { .. } => ResponseFormat::SingleChoice,
            QuestionStatsResponse::MultipleChoice { .. } => ResponseFormat::MultipleChoice,
            QuestionStatsResponse::Numeric { .. } => ResponseFormat::Numeric,
            QuestionStatsResponse::Text { .. } => ResponseFormat::Text,
        }
    }

    pub fn chart_kind(&self) -> ChartKind {
        self.response_format().chart_kind()
    }
}

impl Validate for QuestionStatsResponse {
    fn validate(&self) -> Result<()> {
        const ENTITY: &str = "QuestionStatsResponse";
        if self.question().response_format != self.response_format() {
            return Err(DashboardError::invalid(
                ENTITY,
                "response_format della domanda diverso da quello delle statistiche",
            ));
        }
        match self {
            QuestionStatsResponse::Scale {
                boxplot,
                distribution,
                ..
            } => {
                boxplot.validate()?;
                if distribution.iter().any(|b| !(1..=7).contains(&b.value)) {
                    return Err(DashboardError::invalid(ENTITY, "valore fuori dalla scala 1-7"));
                }
                Ok(())
            }
            QuestionStatsResponse::YesNo {
                response_count,
                yes,
                no,
                ..
            } => {
                if yes + no != *response_count {
                    return Err(DashboardError::invalid(
                        ENTITY,
                        format!("sì ({}) + no ({}) != risposte ({})", yes, no, response_count),
                    ));
                }
                Ok(())
            }
            QuestionStatsResponse::Numeric { boxplot, .. } => boxplot.validate(),
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestionCatalogStatistics {
    pub total_questions: u32,
    pub open_questions: u32,
    pub closed_questions: u32,
    pub student_questions: u32,
    pub teacher_questions: u32,
    pub categories: BTreeMap<String, u32>,
}

/// Envelope of `/api/questions`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestionCatalog {
    pub questions: Vec<QuestionInfo>,
    pub statistics: QuestionCatalogStatistics,
}

impl Validate for QuestionCatalog {}

/// One Likert question with the box plot of every respondent group
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LikertQuestion {
    pub question: QuestionInfo,
    pub groups: Vec<LabeledQuartiles>,
}

impl Validate for LikertQuestion {
    fn validate(&self) -> Result<()> {
        self.groups.validate()
    }
}

// ---------------------------------------------------------------------------
// Dashboard summaries
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub student_responses: u64,
    pub teacher_responses: u64,
}

impl HealthStatus {
    /// No respondent of either population has been imported yet
    pub fn is_empty(&self) -> bool {
        self.student_responses == 0 && self.teacher_responses == 0
    }
}

impl Validate for HealthStatus {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub status: String,
    pub students_imported: u32,
    pub teachers_imported: u32,
}

impl Validate for ImportSummary {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub students: u32,
    pub active_teachers: u32,
    pub training_teachers: u32,
    pub total_teachers: u32,
}

impl Validate for Overview {
    fn validate(&self) -> Result<()> {
        if self.active_teachers + self.training_teachers != self.total_teachers {
            return Err(DashboardError::invalid(
                "Overview",
                "attivi + in formazione diverso dal totale",
            ));
        }
        Ok(())
    }
}

/// Mean, median and 1–7 distribution of one Likert item
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LikertItem {
    pub field: String,
    pub label: String,
    pub n: u32,
    pub mean: f64,
    pub median: f64,
    /// Counts for the values 1 through 7
    pub distribution: [u32; 7],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LikertSection {
    pub key: String,
    pub title: String,
    pub items: Vec<LikertItem>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HoursAverage {
    pub field: String,
    pub label: String,
    pub average: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub uses_ai_daily_count: u32,
    pub uses_ai_daily_percentage: f64,
    /// Study for students, teaching for teachers
    pub uses_ai_work_count: u32,
    pub uses_ai_work_percentage: f64,
    pub hours: Vec<HoursAverage>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub age_avg: f64,
    pub age_min: u32,
    pub age_max: u32,
    pub gender_distribution: BTreeMap<String, u32>,
    pub school_distribution: BTreeMap<String, u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teaching_status_distribution: Option<BTreeMap<String, u32>>,
}

/// Aggregate statistics of one population (`/api/students`, `/api/teachers`)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub respondent_type: RespondentType,
    pub total_responses: u32,
    pub sections: Vec<LikertSection>,
    pub usage: UsageSummary,
    pub demographics: Demographics,
}

impl GroupSummary {
    pub fn item(&self, field: &str) -> Option<&LikertItem> {
        self.sections
            .iter()
            .flat_map(|s| s.items.iter())
            .find(|item| item.field == field)
    }
}

impl Validate for GroupSummary {
    fn validate(&self) -> Result<()> {
        for item in self.sections.iter().flat_map(|s| s.items.iter()) {
            ensure_finite("GroupSummary", &item.field, item.mean)?;
            if item.n > 0 && !(1.0 - EPSILON..=7.0 + EPSILON).contains(&item.mean) {
                return Err(DashboardError::invalid(
                    "GroupSummary",
                    format!("media di {} fuori scala: {}", item.field, item.mean),
                ));
            }
            let counted: u32 = item.distribution.iter().sum();
            if counted > item.n {
                return Err(DashboardError::invalid(
                    "GroupSummary",
                    format!("distribuzione di {} supera n", item.field),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LikertComparison {
    pub field: String,
    pub question: String,
    pub category: String,
    pub students: LikertItem,
    pub teachers: LikertItem,
    /// Teachers' mean minus students' mean
    pub difference: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTotals {
    pub total_students: u32,
    pub total_teachers: u32,
}

/// Envelope of `/api/comparison`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub teacher_category: TeacherCategory,
    pub comparisons: Vec<LikertComparison>,
    pub summary: ComparisonTotals,
}

impl Validate for ComparisonReport {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCount {
    pub name: String,
    pub count: u32,
}

/// AI tools named by each population, most cited first
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolsSummary {
    pub student_tools: Vec<ToolCount>,
    pub teacher_tools: Vec<ToolCount>,
}

impl Validate for ToolsSummary {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupDemographics {
    pub key: String,
    pub label: String,
    pub n: u32,
    #[serde(default)]
    pub age: Option<QuartileStats>,
    /// Respondents per age band (18-25, 26-35, 36-45, 46-55, 56+)
    pub age_ranges: BTreeMap<String, u32>,
    pub gender_distribution: BTreeMap<String, u32>,
    pub education_distribution: BTreeMap<String, u32>,
}

/// Envelope of `/api/demographics`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DemographicsReport {
    pub groups: Vec<GroupDemographics>,
    pub total: u32,
}

impl Validate for DemographicsReport {
    fn validate(&self) -> Result<()> {
        for group in &self.groups {
            if let Some(age) = &group.age {
                age.validate()?;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageGroup {
    pub key: String,
    pub label: String,
    pub n: u32,
    pub uses_ai_daily_percentage: f64,
    pub uses_ai_work_percentage: f64,
    pub hours_daily: GroupStat,
    pub hours_work: GroupStat,
    pub top_purposes: Vec<ToolCount>,
}

/// Envelope of `/api/usage-analysis`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageAnalysis {
    pub groups: Vec<UsageGroup>,
}

impl Validate for UsageAnalysis {
    fn validate(&self) -> Result<()> {
        for group in &self.groups {
            group.hours_daily.validate()?;
            group.hours_work.validate()?;
        }
        Ok(())
    }
}

/// Envelope of `/api/correlations`: the significant pairs of both populations
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrelationHighlights {
    pub student: Vec<SignificantCorrelation>,
    pub teacher: Vec<SignificantCorrelation>,
}

impl Validate for CorrelationHighlights {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RespondentSummary {
    pub code: String,
    pub respondent_type: RespondentType,
    /// `student`, `teacher_active` or `teacher_training`
    pub category: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
}

impl Validate for RespondentSummary {}

/// Envelope of `/api/respondents/list`, sorted by code
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RespondentList {
    pub total: u32,
    pub respondents: Vec<RespondentSummary>,
}

impl Validate for RespondentList {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub column_index: u32,
    pub question_text: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RespondentDetail {
    pub respondent: RespondentSummary,
    pub answers: Vec<Answer>,
}

impl Validate for RespondentDetail {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HomepageContent {
    pub content: String,
    /// Unix timestamp in seconds
    pub last_modified: i64,
}

impl Validate for HomepageContent {}

/// Answer of a successful homepage update
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HomepageUpdate {
    pub success: bool,
    pub message: String,
    pub last_modified: i64,
}

impl Validate for HomepageUpdate {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: u64,
}

impl Validate for LoginResponse {}

/// Body of the JSON error responses
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// The four payloads the dashboard needs before its first render
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    pub students: GroupSummary,
    pub teachers: GroupSummary,
    pub comparison: ComparisonReport,
    pub tools: ToolsSummary,
}
