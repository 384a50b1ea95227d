use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

lazy_static! {
    /// Short Italian labels of the correlation variables
    static ref SHORT_LABELS: HashMap<&'static str, &'static str> = HashMap::from([
        ("practical_competence", "Comp. Pratica"),
        ("theoretical_competence", "Comp. Teorica"),
        ("ai_change_study", "AI Cambia Studio"),
        ("ai_change_teaching", "AI Cambia Insegn."),
        ("training_adequacy", "Formaz. Adeguata"),
        ("trust_integration", "Fiducia Integr."),
        ("concern_ai_school", "Preoccup. Scuola"),
        ("concern_ai_peers", "Preoccup. Pari"),
        ("concern_ai_education", "Preoccup. Educaz."),
        ("concern_ai_students", "Preoccup. Studenti"),
        ("age", "Età"),
        ("hours_daily", "Ore/Giorno"),
        ("hours_study", "Ore Studio"),
        ("hours_training", "Ore Formazione"),
        ("hours_lesson_planning", "Ore Pianif."),
        ("gender_code", "Genere"),
        ("uses_ai_daily_code", "Uso Quotid."),
        ("uses_ai_study_code", "Uso Studio"),
        ("uses_ai_teaching_code", "Uso Didattica"),
        ("school_type_code", "Tipo Scuola"),
        ("school_level_code", "Livello Scuola"),
        ("currently_teaching_code", "Insegna Ora"),
        ("subject_type_code", "Materia STEM"),
    ]);

    static ref LIKERT_NAME: Regex =
        Regex::new(r"competence|change|adequacy|trust|concern").expect("valid regex");
    static ref CODE_SUFFIX: Regex = Regex::new(r"_code$").expect("valid regex");
}

/// Heatmap label of a variable, the raw name when unknown
pub fn short_label(variable: &str) -> &str {
    SHORT_LABELS.get(variable).copied().unwrap_or(variable)
}

/// Kind of a correlation variable, used by the grouped heatmap
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Likert,
    Numeric,
    Categorical,
}

impl VariableKind {
    /// Display order of the grouped heatmap
    pub const ORDER: [VariableKind; 3] = [
        VariableKind::Likert,
        VariableKind::Numeric,
        VariableKind::Categorical,
    ];

    /// Likert keywords win over the `_code` suffix
    pub fn classify(variable: &str) -> Self {
        if LIKERT_NAME.is_match(variable) {
            VariableKind::Likert
        } else if CODE_SUFFIX.is_match(variable) {
            VariableKind::Categorical
        } else {
            VariableKind::Numeric
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            VariableKind::Likert => "Variabili Likert (1-7)",
            VariableKind::Numeric => "Variabili Numeriche Continue",
            VariableKind::Categorical => "Variabili Categoriche Codificate",
        }
    }
}
