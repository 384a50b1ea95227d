//! Static catalogue of both questionnaires.
//!
//! Column indices match the CSV exports, so the importer, the per-question
//! statistics and the respondent detail view all agree on what column `n`
//! means.

use crate::model::{QuestionCatalog, QuestionCatalogStatistics, QuestionInfo, RespondentType, ResponseFormat};
use lazy_static::lazy_static;
use std::collections::BTreeMap;

use ResponseFormat::{MultipleChoice, Numeric, Scale1To7, SingleChoice, Text, YesNo};

/// One question: column, text, answer format and the record field it fills
type QuestionDef = (u32, &'static str, ResponseFormat, Option<&'static str>);

const STUDENT_QUESTIONS: &[QuestionDef] = &[
    (2, "Quanti anni hai?", Numeric, Some("age")),
    (3, "Il tuo genere è", SingleChoice, Some("gender")),
    (4, "Che scuola frequenti", SingleChoice, Some("school_type")),
    (5, "Titolo di studio", SingleChoice, Some("education_level")),
    (6, "Il tuo percorso attuale di studio è di tipo", SingleChoice, Some("study_path")),
    (7, "Su una scala da 1 a 7, quanto ti consideri competente nell'uso pratico di strumenti o tecnologie legati all'intelligenza artificiale?", Scale1To7, Some("practical_competence")),
    (8, "Su una scala da 1 a 7, quanto ritieni adeguata la tua competenza teorica riguardo l'intelligenza artificiale?", Scale1To7, Some("theoretical_competence")),
    (9, "Da una scala da 1 a 7, quanto pensi che l'intelligenza artificiale cambierà il tuo modo di studiare?", Scale1To7, Some("ai_change_study")),
    (10, "Su una scala da 1 a 7, quanto ritieni adeguata la formazione ricevuta in merito all'intelligenza artificiale?", Scale1To7, Some("training_adequacy")),
    (11, "Da una scala da 1 a 7, quanto sei fiducioso nell'integrazione dell'intelligenza artificiale nella scuola o università?", Scale1To7, Some("trust_integration")),
    (12, "Su una scala da 1 a 7, quanto ritieni che i tuoi attuali insegnanti siano preparati e competenti nell'insegnare l'uso dell'intelligenza artificiale?", Scale1To7, Some("teacher_preparation")),
    (13, "Da una scala da 1 a 7, ti preoccupa l'inserimento dell'intelligenza artificiale nella scuola o nell'università?", Scale1To7, Some("concern_ai_school")),
    (14, "Da una scala da 1 a 7, quanto sei preoccupato riguardo all'utilizzo dell'intelligenza artificiale da parte dei tuoi compagni di scuola o universitari?", Scale1To7, Some("concern_ai_peers")),
    (15, "Nella tua vita quotidiana utilizzi l'intelligenza artificiale?", YesNo, Some("uses_ai_daily")),
    (16, "Se sì, quante ore alla settimana, in media, utilizzi strumenti di intelligenza artificiale per le tue attività quotidiane?", Numeric, Some("hours_daily")),
    (17, "Se no, puoi spiegare perché non la utilizzi?", Text, None),
    (18, "Utilizzi l'intelligenza artificiale nello studio?", YesNo, Some("uses_ai_study")),
    (19, "Quante ore alla settimana mediamente utilizzi l'intelligenza artificiale per le tue attività quotidiane?", Numeric, Some("hours_daily")),
    (20, "Quante ore alla settimana mediamente utilizzi l'intelligenza artificiale per le attività riguardanti lo studio?", Numeric, Some("hours_study")),
    (21, "Quante ore alla settimana mediamente dedichi ad informarti sui nuovi strumenti di intelligenza artificiale per lo studio?", Numeric, Some("hours_learning_tools")),
    (22, "Sapresti quante ore ti fa risparmiare l'uso dell'intelligenza artificiale nel tuo studio in una settimana?", Numeric, Some("hours_saved")),
    (23, "Quali sono gli strumenti di intelligenza artificiale che utilizzi?", MultipleChoice, Some("ai_tools")),
    (24, "Per quali scopi usi l'intelligenza artificiale nei tuoi studi?", MultipleChoice, Some("ai_purposes")),
    (25, "Per quali tipi di attività NON deve essere utilizzata l'intelligenza artificiale per apprendere?", MultipleChoice, Some("not_use_for")),
    (26, "Quali strumenti di intelligenza artificiale utilizzi regolarmente nel tuo studio?", Text, None),
    (27, "Quali sono i tuoi strumenti preferiti e perché?", Text, None),
    (28, "In che modo utilizzi l'intelligenza artificiale per personalizzare il tuo studio?", Text, None),
    (29, "Puoi darci uno o più esempi di prompt che utilizzi?", Text, None),
    (30, "In che modo l'intelligenza artificiale ti aiuta a migliorare ad apprendere?", Text, None),
    (31, "Puoi fornire esempi specifici di come l'IA ha migliorato il tuo apprendimento?", Text, None),
    (32, "Quali difficoltà hai incontrato nell'implementazione di strumenti di IA nella tua pratica di studio?", Text, None),
    (33, "Puoi spiegare in maniera più dettagliata perché non utilizzi l'IA nello studio?", Text, None),
    (34, "In base alla tua esperienza, quali sono i pro e i contro dell'uso dell'intelligenza artificiale nello studio?", Text, None),
    (35, "Secondo la tua esperienza, quali pratiche che utilizzano l'intelligenza artificiale NON sono raccomandate o NON dovrebbero essere usate per lo studio?", Text, None),
    (36, "Secondo te come è possibile migliorare questo questionario? Ci sono delle cose che cambieresti? o che leveresti?", Text, None),
];

const TEACHER_QUESTIONS: &[QuestionDef] = &[
    (2, "Attualmente insegni o hai intenzione di intraprendere la professione docente?", SingleChoice, Some("currently_teaching")),
    (3, "Quanti anni hai?", Numeric, Some("age")),
    (4, "Il tuo genere è", SingleChoice, Some("gender")),
    (5, "Titolo di studio", SingleChoice, Some("education_level")),
    (6, "In quale ordine di scuola insegni? O vorresti insegnare?", SingleChoice, Some("school_level")),
    (7, "Insegna (o insegnerà) una materia", SingleChoice, Some("subject_type")),
    (8, "Qual è il tuo settore scientifico-disciplinare attuale?", SingleChoice, Some("subject_area")),
    (9, "Su una scala da 1 a 7, quanto ti consideri competente nell'uso pratico di strumenti o tecnologie legati all'intelligenza artificiale?", Scale1To7, Some("practical_competence")),
    (10, "Su una scala da 1 a 7, quanto ritieni adeguata la tua competenza teorica riguardo l'intelligenza artificiale?", Scale1To7, Some("theoretical_competence")),
    (11, "Da una scala da 1 a 7 quanto pensi che l'intelligenza artificiale cambierà la didattica?", Scale1To7, Some("ai_change_teaching")),
    (12, "Da una scala da 1 a 7, quanto pensi che l'intelligenza artificiale cambierà la tua didattica?", Scale1To7, Some("ai_change_my_teaching")),
    (13, "Su una scala da 1 a 7, quanto ritieni adeguata la formazione ricevuta in merito all'intelligenza artificiale?", Scale1To7, Some("training_adequacy")),
    (14, "Da una scala da 1 a 7, quanto sei fiducioso nell'integrazione dell'intelligenza artificiale nella pratica educativa?", Scale1To7, Some("trust_integration")),
    (15, "Da una scala da 1 a 7, quanto sei fiducioso nell'utilizzo da parte degli studenti di un uso responsabile e maturo dell'intelligenza artificiale?", Scale1To7, Some("trust_students_responsible")),
    (16, "Da una scala da 1 a 7, quanto sei preoccupato riguardo all'utilizzo dell'intelligenza artificiale nel mondo dell'educazione?", Scale1To7, Some("concern_ai_education")),
    (17, "Da una scala da 1 a 7, quanto sei preoccupato riguardo all'utilizzo dell'intelligenza artificiale da parte degli studenti?", Scale1To7, Some("concern_ai_students")),
    (18, "Per quali tipi di attività NON deve essere utilizzata l'intelligenza artificiale nell'insegnamento?", MultipleChoice, Some("not_use_for")),
    (19, "Nella tua vita quotidiana utilizzi l'intelligenza artificiale?", YesNo, Some("uses_ai_daily")),
    (20, "Se sì, quante ore alla settimana, in media, utilizzi strumenti di intelligenza artificiale per le tue attività quotidiane?", Numeric, Some("hours_daily")),
    (21, "Se no, puoi spiegare perché non la utilizzi?", Text, None),
    (22, "Utilizzi l'intelligenza artificiale nella didattica?", YesNo, Some("uses_ai_teaching")),
    (23, "Quante ore alla settimana mediamente dedichi alla formazione e all'aggiornamento sulle tecnologie di intelligenza artificiale per l'insegnamento?", Numeric, Some("hours_training")),
    (24, "Quante ore alla settimana dedichi mediamente per integrare strumenti di intelligenza artificiale nei tuoi piani di lezione settimanali?", Numeric, Some("hours_lesson_planning")),
    (25, "Quali sono gli strumenti di intelligenza artificiale che utilizzi?", MultipleChoice, Some("ai_tools")),
    (26, "Per quali tipi di attività usi l'intelligenza artificiale?", MultipleChoice, Some("ai_purposes")),
    (27, "Quali sono i tuoi strumenti preferiti e perché?", Text, None),
    (28, "In che modo utilizzi l'intelligenza artificiale per individualizzare l'insegnamento?", Text, None),
    (29, "In che modo utilizzi l'intelligenza artificiale per personalizzare l'insegnamento?", Text, None),
    (30, "Puoi darci uno o più esempi di prompt che utilizzi?", Text, None),
    (31, "Puoi fornire esempi specifici di come l'IA ha migliorato l'apprendimento dei tuoi studenti?", Text, None),
    (32, "In che modo l'intelligenza artificiale ti aiuta a migliorare l'apprendimento dei tuoi studenti?", Text, None),
    (33, "Quali difficoltà hai incontrato nell'implementazione di strumenti di IA nella tua didattica?", Text, None),
    (34, "Puoi spiegare in maniera più dettagliata perché non utilizzi l'IA nella didattica?", Text, None),
    (35, "In base alla tua esperienza, quali sono i pro e i contro dell'uso dell'intelligenza artificiale nell'educazione?", Text, None),
    (36, "Secondo la tua esperienza, quali pratiche che utilizzano l'intelligenza artificiale NON sono raccomandate o NON dovrebbero essere usate nell'insegnamento?", Text, None),
    (37, "Secondo te come è possibile migliorare questo questionario?", Text, None),
];

/// Number of columns in the student export (timestamp and code included)
pub const STUDENT_COLUMNS: usize = 37;

/// Number of columns in the teacher export (timestamp and code included)
pub const TEACHER_COLUMNS: usize = 38;

lazy_static! {
    static ref CATALOGUE: Vec<QuestionInfo> = STUDENT_QUESTIONS
        .iter()
        .map(|def| build(RespondentType::Student, def))
        .chain(
            TEACHER_QUESTIONS
                .iter()
                .map(|def| build(RespondentType::Teacher, def)),
        )
        .collect();
}

fn build(respondent_type: RespondentType, def: &QuestionDef) -> QuestionInfo {
    let (column_index, text, response_format, field) = *def;
    QuestionInfo {
        column_index,
        respondent_type,
        question_text: text.to_string(),
        category: categorize(text, column_index).to_string(),
        response_format,
        field_name: field.map(str::to_string),
    }
}

/// Thematic category of a question, from keywords in its text
pub fn categorize(text: &str, column_index: u32) -> &'static str {
    let lower = text.to_lowercase();
    let has_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if column_index <= 8
        && has_any(&[
            "età", "genere", "scuola", "titolo", "studio", "percorso", "ordine", "materia",
            "settore", "anni hai", "attualmente insegni", "professione docente",
        ])
    {
        "demographic"
    } else if has_any(&["competent", "competenza", "pratico", "teorico"]) {
        "competence"
    } else if has_any(&["fiducioso", "fiducia"]) {
        "trust"
    } else if has_any(&["preoccupa"]) {
        "concern"
    } else if has_any(&["formazione", "adeguata"]) {
        "training"
    } else if has_any(&["utilizzi", "ore", "settimana", "quotidian"]) {
        "usage"
    } else if has_any(&["strumenti", "quali sono", "preferiti", "tool"]) {
        "tools"
    } else if has_any(&["prompt", "personaliz", "individualiz"]) {
        "personalization"
    } else if has_any(&["cambierà", "miglior"]) {
        "impact"
    } else if has_any(&["difficoltà", "pro e contro", "non sono raccomandate"]) {
        "challenges"
    } else if has_any(&["secondo te", "esperienza", "esempi specifici"]) {
        "open_reflection"
    } else {
        "other"
    }
}

/// Every question of both questionnaires, students first
pub fn all() -> &'static [QuestionInfo] {
    &CATALOGUE
}

pub fn find(respondent_type: RespondentType, column_index: u32) -> Option<&'static QuestionInfo> {
    CATALOGUE
        .iter()
        .find(|q| q.respondent_type == respondent_type && q.column_index == column_index)
}

/// Question that fills a given record field, first match by column order
pub fn for_field(respondent_type: RespondentType, field: &str) -> Option<&'static QuestionInfo> {
    CATALOGUE.iter().find(|q| {
        q.respondent_type == respondent_type && q.field_name.as_deref() == Some(field)
    })
}

/// Catalogue filtered by respondent type and format, with aggregate counts
pub fn catalogue(
    respondent_type: Option<RespondentType>,
    response_format: Option<ResponseFormat>,
) -> QuestionCatalog {
    let questions: Vec<QuestionInfo> = CATALOGUE
        .iter()
        .filter(|q| respondent_type.is_none_or(|rt| q.respondent_type == rt))
        .filter(|q| response_format.is_none_or(|rf| q.response_format == rf))
        .cloned()
        .collect();

    let mut categories = BTreeMap::new();
    for q in &questions {
        *categories.entry(q.category.clone()).or_insert(0) += 1;
    }
    let open_questions = questions.iter().filter(|q| !q.response_format.is_closed()).count() as u32;
    let student_questions = questions
        .iter()
        .filter(|q| q.respondent_type == RespondentType::Student)
        .count() as u32;

    let statistics = QuestionCatalogStatistics {
        total_questions: questions.len() as u32,
        open_questions,
        closed_questions: questions.len() as u32 - open_questions,
        student_questions,
        teacher_questions: questions.len() as u32 - student_questions,
        categories,
    };
    QuestionCatalog {
        questions,
        statistics,
    }
}

/// Likert sections shown on the population summaries: (key, title, fields)
pub const STUDENT_SECTIONS: &[(&str, &str, &[&str])] = &[
    ("competenze", "Competenze", &["practical_competence", "theoretical_competence"]),
    (
        "impatto_fiducia",
        "Impatto e fiducia",
        &["ai_change_study", "training_adequacy", "trust_integration", "teacher_preparation"],
    ),
    ("preoccupazioni", "Preoccupazioni", &["concern_ai_school", "concern_ai_peers"]),
];

pub const TEACHER_SECTIONS: &[(&str, &str, &[&str])] = &[
    ("competenze", "Competenze", &["practical_competence", "theoretical_competence"]),
    (
        "impatto",
        "Impatto",
        &["ai_change_teaching", "ai_change_my_teaching", "training_adequacy"],
    ),
    ("fiducia", "Fiducia", &["trust_integration", "trust_students_responsible"]),
    ("preoccupazioni", "Preoccupazioni", &["concern_ai_education", "concern_ai_students"]),
];

/// Questions asked to both populations: (field, label, category)
pub const MIRRORED: &[(&str, &str, &str)] = &[
    ("practical_competence", "Competenza pratica AI", "competenze"),
    ("theoretical_competence", "Competenza teorica AI", "competenze"),
    ("trust_integration", "Fiducia integrazione AI", "fiducia"),
    ("training_adequacy", "Adeguatezza formazione AI", "formazione"),
];

/// Human readable label of a record field
pub fn field_label(field: &str) -> &str {
    match field {
        "age" => "Età",
        "practical_competence" => "Competenza pratica AI",
        "theoretical_competence" => "Competenza teorica AI",
        "ai_change_study" => "Cambiamento nello studio",
        "ai_change_teaching" => "Cambiamento della didattica",
        "ai_change_my_teaching" => "Cambiamento della mia didattica",
        "training_adequacy" => "Adeguatezza formazione",
        "trust_integration" => "Fiducia integrazione AI",
        "trust_students_responsible" => "Fiducia uso responsabile studenti",
        "teacher_preparation" => "Preparazione insegnanti",
        "concern_ai_school" => "Preoccupazione AI a scuola",
        "concern_ai_peers" => "Preoccupazione uso compagni",
        "concern_ai_education" => "Preoccupazione AI nell'educazione",
        "concern_ai_students" => "Preoccupazione uso studenti",
        "hours_daily" => "Ore settimanali uso quotidiano",
        "hours_study" => "Ore settimanali per lo studio",
        "hours_learning_tools" => "Ore settimanali di aggiornamento",
        "hours_saved" => "Ore risparmiate a settimana",
        "hours_training" => "Ore settimanali di formazione",
        "hours_lesson_planning" => "Ore settimanali di progettazione",
        other => other,
    }
}
