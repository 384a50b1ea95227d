use std::path::Path;
use survey_dashboard::DashboardError;
use survey_dashboard::analytics;
use survey_dashboard::dataset::{Dataset, Respondent};
use survey_dashboard::importer::{import_dir, read_students, read_teachers};
use survey_dashboard::model::{QuestionStatsResponse, RespondentType, TeacherCategory};
use survey_dashboard::snapshot::{load_dataset, save_dataset};
use tempfile::tempdir;

fn header(columns: usize) -> String {
    (0..columns).map(|i| format!("Q{}", i)).collect::<Vec<_>>().join(",")
}

fn student_row(code: &str, likert: &str) -> String {
    let mut cells = vec![
        "2025/03/01 10:00:00".to_string(),
        code.to_string(),
        "17".to_string(),
        "Femmina".to_string(),
        "Liceo".to_string(),
        "Diploma".to_string(),
        "Scientifico".to_string(),
    ];
    cells.extend((0..8).map(|_| likert.to_string()));
    cells.extend(
        ["Sì", "\"3,5\"", "", "Sì", "2", "4", "1", "2", "\"ChatGPT, Gemini\"", "Riassunti", "Verifiche"]
            .iter()
            .map(|s| s.to_string()),
    );
    while cells.len() < 37 {
        cells.push(String::new());
    }
    cells.join(",")
}

fn sample_data() -> Dataset {
    import_dir(Path::new(env!("CARGO_MANIFEST_DIR")).join("data")).expect("bundled sample data imports")
}

#[test]
fn reads_student_columns_in_order() {
    let csv = format!("{}\n{}\n", header(37), student_row("S001", "5"));
    let students = read_students(csv.as_bytes(), "students.csv").expect("valid row");
    assert_eq!(students.len(), 1);

    let s = &students[0];
    assert_eq!(s.code.as_deref(), Some("S001"));
    assert_eq!(s.age, Some(17.0));
    assert_eq!(s.practical_competence, Some(5.0));
    assert_eq!(s.concern_ai_peers, Some(5.0));
    assert_eq!(s.hours_daily, Some(3.5), "decimal comma is accepted");
    assert_eq!(s.ai_tools.as_deref(), Some("ChatGPT, Gemini"));
    assert_eq!(s.numeric("uses_ai_daily_code"), Some(1.0));
    assert_eq!(s.numeric("gender_code"), Some(2.0));
}

#[test]
fn blank_rows_are_skipped_and_blank_cells_are_missing() {
    let blank = vec![""; 37].join(",");
    let csv = format!("{}\n{}\n{}\n", header(37), blank, student_row("S002", ""));
    let students = read_students(csv.as_bytes(), "students.csv").expect("valid rows");
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].training_adequacy, None);
}

#[test]
fn out_of_scale_likert_is_rejected() {
    let csv = format!("{}\n{}\n", header(37), student_row("S003", "9"));
    match read_students(csv.as_bytes(), "students.csv") {
        Err(DashboardError::InvalidRecord { file, reason, .. }) => {
            assert_eq!(file, "students.csv");
            assert!(reason.contains("practical_competence"), "reason: {}", reason);
        }
        other => panic!("expected InvalidRecord, got {:?}", other.map(|v| v.len())),
    }
}

#[test]
fn imports_bundled_sample_data() {
    let ds = sample_data();
    assert_eq!(ds.students.len(), 24);
    assert_eq!(ds.teachers.len(), 18);
    assert!(ds.imported_at.is_some());
    assert_eq!(ds.teachers_in(TeacherCategory::Active).count(), 12);
    assert_eq!(ds.teachers_in(TeacherCategory::Training).count(), 6);

    let teacher_csv = std::fs::read(Path::new(env!("CARGO_MANIFEST_DIR")).join("data/teachers.csv"))
        .expect("teacher export is bundled");
    let teachers = read_teachers(teacher_csv.as_slice(), "teachers.csv").expect("valid export");
    assert_eq!(teachers, ds.teachers);
}

#[test]
fn snapshot_round_trip() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("database").join("dataset.bin.gz");
    let ds = sample_data();

    save_dataset(&ds, &path).expect("snapshot written");
    assert!(path.exists());
    let restored = load_dataset(&path).expect("snapshot readable");
    assert_eq!(restored, ds);
}

#[test]
fn missing_export_is_an_io_error() {
    let dir = tempdir().expect("temp dir");
    assert!(matches!(import_dir(dir.path()), Err(DashboardError::Io(_))));
}

#[test]
fn summaries_over_sample_data_are_valid() {
    use survey_dashboard::model::Validate;

    let ds = sample_data();
    let students = analytics::student_summary(&ds);
    assert_eq!(students.total_responses, 24);
    students.validate().expect("student summary valid");

    let teachers = analytics::teacher_summary(&ds, TeacherCategory::Active);
    assert_eq!(teachers.total_responses, 12);
    teachers.validate().expect("teacher summary valid");

    let overview = analytics::overview(&ds);
    assert_eq!(overview.total_teachers, 18);

    let ci = analytics::comparison_with_ci(&ds, TeacherCategory::All);
    ci.validate().expect("intervals contain their means");

    let matrix = analytics::correlation_matrix(
        &ds,
        RespondentType::Student,
        Default::default(),
        TeacherCategory::Active,
    );
    matrix.validate().expect("matrix is square and symmetric");
}

#[test]
fn question_stats_by_format() {
    let ds = sample_data();

    match analytics::question_stats(&ds, RespondentType::Student, 7, None).expect("likert question") {
        QuestionStatsResponse::Scale { response_count, .. } => assert_eq!(response_count, 24),
        other => panic!("expected scale statistics, got {:?}", other.response_format()),
    }

    let text = analytics::question_stats(&ds, RespondentType::Student, 27, None).expect("text question");
    assert!(matches!(text, QuestionStatsResponse::Text { .. }));

    assert!(matches!(
        analytics::question_stats(&ds, RespondentType::Teacher, 99, None),
        Err(DashboardError::NotFound(_))
    ));
}

#[test]
fn respondent_lookup() {
    let ds = sample_data();
    let list = analytics::respondents(&ds, Some("student")).expect("valid filter");
    assert_eq!(list.total, 24);
    assert!(analytics::respondents(&ds, Some("parent")).is_err());

    let detail = analytics::respondent(&ds, "D002").expect("teacher exists");
    assert!(!detail.answers.is_empty());
    assert!(matches!(
        analytics::respondent(&ds, "X999"),
        Err(DashboardError::NotFound(_))
    ));
}
