use survey_dashboard::export::{comparison_csv, correlation_xlsx};
use survey_dashboard::model::{ComparisonSummary, ComparisonWithCi, CorrelationMethod, GroupStat};
use survey_dashboard::stats::{correlation_matrix, mean_with_ci};

fn summary(label: &str, students: &[f64], teachers: &[f64]) -> ComparisonSummary {
    let s: GroupStat = mean_with_ci(students, 0.95);
    let t: GroupStat = mean_with_ci(teachers, 0.95);
    ComparisonSummary {
        variable: Some(label.to_lowercase().replace(' ', "_")),
        label: label.to_string(),
        difference: Some(((t.mean - s.mean) * 100.0).round() / 100.0),
        students: s,
        teachers: t,
    }
}

#[test]
fn comparison_csv_has_header_and_one_row_per_variable() {
    let data = ComparisonWithCi {
        comparisons: vec![
            summary("Competenza pratica", &[4.0, 5.0, 6.0], &[3.0, 4.0]),
            summary("Fiducia, integrazione", &[2.0, 2.0], &[]),
        ],
        note: String::new(),
    };
    let csv = comparison_csv(&data).expect("csv export");
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("variable,label,students_mean"));
    assert!(lines[1].starts_with("competenza_pratica,Competenza pratica,5.0,"));
    assert!(lines[2].contains("\"Fiducia, integrazione\""), "labels with commas are quoted");
    assert!(lines[2].contains(",0,0.0,0.0,"), "empty teacher group exports zeros");
}

#[test]
fn correlation_workbook_is_a_zip_archive() {
    let columns = vec![
        ("practical_competence".to_string(), (1..=12).map(|v| Some(f64::from(v % 7 + 1))).collect()),
        ("age".to_string(), (1..=12).map(|v| Some(f64::from(15 + v))).collect()),
        ("hours_daily".to_string(), (1..=12).map(|v| Some(f64::from(v * 2))).collect()),
    ];
    let matrix = correlation_matrix(&columns, CorrelationMethod::Pearson);
    let bytes = correlation_xlsx(&matrix).expect("xlsx export");
    assert!(bytes.len() > 1000);
    assert_eq!(&bytes[..2], b"PK");
}
