use survey_dashboard::graph::boxplot::{self, BoxSeries, Domain, DomainMode, LIKERT_DOMAIN};
use survey_dashboard::graph::error_bars::{self, Orientation, error_extent};
use survey_dashboard::graph::heatmap::{self, CellDisplay, HeatmapFilter, cell_display, is_significant};
use survey_dashboard::graph::labels::VariableKind;
use survey_dashboard::graph::palette::{self, CorrelationBucket};
use survey_dashboard::graph::{ChartOptions, shorten};
use survey_dashboard::DashboardError;
use survey_dashboard::model::{
    ComparisonSummary, CorrelationMatrix, GroupStat, QuartileStats, TeacherCategory, Validate,
};

fn stat(mean: f64, ci_lower: f64, ci_upper: f64, n: u32) -> GroupStat {
    GroupStat {
        mean,
        sd: 1.0,
        se: None,
        n,
        ci_lower,
        ci_upper,
        median: None,
        confidence_level: Some(0.95),
    }
}

fn comparison(label: &str, students: GroupStat, teachers: GroupStat) -> ComparisonSummary {
    ComparisonSummary {
        variable: None,
        label: label.to_string(),
        students,
        teachers,
        difference: None,
    }
}

/// practical_competence, age, gender_code
fn sample_matrix() -> CorrelationMatrix {
    CorrelationMatrix {
        method: None,
        variables: vec![
            "practical_competence".to_string(),
            "age".to_string(),
            "gender_code".to_string(),
        ],
        correlation_matrix: vec![
            vec![1.0, 0.45, -0.05],
            vec![0.45, 1.0, -0.95],
            vec![-0.05, -0.95, 1.0],
        ],
        p_value_matrix: vec![
            vec![None, Some(0.049), Some(0.8)],
            vec![Some(0.049), None, Some(0.0005)],
            vec![Some(0.8), Some(0.0005), None],
        ],
        significant_correlations: Vec::new(),
        interpretation: None,
        respondent_type: None,
        n_total: None,
    }
}

fn likert_box(values: [f64; 5], mean: f64) -> QuartileStats {
    QuartileStats {
        min: values[0],
        q1: values[1],
        q2: values[2],
        q3: values[3],
        max: values[4],
        mean,
        outliers: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Error bars
// ---------------------------------------------------------------------------

#[test]
fn matrix_validation_rejects_broken_payloads() {
    sample_matrix().validate().expect("sample is valid");

    let mut asymmetric = sample_matrix();
    asymmetric.correlation_matrix[0][1] = 0.6;
    assert!(matches!(
        asymmetric.validate(),
        Err(DashboardError::InvalidPayload { entity: "CorrelationMatrix", .. })
    ));

    let mut diagonal = sample_matrix();
    diagonal.correlation_matrix[2][2] = 0.9;
    assert!(diagonal.validate().is_err());

    let mut ragged = sample_matrix();
    ragged.p_value_matrix.pop();
    assert!(ragged.validate().is_err());
}

#[test]
fn error_extent_of_valid_interval() {
    let extent = error_extent(&stat(4.2, 3.9, 4.6, 30)).expect("interval contains the mean").expect("n > 0");
    assert!((extent.below - 0.3).abs() < 1e-9);
    assert!((extent.above - 0.4).abs() < 1e-9);
}

#[test]
fn error_extent_rejects_interval_not_containing_mean() {
    assert!(error_extent(&stat(4.0, 4.5, 5.0, 12)).is_err());
    assert_eq!(error_extent(&stat(0.0, 0.0, 0.0, 0)), Ok(None));
}

#[test]
fn layout_keeps_bad_bars_but_warns() {
    let rows = vec![
        comparison("Competenza", stat(4.0, 3.5, 4.5, 20), stat(5.0, 4.2, 5.8, 15)),
        comparison("Fiducia", stat(3.0, 3.4, 3.9, 20), stat(0.0, 0.0, 0.0, 0)),
    ];
    let layout = error_bars::layout(&rows);
    assert_eq!(layout.orientation, Orientation::Vertical);
    assert_eq!(layout.bars.len(), 4);
    assert_eq!(layout.warnings.len(), 1, "only the student interval of Fiducia is invalid");
    assert!(layout.warnings[0].subject.contains("Fiducia"));

    let no_data = layout.bars.iter().find(|b| b.n == 0).expect("empty teacher group");
    assert!(no_data.no_data);
    assert_eq!(no_data.error, None);
}

#[test]
fn many_labels_switch_to_horizontal() {
    assert_eq!(Orientation::for_label_count(6), Orientation::Vertical);
    assert_eq!(Orientation::for_label_count(7), Orientation::Horizontal);
}

#[test]
fn error_bar_svg_is_produced() {
    let rows = vec![comparison("Competenza pratica", stat(4.0, 3.5, 4.5, 20), stat(5.0, 4.2, 5.8, 15))];
    let layout = error_bars::layout(&rows);
    let svg = error_bars::render_svg(&layout, TeacherCategory::Active, &ChartOptions::titled("Confronto"))
        .expect("render");
    assert!(svg.contains("<svg"));
    assert!(svg.contains("Studenti"));
}

// ---------------------------------------------------------------------------
// Heatmap
// ---------------------------------------------------------------------------

#[test]
fn correlation_buckets_use_inclusive_lower_bounds() {
    assert_eq!(CorrelationBucket::from_r(0.75).label(), "≥0.7");
    assert_eq!(CorrelationBucket::from_r(0.7), CorrelationBucket::StrongPositive);
    assert_eq!(CorrelationBucket::from_r(0.45).label(), "≥0.3");
    assert_eq!(CorrelationBucket::from_r(0.0), CorrelationBucket::Neutral);
    assert_eq!(CorrelationBucket::from_r(-0.95).label(), "<−0.7");
    assert_eq!(palette::hex(palette::text_color(-0.8)), "#ffffff");
    assert_eq!(palette::hex(palette::text_color(0.2)), "#000000");
}

#[test]
fn significance_is_strictly_below_alpha() {
    assert!(is_significant(0.049));
    assert!(!is_significant(0.05));
    assert_eq!(heatmap::significance_stars(0.0005), "***");
    assert_eq!(heatmap::significance_stars(0.005), "**");
    assert_eq!(heatmap::significance_stars(0.049), "*");
    assert_eq!(heatmap::significance_stars(0.2), "");
}

#[test]
fn filter_clamps_threshold() {
    assert_eq!(HeatmapFilter::new(0.9, false).min_correlation, 0.7);
    assert_eq!(HeatmapFilter::new(-0.2, false).min_correlation, 0.0);
    assert_eq!(HeatmapFilter::new(f64::NAN, true).min_correlation, 0.0);
}

#[test]
fn cells_follow_filters() {
    let m = sample_matrix();

    let plain = HeatmapFilter::default();
    assert_eq!(cell_display(&m, 0, 1, &plain).text(), "0.45*");
    assert_eq!(cell_display(&m, 1, 2, &plain).text(), "-0.95***");
    assert_eq!(
        cell_display(&m, 1, 2, &plain).bucket(),
        Some(CorrelationBucket::StrongNegative)
    );

    let threshold = HeatmapFilter::new(0.3, false);
    assert_eq!(cell_display(&m, 0, 2, &threshold), CellDisplay::BelowThreshold);
    assert_eq!(cell_display(&m, 0, 2, &threshold).text(), heatmap::BELOW_THRESHOLD);

    let significant = HeatmapFilter::new(0.0, true);
    assert_eq!(cell_display(&m, 2, 0, &significant), CellDisplay::NotSignificant);
    assert_eq!(cell_display(&m, 1, 0, &significant).text(), "0.45*");
}

#[test]
fn diagonal_is_never_filtered() {
    let m = sample_matrix();
    let strict = HeatmapFilter::new(0.7, true);
    for i in 0..3 {
        let cell = cell_display(&m, i, i, &strict);
        assert_eq!(cell.text(), "1.00");
        assert_eq!(cell.bucket(), Some(CorrelationBucket::StrongPositive));
    }
}

#[test]
fn missing_p_value_counts_as_not_significant() {
    let mut m = sample_matrix();
    m.p_value_matrix[0][1] = None;
    let cell = cell_display(&m, 0, 1, &HeatmapFilter::new(0.0, true));
    assert_eq!(cell, CellDisplay::NotSignificant);
    assert_eq!(cell_display(&m, 0, 1, &HeatmapFilter::default()).text(), "0.45");
}

#[test]
fn grouped_heatmap_splits_by_kind() {
    let m = sample_matrix();
    let groups = heatmap::build_grouped(&m, &HeatmapFilter::default());
    let kinds: Vec<VariableKind> = groups.iter().map(|g| g.kind).collect();
    assert_eq!(
        kinds,
        vec![VariableKind::Likert, VariableKind::Numeric, VariableKind::Categorical]
    );
    assert!(groups.iter().all(|g| g.grid.len() == 1));
    assert_eq!(groups[0].grid.labels, vec!["Comp. Pratica".to_string()]);

    let svg = heatmap::render_grouped_svg(&groups, &ChartOptions::titled("Gruppi")).expect("render");
    assert!(svg.contains("Variabili Likert (1-7)"));
}

#[test]
fn heatmap_svg_lists_labels() {
    let grid = heatmap::build_grid(&sample_matrix(), &HeatmapFilter::default());
    assert_eq!(grid.len(), 3);
    let svg = heatmap::render_svg(&grid, &ChartOptions::titled("Correlazioni")).expect("render");
    assert!(svg.contains("Età"));
    assert!(svg.contains("Genere"));
}

// ---------------------------------------------------------------------------
// Box plot
// ---------------------------------------------------------------------------

#[test]
fn box_plot_rows_are_monotonic_on_likert_scale() {
    let series = vec![BoxSeries {
        key: "students".to_string(),
        label: "Studenti".to_string(),
        color: palette::STUDENTS,
        stats: likert_box([1.0, 2.0, 4.0, 6.0, 7.0], 4.0),
    }];
    let layout = boxplot::layout(&series, &ChartOptions::default(), DomainMode::default());
    assert_eq!(layout.scale.domain, LIKERT_DOMAIN);
    assert!(layout.warnings.is_empty());

    let b = &layout.boxes[0];
    assert!(b.y_min > b.y_q1);
    assert!(b.y_q1 > b.y_median);
    assert!(b.y_median > b.y_q3);
    assert!(b.y_q3 > b.y_max);
    assert_eq!(b.y_mean, b.y_median);
    assert_eq!(layout.scale.y(0.0), 430.0);
    assert_eq!(layout.scale.y(7.0), 50.0);
    assert!(b.half_width <= 30.0);
}

#[test]
fn box_plot_skips_unordered_series() {
    let series = vec![
        BoxSeries {
            key: "students".to_string(),
            label: "Studenti".to_string(),
            color: palette::STUDENTS,
            stats: likert_box([1.0, 2.0, 4.0, 6.0, 7.0], 4.0),
        },
        BoxSeries {
            key: "teachers_active".to_string(),
            label: "Insegnanti".to_string(),
            color: palette::group_color("teachers_active"),
            stats: likert_box([1.0, 5.0, 4.0, 6.0, 7.0], 4.0),
        },
    ];
    let layout = boxplot::layout(&series, &ChartOptions::default(), DomainMode::default());
    assert_eq!(layout.boxes.len(), 1);
    assert_eq!(layout.warnings.len(), 1);
    assert_eq!(layout.warnings[0].subject, "Insegnanti");

    let svg = boxplot::render_svg(&series, &ChartOptions::titled("Likert"), DomainMode::default()).expect("render");
    assert!(svg.contains("Media"));
}

#[test]
fn auto_domain_pads_and_clamps() {
    let stats = QuartileStats {
        min: 2.0,
        q1: 4.0,
        q2: 5.0,
        q3: 8.0,
        max: 10.0,
        mean: 6.0,
        outliers: vec![22.0],
    };
    let domain = Domain::auto([&stats]).expect("finite values");
    assert!((domain.min - 0.0).abs() < 1e-9, "2 - 2 stays at zero");
    assert!((domain.max - 24.0).abs() < 1e-9);

    let flat = likert_box([3.0; 5], 3.0);
    assert_eq!(Domain::auto([&flat]), Some(Domain { min: 2.5, max: 3.5 }));
    assert_eq!(Domain::auto(std::iter::empty()), None);
}

#[test]
fn long_labels_are_shortened() {
    assert_eq!(shorten("Competenza", 20), "Competenza");
    assert_eq!(shorten("Competenza pratica", 10), "Compete...");
}
