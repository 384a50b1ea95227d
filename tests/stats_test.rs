use survey_dashboard::model::{CorrelationMethod, CorrelationStrength, Validate};
use survey_dashboard::stats::{
    correlation_matrix, correlation_p_value, exclusive_quartiles, likert_distribution, mean_with_ci, mode,
    pearson, quartiles, rank, spearman, t_quantile,
};

fn close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() < tol
}

fn column(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}

#[test]
fn mean_with_ci_on_small_sample() {
    let stat = mean_with_ci(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.95);
    assert_eq!(stat.n, 5);
    assert_eq!(stat.mean, 3.0);
    assert_eq!(stat.sd, 1.58);
    assert_eq!(stat.se, Some(0.707));
    assert_eq!(stat.ci_lower, 1.04, "t(0.975, 4) * se should be about 1.96");
    assert_eq!(stat.ci_upper, 4.96);
    assert_eq!(stat.median, Some(3.0));
    assert!(stat.validate().is_ok());
}

#[test]
fn mean_with_ci_degenerate_inputs() {
    let empty = mean_with_ci(&[], 0.95);
    assert_eq!(empty.n, 0);
    assert_eq!(empty.mean, 0.0);
    assert_eq!((empty.ci_lower, empty.ci_upper), (0.0, 0.0));

    let single = mean_with_ci(&[6.0], 0.95);
    assert_eq!(single.n, 1);
    assert_eq!(single.sd, 0.0);
    assert_eq!((single.ci_lower, single.ci_upper), (6.0, 6.0), "one value collapses the interval");
}

#[test]
fn wider_confidence_gives_wider_interval() {
    let values = [2.0, 3.0, 3.0, 4.0, 5.0, 6.0, 6.0, 7.0];
    let ci90 = mean_with_ci(&values, 0.90);
    let ci99 = mean_with_ci(&values, 0.99);
    assert!(ci99.ci_lower < ci90.ci_lower);
    assert!(ci99.ci_upper > ci90.ci_upper);
}

#[test]
fn exclusive_quartiles_match_reference() {
    let seven: Vec<f64> = (1..=7).map(f64::from).collect();
    assert_eq!(exclusive_quartiles(&seven), Some((2.0, 6.0)));
    assert_eq!(exclusive_quartiles(&[1.0, 2.0, 3.0, 4.0]), Some((1.25, 3.75)));
    assert_eq!(exclusive_quartiles(&[]), None);
}

#[test]
fn quartiles_separate_outliers_from_whiskers() {
    let stats = quartiles(&[100.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).expect("non-empty input");
    assert_eq!(stats.q1, 2.0);
    assert_eq!(stats.q2, 4.0);
    assert_eq!(stats.q3, 6.0);
    assert_eq!(stats.max, 6.0, "whisker stops at the last value inside the fence");
    assert_eq!(stats.min, 1.0);
    assert_eq!(stats.outliers, vec![100.0]);
    assert_eq!(stats.mean, 17.29);
    assert!(stats.validate().is_ok());
}

#[test]
fn likert_distribution_ignores_out_of_scale() {
    let counts = likert_distribution(&[1.0, 1.0, 4.0, 7.0, 0.0, 8.0]);
    assert_eq!(counts, [2, 0, 0, 1, 0, 0, 1]);
}

#[test]
fn mode_needs_a_repeat() {
    assert_eq!(mode(&[3.0, 5.0, 5.0, 3.0, 5.0]), Some(5.0));
    assert_eq!(mode(&[1.0, 2.0, 3.0]), None);
}

#[test]
fn pearson_perfect_linear_relation() {
    let x = column(&[1.0, 2.0, 3.0, 4.0, 5.0]);
    let y = column(&[2.0, 4.0, 6.0, 8.0, 10.0]);
    let c = pearson(&x, &y);
    assert!(close(c.r, 1.0, 1e-12));
    assert_eq!(c.p, 0.0);
    assert_eq!(c.n, 5);
}

#[test]
fn pearson_skips_incomplete_pairs() {
    let x = vec![Some(1.0), None, Some(2.0), Some(3.0), Some(4.0), Some(5.0)];
    let y = vec![Some(5.0), Some(1.0), Some(4.0), None, Some(2.0), Some(1.0)];
    let c = pearson(&x, &y);
    assert_eq!(c.n, 4);
    assert!(c.r < -0.9);
}

#[test]
fn pearson_undefined_cases() {
    let few = pearson(&column(&[1.0, 2.0, 3.0]), &column(&[3.0, 2.0, 1.0]));
    assert_eq!((few.r, few.p), (0.0, 1.0), "fewer than four pairs");

    let constant = pearson(&column(&[4.0, 4.0, 4.0, 4.0, 4.0]), &column(&[1.0, 2.0, 3.0, 4.0, 5.0]));
    assert_eq!((constant.r, constant.p), (0.0, 1.0), "constant column");
}

#[test]
fn spearman_sees_monotonic_relations() {
    let x = column(&[1.0, 2.0, 3.0, 4.0, 5.0]);
    let y = column(&[1.0, 4.0, 9.0, 16.0, 25.0]);
    assert!(close(spearman(&x, &y).r, 1.0, 1e-12));
    assert!(pearson(&x, &y).r < 1.0);
}

#[test]
fn ties_share_average_rank() {
    assert_eq!(rank(&[10.0, 20.0, 20.0, 30.0]), vec![1.0, 2.5, 2.5, 4.0]);
}

#[test]
fn p_value_of_moderate_correlation() {
    let p = correlation_p_value(0.5, 10);
    assert!(p > 0.13 && p < 0.15, "p = {}", p);
    assert_eq!(correlation_p_value(0.9, 2), 1.0);
    assert!(close(t_quantile(0.975, 10.0), 2.228139, 1e-4));
}

#[test]
fn correlation_matrix_is_symmetric_and_valid() {
    let columns = vec![
        ("a".to_string(), column(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])),
        ("b".to_string(), column(&[2.0, 1.0, 4.0, 3.0, 6.0, 5.0])),
        ("c".to_string(), column(&[6.0, 5.0, 4.0, 3.0, 2.0, 1.0])),
    ];
    let m = correlation_matrix(&columns, CorrelationMethod::Pearson);
    assert_eq!(m.dimension(), 3);
    for i in 0..3 {
        assert_eq!(m.r(i, i), 1.0);
        assert_eq!(m.p(i, i), None);
        for j in 0..3 {
            assert_eq!(m.r(i, j), m.r(j, i));
        }
    }
    assert_eq!(m.r(0, 2), -1.0);
    assert!(m.validate().is_ok());

    let interpretation = m.interpretation.as_ref().expect("interpretation is always set");
    assert_eq!(interpretation.total_comparisons, 3);
    let strongest = interpretation
        .strongest_correlation
        .as_ref()
        .expect("a vs c is significant");
    assert_eq!(strongest.correlation.abs(), 1.0);
    assert_eq!(strongest.strength, CorrelationStrength::VeryStrong);
}
