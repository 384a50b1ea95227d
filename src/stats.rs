//! Descriptive and inferential statistics over survey columns.
//!
//! Everything is computed on plain `f64` slices; missing answers are filtered
//! out (or paired-away) before they reach these functions. Results are rounded
//! the way the dashboard displays them: two decimals for means, deviations and
//! interval bounds, three for standard errors and correlations, five for
//! p-values.

use crate::model::{
    CorrelationDirection, CorrelationInterpretation, CorrelationMatrix, CorrelationMethod,
    CorrelationStrength, GroupStat, QuartileStats, SignificantCorrelation,
};
use std::cmp::Ordering;
use std::f64::consts::PI;

/// Significance level used throughout the dashboard
pub const ALPHA: f64 = 0.05;

/// Confidence level of the intervals shown on the error-bar chart
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

/// Minimum number of complete pairs for a correlation to be computed
pub const MIN_PAIRS: usize = 4;

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

fn median_of_sorted(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(sorted[n / 2]),
        _ => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0),
    }
}

pub fn median(values: &[f64]) -> Option<f64> {
    median_of_sorted(&sorted(values))
}

/// Sample standard deviation (n − 1 denominator); zero below two values
pub fn sample_sd(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = values.iter().sum::<f64>() / n as f64;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// Most frequent value, first seen wins ties; `None` when every value is unique
pub fn mode(values: &[f64]) -> Option<f64> {
    let mut best: Option<(f64, usize)> = None;
    for (i, v) in values.iter().enumerate() {
        if values[..i].contains(v) {
            continue;
        }
        let count = values[i..].iter().filter(|x| *x == v).count();
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((*v, count));
        }
    }
    best.filter(|(_, count)| *count > 1).map(|(v, _)| v)
}

/// Mean with a Student-t confidence interval
///
/// # Arguments
/// * `values` - Observations, missing answers already removed
/// * `confidence` - Two-sided confidence level, e.g. 0.95
///
/// # Returns
/// * `GroupStat` - Rounded mean, sd, se, interval bounds and median. An empty
///   input yields zeros with `n = 0`; a single value collapses the interval
///   onto the mean.
pub fn mean_with_ci(values: &[f64], confidence: f64) -> GroupStat {
    let n = values.len();
    if n == 0 {
        return GroupStat::empty(confidence);
    }

    let m = values.iter().sum::<f64>() / n as f64;
    let sd = sample_sd(values);
    let se = sd / (n as f64).sqrt();
    let margin = if n > 1 {
        t_quantile((1.0 + confidence) / 2.0, (n - 1) as f64) * se
    } else {
        0.0
    };

    GroupStat {
        mean: round_to(m, 2),
        sd: round_to(sd, 2),
        se: Some(round_to(se, 3)),
        n: n as u32,
        ci_lower: round_to(m - margin, 2),
        ci_upper: round_to(m + margin, 2),
        median: median(values).map(|v| round_to(v, 2)),
        confidence_level: Some(confidence),
    }
}

/// First and third quartile, exclusive method
///
/// Cut points at positions `i·(n+1)/4`, interpolated between neighbours, so
/// the data is treated as a sample of a wider population. Below four values
/// the quartiles fall back to the minimum and the maximum.
pub fn exclusive_quartiles(sorted: &[f64]) -> Option<(f64, f64)> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n < 4 {
        return Some((sorted[0], sorted[n - 1]));
    }
    let m = n + 1;
    let cut = |i: usize| {
        let j = (i * m / 4).clamp(1, n - 1);
        let delta = (i * m - 4 * (i * m / 4)) as f64;
        (sorted[j - 1] * (4.0 - delta) + sorted[j] * delta) / 4.0
    };
    Some((cut(1), cut(3)))
}

/// Box-plot summary: quartiles, Tukey fences, whiskers and outliers
///
/// Whiskers end at the most extreme values still inside `q1 − 1.5·IQR` and
/// `q3 + 1.5·IQR`; anything beyond is reported as an outlier.
pub fn quartiles(values: &[f64]) -> Option<QuartileStats> {
    let data = sorted(values);
    let (q1, q3) = exclusive_quartiles(&data)?;
    let q2 = median_of_sorted(&data)?;
    let iqr = q3 - q1;
    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    let inside = || data.iter().copied().filter(|v| *v >= lower_fence && *v <= upper_fence);
    let whisker_low = inside().next().unwrap_or(data[0]).min(q1);
    let whisker_high = inside().last().unwrap_or(data[data.len() - 1]).max(q3);
    let outliers = data
        .iter()
        .copied()
        .filter(|v| *v < lower_fence || *v > upper_fence)
        .map(|v| round_to(v, 2))
        .collect();

    Some(QuartileStats {
        min: round_to(whisker_low, 2),
        q1: round_to(q1, 2),
        q2: round_to(q2, 2),
        q3: round_to(q3, 2),
        max: round_to(whisker_high, 2),
        mean: round_to(mean(&data)?, 2),
        outliers,
    })
}

/// Counts of the values 1 through 7; anything else is ignored
pub fn likert_distribution(values: &[f64]) -> [u32; 7] {
    let mut counts = [0u32; 7];
    for v in values {
        if (1.0..=7.0).contains(v) {
            counts[(*v as usize) - 1] += 1;
        }
    }
    counts
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Result of one pairwise correlation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Correlation {
    pub r: f64,
    pub p: f64,
    pub n: usize,
}

impl Correlation {
    fn undefined(n: usize) -> Self {
        Correlation { r: 0.0, p: 1.0, n }
    }
}

fn complete_pairs(x: &[Option<f64>], y: &[Option<f64>]) -> (Vec<f64>, Vec<f64>) {
    x.iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .unzip()
}

fn pearson_complete(x: &[f64], y: &[f64]) -> Correlation {
    let n = x.len();
    if n < MIN_PAIRS {
        return Correlation::undefined(n);
    }
    let mx = x.iter().sum::<f64>() / n as f64;
    let my = y.iter().sum::<f64>() / n as f64;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return Correlation::undefined(n);
    }
    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    Correlation {
        r,
        p: correlation_p_value(r, n),
        n,
    }
}

/// Pearson product-moment correlation over complete pairs
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Correlation {
    let (a, b) = complete_pairs(x, y);
    pearson_complete(&a, &b)
}

/// Spearman rank correlation over complete pairs, ties get average ranks
pub fn spearman(x: &[Option<f64>], y: &[Option<f64>]) -> Correlation {
    let (a, b) = complete_pairs(x, y);
    pearson_complete(&rank(&a), &rank(&b))
}

/// 1-based ranks, tied values share the mean of their positions
pub fn rank(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| values[i].partial_cmp(&values[j]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && values[order[end + 1]] == values[order[start]] {
            end += 1;
        }
        let shared = (start + end) as f64 / 2.0 + 1.0;
        for &idx in &order[start..=end] {
            ranks[idx] = shared;
        }
        start = end + 1;
    }
    ranks
}

/// Two-sided p-value of a correlation coefficient, t test with n − 2 df
pub fn correlation_p_value(r: f64, n: usize) -> f64 {
    if n < 3 {
        return 1.0;
    }
    let df = (n - 2) as f64;
    if r.abs() >= 1.0 {
        return 0.0;
    }
    let t = r * (df / (1.0 - r * r)).sqrt();
    t_two_sided_p(t, df)
}

fn round_p(p: f64) -> f64 {
    if p >= 1e-5 { round_to(p, 5) } else { p }
}

/// Full correlation matrix of named columns
///
/// Columns must have the same length (one slot per respondent). Significant
/// pairs (p < 0.05) are listed by decreasing |r|.
pub fn correlation_matrix(columns: &[(String, Vec<Option<f64>>)], method: CorrelationMethod) -> CorrelationMatrix {
    let k = columns.len();
    let mut r = vec![vec![0.0; k]; k];
    let mut p = vec![vec![None; k]; k];
    let mut significant = Vec::new();

    for i in 0..k {
        r[i][i] = 1.0;
        p[i][i] = Some(0.0);
        for j in (i + 1)..k {
            let c = match method {
                CorrelationMethod::Pearson => pearson(&columns[i].1, &columns[j].1),
                CorrelationMethod::Spearman => spearman(&columns[i].1, &columns[j].1),
            };
            let rounded_r = round_to(c.r, 3);
            let rounded_p = round_p(c.p);
            r[i][j] = rounded_r;
            r[j][i] = rounded_r;
            p[i][j] = Some(rounded_p);
            p[j][i] = Some(rounded_p);

            if c.p < ALPHA {
                significant.push(SignificantCorrelation {
                    var1: columns[i].0.clone(),
                    var2: columns[j].0.clone(),
                    correlation: rounded_r,
                    p_value: rounded_p,
                    strength: CorrelationStrength::from_r(c.r),
                    direction: CorrelationDirection::from_r(c.r),
                    n_observations: Some(c.n as u32),
                });
            }
        }
    }

    significant.sort_by(|a, b| {
        b.correlation
            .abs()
            .partial_cmp(&a.correlation.abs())
            .unwrap_or(Ordering::Equal)
    });

    let total_comparisons = (k * k.saturating_sub(1) / 2) as u32;
    let interpretation = CorrelationInterpretation {
        total_comparisons,
        significant_count: significant.len() as u32,
        percentage_significant: if total_comparisons > 0 {
            round_to(significant.len() as f64 / total_comparisons as f64 * 100.0, 1)
        } else {
            0.0
        },
        strongest_correlation: significant.first().cloned(),
    };

    CorrelationMatrix {
        method: Some(method),
        variables: columns.iter().map(|(name, _)| name.clone()).collect(),
        correlation_matrix: r,
        p_value_matrix: p,
        significant_correlations: significant,
        interpretation: Some(interpretation),
        respondent_type: None,
        n_total: None,
    }
}

// ---------------------------------------------------------------------------
// Student t distribution
// ---------------------------------------------------------------------------

/// Cumulative distribution function of Student's t
pub fn t_cdf(t: f64, df: f64) -> f64 {
    if t.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    let x = df / (df + t * t);
    let tail = 0.5 * regularized_ibeta(x, df / 2.0, 0.5);
    if t >= 0.0 { 1.0 - tail } else { tail }
}

/// P(|T| ≥ |t|)
pub fn t_two_sided_p(t: f64, df: f64) -> f64 {
    let x = df / (df + t * t);
    regularized_ibeta(x, df / 2.0, 0.5).clamp(0.0, 1.0)
}

/// Inverse CDF of Student's t by bisection
pub fn t_quantile(p: f64, df: f64) -> f64 {
    const TOL: f64 = 1e-12;
    const MAX_ITER: usize = 200;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    if (p - 0.5).abs() < f64::EPSILON {
        return 0.0;
    }

    let mut hi = 1.0_f64;
    while t_cdf(hi, df) < p.max(1.0 - p) && hi < 1e12 {
        hi *= 2.0;
    }
    let mut lo = -hi;

    for _ in 0..MAX_ITER {
        let mid = f64::midpoint(lo, hi);
        let cdf = t_cdf(mid, df);
        if (cdf - p).abs() < TOL {
            return mid;
        }
        if cdf < p {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    f64::midpoint(lo, hi)
}

/// Log-gamma, Lanczos approximation (g = 7, 9 coefficients)
#[allow(clippy::excessive_precision)]
fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_93,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_13,
        -176.615_029_162_140_59,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_571_6e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if x < 0.5 {
        PI.ln() - (PI * x).sin().abs().ln() - ln_gamma(1.0 - x)
    } else {
        let x = x - 1.0;
        let series = COEFFS[1..]
            .iter()
            .enumerate()
            .fold(COEFFS[0], |acc, (i, c)| acc + c / (x + i as f64 + 1.0));
        let t = x + 7.5;
        0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + series.ln()
    }
}

fn ln_beta(a: f64, b: f64) -> f64 {
    ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b)
}

/// Regularized incomplete beta I_x(a, b), modified Lentz continued fraction
#[allow(clippy::many_single_char_names)]
fn regularized_ibeta(x: f64, a: f64, b: f64) -> f64 {
    const EPS: f64 = 1e-15;
    const TINY: f64 = 1e-30;
    const MAX_ITER: usize = 300;

    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    if x > (a + 1.0) / (a + b + 2.0) {
        return 1.0 - regularized_ibeta(1.0 - x, b, a);
    }

    let prefactor = (a * x.ln() + b * (1.0 - x).ln() - ln_beta(a, b) - a.ln()).exp();

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let clamp_tiny = |v: f64| if v.abs() < TINY { TINY } else { v };

    let mut c = 1.0_f64;
    let mut d = 1.0 / clamp_tiny(1.0 - qab * x / qap);
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 / clamp_tiny(1.0 + aa * d);
        c = clamp_tiny(1.0 + aa / c);
        h *= d * c;

        let aa = -((a + m) * (qab + m) * x) / ((a + m2) * (qap + m2));
        d = 1.0 / clamp_tiny(1.0 + aa * d);
        c = clamp_tiny(1.0 + aa / c);
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPS {
            break;
        }
    }

    prefactor * h
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn ln_gamma_known_values() {
        assert!(close(ln_gamma(1.0), 0.0, 1e-10));
        assert!(close(ln_gamma(2.0), 0.0, 1e-10));
        assert!(close(ln_gamma(0.5), PI.sqrt().ln(), 1e-10));
        assert!(close(ln_gamma(5.0), 24f64.ln(), 1e-10));
    }

    #[test]
    fn ibeta_boundaries_and_symmetry() {
        assert_eq!(regularized_ibeta(0.0, 2.0, 3.0), 0.0);
        assert_eq!(regularized_ibeta(1.0, 2.0, 3.0), 1.0);
        assert!(close(regularized_ibeta(0.5, 4.0, 4.0), 0.5, 1e-12));
        assert!(close(regularized_ibeta(0.3, 1.0, 1.0), 0.3, 1e-12));
    }

    #[test]
    fn t_cdf_is_symmetric() {
        for df in [1.0, 5.0, 30.0] {
            assert!(close(t_cdf(0.0, df), 0.5, 1e-12));
            assert!(close(t_cdf(1.3, df) + t_cdf(-1.3, df), 1.0, 1e-12));
        }
    }

    #[test]
    fn t_quantile_reference_values() {
        assert!(close(t_quantile(0.975, 1.0), 12.7062, 1e-3));
        assert!(close(t_quantile(0.975, 9.0), 2.262157, 1e-5));
        assert!(close(t_quantile(0.975, 29.0), 2.045230, 1e-5));
        assert!(close(t_quantile(0.025, 9.0), -2.262157, 1e-5));
    }

    #[test]
    fn exclusive_quartile_cut_points() {
        let data: Vec<f64> = (1..=8).map(f64::from).collect();
        assert_eq!(exclusive_quartiles(&data), Some((2.25, 6.75)));
        assert_eq!(exclusive_quartiles(&[1.0, 3.0]), Some((1.0, 3.0)));
    }
}
