//! Properties of the discounted cash-flow analyzer

use crate::financial::{analyze, cash_flow_series};

#[test]
fn test_npv_is_sum_of_discounted_flows() {
    let flow = 123.4;
    let rate = 0.08;
    let series = cash_flow_series(flow, 12, rate);

    let expected: f64 = (1..=12).map(|t| flow / (1.0 + rate).powi(t)).sum();
    assert!(
        (series.npv - expected).abs() < 1e-9,
        "npv {} expected {}",
        series.npv,
        expected
    );
    let summed: f64 = series.discounted.iter().sum();
    assert!((series.npv - summed).abs() < 1e-9);
    assert!((series.cumulative[11] - series.npv).abs() < 1e-12);
}

#[test]
fn test_payback_all_negative_is_sentinel() {
    let series = cash_flow_series(-10.0, 8, 0.06);
    assert_eq!(series.payback_year, 9);
    assert!(!series.recovered());
}

#[test]
fn test_payback_positive_flow_is_first_year() {
    let series = cash_flow_series(10.0, 8, 0.06);
    assert_eq!(series.payback_year, 1);
    assert!(series.recovered());
}

#[test]
fn test_zero_flow_pays_back_immediately() {
    let series = cash_flow_series(0.0, 4, 0.06);
    assert_eq!(series.payback_year, 1);
    assert_eq!(series.npv, 0.0);
}

#[test]
fn test_discounted_flows_shrink_over_time() {
    let series = cash_flow_series(100.0, 10, 0.06);
    assert!(series.discounted.windows(2).all(|w| w[1] < w[0]));
    assert!((series.discounted[0] - 100.0 / 1.06).abs() < 1e-9);
}

#[test]
fn test_analyze_combines_components() {
    let series = analyze(600.0, 200.0, 450.0, 5, 0.06);
    assert!((series.annual_flow - 50.0).abs() < 1e-12);
    assert_eq!(series.horizon(), 5);
    assert!(series.npv > 0.0);
}
