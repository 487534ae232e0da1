//! Financial viability analysis
//!
//! Turns a constant annual net flow into a discounted series, NPV and
//! payback year. The analyzer never fails: a zero horizon is analyzed as one
//! year, a horizon past [`MAX_HORIZON_YEARS`] is cut to it, and an unusable
//! discount rate falls back to the default.

use crate::model::{CashFlowSeries, DEFAULT_DISCOUNT_RATE, MAX_HORIZON_YEARS};

/// Horizon and rate used wherever a fixed-horizon NPV is needed
/// (Monte Carlo trials, Sobol rows)
pub const FIXED_HORIZON_YEARS: u32 = 5;
pub const FIXED_DISCOUNT_RATE: f64 = 0.06;

fn usable_rate(rate: f64) -> f64 {
    if rate.is_finite() && (0.0..1.0).contains(&rate) {
        rate
    } else {
        DEFAULT_DISCOUNT_RATE
    }
}

fn usable_horizon(horizon_years: u32) -> u32 {
    horizon_years.clamp(1, MAX_HORIZON_YEARS)
}

/// Net annual flow from its components
#[must_use]
pub fn net_annual_flow(incremental_cost: f64, yield_benefit: f64, carbon_revenue: f64) -> f64 {
    carbon_revenue + yield_benefit - incremental_cost
}

/// Discounted series for a constant annual flow
#[must_use]
pub fn cash_flow_series(
    annual_flow: f64,
    horizon_years: u32,
    discount_rate: f64,
) -> CashFlowSeries {
    let horizon = usable_horizon(horizon_years);
    let rate = usable_rate(discount_rate);
    let annual_flow = if annual_flow.is_finite() {
        annual_flow
    } else {
        0.0
    };

    let mut discounted = Vec::with_capacity(horizon as usize);
    let mut cumulative = Vec::with_capacity(horizon as usize);
    let mut running = 0.0;
    let mut payback_year = horizon + 1;
    let mut factor = 1.0;

    for year in 1..=horizon {
        factor *= 1.0 + rate;
        let value = annual_flow / factor;
        running += value;
        discounted.push(value);
        cumulative.push(running);
        if payback_year > horizon && running >= 0.0 {
            payback_year = year;
        }
    }

    CashFlowSeries {
        annual_flow,
        discount_rate: rate,
        discounted,
        cumulative,
        npv: running,
        payback_year,
    }
}

/// Analyze from the flow components
#[must_use]
pub fn analyze(
    incremental_cost: f64,
    yield_benefit: f64,
    carbon_revenue: f64,
    horizon_years: u32,
    discount_rate: f64,
) -> CashFlowSeries {
    cash_flow_series(
        net_annual_flow(incremental_cost, yield_benefit, carbon_revenue),
        horizon_years,
        discount_rate,
    )
}

/// NPV of a constant flow without materializing the series
#[must_use]
pub fn npv(annual_flow: f64, horizon_years: u32, discount_rate: f64) -> f64 {
    let rate = usable_rate(discount_rate);
    let mut factor = 1.0;
    let mut total = 0.0;
    for _ in 0..usable_horizon(horizon_years) {
        factor *= 1.0 + rate;
        total += annual_flow / factor;
    }
    total
}
