//! Constant-elasticity demand model and KPI solver for the market simulator.
//!
//! Demand follows `base_demand * (price / base_price)^elasticity`. Every KPI
//! is a pure function of [`MarketState`]. Editing a KPI moves only the price:
//! demand inverts in closed form, unit margin is linear, and revenue, profit
//! and margin are solved by bisection.
//!
//! Inputs come from live sliders, so nothing here fails: out-of-range inputs
//! are clamped and an unbracketed solve returns its best midpoint.

use log::debug;
use serde::{Deserialize, Serialize};

pub const MIN_PRICE: f64 = 0.01;
pub const MAX_PRICE: f64 = 1e6;
pub const MIN_ELASTICITY: f64 = -5.0;
pub const MAX_ELASTICITY: f64 = -0.05;

/// Independent variables of the demand/profit model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketState {
    pub price: f64,
    pub base_price: f64,
    pub base_demand: f64,
    pub elasticity: f64,
    /// Variable cost per unit.
    pub vcpu: f64,
    pub fixed_cost: f64,
}

impl Default for MarketState {
    fn default() -> Self {
        Self {
            price: 50.0,
            base_price: 50.0,
            base_demand: 10_000.0,
            elasticity: -1.2,
            vcpu: 20.0,
            fixed_cost: 120_000.0,
        }
    }
}

fn clamp_or(value: f64, lo: f64, hi: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(lo, hi)
    }
}

impl MarketState {
    /// Same state with every input forced into its valid domain.
    pub fn clamped(&self) -> Self {
        Self {
            price: clamp_or(self.price, MIN_PRICE, MAX_PRICE, MIN_PRICE),
            base_price: clamp_or(self.base_price, MIN_PRICE, MAX_PRICE, MIN_PRICE),
            base_demand: clamp_or(self.base_demand, 0.0, f64::MAX, 0.0),
            elasticity: clamp_or(self.elasticity, MIN_ELASTICITY, MAX_ELASTICITY, MAX_ELASTICITY),
            vcpu: clamp_or(self.vcpu, 0.0, f64::MAX, 0.0),
            fixed_cost: clamp_or(self.fixed_cost, 0.0, f64::MAX, 0.0),
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = clamp_or(price, MIN_PRICE, MAX_PRICE, MIN_PRICE);
        self
    }
}

/// KPIs derived from a [`MarketState`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedKpis {
    pub demand: f64,
    pub revenue: f64,
    pub total_cost: f64,
    pub profit: f64,
    /// Profit over revenue as a fraction; 0 when revenue is not positive.
    pub margin_pct: f64,
    pub unit_margin: f64,
}

/// A KPI the user can edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiMetric {
    Demand,
    Revenue,
    Profit,
    Margin,
    UnitMargin,
}

impl KpiMetric {
    pub fn value_of(&self, kpis: &DerivedKpis) -> f64 {
        match self {
            KpiMetric::Demand => kpis.demand,
            KpiMetric::Revenue => kpis.revenue,
            KpiMetric::Profit => kpis.profit,
            KpiMetric::Margin => kpis.margin_pct,
            KpiMetric::UnitMargin => kpis.unit_margin,
        }
    }

    /// Initial upper bracket as a multiple of the base price.
    fn bracket_multiplier(&self) -> f64 {
        match self {
            KpiMetric::Revenue => 200.0,
            KpiMetric::Profit => 100.0,
            _ => 60.0,
        }
    }
}

fn demand_at(state: &MarketState, price: f64) -> f64 {
    state.base_demand * (price / state.base_price).powf(state.elasticity)
}

fn kpis_at(state: &MarketState, price: f64) -> DerivedKpis {
    let demand = demand_at(state, price);
    let revenue = price * demand;
    let total_cost = state.fixed_cost + state.vcpu * demand;
    let profit = revenue - total_cost;
    let margin_pct = if revenue > 0.0 { profit / revenue } else { 0.0 };
    DerivedKpis {
        demand,
        revenue,
        total_cost,
        profit,
        margin_pct,
        unit_margin: price - state.vcpu,
    }
}

/// Compute every KPI for a state (inputs are clamped first).
pub fn derive_all(state: &MarketState) -> DerivedKpis {
    let state = state.clamped();
    kpis_at(&state, state.price)
}

/// Closed-form inverse of the demand curve: the price selling `target_demand`.
pub fn invert_elasticity_for_price(target_demand: f64, state: &MarketState) -> f64 {
    let state = state.clamped();
    if !(target_demand > 0.0) || state.base_demand <= 0.0 {
        // Zero demand is only reached at the top of the price range.
        return MAX_PRICE;
    }
    let price = state.base_price * (target_demand / state.base_demand).powf(1.0 / state.elasticity);
    clamp_or(price, MIN_PRICE, MAX_PRICE, MAX_PRICE)
}

/// Bisection root finder with outward bracket expansion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bisection {
    pub max_iterations: usize,
    pub tolerance: f64,
    pub max_expansions: usize,
}

impl Default for Bisection {
    fn default() -> Self {
        Self {
            max_iterations: 70,
            tolerance: 1e-6,
            max_expansions: 10,
        }
    }
}

/// How a bisection run ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RootEstimate {
    pub x: f64,
    pub bracketed: bool,
    pub iterations: usize,
}

impl Bisection {
    /// Find `x` in `[lo, hi]` with `f(x) ≈ 0`.
    ///
    /// When `f(lo)` and `f(hi)` share a sign the bracket is widened
    /// (`lo / 2`, `hi * 2`) up to `max_expansions` times. If it is still not
    /// bracketed the midpoint is returned unrefined.
    pub fn solve<F>(&self, f: F, lo: f64, hi: f64) -> RootEstimate
    where
        F: Fn(f64) -> f64,
    {
        let (mut lo, mut hi) = (lo, hi);
        let mut f_lo = f(lo);
        let mut f_hi = f(hi);

        let mut expansions = 0;
        while f_lo * f_hi > 0.0 && expansions < self.max_expansions {
            lo /= 2.0;
            hi *= 2.0;
            f_lo = f(lo);
            f_hi = f(hi);
            expansions += 1;
        }

        if f_lo == 0.0 {
            return RootEstimate { x: lo, bracketed: true, iterations: 0 };
        }
        if f_hi == 0.0 {
            return RootEstimate { x: hi, bracketed: true, iterations: 0 };
        }
        if !(f_lo * f_hi < 0.0) {
            return RootEstimate {
                x: (lo + hi) / 2.0,
                bracketed: false,
                iterations: 0,
            };
        }

        let mut iterations = 0;
        loop {
            iterations += 1;
            let mid = (lo + hi) / 2.0;
            let f_mid = f(mid);
            if f_mid.abs() < self.tolerance || iterations >= self.max_iterations {
                return RootEstimate { x: mid, bracketed: true, iterations };
            }
            if f_lo * f_mid < 0.0 {
                hi = mid;
            } else {
                lo = mid;
                f_lo = f_mid;
            }
        }
    }
}

fn solve_by_bisection(metric: KpiMetric, target: f64, state: &MarketState) -> f64 {
    let state = state.clamped();
    let objective = |price: f64| metric.value_of(&kpis_at(&state, price)) - target;
    let hi = state.base_price * metric.bracket_multiplier();
    let estimate = Bisection::default().solve(objective, MIN_PRICE, hi);
    if !estimate.bracketed {
        debug!(
            "No price bracket for {:?} target {}; using midpoint {}",
            metric, target, estimate.x
        );
    }
    clamp_or(estimate.x, MIN_PRICE, MAX_PRICE, MIN_PRICE)
}

/// Price at which revenue reaches `target`.
pub fn solve_for_revenue(target: f64, state: &MarketState) -> f64 {
    solve_by_bisection(KpiMetric::Revenue, target, state)
}

/// Price at which profit reaches `target`.
pub fn solve_for_profit(target: f64, state: &MarketState) -> f64 {
    solve_by_bisection(KpiMetric::Profit, target, state)
}

/// Price at which the margin fraction reaches `target`.
pub fn solve_for_margin(target: f64, state: &MarketState) -> f64 {
    solve_by_bisection(KpiMetric::Margin, target, state)
}

/// Price that makes `metric` equal `target`.
pub fn solve_price(metric: KpiMetric, target: f64, state: &MarketState) -> f64 {
    match metric {
        KpiMetric::Demand => invert_elasticity_for_price(target, state),
        KpiMetric::UnitMargin => {
            let vcpu = state.clamped().vcpu;
            clamp_or(target + vcpu, MIN_PRICE, MAX_PRICE, MIN_PRICE)
        }
        KpiMetric::Revenue | KpiMetric::Profit | KpiMetric::Margin => {
            solve_by_bisection(metric, target, state)
        }
    }
}

/// Apply an edit of a derived KPI: only the price changes.
pub fn apply_kpi_edit(state: &MarketState, metric: KpiMetric, target: f64) -> MarketState {
    let price = solve_price(metric, target, state);
    state.clamped().with_price(price)
}

/// Profit-maximizing price `vcpu * e / (1 + e)`; only defined for elastic demand.
pub fn profit_maximizing_price(state: &MarketState) -> Option<f64> {
    let state = state.clamped();
    if state.elasticity >= -1.0 || state.vcpu <= 0.0 {
        return None;
    }
    let price = state.vcpu * state.elasticity / (1.0 + state.elasticity);
    Some(clamp_or(price, MIN_PRICE, MAX_PRICE, MAX_PRICE))
}

/// A sampled point of the demand/profit chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub price: f64,
    pub demand: f64,
    pub revenue: f64,
    pub profit: f64,
}

/// Sample `points` evenly spaced prices in `[min_price, max_price]`.
pub fn price_curve(state: &MarketState, min_price: f64, max_price: f64, points: usize) -> Vec<CurvePoint> {
    let state = state.clamped();
    let lo = clamp_or(min_price.min(max_price), MIN_PRICE, MAX_PRICE, MIN_PRICE);
    let hi = clamp_or(min_price.max(max_price), MIN_PRICE, MAX_PRICE, MAX_PRICE);
    match points {
        0 => Vec::new(),
        1 => vec![lo],
        n => (0..n)
            .map(|i| lo + (hi - lo) * i as f64 / (n - 1) as f64)
            .collect(),
    }
    .into_iter()
    .map(|price| {
        let k = kpis_at(&state, price);
        CurvePoint {
            price,
            demand: k.demand,
            revenue: k.revenue,
            profit: k.profit,
        }
    })
    .collect()
}
