//! Sobol index estimators over evaluated Saltelli designs
//!
//! First order follows Saltelli (2010), total order follows Jansen (1999).
//! Outputs are standardized before estimation; a constant output yields
//! all-zero indices. The two estimators use different sample products, so at
//! finite N the total-order point estimate is raised to the first-order one
//! where sampling noise puts it below.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::stats;

use super::sampling::block_size;

/// Design outputs regrouped by role: `a[n]`, `ab[i][n]`, `ba[i][n]`, `b[n]`
pub(crate) struct Separated {
    a: Vec<f64>,
    ab: Vec<Vec<f64>>,
    ba: Vec<Vec<f64>>,
    b: Vec<f64>,
}

impl Separated {
    pub(crate) fn new(outputs: &[f64], k: usize) -> Self {
        let step = block_size(k);
        let n = outputs.len() / step;
        let mut sep = Self {
            a: Vec::with_capacity(n),
            ab: vec![Vec::with_capacity(n); k],
            ba: vec![Vec::with_capacity(n); k],
            b: Vec::with_capacity(n),
        };

        let m = stats::mean(outputs);
        let sd = stats::std_dev(outputs);
        let norm = |y: f64| if sd > 0.0 { (y - m) / sd } else { 0.0 };

        for block in outputs.chunks_exact(step) {
            sep.a.push(norm(block[0]));
            for i in 0..k {
                sep.ab[i].push(norm(block[1 + i]));
                sep.ba[i].push(norm(block[1 + k + i]));
            }
            sep.b.push(norm(block[step - 1]));
        }
        sep
    }

    fn len(&self) -> usize {
        self.a.len()
    }
}

/// Raw index estimates before naming and sorting
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Estimates {
    pub s1: Vec<f64>,
    pub s1_conf: Vec<f64>,
    pub st: Vec<f64>,
    pub st_conf: Vec<f64>,
    /// Parameters whose ST was raised to S1
    pub clamped: usize,
    /// Upper triangle, row-major over `(j, l)` with `j < l`
    pub s2: Vec<(usize, usize, f64)>,
}

fn variance_of(sep: &Separated, idx: &[usize]) -> f64 {
    let joined: Vec<f64> = idx
        .iter()
        .map(|&n| sep.a[n])
        .chain(idx.iter().map(|&n| sep.b[n]))
        .collect();
    stats::population_variance(&joined)
}

fn mean_over(idx: &[usize], f: impl Fn(usize) -> f64) -> f64 {
    if idx.is_empty() {
        return 0.0;
    }
    idx.iter().map(|&n| f(n)).sum::<f64>() / idx.len() as f64
}

fn first_order(sep: &Separated, i: usize, idx: &[usize], var: f64) -> f64 {
    if var <= 0.0 {
        return 0.0;
    }
    mean_over(idx, |n| sep.b[n] * (sep.ab[i][n] - sep.a[n])) / var
}

fn total_order(sep: &Separated, i: usize, idx: &[usize], var: f64) -> f64 {
    if var <= 0.0 {
        return 0.0;
    }
    0.5 * mean_over(idx, |n| (sep.a[n] - sep.ab[i][n]).powi(2)) / var
}

fn second_order(sep: &Separated, j: usize, l: usize, idx: &[usize], var: f64) -> f64 {
    if var <= 0.0 {
        return 0.0;
    }
    let vjl = mean_over(idx, |n| sep.ba[j][n] * sep.ab[l][n] - sep.a[n] * sep.b[n]);
    vjl / var - first_order(sep, j, idx, var) - first_order(sep, l, idx, var)
}

/// Sample standard deviation (n - 1)
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = stats::mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64).sqrt()
}

/// Estimate S1, ST (with bootstrap half-widths) and optionally S2
pub(crate) fn estimate(
    sep: &Separated,
    k: usize,
    second: bool,
    resamples: usize,
    z: f64,
    seed: u64,
) -> Estimates {
    let n = sep.len();
    let all: Vec<usize> = (0..n).collect();
    let var = variance_of(sep, &all);

    let s1: Vec<f64> = (0..k).map(|i| first_order(sep, i, &all, var)).collect();
    let mut clamped = 0;
    let st: Vec<f64> = (0..k)
        .map(|i| {
            let st = total_order(sep, i, &all, var);
            if st < s1[i] {
                clamped += 1;
                s1[i]
            } else {
                st
            }
        })
        .collect();

    let mut s2 = Vec::new();
    if second {
        for j in 0..k {
            for l in (j + 1)..k {
                s2.push((j, l, second_order(sep, j, l, &all, var)));
            }
        }
    }

    let mut s1_boot = vec![Vec::with_capacity(resamples); k];
    let mut st_boot = vec![Vec::with_capacity(resamples); k];
    if n > 0 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut idx = vec![0usize; n];
        for _ in 0..resamples {
            for slot in idx.iter_mut() {
                *slot = rng.random_range(0..n);
            }
            let var_r = variance_of(sep, &idx);
            for i in 0..k {
                s1_boot[i].push(first_order(sep, i, &idx, var_r));
                st_boot[i].push(total_order(sep, i, &idx, var_r));
            }
        }
    }

    Estimates {
        s1,
        s1_conf: s1_boot.iter().map(|b| z * sample_std(b)).collect(),
        st,
        st_conf: st_boot.iter().map(|b| z * sample_std(b)).collect(),
        clamped,
        s2,
    }
}
