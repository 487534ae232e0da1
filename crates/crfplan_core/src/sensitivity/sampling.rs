//! Saltelli pick-and-freeze design
//!
//! For every base point, a 2k-dimensional Sobol point is split into two
//! k-vectors A and B. The block of `2k + 2` rows is laid out as
//!
//! ```text
//! A, AB_1 .. AB_k, BA_1 .. BA_k, B
//! ```
//!
//! where `AB_i` is A with column i taken from B and `BA_i` is B with column i
//! taken from A.

use crate::error::ProblemError;

use super::config::SobolProblem;
use super::sequence::SobolSequence;

/// Rows per base sample for `k` parameters
#[inline]
#[must_use]
pub fn block_size(k: usize) -> usize {
    2 * k + 2
}

/// Build the scaled design matrix, `base_samples * (2k + 2)` rows of `k`
/// columns each.
pub fn saltelli_design(
    problem: &SobolProblem,
    base_samples: usize,
) -> Result<Vec<Vec<f64>>, ProblemError> {
    problem.validate()?;
    if base_samples == 0 {
        return Err(ProblemError::NoSamples);
    }

    let k = problem.len();
    let mut sequence = SobolSequence::new(2 * k)?;
    let mut rows = Vec::with_capacity(base_samples * block_size(k));

    for base in sequence.take_points(base_samples) {
        let (a, b) = base.split_at(k);

        rows.push(a.to_vec());
        for i in 0..k {
            let mut ab = a.to_vec();
            ab[i] = b[i];
            rows.push(ab);
        }
        for i in 0..k {
            let mut ba = b.to_vec();
            ba[i] = a[i];
            rows.push(ba);
        }
        rows.push(b.to_vec());
    }

    for row in &mut rows {
        for (x, p) in row.iter_mut().zip(&problem.parameters) {
            *x = p.scale(*x);
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensitivity::{SobolParameter, SobolTarget};

    fn two_param_problem() -> SobolProblem {
        SobolProblem::new(vec![
            SobolParameter::new("a", SobolTarget::CarbonPrice, 0.0, 10.0),
            SobolParameter::new("b", SobolTarget::Dosage, 100.0, 200.0),
        ])
    }

    #[test]
    fn test_design_shape() {
        let rows = saltelli_design(&two_param_problem(), 8).unwrap();
        assert_eq!(rows.len(), 8 * block_size(2));
        assert!(rows.iter().all(|r| r.len() == 2));
    }

    #[test]
    fn test_block_layout() {
        let rows = saltelli_design(&two_param_problem(), 4).unwrap();
        for block in rows.chunks(block_size(2)) {
            let (a, ab1, ab2, ba1, ba2, b) =
                (&block[0], &block[1], &block[2], &block[3], &block[4], &block[5]);
            assert_eq!(ab1, &vec![b[0], a[1]]);
            assert_eq!(ab2, &vec![a[0], b[1]]);
            assert_eq!(ba1, &vec![a[0], b[1]]);
            assert_eq!(ba2, &vec![b[0], a[1]]);
        }
    }

    #[test]
    fn test_values_within_bounds() {
        let rows = saltelli_design(&two_param_problem(), 32).unwrap();
        for row in rows {
            assert!((0.0..10.0).contains(&row[0]));
            assert!((100.0..200.0).contains(&row[1]));
        }
    }

    #[test]
    fn test_zero_samples_rejected() {
        assert_eq!(
            saltelli_design(&two_param_problem(), 0).unwrap_err(),
            ProblemError::NoSamples
        );
    }
}
