//! Sobol low-discrepancy sequence
//!
//! Gray-code construction with the Joe-Kuo (new-joe-kuo-6.21201) direction
//! numbers for the first 32 dimensions.

use crate::error::ProblemError;

const BITS: usize = 32;

pub const MAX_DIMENSIONS: usize = 32;

/// (degree s, coefficient a, initial m values) for dimensions 2..=32
const DIRECTIONS: [(u32, u32, &[u32]); MAX_DIMENSIONS - 1] = [
    (1, 0, &[1]),
    (2, 1, &[1, 3]),
    (3, 1, &[1, 3, 1]),
    (3, 2, &[1, 1, 1]),
    (4, 1, &[1, 1, 3, 3]),
    (4, 4, &[1, 3, 5, 13]),
    (5, 2, &[1, 1, 5, 5, 17]),
    (5, 4, &[1, 1, 5, 5, 5]),
    (5, 7, &[1, 1, 7, 11, 19]),
    (5, 11, &[1, 1, 5, 1, 1]),
    (5, 13, &[1, 1, 1, 3, 11]),
    (5, 14, &[1, 3, 5, 5, 31]),
    (6, 1, &[1, 3, 3, 9, 7, 49]),
    (6, 13, &[1, 1, 1, 15, 21, 21]),
    (6, 16, &[1, 3, 1, 13, 27, 49]),
    (6, 19, &[1, 1, 1, 15, 7, 5]),
    (6, 22, &[1, 3, 1, 15, 13, 25]),
    (6, 25, &[1, 1, 5, 5, 19, 61]),
    (7, 1, &[1, 3, 7, 11, 23, 15, 103]),
    (7, 4, &[1, 3, 7, 13, 13, 15, 69]),
    (7, 7, &[1, 1, 3, 13, 7, 35, 63]),
    (7, 8, &[1, 3, 5, 9, 1, 25, 53]),
    (7, 14, &[1, 3, 1, 13, 9, 35, 107]),
    (7, 19, &[1, 3, 1, 5, 27, 61, 31]),
    (7, 21, &[1, 1, 5, 11, 19, 41, 61]),
    (7, 28, &[1, 3, 5, 3, 3, 13, 69]),
    (7, 31, &[1, 1, 7, 13, 1, 19, 1]),
    (7, 32, &[1, 3, 7, 5, 13, 19, 59]),
    (7, 37, &[1, 1, 3, 9, 25, 29, 41]),
    (7, 41, &[1, 3, 5, 13, 23, 1, 55]),
    (7, 42, &[1, 3, 7, 3, 13, 59, 17]),
];

fn direction_vector(dim: usize) -> [u32; BITS] {
    let mut v = [0u32; BITS];
    if dim == 0 {
        for (i, slot) in v.iter_mut().enumerate() {
            *slot = 1 << (BITS - 1 - i);
        }
        return v;
    }

    let (s, a, m) = DIRECTIONS[dim - 1];
    let s = s as usize;
    for i in 0..s {
        v[i] = m[i] << (BITS - 1 - i);
    }
    for i in s..BITS {
        v[i] = v[i - s] ^ (v[i - s] >> s);
        for k in 1..s {
            v[i] ^= ((a >> (s - 1 - k)) & 1) * v[i - k];
        }
    }
    v
}

/// Iterator over points of a Sobol sequence in `[0, 1)^d`.
///
/// The all-zero first point is skipped.
#[derive(Debug, Clone)]
pub struct SobolSequence {
    directions: Vec<[u32; BITS]>,
    state: Vec<u32>,
    index: u64,
}

impl SobolSequence {
    pub fn new(dimensions: usize) -> Result<Self, ProblemError> {
        if dimensions == 0 {
            return Err(ProblemError::NoParameters);
        }
        if dimensions > MAX_DIMENSIONS {
            return Err(ProblemError::TooManyParameters {
                count: dimensions,
                max: MAX_DIMENSIONS,
            });
        }
        Ok(Self {
            directions: (0..dimensions).map(direction_vector).collect(),
            state: vec![0; dimensions],
            index: 0,
        })
    }

    /// First `n` points as rows
    pub fn take_points(&mut self, n: usize) -> Vec<Vec<f64>> {
        self.by_ref().take(n).collect()
    }
}

impl Iterator for SobolSequence {
    type Item = Vec<f64>;

    fn next(&mut self) -> Option<Vec<f64>> {
        // Position of the lowest zero bit of the current index
        let c = self.index.trailing_ones() as usize;
        if c >= BITS {
            return None;
        }
        for (x, v) in self.state.iter_mut().zip(&self.directions) {
            *x ^= v[c];
        }
        self.index += 1;
        Some(
            self.state
                .iter()
                .map(|&x| f64::from(x) / (1u64 << BITS) as f64)
                .collect(),
        )
    }
}
