//! Comb/integrator response model
//!
//! Computes the gain norm F_j of every pruning point of an N stage CIC
//! decimator: the L2 norm of the impulse response from that point to the
//! filter output. Pruning points are ordered from the first integrator
//! (index 0) through the last comb (index 2N).
//!
//! Integrator points are evaluated exactly as an alternating sum of binomial
//! products. Comb points use closed-form norms from a [`CombNormTable`].

use crate::constants::{COMB_NORM_SQUARES, MIN_RATIO, MIN_STAGES};
use crate::error::{CicError, Result};

/// Squared norms of 0, 1, 2, ... cascaded comb stages
///
/// The default table covers up to 7 stages. Longer filters need a caller
/// supplied table built with [`CombNormTable::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct CombNormTable {
    squares: Vec<f64>,
}

impl Default for CombNormTable {
    fn default() -> Self {
        Self {
            squares: COMB_NORM_SQUARES.to_vec(),
        }
    }
}

impl CombNormTable {
    /// Create a table from squared norms, entry `k` for `k` cascaded combs
    ///
    /// # Errors
    /// Returns `CicError::Config` unless there are at least two entries, all
    /// finite and positive.
    pub fn new(squares: Vec<f64>) -> Result<Self> {
        if squares.len() < 2 {
            return Err(CicError::Config(
                "comb norm table needs at least two entries".to_string(),
            ));
        }
        if let Some(bad) = squares.iter().find(|v| !v.is_finite() || **v <= 0.0) {
            return Err(CicError::Config(format!(
                "comb norm table entries must be positive, got {}",
                bad
            )));
        }
        Ok(Self { squares })
    }

    /// Largest stage count this table supports
    pub fn max_stages(&self) -> u32 {
        (self.squares.len() - 1) as u32
    }

    /// Norm of `combs` cascaded comb stages
    pub fn norm(&self, combs: usize) -> Option<f64> {
        self.squares.get(combs).map(|v| v.sqrt())
    }
}

fn overflow(ratio: u32, stages: u32) -> CicError {
    CicError::Config(format!(
        "impulse response of ratio {} with {} stages overflows 128-bit arithmetic",
        ratio, stages
    ))
}

/// Binomial coefficient C(n, k), zero outside `0 <= k <= n`
///
/// Returns `None` on i128 overflow.
pub fn binomial(n: i64, k: i64) -> Option<i128> {
    if n < 0 || k < 0 || k > n {
        return Some(0);
    }
    let k = k.min(n - k);
    // acc holds C(n, i) after step i, so every division is exact
    (0..k).try_fold(1i128, |acc, i| {
        acc.checked_mul(i128::from(n - i))
            .map(|v| v / i128::from(i + 1))
    })
}

/// Tap `k` of the impulse response from integrator point `j`
///
/// `sum over l of (-1)^l C(N, l) C(N - j + k - R l, k - R l)` for `l = 0..=k/R`.
/// Returns `None` on i128 overflow.
fn impulse_tap(r: i64, n: i64, j: i64, k: i64) -> Option<i128> {
    (0..=k / r).try_fold(0i128, |acc, l| {
        let tap = k - r * l;
        let term = binomial(n, l)?.checked_mul(binomial(n - j + tap, tap)?)?;
        if l % 2 == 0 {
            acc.checked_add(term)
        } else {
            acc.checked_sub(term)
        }
    })
}

fn check_parameters(ratio: u32, stages: u32) -> Result<()> {
    if ratio < MIN_RATIO || stages < MIN_STAGES {
        return Err(CicError::Config(format!(
            "impulse response needs ratio >= {} and stages >= {}, got ratio {} stages {}",
            MIN_RATIO, MIN_STAGES, ratio, stages
        )));
    }
    Ok(())
}

fn response_len(r: i64, n: i64, j: i64) -> i64 {
    (r - 1) * n + j
}

/// Impulse response from integrator pruning point `j` to the filter output
///
/// Length is `(R - 1) N + j`. Allocates the whole response; use
/// [`integrator_norm`] when only its energy is needed.
pub fn integrator_impulse_response(ratio: u32, stages: u32, j: u32) -> Result<Vec<i128>> {
    check_parameters(ratio, stages)?;
    let (r, n, j) = (i64::from(ratio), i64::from(stages), i64::from(j));

    (0..response_len(r, n, j))
        .map(|k| impulse_tap(r, n, j, k).ok_or_else(|| overflow(ratio, stages)))
        .collect()
}

/// L2 norm of the impulse response from integrator point `j`, in one pass
pub fn integrator_norm(ratio: u32, stages: u32, j: u32) -> Result<f64> {
    check_parameters(ratio, stages)?;
    let (r, n, j) = (i64::from(ratio), i64::from(stages), i64::from(j));

    let energy = (0..response_len(r, n, j))
        .try_fold(0.0f64, |acc, k| {
            let h = impulse_tap(r, n, j, k)? as f64;
            Some(acc + h * h)
        })
        .ok_or_else(|| overflow(ratio, stages))?;
    Ok(energy.sqrt())
}

/// Gain norms F_0..F_2N of every pruning point
///
/// # Errors
/// - `CicError::Config` for a ratio below 2, zero stages, or arithmetic overflow
/// - `CicError::UnsupportedStages` if `stages` exceeds the comb norm table
pub fn gain_norms(ratio: u32, stages: u32, table: &CombNormTable) -> Result<Vec<f64>> {
    check_parameters(ratio, stages)?;
    if stages > table.max_stages() {
        return Err(CicError::UnsupportedStages {
            stages,
            supported: table.max_stages(),
        });
    }

    let n = stages as usize;
    let mut norms = vec![0.0; 2 * n + 1];

    for j in (1..stages).rev() {
        norms[j as usize - 1] = integrator_norm(ratio, stages, j)?;
    }

    // Position 2N sees no combs, position N sees all N of them
    for (offset, slot) in norms[n..].iter_mut().enumerate() {
        *slot = table.norm(n - offset).ok_or(CicError::UnsupportedStages {
            stages,
            supported: table.max_stages(),
        })?;
    }

    // The alternating sum does not cover the last integrator
    norms[n - 1] = norms[n + 1] * f64::from(ratio).sqrt();

    for (index, f) in norms.iter().enumerate() {
        log::trace!("F[{}] = {:.6}", index, f);
    }

    Ok(norms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_binomial() {
        assert_eq!(binomial(0, 0), Some(1));
        assert_eq!(binomial(5, 2), Some(10));
        assert_eq!(binomial(10, 7), Some(120));
        assert_eq!(binomial(14, 7), Some(3432));
        assert_eq!(binomial(3, 4), Some(0));
        assert_eq!(binomial(3, -1), Some(0));
        assert_eq!(binomial(901, 6), Some(730_754_141_033_280));
    }

    #[test]
    fn test_binomial_overflow() {
        assert_eq!(binomial(1_000_000_000, 20), None);
    }

    #[test]
    fn test_impulse_response_r2_n2() {
        // R=2, N=2, j=1 reduces to 1 + 2z^-1 + z^-2
        let h = integrator_impulse_response(2, 2, 1).unwrap();
        assert_eq!(h, vec![1, 2, 1]);
    }

    #[test]
    fn test_impulse_response_length() {
        let h = integrator_impulse_response(16, 3, 2).unwrap();
        assert_eq!(h.len(), 15 * 3 + 2);
        let h = integrator_impulse_response(16, 3, 1).unwrap();
        assert_eq!(h.len(), 15 * 3 + 1);
    }

    #[test]
    fn test_single_stage_has_no_alternating_sum() {
        let norms = gain_norms(3, 1, &CombNormTable::default()).unwrap();
        assert_eq!(norms.len(), 3);
        assert_relative_eq!(norms[0], 3.0f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(norms[1], 2.0f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(norms[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_gain_norms_r16_n3() {
        let norms = gain_norms(16, 3, &CombNormTable::default()).unwrap();
        let expected = [
            760.0947309381903,
            64.1248781675256,
            9.797958971132712,
            20.0f64.sqrt(),
            6.0f64.sqrt(),
            2.0f64.sqrt(),
            1.0,
        ];
        assert_eq!(norms.len(), expected.len());
        for (f, e) in norms.iter().zip(expected) {
            assert_relative_eq!(*f, e, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_gain_norms_positive() {
        for stages in 1..=7 {
            for ratio in [2, 3, 8, 25] {
                let norms = gain_norms(ratio, stages, &CombNormTable::default()).unwrap();
                assert_eq!(norms.len(), 2 * stages as usize + 1);
                assert!(norms.iter().all(|f| *f > 0.0), "R={} N={}", ratio, stages);
            }
        }
    }

    #[test]
    fn test_norm_matches_collected_response() {
        for (ratio, stages, j) in [(2, 2, 1), (16, 3, 1), (16, 3, 2), (25, 5, 3)] {
            let energy: f64 = integrator_impulse_response(ratio, stages, j)
                .unwrap()
                .iter()
                .map(|&h| (h as f64) * (h as f64))
                .sum();
            let norm = integrator_norm(ratio, stages, j).unwrap();
            assert_relative_eq!(norm, energy.sqrt(), max_relative = 1e-12);
        }
    }

    #[test]
    fn test_gain_norms_rejects_degenerate_parameters() {
        let table = CombNormTable::default();
        assert!(matches!(gain_norms(16, 0, &table), Err(CicError::Config(_))));
        assert!(matches!(gain_norms(1, 3, &table), Err(CicError::Config(_))));
        assert!(matches!(gain_norms(0, 3, &table), Err(CicError::Config(_))));
        assert!(integrator_impulse_response(0, 3, 1).is_err());
        assert!(integrator_norm(16, 0, 1).is_err());
    }

    #[test]
    fn test_unsupported_stages() {
        assert_eq!(
            gain_norms(16, 8, &CombNormTable::default()),
            Err(CicError::UnsupportedStages {
                stages: 8,
                supported: 7
            })
        );
    }

    #[test]
    fn test_extended_table() {
        let mut squares = COMB_NORM_SQUARES.to_vec();
        squares.push(12870.0);
        let table = CombNormTable::new(squares).unwrap();
        assert_eq!(table.max_stages(), 8);

        let norms = gain_norms(4, 8, &table).unwrap();
        assert_eq!(norms.len(), 17);
        assert_relative_eq!(norms[8], 12870.0f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_table_rejects_bad_entries() {
        assert!(CombNormTable::new(vec![1.0]).is_err());
        assert!(CombNormTable::new(vec![1.0, 0.0]).is_err());
        assert!(CombNormTable::new(vec![1.0, f64::NAN]).is_err());
    }
}
