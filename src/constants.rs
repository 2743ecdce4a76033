//! Numeric constants for the pruning calculation
//!
//! These constants define the precomputed comb norms and the noise model
//! used by the Hogenauer bit allocator.

/// Squared L2 norms of a cascade of 0..=7 comb stages seen from the output.
///
/// Entry `k` is the energy of the impulse response of `k` cascaded combs.
/// Index 7 holds 3424, not C(14, 7) = 3432.
pub const COMB_NORM_SQUARES: [f64; 8] = [1.0, 2.0, 6.0, 20.0, 70.0, 252.0, 924.0, 3424.0];

/// Variance denominator of uniformly distributed quantization error (q²/12).
pub const UNIFORM_NOISE_DIVISOR: f64 = 12.0;

/// Numerator of the per-stage share of the noise budget, 6/N.
pub const NOISE_SHARE_NUMERATOR: f64 = 6.0;

/// Smallest usable decimation ratio.
pub const MIN_RATIO: u32 = 2;

/// Smallest usable stage count.
pub const MIN_STAGES: u32 = 1;
