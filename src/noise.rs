//! Noise budget model
//!
//! Discarding `b` bits at the output adds uniform quantization noise with
//! variance `2^(2b) / 12` (in units of the internal LSB). Pruning inside the
//! filter may add at most this much in total.

use serde::Serialize;

use crate::constants::UNIFORM_NOISE_DIVISOR;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NoiseBudget {
    /// Bits discarded between the internal registers and the output
    pub bits_truncated: u32,
    /// Variance of the output truncation noise
    pub variance: f64,
    /// Standard deviation of the output truncation noise
    pub std_dev: f64,
}

impl NoiseBudget {
    /// Budget for truncating `internal_bits` down to `output_bits`
    ///
    /// Returns `None` when nothing is truncated, i.e. `output_bits >= internal_bits`.
    pub fn new(internal_bits: u32, output_bits: u32) -> Option<Self> {
        if output_bits >= internal_bits {
            return None;
        }
        let bits_truncated = internal_bits - output_bits;
        let variance = 2.0f64.powi(2 * bits_truncated as i32) / UNIFORM_NOISE_DIVISOR;
        let std_dev = variance.sqrt();

        log::debug!(
            "noise budget: {} bits truncated, sigma = {:.3}",
            bits_truncated,
            std_dev
        );

        Some(Self {
            bits_truncated,
            variance,
            std_dev,
        })
    }
}
