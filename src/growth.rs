//! Stage growth model
//!
//! Register widths needed to hold a range of integers, and the bit growth
//! of an N stage decimator with ratio R (DC gain R^N).

use serde::Serialize;

use crate::config::{FilterConfig, Signedness};
use crate::error::{CicError, Result};

/// Number of bits needed for the magnitude of `v`
pub fn bit_length(v: u128) -> u32 {
    u128::BITS - v.leading_zeros()
}

/// Two's complement width of a single value, including the sign bit
pub fn signed_bit_length(v: i128) -> u32 {
    if v >= 0 {
        bit_length(v as u128) + 1
    } else {
        bit_length(!v as u128) + 1
    }
}

/// Minimal register width holding every value of `[min, max]`
///
/// # Errors
/// Returns `CicError::SignednessConflict` for a negative bound with unsigned data.
pub fn range_bits(min: i128, max: i128, signedness: Signedness) -> Result<u32> {
    match signedness {
        Signedness::Unsigned => {
            if min < 0 || max < 0 {
                return Err(CicError::SignednessConflict { min, max });
            }
            Ok(bit_length(max as u128).max(1))
        }
        Signedness::Signed => Ok(signed_bit_length(min).max(signed_bit_length(max))),
    }
}

/// Values representable in a `width` bit register, `None` if outside i128
pub fn representable_range(width: u32, signedness: Signedness) -> Option<(i128, i128)> {
    match signedness {
        Signedness::Unsigned if (1..=127).contains(&width) => {
            Some((0, i128::MAX >> (127 - width)))
        }
        Signedness::Signed if (1..=128).contains(&width) => {
            let max = i128::MAX >> (128 - width);
            Some((-max - 1, max))
        }
        _ => None,
    }
}

/// Natural (unpruned) widths and ranges of a decimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageGrowth {
    /// DC gain R^N
    pub gain: u128,
    /// Width of the input range
    pub input_bits: u32,
    /// ceil(log2(R^N))
    pub growth_bits: u32,
    /// Widest register of the filter, input_bits + growth_bits
    pub internal_bits: u32,
    /// Smallest possible output value
    pub output_min: i128,
    /// Largest possible output value
    pub output_max: i128,
    /// Exact width of the output range
    pub natural_output_bits: u32,
}

impl StageGrowth {
    /// Derive growth for a configuration
    ///
    /// # Errors
    /// - any error of [`FilterConfig::validate`]
    /// - `CicError::Config` if R^N or the output range overflows 128-bit arithmetic
    pub fn new(config: &FilterConfig) -> Result<Self> {
        config.validate()?;

        let overflow = || {
            CicError::Config(format!(
                "ratio {} with {} stages exceeds 128-bit range arithmetic",
                config.ratio, config.stages
            ))
        };

        let gain = u128::from(config.ratio)
            .checked_pow(config.stages)
            .ok_or_else(overflow)?;
        let signed_gain = i128::try_from(gain).map_err(|_| overflow())?;

        let input_min = i128::from(config.input.min);
        let input_max = i128::from(config.input.max);
        let output_min = input_min.checked_mul(signed_gain).ok_or_else(overflow)?;
        let output_max = input_max.checked_mul(signed_gain).ok_or_else(overflow)?;

        let input_bits = range_bits(input_min, input_max, config.signedness)?;
        let natural_output_bits = range_bits(output_min, output_max, config.signedness)?;

        // Exact ceil(log2(gain)) for gain >= 2
        let growth_bits = bit_length(gain - 1);
        let msb_index = input_bits + growth_bits - 1;
        let internal_bits = msb_index + 1;

        log::debug!(
            "growth: R^N={} input_bits={} growth_bits={} internal_bits={} output=[{}, {}]",
            gain,
            input_bits,
            growth_bits,
            internal_bits,
            output_min,
            output_max
        );

        Ok(Self {
            gain,
            input_bits,
            growth_bits,
            internal_bits,
            output_min,
            output_max,
            natural_output_bits,
        })
    }

    /// Index of the most significant internal bit
    pub fn msb_index(&self) -> u32 {
        self.internal_bits - 1
    }
}
