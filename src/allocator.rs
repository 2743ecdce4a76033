//! Bit allocator
//!
//! Turns gain norms and the noise budget into Hogenauer pruning counts.
//! Each pruning point may add an even share of the output truncation noise
//! after it has been amplified by that point's gain norm:
//!
//! ```text
//! B_j = floor(-log2(F_j) + log2(sigma) + log2(6 / N) / 2)
//! ```
//!
//! B_j counts the low bits dropped from the internal width at and before
//! point j, not the bits dropped at point j alone.

use serde::Serialize;

use crate::config::{FilterConfig, Signedness};
use crate::constants::NOISE_SHARE_NUMERATOR;
use crate::error::Result;
use crate::growth::{StageGrowth, representable_range};
use crate::noise::NoiseBudget;
use crate::response::{CombNormTable, gain_norms};

/// Role of a pruning point within the filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Integrator,
    /// Output of the last integrator, input of the first comb
    Transition,
    Comb,
}

impl StageKind {
    pub fn of(index: usize, stages: u32) -> Self {
        let n = stages as usize;
        if index < n {
            StageKind::Integrator
        } else if index == n {
            StageKind::Transition
        } else {
            StageKind::Comb
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Integrator => "integrator",
            StageKind::Transition => "transition",
            StageKind::Comb => "comb",
        }
    }
}

/// Width of one pruning point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSpec {
    pub index: usize,
    pub kind: StageKind,
    /// F_j, `None` when the filter is not pruned and no norm was needed
    pub gain_norm: Option<f64>,
    /// Cumulative low bits removed from the internal width
    pub pruned_bits: u32,
    /// Register width at this point
    pub width: u32,
}

impl StageSpec {
    /// Values the register at this point can hold
    pub fn value_range(&self, signedness: Signedness) -> Option<(i128, i128)> {
        representable_range(self.width, signedness)
    }
}

/// Result of bit allocation over all 2N+1 pruning points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    pub stages: Vec<StageSpec>,
    /// Width of the final stage
    pub output_bits: u32,
    /// Present only when bits are truncated
    pub noise_budget: Option<NoiseBudget>,
}

/// Pruning counts from gain norms, with the edge-case corrections applied
///
/// The last point is forced to the exact output truncation, the first point
/// is never pruned, and negative counts become zero.
pub fn pruned_bits(norms: &[f64], budget: &NoiseBudget, stages: u32) -> Vec<u32> {
    let log2_sigma = budget.std_dev.log2();
    let share = (NOISE_SHARE_NUMERATOR / f64::from(stages)).log2() / 2.0;

    let mut bits: Vec<i64> = norms
        .iter()
        .map(|f| (-f.log2() + log2_sigma + share).floor() as i64)
        .collect();

    if let Some(last) = bits.last_mut() {
        *last = i64::from(budget.bits_truncated);
    }
    if let Some(first) = bits.first_mut() {
        *first = 0;
    }

    bits.into_iter().map(|b| b.max(0) as u32).collect()
}

/// Allocate register widths for every pruning point
///
/// Unpruned filters (no output width, or one at least as wide as the internal
/// registers) skip the norm computation entirely.
pub fn allocate(
    config: &FilterConfig,
    growth: &StageGrowth,
    table: &CombNormTable,
) -> Result<Allocation> {
    let budget = config
        .output_bits
        .and_then(|bits| NoiseBudget::new(growth.internal_bits, bits));

    let Some(budget) = budget else {
        return Ok(unpruned(config, growth));
    };

    let norms = gain_norms(config.ratio, config.stages, table)?;
    let pruned = pruned_bits(&norms, &budget, config.stages);

    let stages: Vec<StageSpec> = norms
        .iter()
        .zip(&pruned)
        .enumerate()
        .map(|(index, (&norm, &bits))| StageSpec {
            index,
            kind: StageKind::of(index, config.stages),
            gain_norm: Some(norm),
            pruned_bits: bits,
            width: growth.internal_bits.saturating_sub(bits),
        })
        .collect();

    Ok(Allocation {
        output_bits: growth.internal_bits - budget.bits_truncated,
        stages,
        noise_budget: Some(budget),
    })
}

fn unpruned(config: &FilterConfig, growth: &StageGrowth) -> Allocation {
    let output_bits = config.output_bits.unwrap_or(growth.natural_output_bits);
    if output_bits > growth.internal_bits {
        log::warn!(
            "output width {} exceeds internal width {}, output will be sign/zero extended",
            output_bits,
            growth.internal_bits
        );
    }

    let count = 2 * config.stages as usize + 1;
    let stages = (0..count)
        .map(|index| StageSpec {
            index,
            kind: StageKind::of(index, config.stages),
            gain_norm: None,
            pruned_bits: 0,
            width: if index + 1 == count {
                output_bits
            } else {
                growth.internal_bits
            },
        })
        .collect();

    Allocation {
        stages,
        output_bits,
        noise_budget: None,
    }
}
