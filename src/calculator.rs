use serde::Serialize;

use crate::allocator::{StageSpec, allocate};
use crate::config::FilterConfig;
use crate::error::Result;
use crate::growth::StageGrowth;
use crate::noise::NoiseBudget;
use crate::response::CombNormTable;

/// Complete register-width plan of one CIC decimator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CicDesign {
    pub config: FilterConfig,
    pub growth: StageGrowth,
    /// Width of the filter output
    pub output_bits: u32,
    /// Present only when the filter is pruned
    pub noise_budget: Option<NoiseBudget>,
    /// Pruning points 0..=2N, first integrator to last comb
    pub stages: Vec<StageSpec>,
    /// Sum of pruned bits over all pruning points
    pub total_bits_saved: u32,
}

impl CicDesign {
    pub fn internal_bits(&self) -> u32 {
        self.growth.internal_bits
    }

    pub fn widths(&self) -> Vec<u32> {
        self.stages.iter().map(|s| s.width).collect()
    }

    pub fn pruned_bits(&self) -> Vec<u32> {
        self.stages.iter().map(|s| s.pruned_bits).collect()
    }

    pub fn is_pruned(&self) -> bool {
        self.noise_budget.is_some()
    }

    /// Value ranges of each pruning point's register
    pub fn stage_ranges(&self) -> Vec<Option<(i128, i128)>> {
        self.stages
            .iter()
            .map(|s| s.value_range(self.config.signedness))
            .collect()
    }
}

/// Compute register widths with the default comb norm table
///
/// # Example
/// ```
/// use cic_decimator::calculate;
/// use cic_decimator::config::{FilterConfig, InputRange, Signedness};
///
/// let config = FilterConfig::new(16, 3, InputRange::new(0, 65535), Signedness::Unsigned)
///     .with_output_bits(Some(16));
/// let design = calculate(&config).unwrap();
/// assert_eq!(design.widths(), vec![28, 24, 21, 20, 19, 18, 16]);
/// ```
pub fn calculate(config: &FilterConfig) -> Result<CicDesign> {
    calculate_with_table(config, &CombNormTable::default())
}

/// Compute register widths using a caller supplied comb norm table
///
/// # Errors
/// Returns any configuration, signedness, stage count or output width error;
/// see [`crate::CicError`].
pub fn calculate_with_table(config: &FilterConfig, table: &CombNormTable) -> Result<CicDesign> {
    config.validate()?;

    let growth = StageGrowth::new(config)?;
    let allocation = allocate(config, &growth, table)?;
    let total_bits_saved = allocation.stages.iter().map(|s| s.pruned_bits).sum();

    log::info!(
        "R={} N={} {}: internal {} bits, output {} bits, {} bits saved",
        config.ratio,
        config.stages,
        config.signedness,
        growth.internal_bits,
        allocation.output_bits,
        total_bits_saved
    );

    Ok(CicDesign {
        config: config.clone(),
        growth,
        output_bits: allocation.output_bits,
        noise_budget: allocation.noise_budget,
        stages: allocation.stages,
        total_bits_saved,
    })
}
