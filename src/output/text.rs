use std::fmt::Write;

use super::{Formatter, format_range, iso8601_timestamp};
use crate::calculator::CicDesign;
use crate::error::Result;

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, design: &CicDesign) -> Result<String> {
        let config = &design.config;
        let growth = &design.growth;
        let mut out = String::new();

        let _ = writeln!(out, "CIC decimator widths ({})", iso8601_timestamp());
        let _ = writeln!(
            out,
            "Ratio: {}  Stages: {}  Type: {}  Input: {} ({} bits)",
            config.ratio, config.stages, config.signedness, config.input, growth.input_bits
        );
        let _ = writeln!(
            out,
            "Internal: {} bits (growth {})  Output: {} bits",
            growth.internal_bits, growth.growth_bits, design.output_bits
        );
        if self.verbose {
            let _ = writeln!(
                out,
                "Output range: [{}, {}]  Natural output width: {} bits",
                growth.output_min, growth.output_max, growth.natural_output_bits
            );
            if let Some(budget) = design.noise_budget {
                let _ = writeln!(
                    out,
                    "Noise budget: {} bits truncated, variance {:.4e}, sigma {:.4e}",
                    budget.bits_truncated, budget.variance, budget.std_dev
                );
            }
        }
        out.push('\n');

        let _ = writeln!(
            out,
            "{:>5}  {:<10}  {:>14}  {:>6}  {:>5}  range",
            "stage", "kind", "F_j", "pruned", "width"
        );
        for (stage, range) in design.stages.iter().zip(design.stage_ranges()) {
            let norm = stage
                .gain_norm
                .map_or("-".to_string(), |f| format!("{:.4}", f));
            let _ = writeln!(
                out,
                "{:>5}  {:<10}  {:>14}  {:>6}  {:>5}  {}",
                stage.index,
                stage.kind.as_str(),
                norm,
                stage.pruned_bits,
                stage.width,
                format_range(range)
            );
        }
        out.push('\n');
        let _ = writeln!(out, "Total bits saved: {}", design.total_bits_saved);

        Ok(out)
    }
}
