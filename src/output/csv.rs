use std::fmt::Write;

use super::{Formatter, format_range};
use crate::calculator::CicDesign;
use crate::error::Result;

pub struct CsvFormatter;

const HEADER: &str = "index,kind,gain_norm,pruned_bits,width,range";

impl Formatter for CsvFormatter {
    fn format(&self, design: &CicDesign) -> Result<String> {
        let mut out = String::from(HEADER);
        out.push('\n');
        for (stage, range) in design.stages.iter().zip(design.stage_ranges()) {
            let norm = stage
                .gain_norm
                .map_or(String::new(), |f| format!("{:.6}", f));
            let _ = writeln!(
                out,
                "{},{},{},{},{},{}",
                stage.index,
                stage.kind.as_str(),
                norm,
                stage.pruned_bits,
                stage.width,
                format_range(range)
            );
        }
        Ok(out)
    }
}
