use serde::Serialize;

use super::{Formatter, iso8601_timestamp};
use crate::calculator::CicDesign;
use crate::error::{CicError, Result};

pub struct JsonFormatter;

#[derive(Serialize)]
struct Report<'a> {
    generated: String,
    #[serde(flatten)]
    design: &'a CicDesign,
}

impl Formatter for JsonFormatter {
    fn format(&self, design: &CicDesign) -> Result<String> {
        let report = Report {
            generated: iso8601_timestamp(),
            design,
        };
        serde_json::to_string_pretty(&report).map_err(|e| CicError::Report(e.to_string()))
    }
}
