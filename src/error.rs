use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CicError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Signed input data range [{min}, {max}] with unsigned data type")]
    SignednessConflict { min: i128, max: i128 },

    #[error(
        "Unsupported stage count: {stages} stages requested, comb norm table covers at most {supported}"
    )]
    UnsupportedStages { stages: u32, supported: u32 },

    #[error("Infeasible output width: {output_bits} bits ({reason})")]
    InfeasibleOutput { output_bits: u32, reason: String },

    #[error("Report serialization failed: {0}")]
    Report(String),
}

pub type Result<T> = std::result::Result<T, CicError>;
