//! Configuration for the CIC decimator width calculator.
//!
//! A [`FilterConfig`] can be built in code, or loaded from a TOML file:
//!
//! ```toml
//! ratio = 16
//! stages = 3
//! dtype = "signed"
//! input_bits = 16      # or: input_range = "-512-511"
//! output_bits = 16     # omit for full natural growth
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::constants::{MIN_RATIO, MIN_STAGES};
use crate::error::{CicError, Result};

/// Data type convention of the filter input and registers
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Signedness {
    /// Non-negative values only
    #[default]
    Unsigned,
    /// Two's complement values
    Signed,
}

impl fmt::Display for Signedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signedness::Unsigned => write!(f, "unsigned"),
            Signedness::Signed => write!(f, "signed"),
        }
    }
}

/// Inclusive range of input sample values
///
/// # Parsing format
/// `MIN-MAX` without spaces or with spaces around the separator, each bound
/// optionally signed. Reversed bounds are swapped.
///
/// # Example
/// ```
/// use cic_decimator::config::InputRange;
///
/// let range: InputRange = "-512-511".parse().unwrap();
/// assert_eq!((range.min, range.max), (-512, 511));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InputRange {
    pub min: i64,
    pub max: i64,
}

impl InputRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Full-scale range of a `bits` wide input
    ///
    /// Unsigned is `[0, 2^bits - 1]`, signed is `[-2^(bits-1), 2^(bits-1) - 1]`.
    pub fn from_bits(bits: u32, signedness: Signedness) -> Result<Self> {
        if !(1..=63).contains(&bits) {
            return Err(CicError::Config(format!(
                "input width must be between 1 and 63 bits, got {}",
                bits
            )));
        }
        Ok(match signedness {
            Signedness::Unsigned => Self::new(0, (1i64 << bits) - 1),
            Signedness::Signed => {
                let half = 1i64 << (bits - 1);
                Self::new(-half, half - 1)
            }
        })
    }
}

impl fmt::Display for InputRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

impl FromStr for InputRange {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || format!("invalid input range: {}", s);

        // The first bound may carry its own sign, so the separator is the
        // first '-' after its digits.
        let digits_start = usize::from(s.starts_with(['-', '+']));
        let digits_end = s[digits_start..]
            .find(|c: char| !c.is_ascii_digit())
            .map_or(s.len(), |i| i + digits_start);
        let (first, rest) = s.split_at(digits_end);
        let second = rest
            .trim_start()
            .strip_prefix('-')
            .ok_or_else(invalid)?
            .trim();

        let a: i64 = first.parse().map_err(|_| invalid())?;
        let b: i64 = second.parse().map_err(|_| invalid())?;
        Ok(Self::new(a.min(b), a.max(b)))
    }
}

/// Parameters of one CIC decimator
///
/// # Example
/// ```
/// use cic_decimator::config::{FilterConfig, InputRange, Signedness};
///
/// let config = FilterConfig::new(16, 3, InputRange::new(0, 65535), Signedness::Unsigned)
///     .with_output_bits(Some(16));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterConfig {
    /// Decimation ratio R (also the comb differential delay)
    pub ratio: u32,
    /// Number of integrator/comb pairs N
    pub stages: u32,
    /// Input value range
    pub input: InputRange,
    /// Data type of input and registers
    pub signedness: Signedness,
    /// Requested output width, `None` for full natural growth
    pub output_bits: Option<u32>,
}

impl FilterConfig {
    pub fn new(ratio: u32, stages: u32, input: InputRange, signedness: Signedness) -> Self {
        Self {
            ratio,
            stages,
            input,
            signedness,
            output_bits: None,
        }
    }

    pub fn with_ratio(&self, ratio: u32) -> Self {
        Self {
            ratio,
            ..self.clone()
        }
    }

    pub fn with_stages(&self, stages: u32) -> Self {
        Self {
            stages,
            ..self.clone()
        }
    }

    pub fn with_input(&self, input: InputRange) -> Self {
        Self {
            input,
            ..self.clone()
        }
    }

    pub fn with_signedness(&self, signedness: Signedness) -> Self {
        Self {
            signedness,
            ..self.clone()
        }
    }

    pub fn with_output_bits(&self, output_bits: Option<u32>) -> Self {
        Self {
            output_bits,
            ..self.clone()
        }
    }

    /// Check parameter ranges and the signedness of the input range
    ///
    /// # Errors
    /// - `CicError::Config` for a ratio below 2, zero stages or an inverted range
    /// - `CicError::SignednessConflict` for a negative bound on unsigned data
    /// - `CicError::InfeasibleOutput` for a zero output width
    pub fn validate(&self) -> Result<()> {
        if self.ratio < MIN_RATIO {
            return Err(CicError::Config(format!(
                "decimation ratio must be at least {}, got {}",
                MIN_RATIO, self.ratio
            )));
        }
        if self.stages < MIN_STAGES {
            return Err(CicError::Config(format!(
                "stage count must be at least {}, got {}",
                MIN_STAGES, self.stages
            )));
        }
        if self.input.min > self.input.max {
            return Err(CicError::Config(format!(
                "input range minimum {} exceeds maximum {}",
                self.input.min, self.input.max
            )));
        }
        if self.signedness == Signedness::Unsigned && (self.input.min < 0 || self.input.max < 0)
        {
            return Err(CicError::SignednessConflict {
                min: self.input.min.into(),
                max: self.input.max.into(),
            });
        }
        if self.output_bits == Some(0) {
            return Err(CicError::InfeasibleOutput {
                output_bits: 0,
                reason: "output must be at least one bit wide".to_string(),
            });
        }
        Ok(())
    }

    /// Parse and validate a TOML configuration
    pub fn from_toml_str(s: &str) -> Result<Self> {
        FilterConfigFile::from_toml_str(s)?.into_config()
    }

    /// Read, parse and validate a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        FilterConfigFile::from_file(path)?.into_config()
    }
}

/// Partially specified configuration, as found in a TOML file
///
/// Every field is optional so that command-line flags can be layered on top
/// with [`FilterConfigFile::overlay`] before conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfigFile {
    pub ratio: Option<u32>,
    pub stages: Option<u32>,
    pub dtype: Option<Signedness>,
    pub input_bits: Option<u32>,
    pub input_range: Option<String>,
    pub output_bits: Option<u32>,
}

impl FilterConfigFile {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| CicError::Config(format!("invalid TOML: {}", e)))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CicError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Replace fields of `self` with those set in `other`
    ///
    /// Setting either input field in `other` replaces both input fields.
    pub fn overlay(self, other: FilterConfigFile) -> Self {
        let other_has_input = other.input_bits.is_some() || other.input_range.is_some();
        Self {
            ratio: other.ratio.or(self.ratio),
            stages: other.stages.or(self.stages),
            dtype: other.dtype.or(self.dtype),
            input_bits: if other_has_input {
                other.input_bits
            } else {
                self.input_bits
            },
            input_range: if other_has_input {
                other.input_range
            } else {
                self.input_range
            },
            output_bits: other.output_bits.or(self.output_bits),
        }
    }

    /// Resolve defaults and validate
    ///
    /// `stages` defaults to 1 and `dtype` to unsigned; `ratio` and exactly one
    /// of `input_bits`/`input_range` are required.
    pub fn into_config(self) -> Result<FilterConfig> {
        let ratio = self
            .ratio
            .ok_or_else(|| CicError::Config("decimation ratio is required".to_string()))?;
        let signedness = self.dtype.unwrap_or_default();

        let input = match (self.input_bits, self.input_range.as_deref()) {
            (Some(bits), None) => InputRange::from_bits(bits, signedness)?,
            (None, Some(range)) => range.parse().map_err(CicError::Config)?,
            (Some(_), Some(_)) => {
                return Err(CicError::Config(
                    "input_bits and input_range are mutually exclusive".to_string(),
                ));
            }
            (None, None) => {
                return Err(CicError::Config(
                    "one of input_bits or input_range is required".to_string(),
                ));
            }
        };

        let config = FilterConfig {
            ratio,
            stages: self.stages.unwrap_or(MIN_STAGES),
            input,
            signedness,
            output_bits: self.output_bits,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> FilterConfig {
        FilterConfig::new(16, 3, InputRange::new(0, 65535), Signedness::Unsigned)
    }

    #[test]
    fn test_input_range_parse() {
        let range: InputRange = "0-65535".parse().unwrap();
        assert_eq!(range, InputRange::new(0, 65535));

        let range: InputRange = "-512-511".parse().unwrap();
        assert_eq!(range, InputRange::new(-512, 511));

        let range: InputRange = "-100 - -20".parse().unwrap();
        assert_eq!(range, InputRange::new(-100, -20));

        let range: InputRange = "+3-+7".parse().unwrap();
        assert_eq!(range, InputRange::new(3, 7));
    }

    #[test]
    fn test_input_range_parse_swaps_reversed_bounds() {
        let range: InputRange = "100 - 0".parse().unwrap();
        assert_eq!(range, InputRange::new(0, 100));
    }

    #[test]
    fn test_input_range_parse_invalid() {
        assert!("abc".parse::<InputRange>().is_err());
        assert!("100".parse::<InputRange>().is_err());
        assert!("1-".parse::<InputRange>().is_err());
        assert!("1:5".parse::<InputRange>().is_err());
    }

    #[test]
    fn test_input_range_from_bits() {
        assert_eq!(
            InputRange::from_bits(16, Signedness::Unsigned).unwrap(),
            InputRange::new(0, 65535)
        );
        assert_eq!(
            InputRange::from_bits(16, Signedness::Signed).unwrap(),
            InputRange::new(-32768, 32767)
        );
        assert_eq!(
            InputRange::from_bits(1, Signedness::Signed).unwrap(),
            InputRange::new(-1, 0)
        );
        assert!(InputRange::from_bits(0, Signedness::Unsigned).is_err());
        assert!(InputRange::from_bits(64, Signedness::Signed).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(base().validate().is_ok());
        assert!(base().with_ratio(1).validate().is_err());
        assert!(base().with_stages(0).validate().is_err());
        assert!(
            base()
                .with_input(InputRange::new(10, 5))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_validate_signedness_conflict() {
        let config = base().with_input(InputRange::new(-5, 5));
        assert_eq!(
            config.validate(),
            Err(CicError::SignednessConflict { min: -5, max: 5 })
        );
        assert!(
            config
                .with_signedness(Signedness::Signed)
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_validate_zero_output_width() {
        let err = base().with_output_bits(Some(0)).validate().unwrap_err();
        assert!(matches!(
            err,
            CicError::InfeasibleOutput { output_bits: 0, .. }
        ));
    }

    #[test]
    fn test_with_methods_leave_original_untouched() {
        let config = base();
        let changed = config.with_output_bits(Some(12)).with_ratio(8);
        assert_eq!(config.output_bits, None);
        assert_eq!(config.ratio, 16);
        assert_eq!(changed.output_bits, Some(12));
        assert_eq!(changed.ratio, 8);
    }

    #[test]
    fn test_from_toml_str() {
        let config = FilterConfig::from_toml_str(
            r#"
            ratio = 128
            stages = 3
            dtype = "signed"
            input_bits = 16
            output_bits = 16
            "#,
        )
        .unwrap();
        assert_eq!(config.ratio, 128);
        assert_eq!(config.stages, 3);
        assert_eq!(config.signedness, Signedness::Signed);
        assert_eq!(config.input, InputRange::new(-32768, 32767));
        assert_eq!(config.output_bits, Some(16));
    }

    #[test]
    fn test_from_toml_str_defaults_and_range() {
        let config = FilterConfig::from_toml_str(
            r#"
            ratio = 10
            input_range = "0-1000"
            "#,
        )
        .unwrap();
        assert_eq!(config.stages, 1);
        assert_eq!(config.signedness, Signedness::Unsigned);
        assert_eq!(config.input, InputRange::new(0, 1000));
        assert_eq!(config.output_bits, None);
    }

    #[test]
    fn test_from_toml_str_errors() {
        assert!(FilterConfig::from_toml_str("stages = 3\ninput_bits = 8").is_err());
        assert!(FilterConfig::from_toml_str("ratio = 8").is_err());
        assert!(
            FilterConfig::from_toml_str("ratio = 8\ninput_bits = 8\ninput_range = \"0-5\"")
                .is_err()
        );
        assert!(FilterConfig::from_toml_str("ratio = 8\ninput_bits = 8\nbogus = 1").is_err());
        assert!(matches!(
            FilterConfig::from_toml_str("ratio = 8\ninput_range = \"-5-5\""),
            Err(CicError::SignednessConflict { .. })
        ));
    }

    #[test]
    fn test_from_file_missing() {
        let err = FilterConfig::from_file(Path::new("/nonexistent/cic.toml")).unwrap_err();
        assert!(matches!(err, CicError::Config(ref msg) if msg.contains("cannot read")));
    }

    #[test]
    fn test_overlay() {
        let file = FilterConfigFile {
            ratio: Some(16),
            stages: Some(3),
            input_range: Some("0-255".to_string()),
            ..Default::default()
        };
        let cli = FilterConfigFile {
            stages: Some(5),
            input_bits: Some(12),
            ..Default::default()
        };
        let merged = file.overlay(cli);
        assert_eq!(merged.ratio, Some(16));
        assert_eq!(merged.stages, Some(5));
        assert_eq!(merged.input_bits, Some(12));
        assert_eq!(merged.input_range, None);

        let config = merged.into_config().unwrap();
        assert_eq!(config.input, InputRange::new(0, 4095));
    }
}
