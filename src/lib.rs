pub mod allocator;
pub mod calculator;
pub mod config;
pub mod constants;
pub mod error;
pub mod growth;
pub mod noise;
pub mod output;
pub mod response;

pub use calculator::{CicDesign, calculate, calculate_with_table};
pub use config::{FilterConfig, InputRange, Signedness};
pub use error::{CicError, Result};
