pub mod file_format;
pub mod file_utils;
pub mod log_setup;
pub mod parallel;

pub use file_format::{deserialize, SerdeFormat, SerdeFormatError};
pub use log_setup::setup_logging;
