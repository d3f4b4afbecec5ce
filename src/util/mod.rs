
/// Helper functions for read/writing JSON via serde
pub mod json_io;
/// Helper functions for generating the progress bars
pub mod progress_bar;
/// Decimal rounding that matches the facility reporting precision
pub mod rounding;
