
/// Command line interface functionality
pub mod cli;
/// Contains various shared data types
pub mod data_types;
/// Tooling for parsing input files into meaningful structs / data
pub mod parsing;
/// Per-run collection that ties parsing, resolution, and statistics together
pub mod pipeline;
/// Linking runs to their lab reports
pub mod resolution;
/// Derived per-run statistics
pub mod stats;
/// Various utility functions that tend to be very generic
pub mod util;
/// All output writers
pub mod writers;
