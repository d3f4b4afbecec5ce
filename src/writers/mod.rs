/*!
# Writers module
Contains the logic for writing the output files.
*/
/// Generates the per-run statistics table
pub mod statistics_table;
