/*!
# Parsing module
Contains the logic for parsing input files into meaningful structs / data.
*/
/// bcl2fastq / multiqc demultiplexing outputs of a run folder
pub mod demux_stats;
/// Report documents and the loaders that produce them
pub mod document;
/// Field extraction from loaded reports
pub mod report_parser;
