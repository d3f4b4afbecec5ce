
/// Settings for the collect subcommand
pub mod collect;
/// Core CLI functionality, e.g. shared functions
pub mod core;
/// Settings for the resolve subcommand
pub mod resolve;
