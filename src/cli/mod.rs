/// CLI layer: flag schemas, argument parsing and output formatting.
pub mod args;
pub mod output;

pub use args::Invocation;
pub use output::write_error;
