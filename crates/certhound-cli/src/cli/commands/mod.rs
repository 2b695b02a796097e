//! Command implementations.

pub mod inspect;
pub mod validate;

use crate::output::OutputFormat;

/// Shared state handed to every command.
pub struct Context {
    pub output_format: OutputFormat,
}
