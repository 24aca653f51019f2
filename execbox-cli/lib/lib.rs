//! `execbox_cli` holds the argument definitions and error types of the `execbox` binary.

#![warn(missing_docs)]

mod args;
mod error;
mod styles;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use args::*;
pub use error::*;
pub use styles::*;
