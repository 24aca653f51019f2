//! `execbox_utils` is a library containing shared constants and helpers for the execbox project.

#![warn(missing_docs)]

pub mod defaults;
pub mod env;
pub mod term;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use defaults::*;
pub use env::*;
pub use term::*;
