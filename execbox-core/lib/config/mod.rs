//! Configuration types and helpers.

mod limits;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use limits::*;
