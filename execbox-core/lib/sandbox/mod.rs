//! Sandbox lifecycle: provisioning, bounded execution, output collection and teardown.

mod collector;
mod guard;
mod orchestrator;
mod result;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use collector::*;
pub use guard::*;
pub use orchestrator::*;
pub use result::*;
