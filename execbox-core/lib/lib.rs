//! `execbox` runs untrusted code snippets inside throwaway, resource-capped containers.
//!
//! # Overview
//!
//! Given a language identifier and a snippet, execbox:
//! - Resolves the language to an execution profile (image, entry file, run command)
//! - Provisions one isolated execution unit with a memory ceiling and no network
//! - Runs it to completion or until the wall-clock timeout fires
//! - Collects the combined stdout/stderr and the exit code
//! - Force-removes the unit on every exit path
//!
//! # Modules
//!
//! - [`config`] - Resource limits applied to every execution unit
//! - [`registry`] - Language profile registry
//! - [`runtime`] - The container runtime boundary and its Docker implementation
//! - [`sandbox`] - Orchestrator, result collector and unit guard

#![warn(missing_docs)]

mod error;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub mod config;
pub mod registry;
pub mod runtime;
pub mod sandbox;

pub use error::*;
