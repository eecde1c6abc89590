//! Infrastructure layer.
//!
//! Configuration, logging and the composition root that wires the
//! application components together.
//!
//! # Submodules
//!
//! - [`config`] - Configuration loading and validation
//! - [`deployment`] - Composition root for a router, manager and trampoline

pub mod config;
pub mod deployment;
