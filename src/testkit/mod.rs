//! Deterministic mocks of every external collaborator.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`tokens`] - Test tokens, accounts and unit helpers
//! - [`oracle`] - Storage-backed USD price oracle
//! - [`venue`] - Lending venue: gateway, view aggregator, delegation contract
//! - [`dex`] - Swap gateway at oracle prices
//! - [`flash`] - Flash lender with scripted misbehavior
//! - [`settlement`] - Settlement contract driving hooks and ERC-1271 checks
//! - [`scenario`] - Fully wired fixture

pub mod dex;
pub mod flash;
pub mod oracle;
pub mod scenario;
pub mod settlement;
pub mod tokens;
pub mod venue;
