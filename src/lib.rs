//! Lendflow - atomic multi-venue lending instructions and trigger-gated
//! conditional orders.
//!
//! # Architecture
//!
//! - **Router** ([`application::router`]) threads an explicitly indexed arena
//!   of outputs through a list of [`domain::Instruction`]s against registered
//!   lending gateways and flash lenders. Execution is all-or-nothing and the
//!   router ends every execution holding exactly what it held before.
//! - **Order manager** ([`application::order`]) stores standing orders whose
//!   size and timing come from a [`port::Trigger`] policy, and drives the
//!   router from pre- and post-settlement hooks called through the
//!   [`application::hooks::HooksTrampoline`]. Order validity is proven to the
//!   settlement with an ERC-1271 check over the EIP-712 trade digest.
//! - **LTV trigger** ([`application::trigger::LtvTrigger`]) deleverages a
//!   position back to a target loan-to-value ratio, optionally in chunks.
//!
//! Everything runs against [`chain::ChainState`], an explicit model of the
//! chain with snapshot-based atomic transactions.
//!
//! # Modules
//!
//! - [`adapter`] - CLI
//! - [`application`] - Router, order manager, triggers, hooks, watcher
//! - [`chain`] - Token ledger, chain state and calldata dispatch
//! - [`domain`] - Instructions, outputs, orders, trades, appData, math
//! - [`error`] - Error types for the crate
//! - [`infrastructure`] - Configuration, logging and deployment wiring
//! - [`port`] - Traits external collaborators implement
//!
//! # Features
//!
//! - `testkit` - Deterministic mock venues, DEX, flash lender and settlement

pub mod adapter;
pub mod application;
pub mod chain;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
