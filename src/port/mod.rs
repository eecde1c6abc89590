//! Trait definitions (hexagonal ports). Depend only on domain and the chain model.
//!
//! Ports are the seams where external collaborators plug in: lending venues,
//! price views, flash lenders, trigger policies and calldata-addressable
//! contracts. Production adapters for real venues live outside this crate;
//! the `testkit` feature ships deterministic mocks.
//!
//! # Available Ports
//!
//! - [`Gateway`] - One lending venue executing primitive operations
//! - [`ViewAggregator`] - Position values and asset prices per venue
//! - [`FlashLender`] - Flash-loan liquidity
//! - [`Trigger`] - Conditional order policy
//! - [`Contract`] - Calldata dispatch target

mod contract;
mod flash_loan;
mod gateway;
mod trigger;
mod view;

pub use contract::Contract;
pub use flash_loan::{FlashLender, FlashLoanCallback, FlashLoanHandler};
pub use gateway::{Authorization, Gateway, GatewayCall};
pub use trigger::{ExecutionAmounts, Trigger, TriggerDecision};
pub use view::{PositionValue, ViewAggregator};
