//! Trigger port: pure "when and how much" policy for conditional orders.

use alloy_primitives::{Address, U256};

use crate::chain::ChainState;
use crate::error::Result;

/// Outcome of [`Trigger::should_execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerDecision {
    pub execute: bool,
    /// Why the trigger refused; empty when it fires.
    pub reason: String,
}

impl TriggerDecision {
    #[must_use]
    pub fn fire() -> Self {
        Self {
            execute: true,
            reason: String::new(),
        }
    }

    #[must_use]
    pub fn hold(reason: impl Into<String>) -> Self {
        Self {
            execute: false,
            reason: reason.into(),
        }
    }
}

/// Amounts of one trade iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionAmounts {
    pub sell_amount: U256,
    /// Minimum amount of the buy token accepted.
    pub buy_amount: U256,
}

/// Policy deciding whether an order should trade and for how much.
///
/// Implementations read state only; given the same state and inputs they
/// return the same answer.
pub trait Trigger: Send + Sync {
    /// Trigger name for logging.
    fn name(&self) -> &'static str;

    /// Check static data at order creation.
    ///
    /// # Errors
    ///
    /// Returns an error describing malformed static data.
    fn validate(&self, static_data: &[u8]) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if static data or the position cannot be read.
    fn should_execute(
        &self,
        state: &ChainState,
        owner: Address,
        static_data: &[u8],
    ) -> Result<TriggerDecision>;

    /// Amounts for iteration `iteration` (zero-based).
    ///
    /// # Errors
    ///
    /// Returns an error if static data or the position cannot be read.
    fn calculate_execution(
        &self,
        state: &ChainState,
        owner: Address,
        static_data: &[u8],
        iteration: u32,
    ) -> Result<ExecutionAmounts>;

    /// True when the order's goal has been reached after `iteration`
    /// completed iterations.
    ///
    /// # Errors
    ///
    /// Returns an error if static data or the position cannot be read.
    fn is_complete(
        &self,
        state: &ChainState,
        owner: Address,
        static_data: &[u8],
        iteration: u32,
    ) -> Result<bool>;
}
