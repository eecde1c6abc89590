//! Read-only venue views consumed by triggers.

use alloy_primitives::{Address, U256};

use crate::chain::ChainState;
use crate::domain::ProtocolId;
use crate::error::Result;

/// Position of one owner, valued in USD with 8 decimals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionValue {
    pub collateral_usd: U256,
    pub debt_usd: U256,
}

/// Position and price queries for one venue.
pub trait ViewAggregator: Send + Sync {
    fn protocol_id(&self) -> ProtocolId;

    /// Collateral and debt of `owner`. `context` selects a market on venues
    /// that have several.
    ///
    /// # Errors
    ///
    /// Returns an error if the position cannot be valued.
    fn position_value(
        &self,
        state: &ChainState,
        owner: Address,
        context: &[u8],
    ) -> Result<PositionValue>;

    /// Price of one whole `token` in USD (8 decimals).
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::MissingPrice`](crate::error::TriggerError::MissingPrice)
    /// when no price is known.
    fn asset_price(&self, state: &ChainState, token: Address) -> Result<U256>;
}
