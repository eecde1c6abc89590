//! Loan-to-value deleverage trigger.
//!
//! Fires when a position's LTV rises above `triggerLtvBps` and sizes a
//! collateral sale that brings it back to `targetLtvBps`. Amounts are
//! truncated so that small drifts (interest accrual, price ticks) between
//! the solver's quote and the pre-hook do not change the order digest.

use alloy_primitives::{Address, U256};
use tracing::debug;

use super::ViewRegistry;
use crate::chain::ChainState;
use crate::domain::math::{self, BPS};
use crate::domain::{LtvTriggerParams, ProtocolId};
use crate::error::Result;
use crate::port::{ExecutionAmounts, Trigger, TriggerDecision};

/// Reason reported when the owner has no collateral.
pub const NO_POSITION: &str = "No position";

/// Reason reported when LTV is at or below the trigger threshold.
pub const BELOW_THRESHOLD: &str = "LTV below threshold";

/// Position figures the trigger decides on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LtvSnapshot {
    pub collateral_usd: U256,
    pub debt_usd: U256,
    pub ltv_bps: U256,
}

/// The LTV policy. Reads positions and prices through [`ViewRegistry`].
pub struct LtvTrigger {
    views: ViewRegistry,
}

impl LtvTrigger {
    #[must_use]
    pub fn new(views: ViewRegistry) -> Self {
        Self { views }
    }

    /// Current position of `owner` under `params`.
    ///
    /// # Errors
    ///
    /// Returns an error when no view is registered for the protocol or the
    /// position cannot be valued.
    pub fn snapshot(
        &self,
        state: &ChainState,
        owner: Address,
        params: &LtvTriggerParams,
    ) -> Result<LtvSnapshot> {
        let view = self.views.get(ProtocolId::new(params.protocolId))?;
        let position = view.position_value(state, owner, &params.protocolContext)?;
        Ok(LtvSnapshot {
            collateral_usd: position.collateral_usd,
            debt_usd: position.debt_usd,
            ltv_bps: math::ltv_bps(position.collateral_usd, position.debt_usd),
        })
    }

    /// USD value of debt to remove so LTV lands on the target:
    /// `(debt - target * collateral) / (1 - target)`.
    fn deleverage_usd(snapshot: &LtvSnapshot, target_bps: u16) -> U256 {
        let bps = U256::from(BPS);
        let target = U256::from(target_bps);
        let target_debt = math::mul_div(snapshot.collateral_usd, target, bps);
        if snapshot.debt_usd <= target_debt {
            return U256::ZERO;
        }
        math::mul_div(snapshot.debt_usd - target_debt, bps, bps - target)
    }
}

impl Trigger for LtvTrigger {
    fn name(&self) -> &'static str {
        "ltv"
    }

    fn validate(&self, static_data: &[u8]) -> Result<()> {
        let params = LtvTriggerParams::decode(static_data)?;
        self.views.get(ProtocolId::new(params.protocolId))?;
        Ok(())
    }

    fn should_execute(
        &self,
        state: &ChainState,
        owner: Address,
        static_data: &[u8],
    ) -> Result<TriggerDecision> {
        let params = LtvTriggerParams::decode(static_data)?;
        let snapshot = self.snapshot(state, owner, &params)?;
        if snapshot.collateral_usd.is_zero() {
            return Ok(TriggerDecision::hold(NO_POSITION));
        }
        if snapshot.ltv_bps <= U256::from(params.triggerLtvBps) {
            return Ok(TriggerDecision::hold(BELOW_THRESHOLD));
        }
        Ok(TriggerDecision::fire())
    }

    fn calculate_execution(
        &self,
        state: &ChainState,
        owner: Address,
        static_data: &[u8],
        iteration: u32,
    ) -> Result<ExecutionAmounts> {
        let params = LtvTriggerParams::decode(static_data)?;
        let snapshot = self.snapshot(state, owner, &params)?;
        let view = self.views.get(ProtocolId::new(params.protocolId))?;
        let collateral_price = view.asset_price(state, params.collateralToken)?;
        let debt_price = view.asset_price(state, params.debtToken)?;

        let divisor = u32::from(params.chunks());
        let usd = Self::deleverage_usd(&snapshot, params.targetLtvBps) / U256::from(divisor);

        let sell_amount = math::truncate(
            math::token_amount(usd, collateral_price, params.collateralDecimals),
            params.collateralDecimals,
        );
        // price the truncated sell amount, not the raw one, so buy stays stable
        let sell_usd = math::usd_value(sell_amount, collateral_price, params.collateralDecimals);
        let buy_amount = math::truncate(
            math::apply_haircut(
                math::token_amount(sell_usd, debt_price, params.debtDecimals),
                params.maxSlippageBps,
            ),
            params.debtDecimals,
        );

        debug!(
            %owner,
            ltv_bps = %snapshot.ltv_bps,
            iteration,
            divisor,
            %sell_amount,
            %buy_amount,
            "LTV execution sized"
        );
        Ok(ExecutionAmounts {
            sell_amount,
            buy_amount,
        })
    }

    fn is_complete(
        &self,
        state: &ChainState,
        owner: Address,
        static_data: &[u8],
        _iteration: u32,
    ) -> Result<bool> {
        let params = LtvTriggerParams::decode(static_data)?;
        let snapshot = self.snapshot(state, owner, &params)?;
        Ok(snapshot.collateral_usd.is_zero()
            || snapshot.ltv_bps <= U256::from(params.targetLtvBps))
    }
}
