//! ABI-encoded parameters of the loan-to-value trigger.

use alloy_primitives::Bytes;
use alloy_sol_types::SolValue;

use crate::domain::math::BPS;
use crate::error::TriggerError;

alloy_sol_types::sol! {
    /// Static data of an LTV deleverage order.
    #[derive(Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
    struct LtvTriggerParams {
        uint8 protocolId;
        bytes protocolContext;
        uint16 triggerLtvBps;
        uint16 targetLtvBps;
        address collateralToken;
        address debtToken;
        uint8 collateralDecimals;
        uint8 debtDecimals;
        uint16 maxSlippageBps;
        uint8 numChunks;
    }
}

impl LtvTriggerParams {
    /// ABI-encode for storage in an order.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        Bytes::from(SolValue::abi_encode(self))
    }

    /// Decode and validate static data.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::InvalidParams`] if the bytes do not decode or
    /// the thresholds are inconsistent.
    pub fn decode(data: &[u8]) -> Result<Self, TriggerError> {
        let params = <Self as SolValue>::abi_decode(data)
            .map_err(|e| TriggerError::InvalidParams(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Check thresholds and token fields.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::InvalidParams`] describing the first problem found.
    pub fn validate(&self) -> Result<(), TriggerError> {
        let bps = BPS as u16;
        if self.triggerLtvBps == 0 || self.triggerLtvBps >= bps {
            return Err(TriggerError::InvalidParams(format!(
                "trigger LTV {} bps out of range",
                self.triggerLtvBps
            )));
        }
        if self.targetLtvBps >= self.triggerLtvBps {
            return Err(TriggerError::InvalidParams(format!(
                "target LTV {} bps must be below trigger {} bps",
                self.targetLtvBps, self.triggerLtvBps
            )));
        }
        if self.maxSlippageBps >= bps {
            return Err(TriggerError::InvalidParams(format!(
                "slippage {} bps out of range",
                self.maxSlippageBps
            )));
        }
        if self.collateralToken.is_zero() || self.debtToken.is_zero() {
            return Err(TriggerError::InvalidParams("zero token address".into()));
        }
        if self.collateralToken == self.debtToken {
            return Err(TriggerError::InvalidParams(
                "collateral and debt token must differ".into(),
            ));
        }
        if self.collateralDecimals > 36 || self.debtDecimals > 36 {
            return Err(TriggerError::InvalidParams("decimals above 36".into()));
        }
        Ok(())
    }

    /// Chunks the deleverage is split into; zero counts as one.
    #[must_use]
    pub fn chunks(&self) -> u8 {
        self.numChunks.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    fn params() -> LtvTriggerParams {
        LtvTriggerParams {
            protocolId: 1,
            protocolContext: Bytes::from_static(b"market-a"),
            triggerLtvBps: 2_500,
            targetLtvBps: 2_202,
            collateralToken: Address::repeat_byte(1),
            debtToken: Address::repeat_byte(2),
            collateralDecimals: 18,
            debtDecimals: 6,
            maxSlippageBps: 50,
            numChunks: 0,
        }
    }

    #[test]
    fn round_trips_through_abi() {
        let p = params();
        assert_eq!(LtvTriggerParams::decode(&p.encode()).unwrap(), p);

        let mut chunked = params();
        chunked.numChunks = 7;
        chunked.protocolContext = Bytes::new();
        assert_eq!(LtvTriggerParams::decode(&chunked.encode()).unwrap(), chunked);
    }

    #[test]
    fn rejects_target_above_trigger() {
        let mut p = params();
        p.targetLtvBps = 2_600;
        assert!(matches!(
            LtvTriggerParams::decode(&p.encode()),
            Err(TriggerError::InvalidParams(_))
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(LtvTriggerParams::decode(&[1, 2, 3]).is_err());
    }

    #[test]
    fn zero_chunks_counts_as_one() {
        assert_eq!(params().chunks(), 1);
    }
}
