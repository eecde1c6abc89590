//! ERC-1271 signature check and calldata entry points.

use alloy_primitives::{Address, Bytes, FixedBytes, B256};
use alloy_sol_types::{SolInterface, SolValue};
use tracing::{debug, warn};

use super::OrderManager;
use crate::chain::abi::{ConditionalOrderParams, IOrderManager::IOrderManagerCalls};
use crate::chain::ChainState;
use crate::domain::trade::{ERC1271_INVALID, ERC1271_MAGIC_VALUE};
use crate::error::{OrderError, Result};
use crate::port::Contract;

impl OrderManager {
    /// Signature payload the settlement passes back to
    /// [`Self::is_valid_signature`]: the manager, the salt and the user.
    #[must_use]
    pub fn encode_signature(&self, user: Address, salt: B256) -> Bytes {
        ConditionalOrderParams {
            handler: self.address,
            salt,
            staticInput: user.abi_encode().into(),
        }
        .abi_encode()
        .into()
    }

    /// Recompute the order's current trade and compare its digest.
    ///
    /// Returns the ERC-1271 magic value on a match and `0xffffffff` when the
    /// digest differs.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed signatures, a foreign handler, or when
    /// the order has no tradeable trade.
    pub fn is_valid_signature(
        &self,
        state: &ChainState,
        digest: B256,
        signature: &[u8],
    ) -> Result<FixedBytes<4>> {
        let params = ConditionalOrderParams::abi_decode(signature)?;
        if params.handler != self.address {
            return Err(OrderError::InvalidOrderParams(format!(
                "signature names handler {}",
                params.handler
            ))
            .into());
        }
        let user = Address::abi_decode(&params.staticInput)?;
        let trade = self.get_tradeable_order(state, user, params.salt)?;
        let expected = trade.digest(&self.domain(state));
        if expected == digest {
            debug!(manager = %self.address, %user, salt = %params.salt, "Signature valid");
            Ok(ERC1271_MAGIC_VALUE)
        } else {
            warn!(
                manager = %self.address,
                %user,
                %digest,
                %expected,
                "Signature digest mismatch"
            );
            Ok(ERC1271_INVALID)
        }
    }
}

impl Contract for OrderManager {
    fn address(&self) -> Address {
        self.address
    }

    fn call(&self, state: &mut ChainState, sender: Address, data: &[u8]) -> Result<Bytes> {
        match IOrderManagerCalls::abi_decode(data)? {
            IOrderManagerCalls::executePreHookBySalt(c) => {
                self.execute_pre_hook_by_salt(state, sender, c.user, c.salt)?;
                Ok(Bytes::new())
            }
            IOrderManagerCalls::executePostHookBySalt(c) => {
                self.execute_post_hook_by_salt(state, sender, c.user, c.salt)?;
                Ok(Bytes::new())
            }
            IOrderManagerCalls::fundOrderBySalt(c) => {
                self.fund_order_by_salt(state, sender, c.user, c.salt, c.token, c.amount)?;
                Ok(Bytes::new())
            }
            IOrderManagerCalls::fundOrderWithBalance(c) => {
                self.fund_order_with_balance(state, sender, c.user, c.salt, c.token)?;
                Ok(Bytes::new())
            }
            IOrderManagerCalls::isValidSignature(c) => {
                let magic = self.is_valid_signature(state, c.hash, &c.signature)?;
                Ok(magic.abi_encode().into())
            }
        }
    }
}
