//! ERC-20 style balances and allowances for every token on the chain.

use std::collections::{BTreeMap, HashMap};

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolInterface, SolValue};
use tracing::trace;

use super::abi::IERC20;
use crate::error::LedgerError;

/// Metadata of a registered token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub symbol: String,
    pub decimals: u8,
}

/// Balances, allowances and token metadata.
#[derive(Debug, Clone, Default)]
pub struct TokenLedger {
    tokens: HashMap<Address, TokenInfo>,
    balances: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address, Address), U256>,
}

impl TokenLedger {
    /// Register a token so it can be minted and moved.
    pub fn register(&mut self, token: Address, symbol: impl Into<String>, decimals: u8) {
        self.tokens.insert(
            token,
            TokenInfo {
                symbol: symbol.into(),
                decimals,
            },
        );
    }

    #[must_use]
    pub fn is_registered(&self, token: Address) -> bool {
        self.tokens.contains_key(&token)
    }

    /// Decimals of a registered token.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownToken`] for unregistered tokens.
    pub fn decimals(&self, token: Address) -> Result<u8, LedgerError> {
        self.info(token).map(|info| info.decimals)
    }

    /// Metadata of a registered token.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownToken`] for unregistered tokens.
    pub fn info(&self, token: Address) -> Result<&TokenInfo, LedgerError> {
        self.tokens
            .get(&token)
            .ok_or(LedgerError::UnknownToken(token))
    }

    #[must_use]
    pub fn balance_of(&self, token: Address, holder: Address) -> U256 {
        self.balances
            .get(&(token, holder))
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    /// Non-zero balances held by `holder`, ordered by token.
    #[must_use]
    pub fn holdings(&self, holder: Address) -> BTreeMap<Address, U256> {
        self.balances
            .iter()
            .filter(|((_, owner), amount)| *owner == holder && !amount.is_zero())
            .map(|((token, _), amount)| (*token, *amount))
            .collect()
    }

    /// Create `amount` of `token` out of thin air.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownToken`] for unregistered tokens.
    pub fn mint(&mut self, token: Address, to: Address, amount: U256) -> Result<(), LedgerError> {
        self.info(token)?;
        let balance = self.balances.entry((token, to)).or_default();
        *balance = balance.saturating_add(amount);
        Ok(())
    }

    /// Destroy `amount` of `token` held by `from`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientBalance`] when `from` holds less.
    pub fn burn(&mut self, token: Address, from: Address, amount: U256) -> Result<(), LedgerError> {
        self.debit(token, from, amount)
    }

    /// Move tokens between holders.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown tokens or when `from` holds less than `amount`.
    pub fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        self.info(token)?;
        if amount.is_zero() {
            return Ok(());
        }
        self.debit(token, from, amount)?;
        let balance = self.balances.entry((token, to)).or_default();
        *balance = balance.saturating_add(amount);
        trace!(%token, %from, %to, %amount, "transfer");
        Ok(())
    }

    /// Set the allowance of `spender` over `owner`'s tokens.
    pub fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: U256) {
        if amount.is_zero() {
            self.allowances.remove(&(token, owner, spender));
        } else {
            self.allowances.insert((token, owner, spender), amount);
        }
    }

    /// Move tokens on behalf of `from`, spending `spender`'s allowance.
    ///
    /// An allowance of `U256::MAX` is never decreased.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientAllowance`] or a transfer error.
    pub fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        if spender != from {
            let allowed = self.allowance(token, from, spender);
            if allowed < amount {
                return Err(LedgerError::InsufficientAllowance {
                    token,
                    owner: from,
                    spender,
                    needed: amount,
                    available: allowed,
                });
            }
            if allowed != U256::MAX {
                self.approve(token, from, spender, allowed - amount);
            }
        }
        self.transfer(token, from, to, amount)
    }

    /// Apply raw ERC-20 calldata sent by `sender` to `token`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnsupportedCall`] for calldata outside the
    /// ERC-20 surface or for unregistered tokens, otherwise the ledger error
    /// of the operation.
    pub fn apply_call(
        &mut self,
        token: Address,
        sender: Address,
        data: &[u8],
    ) -> Result<Bytes, LedgerError> {
        if !self.is_registered(token) {
            return Err(LedgerError::UnsupportedCall {
                target: token,
                reason: "no contract or token at address".into(),
            });
        }
        let call = IERC20::IERC20Calls::abi_decode(data).map_err(|e| {
            LedgerError::UnsupportedCall {
                target: token,
                reason: e.to_string(),
            }
        })?;

        let ret = match call {
            IERC20::IERC20Calls::approve(c) => {
                self.approve(token, sender, c.spender, c.amount);
                true.abi_encode()
            }
            IERC20::IERC20Calls::transfer(c) => {
                self.transfer(token, sender, c.to, c.amount)?;
                true.abi_encode()
            }
            IERC20::IERC20Calls::transferFrom(c) => {
                self.transfer_from(token, sender, c.from, c.to, c.amount)?;
                true.abi_encode()
            }
            IERC20::IERC20Calls::balanceOf(c) => self.balance_of(token, c.owner).abi_encode(),
            IERC20::IERC20Calls::allowance(c) => {
                self.allowance(token, c.owner, c.spender).abi_encode()
            }
        };
        Ok(Bytes::from(ret))
    }

    fn debit(&mut self, token: Address, from: Address, amount: U256) -> Result<(), LedgerError> {
        let available = self.balance_of(token, from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                token,
                holder: from,
                needed: amount,
                available,
            });
        }
        let remaining = available - amount;
        if remaining.is_zero() {
            self.balances.remove(&(token, from));
        } else {
            self.balances.insert((token, from), remaining);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolCall;

    const TOKEN: Address = Address::repeat_byte(0x01);
    const ALICE: Address = Address::repeat_byte(0xaa);
    const BOB: Address = Address::repeat_byte(0xbb);

    fn ledger() -> TokenLedger {
        let mut ledger = TokenLedger::default();
        ledger.register(TOKEN, "TKN", 18);
        ledger.mint(TOKEN, ALICE, U256::from(100)).unwrap();
        ledger
    }

    #[test]
    fn transfer_moves_balance() {
        let mut ledger = ledger();
        ledger.transfer(TOKEN, ALICE, BOB, U256::from(40)).unwrap();
        assert_eq!(ledger.balance_of(TOKEN, ALICE), U256::from(60));
        assert_eq!(ledger.balance_of(TOKEN, BOB), U256::from(40));

        let err = ledger.transfer(TOKEN, BOB, ALICE, U256::from(41)).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
    }

    #[test]
    fn transfer_from_spends_allowance() {
        let mut ledger = ledger();
        ledger.approve(TOKEN, ALICE, BOB, U256::from(30));
        ledger
            .transfer_from(TOKEN, BOB, ALICE, BOB, U256::from(20))
            .unwrap();
        assert_eq!(ledger.allowance(TOKEN, ALICE, BOB), U256::from(10));

        let err = ledger
            .transfer_from(TOKEN, BOB, ALICE, BOB, U256::from(11))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientAllowance { .. }));
    }

    #[test]
    fn applies_erc20_calldata() {
        let mut ledger = ledger();
        let data = IERC20::approveCall {
            spender: BOB,
            amount: U256::MAX,
        }
        .abi_encode();
        ledger.apply_call(TOKEN, ALICE, &data).unwrap();
        assert_eq!(ledger.allowance(TOKEN, ALICE, BOB), U256::MAX);

        let data = IERC20::balanceOfCall { owner: ALICE }.abi_encode();
        let ret = ledger.apply_call(TOKEN, BOB, &data).unwrap();
        assert_eq!(U256::abi_decode(&ret).unwrap(), U256::from(100));

        assert!(matches!(
            ledger.apply_call(Address::repeat_byte(0x99), ALICE, &data),
            Err(LedgerError::UnsupportedCall { .. })
        ));
    }

    #[test]
    fn holdings_skip_empty_balances() {
        let mut ledger = ledger();
        ledger.transfer(TOKEN, ALICE, BOB, U256::from(100)).unwrap();
        assert!(ledger.holdings(ALICE).is_empty());
        assert_eq!(ledger.holdings(BOB).get(&TOKEN), Some(&U256::from(100)));
    }
}
