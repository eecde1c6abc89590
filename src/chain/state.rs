//! The simulated chain every component reads and mutates.

use alloy_primitives::{Address, B256, U256};
use std::collections::HashMap;

use super::ledger::TokenLedger;
use crate::domain::{Event, OrderStore};

/// Current block number and timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEnv {
    pub number: u64,
    pub timestamp: u64,
}

/// Complete chain state: tokens, contract storage, orders and the event log.
///
/// All mutation entry points run inside [`ChainState::transact`], which
/// restores the previous state when the closure fails.
#[derive(Debug, Clone)]
pub struct ChainState {
    chain_id: u64,
    pub block: BlockEnv,
    pub tokens: TokenLedger,
    pub orders: OrderStore,
    storage: HashMap<(Address, B256), U256>,
    events: Vec<Event>,
}

impl ChainState {
    #[must_use]
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            block: BlockEnv {
                number: 1,
                timestamp: 0,
            },
            tokens: TokenLedger::default(),
            orders: OrderStore::default(),
            storage: HashMap::new(),
            events: Vec::new(),
        }
    }

    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    #[must_use]
    pub const fn timestamp(&self) -> u64 {
        self.block.timestamp
    }

    #[must_use]
    pub const fn block_number(&self) -> u64 {
        self.block.number
    }

    /// Mine one block `secs` seconds after the current one.
    pub fn advance(&mut self, secs: u64) {
        self.block.number += 1;
        self.block.timestamp += secs;
    }

    /// Jump to `timestamp`, mining one block.
    pub fn warp(&mut self, timestamp: u64) {
        self.block.number += 1;
        self.block.timestamp = timestamp;
    }

    /// Read a storage word of `contract`.
    #[must_use]
    pub fn sload(&self, contract: Address, slot: B256) -> U256 {
        self.storage
            .get(&(contract, slot))
            .copied()
            .unwrap_or_default()
    }

    /// Write a storage word of `contract`. Zero clears the slot.
    pub fn sstore(&mut self, contract: Address, slot: B256, value: U256) {
        if value.is_zero() {
            self.storage.remove(&(contract, slot));
        } else {
            self.storage.insert((contract, slot), value);
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Events appended at or after position `cursor`.
    #[must_use]
    pub fn events_since(&self, cursor: usize) -> &[Event] {
        self.events.get(cursor..).unwrap_or_default()
    }

    /// Run `f` atomically: on `Err` every change it made is rolled back.
    ///
    /// # Errors
    ///
    /// Returns whatever error `f` returns.
    pub fn transact<T, E>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E> {
        let snapshot = self.clone();
        let result = f(self);
        if result.is_err() {
            *self = snapshot;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transact_rolls_back_on_error() {
        let token = Address::repeat_byte(1);
        let holder = Address::repeat_byte(2);
        let mut state = ChainState::new(1);
        state.tokens.register(token, "TKN", 6);

        let result: Result<(), &str> = state.transact(|s| {
            s.tokens.mint(token, holder, U256::from(5)).unwrap();
            s.sstore(holder, B256::ZERO, U256::from(1));
            Err("boom")
        });
        assert!(result.is_err());
        assert!(state.tokens.balance_of(token, holder).is_zero());
        assert!(state.sload(holder, B256::ZERO).is_zero());

        let ok: Result<(), &str> = state.transact(|s| {
            s.tokens.mint(token, holder, U256::from(5)).unwrap();
            Ok(())
        });
        assert!(ok.is_ok());
        assert_eq!(state.tokens.balance_of(token, holder), U256::from(5));
    }

    #[test]
    fn events_since_cursor() {
        let mut state = ChainState::new(1);
        assert!(state.events_since(3).is_empty());
        state.emit(Event::OrderCancelled {
            manager: Address::ZERO,
            hash: B256::ZERO.into(),
        });
        assert_eq!(state.events_since(0).len(), 1);
        assert!(state.events_since(1).is_empty());
    }
}
