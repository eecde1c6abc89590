//! Conditional order parameters, lifecycle state and the order store.

use std::collections::HashMap;

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};

use super::id::OrderHash;
use super::instruction::Instruction;

/// Outputs pre-populated before `pre_instructions` run:
/// `[0]` the virtual sell amount, `[1]` staged funds (or a zero buy-token slot).
pub const PRE_HOOK_SEEDS: usize = 2;

/// Outputs pre-populated before `post_instructions` run: `[0]` the buy-token proceeds.
pub const POST_HOOK_SEEDS: usize = 1;

/// `keccak256(abi.encode(user, salt))`.
#[must_use]
pub fn order_hash(user: Address, salt: B256) -> OrderHash {
    OrderHash::new(keccak256((user, salt).abi_encode()))
}

/// Everything a user commits to when registering a conditional order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderParams {
    pub user: Address,
    /// Address the trigger policy is registered under.
    pub trigger: Address,
    pub trigger_static_data: Bytes,
    #[serde(default)]
    pub pre_instructions: Vec<Instruction>,
    pub sell_token: Address,
    pub buy_token: Address,
    #[serde(default)]
    pub post_instructions: Vec<Instruction>,
    pub app_data_hash: B256,
    pub max_iterations: u32,
    /// Leftover sell tokens go here after a fill; the user when zero.
    #[serde(default)]
    pub sell_token_refund_address: Address,
    #[serde(default)]
    pub is_kind_buy: bool,
}

impl OrderParams {
    /// Where leftover sell tokens are refunded.
    #[must_use]
    pub fn refund_address(&self) -> Address {
        if self.sell_token_refund_address.is_zero() {
            self.user
        } else {
            self.sell_token_refund_address
        }
    }
}

/// Order lifecycle: `None -> Active -> Completed`, `Active -> Cancelled`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    None,
    Active,
    Completed,
    Cancelled,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// True once the order can never trade again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Trade amounts frozen by the pre-hook until the matching post-hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTrade {
    pub sell_amount: U256,
    pub buy_amount: U256,
    pub valid_to: u32,
}

/// Funds delivered to the manager for the next pre-hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedFunds {
    pub token: Address,
    pub amount: U256,
}

/// Stored state of one conditional order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub params: OrderParams,
    pub salt: B256,
    pub status: OrderStatus,
    pub iteration_count: u32,
    pub created_at: u64,
    pub pending: Option<PendingTrade>,
    pub staged: Option<StagedFunds>,
}

impl OrderRecord {
    /// A freshly created, active record.
    #[must_use]
    pub fn new(params: OrderParams, salt: B256, created_at: u64) -> Self {
        Self {
            params,
            salt,
            status: OrderStatus::Active,
            iteration_count: 0,
            created_at,
            pending: None,
            staged: None,
        }
    }

    #[must_use]
    pub fn hash(&self) -> OrderHash {
        order_hash(self.params.user, self.salt)
    }
}

/// Orders of every manager on the chain, keyed by `(manager, order hash)`.
#[derive(Debug, Clone, Default)]
pub struct OrderStore {
    records: HashMap<(Address, OrderHash), OrderRecord>,
}

impl OrderStore {
    #[must_use]
    pub fn get(&self, manager: Address, hash: OrderHash) -> Option<&OrderRecord> {
        self.records.get(&(manager, hash))
    }

    pub fn get_mut(&mut self, manager: Address, hash: OrderHash) -> Option<&mut OrderRecord> {
        self.records.get_mut(&(manager, hash))
    }

    #[must_use]
    pub fn contains(&self, manager: Address, hash: OrderHash) -> bool {
        self.records.contains_key(&(manager, hash))
    }

    pub fn insert(&mut self, manager: Address, record: OrderRecord) {
        self.records.insert((manager, record.hash()), record);
    }

    /// Status of an order; `None` for unknown hashes.
    #[must_use]
    pub fn status(&self, manager: Address, hash: OrderHash) -> OrderStatus {
        self.get(manager, hash)
            .map_or(OrderStatus::None, |record| record.status)
    }

    /// Records belonging to `manager`.
    pub fn for_manager(&self, manager: Address) -> impl Iterator<Item = &OrderRecord> {
        self.records
            .iter()
            .filter(move |((owner, _), _)| *owner == manager)
            .map(|(_, record)| record)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
