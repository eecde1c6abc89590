//! Events appended to the chain log by the router and the order manager.

use alloy_primitives::{Address, B256, U256};
use serde::Serialize;

use super::id::OrderHash;

/// Log entry emitted by a state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    InstructionsExecuted {
        router: Address,
        user: Address,
        instructions: usize,
        outputs: usize,
    },
    /// Registration signal picked up by watchers and solvers.
    OrderCreated {
        manager: Address,
        hash: OrderHash,
        user: Address,
        salt: B256,
        trigger: Address,
    },
    OrderFunded {
        manager: Address,
        hash: OrderHash,
        token: Address,
        amount: U256,
    },
    PreHookExecuted {
        manager: Address,
        hash: OrderHash,
        iteration: u32,
        sell_amount: U256,
        buy_amount: U256,
    },
    PostHookExecuted {
        manager: Address,
        hash: OrderHash,
        iteration: u32,
        proceeds: U256,
    },
    OrderCompleted {
        manager: Address,
        hash: OrderHash,
        iterations: u32,
    },
    OrderCancelled {
        manager: Address,
        hash: OrderHash,
    },
}

impl Event {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::InstructionsExecuted { .. } => "instructions_executed",
            Self::OrderCreated { .. } => "order_created",
            Self::OrderFunded { .. } => "order_funded",
            Self::PreHookExecuted { .. } => "pre_hook_executed",
            Self::PostHookExecuted { .. } => "post_hook_executed",
            Self::OrderCompleted { .. } => "order_completed",
            Self::OrderCancelled { .. } => "order_cancelled",
        }
    }
}
