//! Chain-agnostic domain types: instructions, outputs, orders and fixed-point math.

pub mod app_data;
pub mod event;
pub mod id;
pub mod instruction;
pub mod math;
pub mod order;
pub mod output;
pub mod trade;
pub mod trigger_params;

pub use app_data::{AppData, FlashLoanMetadata, HookMetadata};
pub use event::Event;
pub use id::{LenderId, OrderHash, ProtocolId, ProtocolName};
pub use instruction::{Instruction, LendingAction, LendingOp};
pub use order::{
    order_hash, OrderParams, OrderRecord, OrderStatus, OrderStore, PendingTrade, StagedFunds,
    POST_HOOK_SEEDS, PRE_HOOK_SEEDS,
};
pub use output::{Backing, Output};
pub use trade::{OrderKind, TradeDescriptor};
pub use trigger_params::LtvTriggerParams;
