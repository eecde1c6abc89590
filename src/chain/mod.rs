//! In-process chain model: token ledger, contract storage, calldata dispatch.

pub mod abi;
mod ledger;
mod registry;
mod state;

pub use ledger::{TokenInfo, TokenLedger};
pub use registry::ContractRegistry;
pub use state::{BlockEnv, ChainState};
