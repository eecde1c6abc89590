use alloy_primitives::{Address, B256, U256};
use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

/// Token ledger errors (balances, allowances, ERC-20 calldata).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient balance of {token} for {holder}: need {needed}, have {available}")]
    InsufficientBalance {
        token: Address,
        holder: Address,
        needed: U256,
        available: U256,
    },

    #[error("insufficient allowance of {token} from {owner} to {spender}: need {needed}, have {available}")]
    InsufficientAllowance {
        token: Address,
        owner: Address,
        spender: Address,
        needed: U256,
        available: U256,
    },

    #[error("unknown token {0}")]
    UnknownToken(Address),

    #[error("unsupported call to {target}: {reason}")]
    UnsupportedCall { target: Address, reason: String },
}

/// Instruction router errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("caller {caller} may not execute instructions for {user}")]
    Unauthorized { caller: Address, user: Address },

    #[error("instruction {instruction} acts for {found}, execution belongs to {expected}")]
    UserMismatch {
        instruction: usize,
        expected: Address,
        found: Address,
    },

    #[error("instruction {instruction} reads output {index} but only {len} exist")]
    IndexOutOfBounds {
        instruction: usize,
        index: usize,
        len: usize,
    },

    #[error("output {index} was already consumed")]
    AlreadyConsumed { index: usize },

    #[error("output {index} is virtual and has no tokens behind it")]
    UnbackedOutput { index: usize },

    #[error("output {index} is already backed by custody")]
    AlreadyBacked { index: usize },

    #[error("instruction {instruction} ({kind}) requires an input output")]
    MissingInput {
        instruction: usize,
        kind: &'static str,
    },

    #[error("instruction {instruction} asks for {requested} but output holds {available}")]
    AmountExceedsInput {
        instruction: usize,
        requested: U256,
        available: U256,
    },

    #[error("instruction {instruction} names token {found} but its input holds {expected}")]
    TokenMismatch {
        instruction: usize,
        expected: Address,
        found: Address,
    },

    #[error("no gateway registered for protocol '{0}'")]
    UnknownProtocol(String),

    #[error("no flash lender registered as '{0}'")]
    UnknownLender(String),

    #[error("flash loan callback from {actual}, expected {expected:?}")]
    UnexpectedLender {
        expected: Option<Address>,
        actual: Address,
    },

    #[error("flash lender {lender} never called back")]
    FlashLoanCallbackMissing { lender: Address },

    #[error("flash loan of {amount} {token} was not repaid to {lender}")]
    FlashLoanNotRepaid {
        lender: Address,
        token: Address,
        amount: U256,
    },

    #[error("gateway '{protocol}' returned {actual} outputs, declared {expected}")]
    OutputCountMismatch {
        protocol: String,
        expected: usize,
        actual: usize,
    },

    #[error("gateway '{protocol}' took {spent} from an input of {available}")]
    Overspent {
        protocol: String,
        spent: U256,
        available: U256,
    },

    #[error("gateway '{protocol}' reported {reported} of {token} but delivered {delivered}")]
    UnbackedGatewayOutput {
        protocol: String,
        token: Address,
        reported: U256,
        delivered: U256,
    },

    #[error("router custody of {token} changed from {before} to {after}")]
    ResidualCustody {
        token: Address,
        before: U256,
        after: U256,
    },

    #[error("gateway '{protocol}' failed: {reason}")]
    Gateway { protocol: String, reason: String },
}

/// Broad error classes for conditional-order failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller or embedded instruction targets someone other than the owner.
    Authorization,
    /// Malformed or missing setup.
    Configuration,
    /// Entry point called out of sequence.
    State,
    /// The trigger currently refuses to trade.
    Policy,
}

/// Conditional order manager errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("caller {caller} is not authorized for this entry point")]
    Unauthorized { caller: Address },

    #[error("instruction {index} of the {list} list targets {found}, order belongs to {expected}")]
    InstructionUserMismatch {
        list: &'static str,
        index: usize,
        expected: Address,
        found: Address,
    },

    #[error("invalid trigger {0}")]
    InvalidTrigger(Address),

    #[error("invalid order parameters: {0}")]
    InvalidOrderParams(String),

    #[error("order {0} not found")]
    OrderNotFound(B256),

    #[error("order {0} already exists")]
    OrderAlreadyExists(B256),

    #[error("order is {status}, expected {expected}")]
    InvalidOrderState {
        status: &'static str,
        expected: &'static str,
    },

    #[error("pre-hook already executed for this iteration")]
    PreHookAlreadyExecuted,

    #[error("post-hook called without a pending pre-hook")]
    PreHookNotExecuted,

    #[error("trigger not met: {reason}")]
    TriggerNotMet { reason: String },

    #[error("manager holds {available} of {token}, trade needs {needed}")]
    InsufficientSellBalance {
        token: Address,
        needed: U256,
        available: U256,
    },

    #[error("manager still holds {amount} of {token} after post-hook")]
    ResidualBalance { token: Address, amount: U256 },

    #[error("appData hash {actual} does not match order's {expected}")]
    AppDataMismatch { expected: B256, actual: B256 },
}

impl OrderError {
    /// Classify the error the way operators triage failed settlements.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Unauthorized { .. } | Self::InstructionUserMismatch { .. } => {
                ErrorClass::Authorization
            }
            Self::InvalidTrigger(_)
            | Self::InvalidOrderParams(_)
            | Self::OrderNotFound(_)
            | Self::OrderAlreadyExists(_)
            | Self::AppDataMismatch { .. } => ErrorClass::Configuration,
            Self::InvalidOrderState { .. }
            | Self::PreHookAlreadyExecuted
            | Self::PreHookNotExecuted
            | Self::InsufficientSellBalance { .. }
            | Self::ResidualBalance { .. } => ErrorClass::State,
            Self::TriggerNotMet { .. } => ErrorClass::Policy,
        }
    }
}

/// Trigger policy errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TriggerError {
    #[error("invalid trigger parameters: {0}")]
    InvalidParams(String),

    #[error("no view aggregator registered for protocol {0}")]
    UnknownProtocol(u8),

    #[error("no price for token {0}")]
    MissingPrice(Address),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Router(#[from] RouterError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Trigger(#[from] TriggerError),

    #[error("ABI error: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settlement rejected: {0}")]
    Settlement(String),

    #[error("hook {index} to {target} failed: {source}")]
    Hook {
        index: usize,
        target: Address,
        #[source]
        source: Box<Error>,
    },

    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The order error behind this error, if any.
    #[must_use]
    pub fn as_order(&self) -> Option<&OrderError> {
        match self {
            Self::Order(e) => Some(e),
            _ => None,
        }
    }

    /// The error a failed hook reverted with, if this is a hook failure.
    #[must_use]
    pub fn hook_source(&self) -> Option<&Error> {
        match self {
            Self::Hook { source, .. } => Some(source),
            _ => None,
        }
    }

    /// The router error behind this error, if any.
    #[must_use]
    pub fn as_router(&self) -> Option<&RouterError> {
        match self {
            Self::Router(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_errors_are_classified() {
        let err = OrderError::InstructionUserMismatch {
            list: "pre",
            index: 0,
            expected: Address::ZERO,
            found: Address::repeat_byte(1),
        };
        assert_eq!(err.class(), ErrorClass::Authorization);
        assert_eq!(
            OrderError::TriggerNotMet {
                reason: "LTV below threshold".into()
            }
            .class(),
            ErrorClass::Policy
        );
        assert_eq!(OrderError::PreHookAlreadyExecuted.class(), ErrorClass::State);
        assert_eq!(
            OrderError::InvalidTrigger(Address::ZERO).class(),
            ErrorClass::Configuration
        );
    }

    #[test]
    fn wrapped_errors_expose_their_source() {
        let err: Error = OrderError::PreHookNotExecuted.into();
        assert!(err.as_order().is_some());
        assert!(err.as_router().is_none());
    }
}
