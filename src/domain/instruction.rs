//! The closed instruction set understood by the router.
//!
//! Every instruction states, by construction, which output indices it reads
//! and how many outputs it appends. Nothing about data flow is inferred.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use super::id::{LenderId, ProtocolName};

/// Primitive lending operations a gateway can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LendingAction {
    Deposit,
    DepositCollateral,
    Borrow,
    Repay,
    WithdrawCollateral,
    Withdraw,
    Swap,
}

impl LendingAction {
    /// Stable identifier used in logs and the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::DepositCollateral => "deposit_collateral",
            Self::Borrow => "borrow",
            Self::Repay => "repay",
            Self::WithdrawCollateral => "withdraw_collateral",
            Self::Withdraw => "withdraw",
            Self::Swap => "swap",
        }
    }

    /// True when the action takes tokens out of its input output.
    ///
    /// Token-consuming actions require an input, consume it, and get a
    /// remainder output appended by the router.
    #[must_use]
    pub const fn consumes_tokens(self) -> bool {
        matches!(
            self,
            Self::Deposit | Self::DepositCollateral | Self::Repay | Self::Swap
        )
    }

    /// Number of outputs the gateway itself returns.
    #[must_use]
    pub const fn gateway_outputs(self) -> usize {
        match self {
            Self::Deposit | Self::DepositCollateral | Self::Repay => 0,
            Self::Borrow | Self::WithdrawCollateral | Self::Withdraw | Self::Swap => 1,
        }
    }

    /// Total outputs appended: gateway outputs plus the remainder slot.
    #[must_use]
    pub const fn appended_outputs(self) -> usize {
        self.gateway_outputs() + if self.consumes_tokens() { 1 } else { 0 }
    }
}

/// A lending operation delegated to a gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LendingOp {
    pub action: LendingAction,
    pub token: Address,
    pub user: Address,
    /// Zero means "the full amount of the referenced input".
    #[serde(default)]
    pub amount: U256,
    /// Opaque venue-specific bytes.
    #[serde(default)]
    pub context: Bytes,
    #[serde(default)]
    pub input: Option<usize>,
}

impl LendingOp {
    /// Create an operation with an explicit amount and no input.
    #[must_use]
    pub fn new(action: LendingAction, token: Address, user: Address, amount: U256) -> Self {
        Self {
            action,
            token,
            user,
            amount,
            context: Bytes::new(),
            input: None,
        }
    }

    /// Create an operation that uses the full amount of output `input`.
    #[must_use]
    pub fn from_input(action: LendingAction, token: Address, user: Address, input: usize) -> Self {
        Self {
            input: Some(input),
            ..Self::new(action, token, user, U256::ZERO)
        }
    }

    /// Attach venue-specific context bytes.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<Bytes>) -> Self {
        self.context = context.into();
        self
    }

    /// Reference an input output while keeping the explicit amount.
    #[must_use]
    pub fn with_input(mut self, input: usize) -> Self {
        self.input = Some(input);
        self
    }
}

/// One step of an atomic execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Instruction {
    /// Move `amount` of `token` from `user` into router custody.
    PullToken {
        amount: U256,
        token: Address,
        user: Address,
    },
    /// Declare a virtual output to be backed later by a flash loan.
    ToOutput {
        amount: U256,
        token: Address,
        user: Address,
    },
    /// Let the named gateway spend the referenced output.
    Approve {
        input: usize,
        protocol: ProtocolName,
    },
    /// Send the referenced output out of custody.
    PushToken { input: usize, recipient: Address },
    /// Back the referenced virtual output with borrowed funds.
    FlashLoan { lender: LenderId, input: usize },
    /// Delegate an operation to the named gateway.
    Protocol {
        protocol: ProtocolName,
        op: LendingOp,
    },
}

impl Instruction {
    /// Short name for logs and error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PullToken { .. } => "pull_token",
            Self::ToOutput { .. } => "to_output",
            Self::Approve { .. } => "approve",
            Self::PushToken { .. } => "push_token",
            Self::FlashLoan { .. } => "flash_loan",
            Self::Protocol { .. } => "protocol",
        }
    }

    /// The output index this instruction reads, if any.
    #[must_use]
    pub const fn input(&self) -> Option<usize> {
        match self {
            Self::PullToken { .. } | Self::ToOutput { .. } => None,
            Self::Approve { input, .. }
            | Self::PushToken { input, .. }
            | Self::FlashLoan { input, .. } => Some(*input),
            Self::Protocol { op, .. } => op.input,
        }
    }

    /// Number of outputs appended when the instruction runs.
    #[must_use]
    pub const fn appended_outputs(&self) -> usize {
        match self {
            Self::PullToken { .. } | Self::ToOutput { .. } | Self::Approve { .. } => 1,
            Self::PushToken { .. } | Self::FlashLoan { .. } => 0,
            Self::Protocol { op, .. } => op.action.appended_outputs(),
        }
    }

    /// The user whose funds or position the instruction touches, if it names one.
    #[must_use]
    pub const fn user(&self) -> Option<Address> {
        match self {
            Self::PullToken { user, .. } | Self::ToOutput { user, .. } => Some(*user),
            Self::Protocol { op, .. } => Some(op.user),
            Self::Approve { .. } | Self::PushToken { .. } | Self::FlashLoan { .. } => None,
        }
    }

    /// Shorthand for a protocol instruction.
    pub fn protocol(protocol: impl Into<ProtocolName>, op: LendingOp) -> Self {
        Self::Protocol {
            protocol: protocol.into(),
            op,
        }
    }

    /// Shorthand for an approval of output `input`.
    pub fn approve(input: usize, protocol: impl Into<ProtocolName>) -> Self {
        Self::Approve {
            input,
            protocol: protocol.into(),
        }
    }
}
