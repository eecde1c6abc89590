//! Trade descriptors handed to the external settlement network.
//!
//! The descriptor is the settlement contract's 12-field order struct. Its
//! EIP-712 hash is the digest the order manager's signature check recomputes.

use alloy_primitives::{keccak256, Address, FixedBytes, B256, U256};
use alloy_sol_types::{eip712_domain, Eip712Domain, SolStruct};
use serde::{Deserialize, Serialize};

/// ABI mirror of the settlement contract's order type.
pub mod gpv2 {
    alloy_sol_types::sol! {
        #[derive(Debug, PartialEq, Eq)]
        struct Order {
            address sellToken;
            address buyToken;
            address receiver;
            uint256 sellAmount;
            uint256 buyAmount;
            uint32 validTo;
            bytes32 appData;
            uint256 feeAmount;
            bytes32 kind;
            bool partiallyFillable;
            bytes32 sellTokenBalance;
            bytes32 buyTokenBalance;
        }
    }
}

/// ERC-1271 "valid signature" marker.
pub const ERC1271_MAGIC_VALUE: FixedBytes<4> = FixedBytes([0x16, 0x26, 0xba, 0x7e]);

/// Returned by the signature check on a digest mismatch.
pub const ERC1271_INVALID: FixedBytes<4> = FixedBytes([0xff, 0xff, 0xff, 0xff]);

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    Sell,
    Buy,
}

impl OrderKind {
    /// Marker hash used in the settlement order struct.
    #[must_use]
    pub fn marker(self) -> B256 {
        match self {
            Self::Sell => keccak256("sell"),
            Self::Buy => keccak256("buy"),
        }
    }
}

/// Marker for plain ERC-20 balances on both sides of a trade.
#[must_use]
pub fn erc20_balance_marker() -> B256 {
    keccak256("erc20")
}

/// EIP-712 domain of the settlement contract.
#[must_use]
pub fn settlement_domain(chain_id: u64, settlement: Address) -> Eip712Domain {
    eip712_domain! {
        name: "Gnosis Protocol",
        version: "v2",
        chain_id: chain_id,
        verifying_contract: settlement,
    }
}

/// A concrete trade the settlement network may fill right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeDescriptor {
    pub sell_token: Address,
    pub buy_token: Address,
    pub receiver: Address,
    pub sell_amount: U256,
    pub buy_amount: U256,
    pub valid_to: u32,
    pub app_data: B256,
    pub fee_amount: U256,
    pub kind: OrderKind,
    pub partially_fillable: bool,
}

impl TradeDescriptor {
    /// Convert into the settlement contract's struct.
    #[must_use]
    pub fn to_sol(&self) -> gpv2::Order {
        gpv2::Order {
            sellToken: self.sell_token,
            buyToken: self.buy_token,
            receiver: self.receiver,
            sellAmount: self.sell_amount,
            buyAmount: self.buy_amount,
            validTo: self.valid_to,
            appData: self.app_data,
            feeAmount: self.fee_amount,
            kind: self.kind.marker(),
            partiallyFillable: self.partially_fillable,
            sellTokenBalance: erc20_balance_marker(),
            buyTokenBalance: erc20_balance_marker(),
        }
    }

    /// EIP-712 digest under `domain`.
    #[must_use]
    pub fn digest(&self, domain: &Eip712Domain) -> B256 {
        self.to_sol().eip712_signing_hash(domain)
    }
}
