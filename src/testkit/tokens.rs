//! Well-known test tokens and accounts.

use alloy_primitives::{address, Address, U256};

use crate::chain::ChainState;
use crate::domain::math::pow10;

pub const WETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
pub const USDC: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");

pub const WETH_DECIMALS: u8 = 18;
pub const USDC_DECIMALS: u8 = 6;

pub const ALICE: Address = address!("00000000000000000000000000000000000a11ce");
pub const BOB: Address = address!("0000000000000000000000000000000000000b0b");

/// Register WETH and USDC on the ledger.
pub fn install(state: &mut ChainState) {
    state.tokens.register(WETH, "WETH", WETH_DECIMALS);
    state.tokens.register(USDC, "USDC", USDC_DECIMALS);
}

/// `whole` tokens in base units.
#[must_use]
pub fn units(whole: u64, decimals: u8) -> U256 {
    U256::from(whole) * pow10(decimals)
}

/// Whole ether in wei.
#[must_use]
pub fn eth(whole: u64) -> U256 {
    units(whole, WETH_DECIMALS)
}

/// Whole dollars in USDC base units.
#[must_use]
pub fn usdc(whole: u64) -> U256 {
    units(whole, USDC_DECIMALS)
}

/// USD price with 8 decimals.
#[must_use]
pub fn usd(whole: u64) -> U256 {
    units(whole, 8)
}
