use alloy_primitives::{Address, U256};
use lendflow::chain::ChainState;
use lendflow::domain::math::to_decimal;
use rust_decimal::Decimal;

pub fn assert_decimal_near(actual: Decimal, expected: Decimal, tolerance: Decimal) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "expected {} ± {}, got {}",
        expected,
        tolerance,
        actual
    );
}

/// `amount` of a token with `decimals`, compared in whole units.
pub fn assert_amount_near(amount: U256, decimals: u8, expected: Decimal, tolerance: Decimal) {
    assert_decimal_near(to_decimal(amount, decimals), expected, tolerance);
}

/// The account holds no token at all.
pub fn assert_empty_custody(state: &ChainState, holder: Address) {
    let holdings = state.tokens.holdings(holder);
    assert!(holdings.is_empty(), "{holder} still holds {holdings:?}");
}
