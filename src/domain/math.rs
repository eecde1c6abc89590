//! Fixed-point helpers shared by triggers, gateways and reporting.
//!
//! USD values and prices carry 8 decimals. Ratios are in basis points.

use alloy_primitives::U256;
use rust_decimal::Decimal;

/// One hundred percent in basis points.
pub const BPS: u64 = 10_000;

/// Decimals of USD values and prices.
pub const USD_DECIMALS: u8 = 8;

/// `10^exp` as a `U256`.
#[must_use]
pub fn pow10(exp: u8) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}

/// `a * b / denominator`, rounding down. Zero when the denominator is zero.
#[must_use]
pub fn mul_div(a: U256, b: U256, denominator: U256) -> U256 {
    if denominator.is_zero() {
        return U256::ZERO;
    }
    a.saturating_mul(b) / denominator
}

/// USD value (8 decimals) of `amount` base units priced at `price_usd` per whole token.
#[must_use]
pub fn usd_value(amount: U256, price_usd: U256, decimals: u8) -> U256 {
    mul_div(amount, price_usd, pow10(decimals))
}

/// Token base units worth `usd` (8 decimals) at `price_usd` per whole token.
#[must_use]
pub fn token_amount(usd: U256, price_usd: U256, decimals: u8) -> U256 {
    mul_div(usd, pow10(decimals), price_usd)
}

/// Loan-to-value in basis points, rounding down. Zero without collateral.
#[must_use]
pub fn ltv_bps(collateral_usd: U256, debt_usd: U256) -> U256 {
    mul_div(debt_usd, U256::from(BPS), collateral_usd)
}

/// Apply a basis-point haircut: `amount * (BPS - bps) / BPS`.
#[must_use]
pub fn apply_haircut(amount: U256, bps: u16) -> U256 {
    let keep = BPS.saturating_sub(u64::from(bps));
    mul_div(amount, U256::from(keep), U256::from(BPS))
}

/// Decimal places kept when truncating amounts of a token with `decimals`.
///
/// Wide tokens (more than 6 decimals) keep 4 places, stablecoin-style tokens
/// (3 to 6 decimals) keep 2, anything narrower is left untouched.
#[must_use]
pub const fn kept_places(decimals: u8) -> u8 {
    if decimals > 6 {
        4
    } else if decimals > 2 {
        2
    } else {
        decimals
    }
}

/// Size of one truncation step in base units.
#[must_use]
pub fn truncation_unit(decimals: u8) -> U256 {
    pow10(decimals - kept_places(decimals))
}

/// Round `amount` down to the token's truncation unit.
#[must_use]
pub fn truncate(amount: U256, decimals: u8) -> U256 {
    let unit = truncation_unit(decimals);
    amount / unit * unit
}

/// Human-readable decimal for logs, CLI output and tolerance checks.
///
/// Values beyond the `Decimal` range saturate to `Decimal::MAX`.
#[must_use]
pub fn to_decimal(amount: U256, decimals: u8) -> Decimal {
    let Ok(raw) = u128::try_from(amount) else {
        return Decimal::MAX;
    };
    let Ok(raw) = i128::try_from(raw) else {
        return Decimal::MAX;
    };
    Decimal::try_from_i128_with_scale(raw, u32::from(decimals))
        .map(|d| d.normalize())
        .unwrap_or(Decimal::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn ltv_rounds_down() {
        let coll = U256::from(3_700u64) * pow10(8);
        let debt = U256::from(1_000u64) * pow10(8);
        assert_eq!(ltv_bps(coll, debt), U256::from(2_702u64));
        assert_eq!(ltv_bps(U256::ZERO, debt), U256::ZERO);
    }

    #[test]
    fn truncation_follows_decimal_class() {
        // 1.64619 WETH -> 1.6461
        let weth = U256::from(1_646_191_646_191_646_191u64);
        assert_eq!(truncate(weth, 18), U256::from(1_646_100_000_000_000_000u64));
        // 4522.5735 USDC -> 4522.57
        assert_eq!(truncate(U256::from(4_522_573_500u64), 6), U256::from(4_522_570_000u64));
        // 2-decimal tokens are left alone
        assert_eq!(truncate(U256::from(12_345u64), 2), U256::from(12_345u64));
    }

    #[test]
    fn usd_conversions_invert() {
        let price = U256::from(3_700u64) * pow10(8);
        let one_eth = pow10(18);
        let usd = usd_value(one_eth, price, 18);
        assert_eq!(usd, price);
        assert_eq!(token_amount(usd, price, 18), one_eth);
    }

    #[test]
    fn haircut_and_decimal_rendering() {
        assert_eq!(apply_haircut(U256::from(10_000u64), 50), U256::from(9_950u64));
        assert_eq!(to_decimal(U256::from(236_350_000u64), 6), dec!(236.35));
        assert_eq!(to_decimal(U256::ZERO, 18), Decimal::ZERO);
    }
}
