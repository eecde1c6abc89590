//! LTV trigger behavior against the mock venue.

mod support;

use alloy_primitives::{Address, U256};
use lendflow::application::trigger::{LtvTrigger, ViewRegistry};
use lendflow::domain::LtvTriggerParams;
use lendflow::error::{Error, TriggerError};
use lendflow::port::Trigger;
use lendflow::testkit::scenario::Scenario;
use lendflow::testkit::tokens::{eth, units, usdc, ALICE, BOB, USDC_DECIMALS};
use rust_decimal_macros::dec;
use support::assertions::assert_amount_near;

fn trigger(s: &Scenario) -> LtvTrigger {
    let mut views = ViewRegistry::new();
    views.register(s.venue.clone());
    LtvTrigger::new(views)
}

fn position(price: u64, collateral: u64, debt: u64) -> Scenario {
    let mut s = Scenario::builder().eth_price(price).build();
    s.open_position(ALICE, eth(collateral), usdc(debt)).unwrap();
    s
}

fn amounts(s: &Scenario, owner: Address, params: &LtvTriggerParams, iteration: u32) -> (U256, U256) {
    let a = trigger(s)
        .calculate_execution(&s.state, owner, &params.encode(), iteration)
        .unwrap();
    (a.sell_amount, a.buy_amount)
}

#[test]
fn fires_above_threshold_and_sizes_to_target() {
    let s = position(3_700, 1, 1_000);
    let params = Scenario::ltv_params(2_500, 2_202, 50, 1);
    let t = trigger(&s);

    let decision = t.should_execute(&s.state, ALICE, &params.encode()).unwrap();
    assert!(decision.execute);
    assert!(decision.reason.is_empty());

    let (sell, buy) = amounts(&s, ALICE, &params, 0);
    assert_eq!(sell, units(642, 14));
    assert_eq!(buy, U256::from(236_350_000u64));
    // 0.0642 ETH is worth 237.54; slippage allowance is 0.5%
    assert_amount_near(buy, USDC_DECIMALS, dec!(236.35), dec!(0.01));
    assert!(!t.is_complete(&s.state, ALICE, &params.encode(), 0).unwrap());
}

#[test]
fn holds_at_or_below_threshold() {
    let s = position(5_000, 1, 1_000);
    let params = Scenario::ltv_params(2_500, 2_202, 50, 1);

    let decision = trigger(&s)
        .should_execute(&s.state, ALICE, &params.encode())
        .unwrap();

    assert!(!decision.execute);
    assert_eq!(decision.reason, "LTV below threshold");
}

#[test]
fn holds_without_a_position() {
    let s = position(3_000, 1, 1_000);
    let params = Scenario::ltv_params(2_500, 2_202, 50, 1);
    let t = trigger(&s);

    let decision = t.should_execute(&s.state, BOB, &params.encode()).unwrap();

    assert!(!decision.execute);
    assert_eq!(decision.reason, "No position");
    assert!(t.is_complete(&s.state, BOB, &params.encode(), 3).unwrap());
}

#[test]
fn chunks_divide_the_sale_on_every_iteration() {
    let s = position(3_000, 10, 14_000);
    let whole = Scenario::ltv_params(4_550, 4_500, 50, 1);
    let halves = Scenario::ltv_params(4_550, 4_500, 50, 2);
    let thirds = Scenario::ltv_params(4_550, 4_500, 50, 3);
    let unset = Scenario::ltv_params(4_550, 4_500, 50, 0);

    assert_eq!(amounts(&s, ALICE, &whole, 0).0, units(3_030, 14));
    assert_eq!(amounts(&s, ALICE, &unset, 0), amounts(&s, ALICE, &whole, 0));
    // the iteration does not change the divisor
    for iteration in [0, 1, 7] {
        assert_eq!(amounts(&s, ALICE, &halves, iteration).0, units(1_515, 14));
    }
    for iteration in [0, 1, 2] {
        assert_eq!(amounts(&s, ALICE, &thirds, iteration).0, units(1_010, 14));
    }
}

#[test]
fn more_debt_sells_more() {
    let params = Scenario::ltv_params(4_550, 4_500, 50, 1);
    let lighter = position(3_000, 10, 14_000);
    let heavier = position(3_000, 10, 15_000);

    let (light_sell, light_buy) = amounts(&lighter, ALICE, &params, 0);
    let (heavy_sell, heavy_buy) = amounts(&heavier, ALICE, &params, 0);

    assert!(heavy_sell > light_sell);
    assert!(heavy_buy > light_buy);
}

#[test]
fn amounts_are_stable_under_accrual() {
    let mut s = Scenario::builder().apr_bps(500).build();
    s.open_position(ALICE, eth(10), usdc(16_000)).unwrap();
    let params = Scenario::ltv_params(5_000, 4_500, 50, 1);
    let before = amounts(&s, ALICE, &params, 0);

    s.state.advance(1_200);

    assert_eq!(amounts(&s, ALICE, &params, 0), before);
    assert_eq!(before.0, units(15_151, 14));
    assert_eq!(before.1, U256::from(4_522_570_000u64));
}

#[test]
fn validate_rejects_unknown_protocols() {
    let s = Scenario::new();
    let mut params = Scenario::ltv_params(2_500, 2_202, 50, 1);
    params.protocolId = 9;

    let err = trigger(&s).validate(&params.encode()).unwrap_err();

    assert!(matches!(err, Error::Trigger(TriggerError::UnknownProtocol(9))));
}

#[test]
fn validate_rejects_malformed_data() {
    let s = Scenario::new();

    let err = trigger(&s).validate(&[0xde, 0xad]).unwrap_err();

    assert!(matches!(err, Error::Trigger(TriggerError::InvalidParams(_))));
}
