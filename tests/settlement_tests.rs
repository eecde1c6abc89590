//! Full settlement cycles: appData check, pre-hook, ERC-1271 proof, fill,
//! post-hook.

mod support;

use std::sync::Arc;

use alloy_primitives::{Bytes, U256};
use alloy_sol_types::SolCall;
use lendflow::application::hooks::Hook;
use lendflow::chain::abi::IOrderManager;
use lendflow::domain::{
    AppData, FlashLoanMetadata, Instruction, LendingAction, LendingOp, OrderParams, OrderStatus,
};
use lendflow::error::{Error, OrderError, RouterError};
use lendflow::testkit::scenario::{
    Scenario, APP_CODE, HOOK_GAS, LENDER, MANAGER, ROUTER, VENUE_NAME,
};
use lendflow::testkit::tokens::{eth, units, usdc, ALICE, USDC, WETH};
use support::assertions::assert_empty_custody;
use support::{event_names, salt};

/// 1 ETH at $3,700 against 1,000 USDC: 27.0% LTV.
fn convergence() -> (Scenario, AppData) {
    let mut s = Scenario::builder().eth_price(3_700).build();
    s.open_position(ALICE, eth(1), usdc(1_000)).unwrap();
    let params = Scenario::ltv_params(2_500, 2_202, 50, 1);
    let (order, app_data) = s.deleverage_order(ALICE, salt(1), &params, 5);
    s.place_order(order, salt(1)).unwrap();
    (s, app_data)
}

fn status(s: &Scenario) -> (OrderStatus, u32) {
    let record = s.manager().get_order(&s.state, ALICE, salt(1)).unwrap();
    (record.status, record.iteration_count)
}

#[test]
fn deleverage_converges_to_target() {
    let (mut s, app_data) = convergence();
    let trade = s
        .manager()
        .get_tradeable_order(&s.state, ALICE, salt(1))
        .unwrap();
    assert_eq!(trade.sell_amount, units(642, 14));
    assert_eq!(trade.buy_amount, U256::from(236_350_000u64));
    let cursor = s.state.events().len();

    let fill = s.settle(ALICE, salt(1), &app_data).unwrap();

    assert_eq!(fill.sell_amount, units(642, 14));
    assert_eq!(fill.buy_amount, U256::from(237_540_000u64));
    assert_eq!((fill.pre_hooks, fill.post_hooks), (1, 1));
    assert_eq!(
        s.venue.debt(&s.state, ALICE, USDC),
        U256::from(762_460_000u64)
    );
    assert_eq!(
        s.venue.collateral(&s.state, ALICE, WETH),
        eth(1) - units(642, 14)
    );
    // target reached after one fill, well before max_iterations
    assert_eq!(status(&s), (OrderStatus::Completed, 1));
    assert_empty_custody(&s.state, MANAGER);
    assert_empty_custody(&s.state, ROUTER);

    let names = event_names(&s.state, cursor);
    for expected in ["pre_hook_executed", "post_hook_executed", "order_completed"] {
        assert!(names.contains(&expected), "missing {expected} in {names:?}");
    }

    let err = s
        .manager()
        .get_tradeable_order(&s.state, ALICE, salt(1))
        .unwrap_err();
    assert!(matches!(
        err.as_order(),
        Some(OrderError::InvalidOrderState { .. })
    ));
}

#[test]
fn chunked_deleverage_completes_after_max_iterations() {
    let mut s = Scenario::new();
    s.open_position(ALICE, eth(10), usdc(14_000)).unwrap();
    let params = Scenario::ltv_params(4_550, 4_500, 50, 2);
    let (order, app_data) = s.deleverage_order(ALICE, salt(1), &params, 2);
    s.place_order(order, salt(1)).unwrap();

    let first = s.settle(ALICE, salt(1), &app_data).unwrap();
    assert_eq!(first.sell_amount, units(1_515, 14));
    assert_eq!(first.buy_amount, U256::from(454_500_000u64));
    assert_eq!(status(&s), (OrderStatus::Active, 1));

    // half of what the smaller position now needs
    let second = s.settle(ALICE, salt(1), &app_data).unwrap();
    assert_eq!(second.sell_amount, units(757, 14));
    assert_eq!(second.buy_amount, U256::from(227_100_000u64));
    assert_eq!(status(&s), (OrderStatus::Completed, 2));

    assert_eq!(
        s.venue.debt(&s.state, ALICE, USDC),
        usdc(14_000) - U256::from(681_600_000u64)
    );
    assert_empty_custody(&s.state, MANAGER);
}

#[test]
fn quote_survives_interest_accrual_within_the_window() {
    let mut s = Scenario::builder().apr_bps(500).build();
    s.open_position(ALICE, eth(10), usdc(16_000)).unwrap();
    let params = Scenario::ltv_params(5_000, 4_500, 50, 1);
    let (order, app_data) = s.deleverage_order(ALICE, salt(1), &params, 1);
    s.place_order(order, salt(1)).unwrap();

    let manager = Arc::clone(&s.deployment.manager);
    let (trade, signature) = manager
        .get_tradeable_order_with_signature(&s.state, ALICE, salt(1))
        .unwrap();
    assert_eq!(trade.sell_amount, units(15_151, 14));
    assert_eq!(trade.buy_amount, U256::from(4_522_570_000u64));

    s.state.advance(1_200);
    assert!(s.venue.debt(&s.state, ALICE, USDC) > usdc(16_000));
    assert_eq!(
        manager.get_tradeable_order(&s.state, ALICE, salt(1)).unwrap(),
        trade
    );

    let fill = s
        .settlement
        .settle(&mut s.state, &trade, MANAGER, &signature, &app_data)
        .unwrap();
    assert_eq!(fill.sell_amount, trade.sell_amount);
    assert_eq!(status(&s), (OrderStatus::Completed, 1));
}

#[test]
fn mismatched_app_data_is_rejected() {
    let (mut s, _) = convergence();
    let other = s.deployment.hooks_app_data(ALICE, salt(1), "someone-else");

    let err = s.settle(ALICE, salt(1), &other).unwrap_err();

    assert!(matches!(
        err.as_order(),
        Some(OrderError::AppDataMismatch { .. })
    ));
    assert_eq!(status(&s), (OrderStatus::Active, 0));
}

#[test]
fn stale_trade_fails_the_signature_check() {
    let (mut s, app_data) = convergence();
    let manager = Arc::clone(&s.deployment.manager);
    let (trade, signature) = manager
        .get_tradeable_order_with_signature(&s.state, ALICE, salt(1))
        .unwrap();

    s.set_eth_price(3_600);
    let err = s
        .settlement
        .settle(&mut s.state, &trade, MANAGER, &signature, &app_data)
        .unwrap_err();

    assert!(matches!(err, Error::Settlement(ref reason) if reason.contains("signature")));
    let record = manager.get_order(&s.state, ALICE, salt(1)).unwrap();
    assert!(record.pending.is_none());
    assert_eq!(s.venue.collateral(&s.state, ALICE, WETH), eth(1));
}

#[test]
fn expired_trade_is_rejected() {
    let (mut s, app_data) = convergence();
    let manager = Arc::clone(&s.deployment.manager);
    let (trade, signature) = manager
        .get_tradeable_order_with_signature(&s.state, ALICE, salt(1))
        .unwrap();
    assert_eq!(trade.valid_to, 1_801_800);

    s.state.advance(1_801);
    let err = s
        .settlement
        .settle(&mut s.state, &trade, MANAGER, &signature, &app_data)
        .unwrap_err();

    assert!(matches!(err, Error::Settlement(ref reason) if reason.contains("expired")));
    assert_eq!(status(&s), (OrderStatus::Active, 0));
}

#[test]
fn failed_pre_hook_reverts_the_settlement() {
    let mut s = Scenario::builder().eth_price(3_700).build();
    s.open_position(ALICE, eth(1), usdc(1_000)).unwrap();
    let params = Scenario::ltv_params(2_500, 2_202, 50, 1);
    let (order, app_data) = s.deleverage_order(ALICE, salt(1), &params, 5);
    // skip the router delegation so the withdrawal in the pre-hook fails
    let manager = Arc::clone(&s.deployment.manager);
    manager.create_order(&mut s.state, ALICE, order, salt(1)).unwrap();

    let err = s.settle(ALICE, salt(1), &app_data).unwrap_err();

    assert!(matches!(err, Error::Hook { index: 0, target: MANAGER, .. }));
    assert_eq!(status(&s), (OrderStatus::Active, 0));
    assert_eq!(s.venue.collateral(&s.state, ALICE, WETH), eth(1));
}

#[test]
fn failed_post_hook_reverts_the_swap() {
    let mut s = Scenario::builder().eth_price(3_700).build();
    s.open_position(ALICE, eth(1), usdc(1_000)).unwrap();
    let params = Scenario::ltv_params(2_500, 2_202, 50, 1);
    let (order, app_data) = s.deleverage_order(ALICE, salt(1), &params, 5);
    // nothing spends the proceeds, so they stay in router custody
    let order = OrderParams {
        post_instructions: Vec::new(),
        ..order
    };
    s.place_order(order, salt(1)).unwrap();

    let err = s.settle(ALICE, salt(1), &app_data).unwrap_err();

    assert!(matches!(err, Error::Hook { index: 0, .. }));
    assert!(matches!(
        err.hook_source().and_then(Error::as_router),
        Some(RouterError::ResidualCustody { token: USDC, .. })
    ));
    assert_empty_custody(&s.state, MANAGER);
    assert_eq!(s.venue.collateral(&s.state, ALICE, WETH), eth(1));
    assert_eq!(s.venue.debt(&s.state, ALICE, USDC), usdc(1_000));
    let manager = Arc::clone(&s.deployment.manager);
    let record = manager.get_order(&s.state, ALICE, salt(1)).unwrap();
    assert_eq!(record.status, OrderStatus::Active);
    assert!(record.pending.is_none());
    manager
        .cancel_order(&mut s.state, ALICE, ALICE, salt(1))
        .unwrap();
}

#[test]
fn flash_loan_funds_the_pre_hook() {
    let mut s = Scenario::builder().eth_price(3_700).build();
    s.open_position(ALICE, eth(1), usdc(1_000)).unwrap();
    let loan = U256::from(236_350_000u64);
    let gas = HOOK_GAS;

    // seeds: [0] sell amount, [1] staged loan
    let pre_instructions = vec![
        Instruction::approve(1, VENUE_NAME),
        Instruction::protocol(
            VENUE_NAME,
            LendingOp::from_input(LendingAction::Repay, USDC, ALICE, 1),
        ),
        Instruction::protocol(
            VENUE_NAME,
            LendingOp::from_input(LendingAction::WithdrawCollateral, WETH, ALICE, 0),
        ),
        Instruction::PushToken {
            input: 4,
            recipient: MANAGER,
        },
        Instruction::PushToken {
            input: 3,
            recipient: ALICE,
        },
    ];
    let post_instructions = vec![Instruction::PushToken {
        input: 0,
        recipient: LENDER,
    }];

    let fund = IOrderManager::fundOrderWithBalanceCall {
        user: ALICE,
        salt: salt(1),
        token: USDC,
    };
    let pre = Hook::pre_hook(MANAGER, ALICE, salt(1), gas);
    let post = Hook::post_hook(MANAGER, ALICE, salt(1), gas);
    let app_data = AppData::new(APP_CODE)
        .with_pre_hook(MANAGER, Bytes::from(fund.abi_encode()), gas)
        .with_pre_hook(pre.target, pre.call_data, gas)
        .with_post_hook(post.target, post.call_data, gas)
        .with_flash_loan(FlashLoanMetadata {
            lender: LENDER,
            token: USDC,
            amount: loan,
            receiver: MANAGER,
        });

    let params = Scenario::ltv_params(2_500, 2_202, 50, 1);
    let (template, _) = s.deleverage_order(ALICE, salt(1), &params, 1);
    let order = OrderParams {
        pre_instructions,
        post_instructions,
        app_data_hash: app_data.hash().unwrap(),
        ..template
    };
    s.place_order(order, salt(1)).unwrap();
    let lender_before = s.state.tokens.balance_of(USDC, LENDER);

    let fill = s.settle(ALICE, salt(1), &app_data).unwrap();

    assert_eq!((fill.pre_hooks, fill.post_hooks), (2, 1));
    assert_eq!(
        s.venue.debt(&s.state, ALICE, USDC),
        usdc(1_000) - loan
    );
    assert_eq!(
        s.state.tokens.balance_of(USDC, LENDER),
        lender_before - loan + fill.buy_amount
    );
    assert_eq!(status(&s), (OrderStatus::Completed, 1));
    assert_empty_custody(&s.state, MANAGER);
    assert_empty_custody(&s.state, ROUTER);
}

#[test]
fn unknown_flash_lender_is_rejected() {
    let (mut s, app_data) = convergence();
    let manager = Arc::clone(&s.deployment.manager);
    let (trade, signature) = manager
        .get_tradeable_order_with_signature(&s.state, ALICE, salt(1))
        .unwrap();
    let with_loan = app_data.with_flash_loan(FlashLoanMetadata {
        lender: ALICE,
        token: USDC,
        amount: usdc(1),
        receiver: MANAGER,
    });
    let trade = lendflow::domain::TradeDescriptor {
        app_data: with_loan.hash().unwrap(),
        ..trade
    };

    let err = s
        .settlement
        .settle(&mut s.state, &trade, MANAGER, &signature, &with_loan)
        .unwrap_err();

    assert!(matches!(err, Error::Settlement(ref reason) if reason.contains("flash lender")));
}
