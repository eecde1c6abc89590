//! End-to-end fixture: one chain with a lending venue, a DEX, a flash
//! lender, the LTV trigger, a full deployment and a settlement.

use std::sync::Arc;

use alloy_primitives::{address, Address, Bytes, B256, U256};

use super::dex::MockDex;
use super::flash::{LenderBehavior, MockFlashLender};
use super::oracle::MockOracle;
use super::settlement::{Fill, MockSettlement};
use super::tokens::{self, eth, usd, usdc, USDC, USDC_DECIMALS, WETH, WETH_DECIMALS};
use super::venue::MockLendingVenue;
use crate::application::order::OrderManager;
use crate::application::router::Router;
use crate::application::trigger::{LtvTrigger, ViewRegistry};
use crate::chain::ChainState;
use crate::domain::{
    AppData, Instruction, LendingAction, LendingOp, LtvTriggerParams, OrderHash, OrderParams,
    Output,
};
use crate::error::Result;
use crate::infrastructure::deployment::Deployment;
use crate::port::Authorization;

pub const CHAIN_ID: u64 = 1;
pub const ROUTER: Address = address!("00000000000000000000000000000000000f0001");
pub const MANAGER: Address = address!("00000000000000000000000000000000000f0002");
pub const TRAMPOLINE: Address = address!("00000000000000000000000000000000000f0003");
pub const SETTLEMENT: Address = address!("9008d19f58aabd9ed0d60971565aa8510560ab41");
pub const ORACLE: Address = address!("00000000000000000000000000000000000f0005");
pub const VENUE: Address = address!("00000000000000000000000000000000000f0006");
pub const DEX: Address = address!("00000000000000000000000000000000000f0007");
pub const LENDER: Address = address!("00000000000000000000000000000000000f0008");
pub const LTV_TRIGGER: Address = address!("00000000000000000000000000000000000f0009");

pub const VENUE_NAME: &str = "venue";
pub const VENUE_ID: u8 = 1;
pub const DEX_NAME: &str = "dex";
pub const LENDER_ID: &str = "lender";
pub const APP_CODE: &str = "lendflow";
pub const HOOK_GAS: u64 = 500_000;

/// Knobs for [`Scenario`].
#[derive(Debug, Clone, Copy)]
pub struct ScenarioBuilder {
    start_time: u64,
    eth_price: u64,
    apr_bps: u64,
    dex_fee_bps: u16,
    lender_fee_bps: u16,
    lender_behavior: LenderBehavior,
    validity_window: u64,
}

impl Default for ScenarioBuilder {
    fn default() -> Self {
        Self {
            start_time: 1_800_000,
            eth_price: 3_000,
            apr_bps: 0,
            dex_fee_bps: 0,
            lender_fee_bps: 0,
            lender_behavior: LenderBehavior::Honest,
            validity_window: 1_800,
        }
    }
}

impl ScenarioBuilder {
    #[must_use]
    pub fn start_time(mut self, ts: u64) -> Self {
        self.start_time = ts;
        self
    }

    /// WETH price in whole dollars.
    #[must_use]
    pub fn eth_price(mut self, usd: u64) -> Self {
        self.eth_price = usd;
        self
    }

    #[must_use]
    pub fn apr_bps(mut self, bps: u64) -> Self {
        self.apr_bps = bps;
        self
    }

    #[must_use]
    pub fn dex_fee_bps(mut self, bps: u16) -> Self {
        self.dex_fee_bps = bps;
        self
    }

    #[must_use]
    pub fn lender_fee_bps(mut self, bps: u16) -> Self {
        self.lender_fee_bps = bps;
        self
    }

    #[must_use]
    pub fn lender_behavior(mut self, behavior: LenderBehavior) -> Self {
        self.lender_behavior = behavior;
        self
    }

    #[must_use]
    pub fn validity_window(mut self, secs: u64) -> Self {
        self.validity_window = secs;
        self
    }

    #[must_use]
    pub fn build(self) -> Scenario {
        let mut state = ChainState::new(CHAIN_ID);
        state.warp(self.start_time);
        tokens::install(&mut state);

        let oracle = MockOracle::new(ORACLE);
        oracle.set_price(&mut state, WETH, usd(self.eth_price));
        oracle.set_price(&mut state, USDC, usd(1));

        let venue = Arc::new(
            MockLendingVenue::new(VENUE_NAME, VENUE_ID, VENUE, oracle)
                .with_token(WETH)
                .with_token(USDC)
                .apr_bps(self.apr_bps),
        );
        let dex = Arc::new(MockDex::new(DEX_NAME, DEX, oracle).fee_bps(self.dex_fee_bps));
        let lender = Arc::new(
            MockFlashLender::new(LENDER_ID, LENDER)
                .fee_bps(self.lender_fee_bps)
                .behavior(self.lender_behavior),
        );

        // liquidity
        for (token, amount, holder) in [
            (USDC, usdc(10_000_000), VENUE),
            (USDC, usdc(10_000_000), LENDER),
            (WETH, eth(10_000), LENDER),
        ] {
            state
                .tokens
                .mint(token, holder, amount)
                .expect("registered token");
        }

        let mut views = ViewRegistry::new();
        views.register(venue.clone());
        let trigger = Arc::new(LtvTrigger::new(views));

        let deployment = Deployment::builder(ROUTER, MANAGER, TRAMPOLINE, SETTLEMENT)
            .gateway(venue.clone())
            .gateway(dex.clone())
            .lender(lender.clone())
            .trigger(LTV_TRIGGER, trigger)
            .contract(venue.clone())
            .validity_window(self.validity_window)
            .hook_gas_limit(HOOK_GAS)
            .build();
        let settlement = MockSettlement::new(
            SETTLEMENT,
            Arc::clone(&deployment.trampoline),
            Arc::clone(&deployment.contracts),
            oracle,
        )
        .with_lender(lender.clone());

        Scenario {
            state,
            oracle,
            venue,
            dex,
            lender,
            deployment,
            settlement,
        }
    }
}

/// A wired chain ready for router and order tests.
pub struct Scenario {
    pub state: ChainState,
    pub oracle: MockOracle,
    pub venue: Arc<MockLendingVenue>,
    pub dex: Arc<MockDex>,
    pub lender: Arc<MockFlashLender>,
    pub deployment: Deployment,
    pub settlement: MockSettlement,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario {
    #[must_use]
    pub fn new() -> Self {
        ScenarioBuilder::default().build()
    }

    #[must_use]
    pub fn builder() -> ScenarioBuilder {
        ScenarioBuilder::default()
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.deployment.router
    }

    #[must_use]
    pub fn manager(&self) -> &OrderManager {
        &self.deployment.manager
    }

    pub fn set_eth_price(&mut self, usd_whole: u64) {
        self.oracle.set_price(&mut self.state, WETH, usd(usd_whole));
    }

    /// Open a WETH-collateral, USDC-debt position for `user`.
    ///
    /// # Errors
    ///
    /// Returns a ledger error if minting fails.
    pub fn open_position(&mut self, user: Address, collateral: U256, debt: U256) -> Result<()> {
        self.venue
            .open_position(&mut self.state, user, (WETH, collateral), (USDC, debt))
    }

    /// Submit `auths` as transactions from `user`.
    ///
    /// # Errors
    ///
    /// Returns the first failing call's error.
    pub fn apply(&mut self, user: Address, auths: &[Authorization]) -> Result<()> {
        for auth in auths {
            self.deployment
                .contracts
                .call(&mut self.state, user, auth.target, &auth.call_data)?;
        }
        Ok(())
    }

    /// Compute and submit everything `user` must authorize for `instructions`.
    ///
    /// # Errors
    ///
    /// Returns router or call errors.
    pub fn authorize(&mut self, user: Address, instructions: &[Instruction]) -> Result<()> {
        let auths = self
            .deployment
            .router
            .authorize(&self.state, instructions, user)?;
        self.apply(user, &auths)
    }

    /// Execute `instructions` as `user`.
    ///
    /// # Errors
    ///
    /// Returns the router's error.
    pub fn execute(&mut self, user: Address, instructions: &[Instruction]) -> Result<Vec<Output>> {
        self.deployment
            .router
            .execute(&mut self.state, user, instructions, user)
    }

    /// LTV trigger parameters for the WETH/USDC position on the venue.
    #[must_use]
    pub fn ltv_params(trigger_bps: u16, target_bps: u16, slippage_bps: u16, chunks: u8) -> LtvTriggerParams {
        LtvTriggerParams {
            protocolId: VENUE_ID,
            protocolContext: Bytes::new(),
            triggerLtvBps: trigger_bps,
            targetLtvBps: target_bps,
            collateralToken: WETH,
            debtToken: USDC,
            collateralDecimals: WETH_DECIMALS,
            debtDecimals: USDC_DECIMALS,
            maxSlippageBps: slippage_bps,
            numChunks: chunks,
        }
    }

    /// Pre-hook: withdraw the sell amount (seed 0) and hand it to the manager.
    #[must_use]
    pub fn deleverage_pre(user: Address) -> Vec<Instruction> {
        vec![
            Instruction::protocol(
                VENUE_NAME,
                LendingOp::from_input(LendingAction::WithdrawCollateral, WETH, user, 0),
            ),
            Instruction::PushToken {
                input: 2,
                recipient: MANAGER,
            },
        ]
    }

    /// Post-hook: repay debt with the proceeds (seed 0), return change.
    #[must_use]
    pub fn deleverage_post(user: Address) -> Vec<Instruction> {
        vec![
            Instruction::approve(0, VENUE_NAME),
            Instruction::protocol(
                VENUE_NAME,
                LendingOp::from_input(LendingAction::Repay, USDC, user, 0),
            ),
            Instruction::PushToken {
                input: 2,
                recipient: user,
            },
        ]
    }

    /// A deleverage order for `user` and its hook appData.
    #[must_use]
    pub fn deleverage_order(
        &self,
        user: Address,
        salt: B256,
        params: &LtvTriggerParams,
        max_iterations: u32,
    ) -> (OrderParams, AppData) {
        let app_data = self.deployment.hooks_app_data(user, salt, APP_CODE);
        let order = OrderParams {
            user,
            trigger: LTV_TRIGGER,
            trigger_static_data: params.encode(),
            pre_instructions: Self::deleverage_pre(user),
            sell_token: WETH,
            buy_token: USDC,
            post_instructions: Self::deleverage_post(user),
            app_data_hash: app_data.hash().unwrap_or_default(),
            max_iterations,
            sell_token_refund_address: Address::ZERO,
            is_kind_buy: false,
        };
        (order, app_data)
    }

    /// Authorize the router for the order's instructions and create it.
    ///
    /// # Errors
    ///
    /// Returns authorization or creation errors.
    pub fn place_order(&mut self, order: OrderParams, salt: B256) -> Result<OrderHash> {
        let user = order.user;
        self.authorize(user, &order.pre_instructions)?;
        self.authorize(user, &order.post_instructions)?;
        let manager = Arc::clone(&self.deployment.manager);
        manager.create_order(&mut self.state, user, order, salt)
    }

    /// Fetch the current trade of an order and settle it.
    ///
    /// # Errors
    ///
    /// Returns quoting or settlement errors.
    pub fn settle(&mut self, user: Address, salt: B256, app_data: &AppData) -> Result<Fill> {
        let manager = Arc::clone(&self.deployment.manager);
        let (trade, signature) = manager.get_tradeable_order_with_signature(&self.state, user, salt)?;
        self.settlement
            .settle(&mut self.state, &trade, manager.address(), &signature, app_data)
    }
}
