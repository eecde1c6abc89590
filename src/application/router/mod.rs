//! Atomic instruction router.
//!
//! The router threads an explicitly indexed arena of outputs through an
//! ordered list of instructions. Either every instruction applies or the
//! chain is left untouched. At the end of an execution the router holds
//! exactly what it held before and every allowance it granted is revoked.

mod arena;
mod layout;
mod registry;

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use tracing::{debug, info, trace};

use crate::chain::abi::IERC20;
use crate::chain::ChainState;
use crate::domain::{
    Backing, Event, Instruction, LenderId, LendingOp, Output, ProtocolName,
};
use crate::error::{Result, RouterError};
use crate::port::{Authorization, FlashLender, FlashLoanCallback, Gateway, GatewayCall};

pub use arena::OutputArena;
pub use layout::{consumes_input, validate_layout, Layout, LayoutStep};
pub use registry::{GatewayRegistry, LenderRegistry};

/// Output pre-populated by an operator before the first instruction runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seed {
    /// Transferred from the caller into router custody.
    Funded(Output),
    /// Declared only; a flash loan may back it later.
    Virtual(Output),
}

/// State of one execution.
struct Execution {
    arena: OutputArena,
    /// `(token, spender)` pairs approved during the execution.
    granted: Vec<(Address, Address)>,
}

/// The instruction router.
pub struct Router {
    address: Address,
    gateways: GatewayRegistry,
    lenders: LenderRegistry,
    operators: HashSet<Address>,
}

impl Router {
    /// Start building a router deployed at `address`.
    #[must_use]
    pub fn builder(address: Address) -> RouterBuilder {
        RouterBuilder::new(address)
    }

    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub fn gateways(&self) -> &GatewayRegistry {
        &self.gateways
    }

    #[must_use]
    pub fn lenders(&self) -> &LenderRegistry {
        &self.lenders
    }

    /// True when `caller` may execute on behalf of any user.
    #[must_use]
    pub fn is_operator(&self, caller: Address) -> bool {
        self.operators.contains(&caller)
    }

    /// Static layout check plus resolution of every gateway and lender name.
    ///
    /// # Errors
    ///
    /// Returns the first layout problem or unknown name.
    pub fn validate_layout(
        &self,
        instructions: &[Instruction],
        seeds: usize,
    ) -> std::result::Result<Layout, RouterError> {
        let layout = validate_layout(instructions, seeds)?;
        for instruction in instructions {
            match instruction {
                Instruction::Approve { protocol, .. } | Instruction::Protocol { protocol, .. } => {
                    self.gateways.get(protocol)?;
                }
                Instruction::FlashLoan { lender, .. } => {
                    self.lenders.get(lender)?;
                }
                _ => {}
            }
        }
        Ok(layout)
    }

    /// Execute `instructions` for `user` atomically.
    ///
    /// # Errors
    ///
    /// Returns the first failure; the chain is then unchanged.
    pub fn execute(
        &self,
        state: &mut ChainState,
        sender: Address,
        instructions: &[Instruction],
        user: Address,
    ) -> Result<Vec<Output>> {
        self.execute_with_inputs(state, sender, instructions, user, &[])
    }

    /// Execute with pre-populated outputs at indices `0..seeds.len()`.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::Unauthorized`] unless `sender` is `user` or an
    /// operator, and otherwise the first failure; the chain is then unchanged.
    pub fn execute_with_inputs(
        &self,
        state: &mut ChainState,
        sender: Address,
        instructions: &[Instruction],
        user: Address,
        seeds: &[Seed],
    ) -> Result<Vec<Output>> {
        if sender != user && !self.is_operator(sender) {
            return Err(RouterError::Unauthorized {
                caller: sender,
                user,
            }
            .into());
        }
        self.validate_layout(instructions, seeds.len())?;
        for (i, instruction) in instructions.iter().enumerate() {
            if let Some(found) = instruction.user() {
                if found != user {
                    return Err(RouterError::UserMismatch {
                        instruction: i,
                        expected: user,
                        found,
                    }
                    .into());
                }
            }
        }

        state.transact(|state| -> Result<Vec<Output>> {
            let custody_before = state.tokens.holdings(self.address);
            let mut exec = Execution {
                arena: OutputArena::new(),
                granted: Vec::new(),
            };

            for seed in seeds {
                match *seed {
                    Seed::Funded(output) => {
                        state
                            .tokens
                            .transfer(output.token, sender, self.address, output.amount)?;
                        exec.arena.push(output);
                    }
                    Seed::Virtual(output) => {
                        exec.arena.push_virtual(output);
                    }
                }
            }

            self.run(state, &mut exec, instructions, 0)?;

            for (token, spender) in exec.granted.drain(..) {
                state.tokens.approve(token, self.address, spender, U256::ZERO);
            }
            check_custody(&custody_before, &state.tokens.holdings(self.address))?;

            let outputs = exec.arena.into_outputs();
            state.emit(Event::InstructionsExecuted {
                router: self.address,
                user,
                instructions: instructions.len(),
                outputs: outputs.len(),
            });
            info!(
                router = %self.address,
                %user,
                %sender,
                instructions = instructions.len(),
                outputs = outputs.len(),
                "Instructions executed"
            );
            Ok(outputs)
        })
    }

    /// Calls `user` must submit before executing `instructions`: ERC-20
    /// approvals for pulled totals not yet covered, then whatever each
    /// gateway requires.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::UnknownProtocol`] or a gateway error.
    pub fn authorize(
        &self,
        state: &ChainState,
        instructions: &[Instruction],
        user: Address,
    ) -> Result<Vec<Authorization>> {
        let mut pulls: Vec<(Address, U256)> = Vec::new();
        let mut by_gateway: Vec<(&ProtocolName, Vec<LendingOp>)> = Vec::new();

        for instruction in instructions {
            match instruction {
                Instruction::PullToken {
                    amount,
                    token,
                    user: owner,
                } if *owner == user => match pulls.iter_mut().find(|(t, _)| t == token) {
                    Some((_, total)) => *total = total.saturating_add(*amount),
                    None => pulls.push((*token, *amount)),
                },
                Instruction::Protocol { protocol, op } if op.user == user => {
                    match by_gateway.iter_mut().find(|(name, _)| *name == protocol) {
                        Some((_, ops)) => ops.push(op.clone()),
                        None => by_gateway.push((protocol, vec![op.clone()])),
                    }
                }
                _ => {}
            }
        }

        let mut authorizations = Vec::new();
        for (token, total) in pulls {
            if state.tokens.allowance(token, user, self.address) < total {
                let call = IERC20::approveCall {
                    spender: self.address,
                    amount: total,
                };
                authorizations.push(Authorization::new(token, call.abi_encode()));
            }
        }
        for (name, ops) in by_gateway {
            let gateway = self.gateways.get(name)?;
            authorizations.extend(gateway.authorize(state, &ops, user, self.address)?);
        }
        Ok(authorizations)
    }

    fn run(
        &self,
        state: &mut ChainState,
        exec: &mut Execution,
        instructions: &[Instruction],
        start: usize,
    ) -> Result<()> {
        for (i, instruction) in instructions.iter().enumerate().skip(start) {
            trace!(instruction = i, kind = instruction.kind(), "step");
            match instruction {
                Instruction::FlashLoan { lender, input } => {
                    // the rest of the list runs inside the lender's callback
                    return self.flash_loan(state, exec, instructions, i, lender, *input);
                }
                Instruction::PullToken {
                    amount,
                    token,
                    user,
                } => {
                    state
                        .tokens
                        .transfer_from(*token, self.address, *user, self.address, *amount)?;
                    exec.arena.push(Output::new(*amount, *token, *user));
                }
                Instruction::ToOutput {
                    amount,
                    token,
                    user,
                } => {
                    exec.arena.push_virtual(Output::new(*amount, *token, *user));
                }
                Instruction::Approve { input, protocol } => {
                    let output = exec.arena.peek(i, *input)?;
                    let spender = self.gateways.get(protocol)?.spender();
                    state
                        .tokens
                        .approve(output.token, self.address, spender, output.amount);
                    exec.granted.push((output.token, spender));
                    exec.arena
                        .push(Output::placeholder(output.token, output.owner));
                }
                Instruction::PushToken { input, recipient } => {
                    let output = exec.arena.consume(i, *input)?;
                    state
                        .tokens
                        .transfer(output.token, self.address, *recipient, output.amount)?;
                }
                Instruction::Protocol { protocol, op } => {
                    self.protocol(state, exec, i, protocol, op)?;
                }
            }
        }
        Ok(())
    }

    fn protocol(
        &self,
        state: &mut ChainState,
        exec: &mut Execution,
        i: usize,
        name: &ProtocolName,
        op: &LendingOp,
    ) -> Result<()> {
        let gateway: Arc<dyn Gateway> = Arc::clone(self.gateways.get(name)?);
        let consumes = op.action.consumes_tokens();

        let input = match (op.input, consumes) {
            (Some(index), true) => Some(exec.arena.consume(i, index)?),
            (Some(index), false) => Some(exec.arena.peek(i, index)?),
            (None, true) => {
                return Err(RouterError::MissingInput {
                    instruction: i,
                    kind: op.action.as_str(),
                }
                .into())
            }
            (None, false) => None,
        };

        let mut resolved = op.clone();
        if let Some(input) = input {
            if op.amount.is_zero() {
                resolved.amount = input.amount;
            }
            if consumes {
                if input.token != op.token {
                    return Err(RouterError::TokenMismatch {
                        instruction: i,
                        expected: input.token,
                        found: op.token,
                    }
                    .into());
                }
                if resolved.amount > input.amount {
                    return Err(RouterError::AmountExceedsInput {
                        instruction: i,
                        requested: resolved.amount,
                        available: input.amount,
                    }
                    .into());
                }
            }
        }

        let before = state.tokens.holdings(self.address);
        let outputs = gateway.execute(
            state,
            GatewayCall {
                router: self.address,
                op: &resolved,
                input,
            },
        )?;
        let after = state.tokens.holdings(self.address);

        let expected = op.action.gateway_outputs();
        if outputs.len() != expected {
            return Err(RouterError::OutputCountMismatch {
                protocol: name.to_string(),
                expected,
                actual: outputs.len(),
            }
            .into());
        }

        let consumed_token = input.filter(|_| consumes).map(|o| o.token);
        let mut reported_in_kind = U256::ZERO;
        for output in &outputs {
            if Some(output.token) == consumed_token {
                reported_in_kind = reported_in_kind.saturating_add(output.amount);
                continue;
            }
            let delivered = held(&after, output.token).saturating_sub(held(&before, output.token));
            if delivered < output.amount {
                return Err(RouterError::UnbackedGatewayOutput {
                    protocol: name.to_string(),
                    token: output.token,
                    reported: output.amount,
                    delivered,
                }
                .into());
            }
        }
        for output in outputs {
            exec.arena.push(output);
        }

        if let (true, Some(input)) = (consumes, input) {
            let spent = held(&before, input.token)
                .saturating_add(reported_in_kind)
                .saturating_sub(held(&after, input.token));
            if spent > input.amount {
                return Err(RouterError::Overspent {
                    protocol: name.to_string(),
                    spent,
                    available: input.amount,
                }
                .into());
            }
            exec.arena
                .push(Output::new(input.amount - spent, input.token, input.owner));
        }

        debug!(
            instruction = i,
            protocol = %name,
            action = op.action.as_str(),
            amount = %resolved.amount,
            "Gateway operation applied"
        );
        Ok(())
    }

    fn flash_loan(
        &self,
        state: &mut ChainState,
        exec: &mut Execution,
        instructions: &[Instruction],
        i: usize,
        lender_id: &LenderId,
        input: usize,
    ) -> Result<()> {
        let lender: Arc<dyn FlashLender> = Arc::clone(self.lenders.get(lender_id)?);
        if exec.arena.backing(i, input)? == Backing::Custody {
            return Err(RouterError::AlreadyBacked { index: input }.into());
        }
        let wanted = exec.arena.peek(i, input)?;
        let expected = lender.address();
        let router = self.address;
        let held_before = state.tokens.balance_of(wanted.token, router);
        let mut called = false;

        lender.flash_loan(
            state,
            router,
            wanted.token,
            wanted.amount,
            &mut |state: &mut ChainState, callback: FlashLoanCallback| -> Result<()> {
                if callback.lender != expected || called {
                    return Err(RouterError::UnexpectedLender {
                        expected: (!called).then_some(expected),
                        actual: callback.lender,
                    }
                    .into());
                }
                called = true;

                let held_now = state.tokens.balance_of(wanted.token, router);
                if callback.token != wanted.token
                    || held_now < held_before.saturating_add(wanted.amount)
                {
                    return Err(RouterError::UnbackedOutput { index: input }.into());
                }
                exec.arena.back(i, input)?;
                debug!(
                    instruction = i,
                    lender = %lender_id,
                    token = %wanted.token,
                    amount = %wanted.amount,
                    "Flash loan received"
                );
                self.run(state, exec, instructions, i + 1)
            },
        )?;

        if !called {
            return Err(RouterError::FlashLoanCallbackMissing { lender: expected }.into());
        }
        Ok(())
    }
}

fn held(holdings: &BTreeMap<Address, U256>, token: Address) -> U256 {
    holdings.get(&token).copied().unwrap_or_default()
}

fn check_custody(
    before: &BTreeMap<Address, U256>,
    after: &BTreeMap<Address, U256>,
) -> std::result::Result<(), RouterError> {
    for token in before.keys().chain(after.keys()) {
        let (was, now) = (held(before, *token), held(after, *token));
        if was != now {
            return Err(RouterError::ResidualCustody {
                token: *token,
                before: was,
                after: now,
            });
        }
    }
    Ok(())
}

/// Builder for [`Router`].
pub struct RouterBuilder {
    address: Address,
    gateways: GatewayRegistry,
    lenders: LenderRegistry,
    operators: HashSet<Address>,
}

impl RouterBuilder {
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self {
            address,
            gateways: GatewayRegistry::new(),
            lenders: LenderRegistry::new(),
            operators: HashSet::new(),
        }
    }

    #[must_use]
    pub fn gateway(mut self, gateway: Arc<dyn Gateway>) -> Self {
        self.gateways.register(gateway);
        self
    }

    #[must_use]
    pub fn lender(mut self, lender: Arc<dyn FlashLender>) -> Self {
        self.lenders.register(lender);
        self
    }

    /// Allow `operator` to execute on behalf of any user.
    #[must_use]
    pub fn operator(mut self, operator: Address) -> Self {
        self.operators.insert(operator);
        self
    }

    #[must_use]
    pub fn build(self) -> Router {
        Router {
            address: self.address,
            gateways: self.gateways,
            lenders: self.lenders,
            operators: self.operators,
        }
    }
}
