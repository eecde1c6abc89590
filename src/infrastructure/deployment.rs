//! Composition root: wires registries into a router, an order manager and a
//! hooks trampoline sharing one contract registry.

use std::sync::Arc;

use alloy_primitives::{Address, B256};
use tracing::info;

use super::config::Config;
use crate::application::hooks::HooksTrampoline;
use crate::application::order::{OrderManager, DEFAULT_VALIDITY_WINDOW};
use crate::application::router::Router;
use crate::application::trigger::TriggerRegistry;
use crate::chain::ContractRegistry;
use crate::domain::AppData;
use crate::port::{Contract, FlashLender, Gateway, Trigger};

/// Gas limit written into hook appData when none is configured.
pub const DEFAULT_HOOK_GAS_LIMIT: u64 = 500_000;

/// The deployed components.
pub struct Deployment {
    pub router: Arc<Router>,
    pub manager: Arc<OrderManager>,
    pub trampoline: Arc<HooksTrampoline>,
    /// Every calldata-addressable contract, the manager included.
    pub contracts: Arc<ContractRegistry>,
    pub hook_gas_limit: u64,
}

impl Deployment {
    #[must_use]
    pub fn builder(
        router: Address,
        order_manager: Address,
        hooks_trampoline: Address,
        settlement: Address,
    ) -> DeploymentBuilder {
        DeploymentBuilder::new(router, order_manager, hooks_trampoline, settlement)
    }

    /// appData for an order's hooks with the deployment's gas limit.
    #[must_use]
    pub fn hooks_app_data(&self, user: Address, salt: B256, app_code: &str) -> AppData {
        self.manager
            .hooks_app_data(user, salt, app_code, self.hook_gas_limit)
    }
}

/// Builder for [`Deployment`].
pub struct DeploymentBuilder {
    router: Address,
    order_manager: Address,
    hooks_trampoline: Address,
    settlement: Address,
    gateways: Vec<Arc<dyn Gateway>>,
    lenders: Vec<Arc<dyn FlashLender>>,
    triggers: TriggerRegistry,
    contracts: Vec<Arc<dyn Contract>>,
    funders: Vec<Address>,
    validity_window: u64,
    hook_gas_limit: u64,
}

impl DeploymentBuilder {
    #[must_use]
    pub fn new(
        router: Address,
        order_manager: Address,
        hooks_trampoline: Address,
        settlement: Address,
    ) -> Self {
        Self {
            router,
            order_manager,
            hooks_trampoline,
            settlement,
            gateways: Vec::new(),
            lenders: Vec::new(),
            triggers: TriggerRegistry::new(),
            contracts: Vec::new(),
            funders: Vec::new(),
            validity_window: DEFAULT_VALIDITY_WINDOW,
            hook_gas_limit: DEFAULT_HOOK_GAS_LIMIT,
        }
    }

    /// Addresses and order tuning taken from a loaded config.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let d = &config.deployment;
        let mut builder = Self::new(d.router, d.order_manager, d.hooks_trampoline, d.settlement)
            .validity_window(config.orders.validity_window_secs)
            .hook_gas_limit(config.orders.default_hook_gas_limit);
        for funder in &config.orders.funders {
            builder = builder.funder(*funder);
        }
        builder
    }

    #[must_use]
    pub fn gateway(mut self, gateway: Arc<dyn Gateway>) -> Self {
        self.gateways.push(gateway);
        self
    }

    #[must_use]
    pub fn lender(mut self, lender: Arc<dyn FlashLender>) -> Self {
        self.lenders.push(lender);
        self
    }

    #[must_use]
    pub fn trigger(mut self, address: Address, trigger: Arc<dyn Trigger>) -> Self {
        self.triggers.register(address, trigger);
        self
    }

    /// Extra contract reachable through calldata (hook targets, delegation
    /// endpoints of venues).
    #[must_use]
    pub fn contract(mut self, contract: Arc<dyn Contract>) -> Self {
        self.contracts.push(contract);
        self
    }

    #[must_use]
    pub fn funder(mut self, funder: Address) -> Self {
        self.funders.push(funder);
        self
    }

    #[must_use]
    pub fn validity_window(mut self, secs: u64) -> Self {
        self.validity_window = secs;
        self
    }

    #[must_use]
    pub fn hook_gas_limit(mut self, gas: u64) -> Self {
        self.hook_gas_limit = gas;
        self
    }

    /// Wire everything together. The manager becomes a router operator and
    /// is registered as a contract so hooks can reach it.
    #[must_use]
    pub fn build(self) -> Deployment {
        let mut router = Router::builder(self.router).operator(self.order_manager);
        for gateway in self.gateways {
            router = router.gateway(gateway);
        }
        for lender in self.lenders {
            router = router.lender(lender);
        }
        let router = Arc::new(router.build());

        let mut manager = OrderManager::builder(self.order_manager, Arc::clone(&router))
            .hooks_trampoline(self.hooks_trampoline)
            .settlement(self.settlement)
            .triggers(self.triggers)
            .validity_window(self.validity_window);
        for funder in self.funders {
            manager = manager.funder(funder);
        }
        let manager = Arc::new(manager.build());

        let mut contracts = ContractRegistry::new();
        contracts.register(Arc::clone(&manager) as Arc<dyn Contract>);
        for contract in self.contracts {
            contracts.register(contract);
        }
        let contracts = Arc::new(contracts);

        let trampoline = Arc::new(HooksTrampoline::new(
            self.hooks_trampoline,
            self.settlement,
            Arc::clone(&contracts),
        ));

        info!(
            router = %router.address(),
            manager = %manager.address(),
            trampoline = %trampoline.address(),
            gateways = router.gateways().len(),
            contracts = contracts.len(),
            "Deployment wired"
        );
        Deployment {
            router,
            manager,
            trampoline,
            contracts,
            hook_gas_limit: self.hook_gas_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_is_operator_and_contract() {
        let deployment = Deployment::builder(
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            Address::repeat_byte(3),
            Address::repeat_byte(4),
        )
        .build();

        assert!(deployment.router.is_operator(Address::repeat_byte(2)));
        assert!(deployment.contracts.get(Address::repeat_byte(2)).is_some());
        assert_eq!(deployment.trampoline.settlement(), Address::repeat_byte(4));
        assert_eq!(deployment.manager.hooks_trampoline(), Address::repeat_byte(3));
    }
}
