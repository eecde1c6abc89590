//! Registries of gateways and flash lenders known to a router.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{LenderId, ProtocolName};
use crate::error::RouterError;
use crate::port::{FlashLender, Gateway};

/// Gateways keyed by protocol name.
#[derive(Default, Clone)]
pub struct GatewayRegistry {
    gateways: HashMap<ProtocolName, Arc<dyn Gateway>>,
}

impl GatewayRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gateway under its own name, replacing any previous one.
    pub fn register(&mut self, gateway: Arc<dyn Gateway>) {
        self.gateways
            .insert(ProtocolName::new(gateway.name()), gateway);
    }

    /// Look up a gateway.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::UnknownProtocol`] when nothing is registered.
    pub fn get(&self, name: &ProtocolName) -> Result<&Arc<dyn Gateway>, RouterError> {
        self.gateways
            .get(name)
            .ok_or_else(|| RouterError::UnknownProtocol(name.to_string()))
    }

    #[must_use]
    pub fn contains(&self, name: &ProtocolName) -> bool {
        self.gateways.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.gateways.keys().map(ProtocolName::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.gateways.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }
}

/// Flash lenders keyed by id.
#[derive(Default, Clone)]
pub struct LenderRegistry {
    lenders: HashMap<LenderId, Arc<dyn FlashLender>>,
}

impl LenderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, lender: Arc<dyn FlashLender>) {
        self.lenders.insert(lender.id().clone(), lender);
    }

    /// Look up a lender.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::UnknownLender`] when nothing is registered.
    pub fn get(&self, id: &LenderId) -> Result<&Arc<dyn FlashLender>, RouterError> {
        self.lenders
            .get(id)
            .ok_or_else(|| RouterError::UnknownLender(id.to_string()))
    }

    #[must_use]
    pub fn contains(&self, id: &LenderId) -> bool {
        self.lenders.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lenders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lenders.is_empty()
    }
}
