//! Trigger policies and the registries that resolve them.

mod ltv;

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::Address;

use crate::domain::ProtocolId;
use crate::error::{OrderError, TriggerError};
use crate::port::{Trigger, ViewAggregator};

pub use ltv::{LtvSnapshot, LtvTrigger};

/// Triggers keyed by the address orders reference them by.
#[derive(Default, Clone)]
pub struct TriggerRegistry {
    triggers: HashMap<Address, Arc<dyn Trigger>>,
}

impl TriggerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, address: Address, trigger: Arc<dyn Trigger>) {
        self.triggers.insert(address, trigger);
    }

    /// Resolve a trigger address.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::InvalidTrigger`] for the zero address or an
    /// unregistered one.
    pub fn get(&self, address: Address) -> Result<&Arc<dyn Trigger>, OrderError> {
        if address.is_zero() {
            return Err(OrderError::InvalidTrigger(address));
        }
        self.triggers
            .get(&address)
            .ok_or(OrderError::InvalidTrigger(address))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

/// View aggregators keyed by protocol id.
#[derive(Default, Clone)]
pub struct ViewRegistry {
    views: HashMap<ProtocolId, Arc<dyn ViewAggregator>>,
}

impl ViewRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, view: Arc<dyn ViewAggregator>) {
        self.views.insert(view.protocol_id(), view);
    }

    /// Look up the view for a protocol.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::UnknownProtocol`] when nothing is registered.
    pub fn get(&self, id: ProtocolId) -> Result<&Arc<dyn ViewAggregator>, TriggerError> {
        self.views
            .get(&id)
            .ok_or(TriggerError::UnknownProtocol(id.value()))
    }
}
