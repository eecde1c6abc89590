//! Off-chain order watcher.
//!
//! Follows the chain's event log to discover conditional orders and asks the
//! manager which of them can trade right now, the way a settlement network
//! watch-tower would before posting orders to its book.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::order::OrderManager;
use crate::chain::ChainState;
use crate::domain::{Event, OrderHash, TradeDescriptor};
use crate::error::OrderError;

/// An order that can be posted to the settlement network now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeableOrder {
    pub user: Address,
    pub salt: B256,
    pub hash: OrderHash,
    pub trade: TradeDescriptor,
    pub signature: Bytes,
}

/// Polls one order manager.
pub struct Watcher {
    chain: Arc<Mutex<ChainState>>,
    manager: Arc<OrderManager>,
    cursor: usize,
    known: BTreeMap<OrderHash, (Address, B256)>,
    interval: Duration,
}

impl Watcher {
    #[must_use]
    pub fn new(chain: Arc<Mutex<ChainState>>, manager: Arc<OrderManager>, interval: Duration) -> Self {
        Self {
            chain,
            manager,
            cursor: 0,
            known: BTreeMap::new(),
            interval,
        }
    }

    /// Orders currently tracked.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.known.len()
    }

    /// Read new events, then collect every tracked order that can trade.
    ///
    /// Orders that fail to quote are logged and skipped.
    pub fn poll(&mut self) -> Vec<TradeableOrder> {
        let chain = self.chain.lock();
        let manager = self.manager.address();

        for event in chain.events_since(self.cursor) {
            match event {
                Event::OrderCreated {
                    manager: m,
                    hash,
                    user,
                    salt,
                    ..
                } if *m == manager => {
                    debug!(order = %hash, %user, "Discovered order");
                    self.known.insert(*hash, (*user, *salt));
                }
                Event::OrderCompleted { manager: m, hash, .. }
                | Event::OrderCancelled { manager: m, hash } if *m == manager => {
                    debug!(order = %hash, "Order closed");
                    self.known.remove(hash);
                }
                _ => {}
            }
        }
        self.cursor = chain.events().len();

        let mut tradeable = Vec::new();
        for (&hash, &(user, salt)) in &self.known {
            match self
                .manager
                .get_tradeable_order_with_signature(&chain, user, salt)
            {
                Ok((trade, signature)) => tradeable.push(TradeableOrder {
                    user,
                    salt,
                    hash,
                    trade,
                    signature,
                }),
                Err(e) => match e.as_order() {
                    Some(OrderError::TriggerNotMet { reason }) => {
                        debug!(order = %hash, %reason, "Not tradeable");
                    }
                    _ => warn!(order = %hash, %user, error = %e, "Order quote failed"),
                },
            }
        }
        tradeable
    }

    /// Poll on every tick and send tradeable orders to `tx` until `shutdown`
    /// flips to true or the receiver goes away.
    pub async fn run(mut self, tx: mpsc::Sender<TradeableOrder>, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!(manager = %self.manager.address(), interval_ms = self.interval.as_millis(), "Watcher started");

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Watcher shutting down");
                        break;
                    }
                }
                _ = interval.tick() => {
                    for order in self.poll() {
                        if tx.send(order).await.is_err() {
                            debug!("Receiver dropped, stopping watcher");
                            return;
                        }
                    }
                }
            }
        }
    }
}
