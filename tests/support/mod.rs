#![allow(dead_code)]

pub mod architecture;
pub mod assertions;

use alloy_primitives::B256;
use lendflow::chain::ChainState;
use lendflow::domain::Event;

pub fn salt(n: u8) -> B256 {
    B256::repeat_byte(n)
}

/// Names of the events appended after `cursor`.
pub fn event_names(state: &ChainState, cursor: usize) -> Vec<&'static str> {
    state.events_since(cursor).iter().map(Event::name).collect()
}
