//! Inbound adapters.

pub mod inbound;
