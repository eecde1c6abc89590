//! Application services.
//!
//! The router and order manager are the two contracts the crate models; the
//! trampoline bridges the settlement to the manager, and the watcher is the
//! off-chain side that discovers tradeable orders.

pub mod hooks;
pub mod order;
pub mod router;
pub mod trigger;
pub mod watcher;
