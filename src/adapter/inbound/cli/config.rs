use std::path::Path;

use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::config::Config;

/// Validate a configuration file without wiring a deployment.
pub fn execute_check<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let config = Config::load(path)?;

    output::section("Configuration Check");
    output::field("Config", path.display());
    output::success("Configuration file is valid");

    output::section("Deployment");
    output::field("Chain ID", config.chain_id);
    output::field("Router", config.deployment.router);
    output::field("Order manager", config.deployment.order_manager);
    output::field("Trampoline", config.deployment.hooks_trampoline);
    output::field("Settlement", config.deployment.settlement);

    output::section("Orders");
    output::field("Validity (s)", config.orders.validity_window_secs);
    output::field("Hook gas", config.orders.default_hook_gas_limit);
    output::field("Funders", config.orders.funders.len());
    Ok(())
}
