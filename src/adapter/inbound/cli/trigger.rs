use std::path::Path;

use alloy_primitives::hex;

use crate::adapter::inbound::cli::output;
use crate::domain::LtvTriggerParams;
use crate::error::{Error, Result};

/// Encode LTV trigger parameters read from a JSON file.
pub fn execute_encode<P: AsRef<Path>>(path: P) -> Result<()> {
    let content = std::fs::read_to_string(path)?;
    let params: LtvTriggerParams = serde_json::from_str(&content)?;
    params.validate()?;
    output::field("Static data", params.encode());
    Ok(())
}

/// Decode hex static data and print the parameters.
pub fn execute_decode(data: &str) -> Result<()> {
    let bytes = hex::decode(data.trim()).map_err(|e| Error::Parse(format!("hex: {e}")))?;
    let params = LtvTriggerParams::decode(&bytes)?;
    output::document("trigger_params", &serde_json::to_value(&params)?);
    Ok(())
}
