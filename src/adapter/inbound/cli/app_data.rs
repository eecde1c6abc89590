use std::path::Path;

use crate::adapter::inbound::cli::output;
use crate::domain::AppData;
use crate::error::Result;

/// Print the canonical form of an appData document and its hash.
pub fn execute_hash<P: AsRef<Path>>(path: P) -> Result<()> {
    let content = std::fs::read_to_string(path)?;
    let app_data = AppData::parse(&content)?;
    output::field("Canonical", app_data.canonical_json()?);
    output::field("Hash", app_data.hash()?);
    Ok(())
}
