use std::path::Path;

use crate::adapter::inbound::cli::output;
use crate::application::router::validate_layout;
use crate::domain::Instruction;
use crate::error::Result;

/// Statically check an instruction list and print its slot layout.
pub fn execute_plan<P: AsRef<Path>>(path: P, seeds: usize) -> Result<()> {
    let content = std::fs::read_to_string(path)?;
    let instructions: Vec<Instruction> = serde_json::from_str(&content)?;
    let layout = validate_layout(&instructions, seeds)?;

    output::section("Layout");
    output::field("Seeds", layout.seeds);
    for step in &layout.steps {
        let reads = match (step.reads, step.consumes) {
            (Some(i), true) => format!("consumes {i}"),
            (Some(i), false) => format!("reads {i}"),
            (None, _) => "-".to_string(),
        };
        let appends = if step.appends.is_empty() {
            "-".to_string()
        } else {
            format!("{}..{}", step.appends.start, step.appends.end)
        };
        output::field(
            &format!("#{} {}", step.instruction, step.kind),
            format!("{reads}, appends {appends}"),
        );
    }
    output::field("Final outputs", layout.final_len);
    output::success("Layout is valid");
    Ok(())
}
