use std::fs;

use anyhow::{Context, Result};
use farmplan_core::model::Plan;

pub fn handle(plan_path: &str) -> Result<()> {
    let contents = fs::read_to_string(plan_path)
        .with_context(|| format!("reading plan file {plan_path}"))?;
    let plan: Plan = serde_json::from_str(&contents)
        .with_context(|| format!("parsing plan file {plan_path} as JSON"))?;

    match plan.validate() {
        Ok(diagnostics) => {
            for warning in diagnostics.warnings() {
                tracing::warn!(category = %warning.category, "{}", warning.message);
            }
            println!("plan is valid ({} warning(s))", diagnostics.warning_count());
            Ok(())
        }
        Err(e) => {
            eprintln!("plan is invalid: {e}");
            std::process::exit(1);
        }
    }
}
