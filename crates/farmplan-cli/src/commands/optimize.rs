use std::collections::HashMap;
use std::fs;

use anyhow::{Context, Result};
use farmplan_core::model::Plan;
use farmplan_planner::OptimizeService;

pub async fn handle(plan_path: &str, stages: Option<Vec<String>>, out: Option<String>) -> Result<()> {
    let contents = fs::read_to_string(plan_path)
        .with_context(|| format!("reading plan file {plan_path}"))?;
    let plan: Plan = serde_json::from_str(&contents)
        .with_context(|| format!("parsing plan file {plan_path} as JSON"))?;

    let service = OptimizeService::new().context("loading planner configuration")?;
    let result = service
        .optimize_sync(plan, stages, HashMap::new())
        .await
        .context("running the stage sequence")?;

    let json = serde_json::to_string_pretty(&result)?;
    match out {
        Some(path) => {
            fs::write(&path, json).with_context(|| format!("writing result to {path}"))?;
            tracing::info!(path = %path, "wrote optimization result");
        }
        None => println!("{json}"),
    }

    if result.status != "ok" {
        std::process::exit(1);
    }
    Ok(())
}
