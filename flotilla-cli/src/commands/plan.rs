//! Plan command handler
//!
//! Registers the plan's waves and nodes, finalizes the builder and prints the
//! assembled orchestration graph.

use anyhow::{Context, Result};
use colored::*;
use flotilla_core::domain::node::PostAction;
use flotilla_core::dto::graph::AssembledPipeline;
use std::path::Path;

use crate::plan::DeploymentPlan;

pub fn handle_plan_command(file: &Path, json: bool) -> Result<()> {
    let pipeline = DeploymentPlan::from_file(file)?
        .assemble()
        .context("Failed to assemble deployment plan")?;

    if json {
        println!("{}", pipeline.to_json_pretty()?);
    } else {
        print_pipeline(&pipeline);
    }

    Ok(())
}

fn print_pipeline(pipeline: &AssembledPipeline) {
    println!("{}", "✓ Pipeline assembled".green().bold());
    println!("  ID:        {}", pipeline.id.cyan());
    println!("  Synth:     {}", pipeline.synth.name.bold());
    println!(
        "  Bucket:    {} {}",
        pipeline.asset_location.bucket,
        format!("(published as {})", pipeline.asset_location.parameter_name).dimmed()
    );
    let lifecycle = &pipeline.asset_location.lifecycle;
    println!(
        "  Retention: {}",
        format!(
            "objects {}d, non-current versions {}d{}",
            lifecycle.expiration_days,
            lifecycle.noncurrent_version_expiration_days,
            if lifecycle.versioned { ", versioned" } else { "" }
        )
        .dimmed()
    );
    println!("  Monitor:   {}", pipeline.monitor);

    if pipeline.is_empty() {
        println!();
        println!("{}", "No waves registered.".yellow());
        return;
    }

    println!(
        "  Waves:     {} ({} node(s))",
        pipeline.waves.len(),
        pipeline.node_count()
    );

    for wave in &pipeline.waves {
        println!();
        println!("  {} {}", "▸".cyan(), wave.id.bold());
        if wave.nodes.is_empty() {
            println!("    {}", "(empty)".dimmed());
        }
        for node in &wave.nodes {
            println!(
                "    {} {} {}",
                node.id.bold(),
                "→".dimmed(),
                node.job_name.cyan()
            );
            for action in node.scheduled_actions() {
                let detail = match action {
                    PostAction::PushArtifact { .. } => {
                        pipeline.asset_location.object_path(&node.job_name)
                    }
                    PostAction::InvokeMonitor { monitor, job_name, .. } => {
                        format!("{} {{\"jobName\": \"{}\"}}", monitor, job_name)
                    }
                };
                println!(
                    "      {} {:<14} {}",
                    action.run_order().to_string().dimmed(),
                    action.name(),
                    detail.dimmed()
                );
            }
        }
    }
}
