// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::io::{self, Write};

use anyhow::Context;
use futures_util::StreamExt;
use serde_json::{Map, Value};
use the_hoagie::config::load_orchestrator;
use the_hoagie::engine::{NodeOutput, ScheduleOutput};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <pipeline.yaml> <payload-json>", args[0]);
        eprintln!(
            "Example: {} configs/rag-pipeline.yaml '{{\"query\": \"what is a hoagie?\"}}'",
            args[0]
        );
        std::process::exit(1);
    }

    let orchestrator =
        load_orchestrator(&args[1]).with_context(|| format!("loading pipeline '{}'", args[1]))?;

    let payload: Map<String, Value> =
        serde_json::from_str(&args[2]).context("payload must be a JSON object")?;

    let output = orchestrator
        .schedule(payload)
        .await
        .context("pipeline run failed")?;

    match output {
        ScheduleOutput::Single(output) => print_output(&args[1], output).await?,
        ScheduleOutput::PerLeaf(outputs) => {
            for (leaf, output) in outputs {
                print_output(&leaf, output).await?;
            }
        }
    }

    Ok(())
}

/// Print one leaf result; stream chunks are forwarded to stdout as they
/// arrive.
async fn print_output(label: &str, output: NodeOutput) -> anyhow::Result<()> {
    match output {
        NodeOutput::Json(fields) => {
            println!("{}", serde_json::to_string_pretty(&Value::Object(fields))?);
        }
        NodeOutput::Stream(mut stream) => {
            let mut stdout = io::stdout();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.with_context(|| format!("stream from '{}' failed", label))?;
                stdout.write_all(&chunk)?;
                stdout.flush()?;
            }
            println!();
        }
    }
    Ok(())
}
