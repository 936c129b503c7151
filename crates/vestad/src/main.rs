//! Vesta CLI - satellite anomaly diagnosis over a causal knowledge graph.
//!
//! `seed` populates the graph from the built-in knowledge base, `route`
//! classifies an event to one subsystem, `diagnose` runs the full
//! traversal → reasoning → write-back pipeline.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vesta_common::Config;
use vestad::pipeline::DiagnosisOptions;
use vestad::{knowledge, seed, DiagnosisEngine, Neo4jGraph, QwenClient, SubsystemRouter};

#[derive(Parser)]
#[command(name = "vestad", version, about = "Satellite anomaly diagnosis engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Seed the built-in power-subsystem knowledge base into the graph
    Seed {
        /// Empty the graph store before seeding
        #[arg(long)]
        wipe: bool,
    },
    /// Attribute an anomaly event to one satellite subsystem
    Route {
        /// Anomaly event description
        event: String,
    },
    /// Produce ranked repair recommendations for an anomaly event
    Diagnose {
        /// Event node name in the knowledge graph
        event: String,
        /// Restrict traversal to one subsystem scope
        #[arg(long)]
        system: Option<String>,
        /// JSON file with a telemetry snapshot to include in the prompt
        #[arg(long)]
        telemetry: Option<PathBuf>,
        /// Do not persist recommendations back onto the graph
        #[arg(long)]
        no_write_back: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("vestad v{} starting", env!("CARGO_PKG_VERSION"));
    let cli = Cli::parse();
    let config = Config::load();

    match cli.command {
        Command::Seed { wipe } => {
            config.validate_graph()?;
            let graph = connect(&config).await?;
            let stats = seed::seed(&graph, &knowledge::POWER_SYSTEM, wipe).await?;
            println!(
                "Seeded {}: {} node merges, {} relationship merges",
                knowledge::POWER_SYSTEM.system,
                stats.nodes,
                stats.relationships
            );
        }
        Command::Route { event } => {
            config.validate_llm()?;
            let client = client(&config)?;
            let router = SubsystemRouter::new(&client, &config.llm.model, config.diagnosis.max_retries);
            let accepted = router.route(&event).await?;
            println!("{}", accepted.response);
        }
        Command::Diagnose {
            event,
            system,
            telemetry,
            no_write_back,
        } => {
            config.validate()?;
            let telemetry: Option<Value> = match telemetry {
                Some(path) => Some(serde_json::from_str(&fs::read_to_string(path)?)?),
                None => None,
            };
            let graph = connect(&config).await?;
            let client = client(&config)?;
            let mut options = DiagnosisOptions::from_config(&config);
            if no_write_back {
                options.write_back = false;
            }
            let engine = DiagnosisEngine::new(&graph, &client, options);
            let diagnosis = engine
                .diagnose(&event, system.as_deref(), telemetry.as_ref())
                .await?;

            println!("=== 候选路径（来自图谱）===");
            for p in &diagnosis.paths {
                println!("- {} → {} → {}", p.cause, p.sub_cause, p.repair);
            }
            println!("\n=== 推荐结果（JSON）===");
            println!("{}", serde_json::to_string_pretty(&diagnosis.recommendations)?);
            if let Some(summary) = diagnosis.write_back {
                println!(
                    "\n写回: {} 条已保存, {} 条跳过, {} 条失败",
                    summary.written, summary.skipped, summary.failed
                );
            }
        }
    }

    Ok(())
}

async fn connect(config: &Config) -> Result<Neo4jGraph> {
    Ok(Neo4jGraph::connect(&config.graph.uri, &config.graph.user, &config.graph.password).await?)
}

fn client(config: &Config) -> Result<QwenClient> {
    Ok(QwenClient::new(
        &config.llm.base_url,
        &config.llm.api_key,
        config.llm.timeout_secs,
    )?)
}
