use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use router_config::{ConfigLoader, RouterConfig};
use router_core::{MarketRouter, PlanOptions};
use router_types::MarketSide;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod scenario;

use scenario::Scenario;

#[derive(Parser)]
#[command(name = "market-router")]
#[command(about = "DEX aggregation path optimizer", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[arg(short, long, value_name = "FILE", default_value = "config/router.toml")]
	config: PathBuf,

	#[arg(long, env = "ROUTER_LOG_LEVEL", default_value = "info")]
	log_level: String,
}

#[derive(Subcommand)]
enum Commands {
	/// Plan a recorded scenario and print the optimized orders as JSON
	Plan {
		/// Scenario file describing the operation and venue liquidity
		#[arg(value_name = "SCENARIO")]
		scenario: PathBuf,
	},
	/// Validate the configuration file
	Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	setup_tracing(&cli.log_level)?;

	match &cli.command {
		Commands::Plan { scenario } => plan_scenario(&cli, scenario).await,
		Commands::Validate => validate_config(&cli).await,
	}
}

async fn load_config(cli: &Cli) -> Result<RouterConfig> {
	info!("Loading configuration from: {:?}", cli.config);

	ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.context("Failed to load configuration")
}

async fn plan_scenario(cli: &Cli, path: &Path) -> Result<()> {
	let config = load_config(cli).await?;
	let scenario = Scenario::load(path).await?;

	let mut options = PlanOptions::from_config(&config);
	for token in scenario.intermediate_tokens() {
		if !options.intermediate_tokens.contains(&token) {
			options.intermediate_tokens.push(token);
		}
	}

	let router = MarketRouter::from_config(Arc::new(scenario.sampler()), &config);
	let planned = if scenario.orders.is_empty() {
		let pair = scenario
			.pair()
			.context("Scenario names neither orders nor a token pair")?;
		router
			.plan(scenario.side, pair, &[], scenario.amount, &options)
			.await
	} else {
		match scenario.side {
			MarketSide::Sell => {
				router
					.plan_sell(&scenario.orders, scenario.amount, &options)
					.await
			}
			MarketSide::Buy => {
				router
					.plan_buy(&scenario.orders, scenario.amount, &options)
					.await
			}
		}
	};
	let result = planned.context("Failed to plan scenario")?;

	info!(
		"Planned {} orders using {:?}",
		result.optimized_orders.len(),
		result.report.sources_used
	);
	println!(
		"{}",
		serde_json::to_string_pretty(&result).context("Failed to serialize plan")?
	);

	Ok(())
}

async fn validate_config(cli: &Cli) -> Result<()> {
	let config = load_config(cli).await?;

	info!("Configuration is valid");
	info!("Router name: {}", config.router.name);
	info!(
		"Sampling: {} samples, distribution base {}",
		config.sampling.num_samples, config.sampling.sample_distribution_base
	);
	if !config.sources.included.is_empty() {
		info!("Included sources: {:?}", config.sources.included);
	}
	if !config.sources.excluded.is_empty() {
		info!("Excluded sources: {:?}", config.sources.excluded);
	}
	for (source, bridge) in &config.sources.bridges {
		info!("  Bridge: {} at {}", source, bridge);
	}

	Ok(())
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	Ok(())
}
