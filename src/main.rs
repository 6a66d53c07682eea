use std::path::PathBuf;

use anyhow::{Context, Result};
use benefit_engine::api::{AppState, create_router};
use benefit_engine::config::ConfigLoader;
use benefit_engine::external::{
    CachedRegistryLookup, CachedRuleExtractor, DEFAULT_REGISTRY_URL, HttpRegistryLookup,
    RegistryLookup, TextRuleExtractor,
};
use benefit_engine::models::ReferencePeriod;
use benefit_engine::pipeline::Pipeline;
use benefit_engine::report::ReportWriter;
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "benefit-engine")]
#[command(about = "Monthly meal and transport benefit calculation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline over a directory of source files
    Run {
        /// Configuration directory
        #[arg(long, default_value = "config/default")]
        config: PathBuf,
        /// Directory holding the source files
        #[arg(long)]
        input: PathBuf,
        /// Report file to write; review tables are written next to it
        #[arg(long)]
        output: PathBuf,
        /// Reference period (YYYY-MM); defaults to the configured period
        #[arg(long)]
        period: Option<ReferencePeriod>,
        /// Resolve meal rates from the union agreement documents
        #[arg(long)]
        agreements: bool,
    },
    /// Look up company identifiers in the public registry, printing JSON profiles
    Registry {
        /// Identifiers; punctuation is ignored (e.g. 12.345.678/0001-90)
        #[arg(required = true)]
        ids: Vec<String>,
        /// Registry endpoint
        #[arg(long, default_value = DEFAULT_REGISTRY_URL)]
        url: String,
        /// API token sent with each request
        #[arg(long, env = "RECEITAWS_TOKEN")]
        token: Option<String>,
    },
    /// Serve the calculation API
    Serve {
        /// Configuration directory
        #[arg(long, default_value = "config/default")]
        config: PathBuf,
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: String,
    },
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("benefit_engine=info")),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            input,
            output,
            period,
            agreements,
        } => {
            let loader = ConfigLoader::load(&config)
                .with_context(|| format!("loading configuration from {}", config.display()))?;
            let engine_config = loader.config();
            let period = period
                .or_else(|| engine_config.period())
                .context("no reference period given and none configured")?;

            let extractor = CachedRuleExtractor::new(TextRuleExtractor::new()?);
            let mut pipeline = Pipeline::new(engine_config);
            if agreements {
                pipeline = pipeline.with_rule_extractor(&extractor);
            }

            let run = pipeline
                .run(&input, period, Local::now().date_naive())
                .with_context(|| format!("running pipeline over {}", input.display()))?;

            ReportWriter::new(engine_config.output_delimiter())?.write_run(
                &output,
                &run.report,
                &run.duplicates,
                &run.excluded,
                &run.issues,
            )?;

            info!(
                output = %output.display(),
                rows = run.report.rows.len(),
                total = %run.report.totals.total,
                employer_cost = %run.report.totals.employer_cost,
                employee_share = %run.report.totals.employee_share,
                "Report written"
            );
        }
        Commands::Registry { ids, url, token } => {
            let results = tokio::task::spawn_blocking(move || -> Result<Vec<_>> {
                let lookup = CachedRegistryLookup::new(HttpRegistryLookup::new(url, token)?);
                Ok(ids
                    .into_iter()
                    .map(|id| {
                        let result = lookup.lookup(&id);
                        (id, result)
                    })
                    .collect())
            })
            .await??;

            for (id, result) in results {
                match result {
                    Ok(profile) => println!("{}", serde_json::to_string_pretty(&profile)?),
                    Err(message) => warn!(id = %id, error = %message, "Registry lookup failed"),
                }
            }
        }
        Commands::Serve { config, addr } => {
            let loader = ConfigLoader::load(&config)
                .with_context(|| format!("loading configuration from {}", config.display()))?;
            let router = create_router(AppState::new(loader));

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("binding {}", addr))?;
            info!(addr = %addr, "Listening");
            axum::serve(listener, router).await?;
        }
    }

    Ok(())
}
