mod inspect;
mod run;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "newsgraph")]
#[command(about = "Ingest, enrich and load news into ClickHouse and Neo4j")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one batch: ingest, enrich, load both sinks
    Run {
        /// Category to fetch; repeat for several. Overrides the settings file
        #[arg(long = "category")]
        categories: Vec<String>,
        /// Per-category article limit. Overrides the settings file
        #[arg(long)]
        max_articles: Option<usize>,
        /// Enrich and report without writing to either sink
        #[arg(long)]
        dry_run: bool,
        /// On Ctrl-C, load the articles enriched so far instead of nothing
        #[arg(long)]
        flush_partial: bool,
    },
    /// Print the resolved run settings
    Settings,
    /// Show the topic, sentiment and breaking verdict for one headline
    Classify {
        title: String,
        /// Use this sentiment instead of scoring the title
        #[arg(long, allow_negative_numbers = true)]
        sentiment: Option<f32>,
    },
    /// Merge the newest columnar rows into the graph
    BackfillGraph {
        #[arg(long, default_value = "50")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --help and usage errors exit here, before any config is read.
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = newsgraph_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Run {
            categories,
            max_articles,
            dry_run,
            flush_partial,
        }) => {
            let overrides = run::RunOverrides {
                categories,
                max_articles,
                dry_run,
                flush_partial,
            };
            run::run_batch(&config, overrides).await?;
        }
        Some(Commands::Settings) => inspect::print_settings(&config)?,
        Some(Commands::Classify { title, sentiment }) => {
            inspect::classify_headline(&config, &title, sentiment)?;
        }
        Some(Commands::BackfillGraph { limit }) => run::run_backfill(&config, limit).await?,
        None => Cli::command().print_help()?,
    }

    Ok(())
}
