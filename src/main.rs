use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sovereign_lineage::{
    config::Config,
    reports::ReportGenerator,
    seed::{SeedDocument, DEMO_ADDRESS},
    types::{NodeType, TraversalDirection},
    LineageStore,
};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lineage-graph")]
#[command(about = "In-memory sovereign lineage graph store")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Seed document to load (defaults to the built-in demo lineage)
    #[arg(short, long)]
    seed: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the demo lineage and print its sovereignty metrics
    Demo,

    /// Show node, relationship and metric counts
    Status {
        /// Output format (json, markdown, text)
        #[arg(short, long, default_value = "text")]
        output: String,
    },

    /// Export the whole graph
    Export {
        /// Export format (cypher, json)
        #[arg(long, default_value = "cypher")]
        format: String,

        /// Output file path (defaults to stdout)
        #[arg(short = 'f', long)]
        output_file: Option<PathBuf>,
    },

    /// Walk the lineage from a node
    Traverse {
        /// Seed key or node id to start from
        #[arg(long)]
        start: String,

        /// Maximum hops (defaults to traversal.default_max_depth)
        #[arg(short, long)]
        depth: Option<usize>,

        /// outgoing, incoming or both
        #[arg(long, default_value = "outgoing")]
        direction: String,
    },

    /// List nodes of one type in insertion order
    Nodes {
        /// Node type (Sovereign, Scroll, NFT, ...)
        #[arg(short = 't', long = "type")]
        node_type: String,

        /// Maximum nodes to list (defaults to queries.default_limit)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show the sovereignty chain and scalability metrics for an address
    Sovereign {
        #[arg(short, long)]
        address: String,
    },

    /// Initialize configuration file
    Init {
        /// Configuration file path
        #[arg(short, long, default_value = "lineage-graph.yml")]
        config_file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level)?;

    info!("Starting lineage graph store");

    let config = load_config(cli.config.as_ref()).await?;

    match cli.command {
        Commands::Demo => {
            let (mut store, _) = build_store(None, config).await?;
            show_sovereign(&mut store, DEMO_ADDRESS)?;
            println!("{}", ReportGenerator::new().generate(&store.get_status(), "text")?);
        }

        Commands::Status { output } => {
            let (store, _) = build_store(cli.seed.as_ref(), config).await?;
            println!("{}", ReportGenerator::new().generate(&store.get_status(), &output)?);
        }

        Commands::Export {
            format,
            output_file,
        } => {
            let (store, _) = build_store(cli.seed.as_ref(), config).await?;
            export(&store, &format, output_file.as_ref()).await?;
        }

        Commands::Traverse {
            start,
            depth,
            direction,
        } => {
            let (mut store, keys) = build_store(cli.seed.as_ref(), config).await?;
            traverse(&mut store, &keys, &start, depth, &direction)?;
        }

        Commands::Nodes { node_type, limit } => {
            let (mut store, _) = build_store(cli.seed.as_ref(), config).await?;
            list_nodes(&mut store, &node_type, limit)?;
        }

        Commands::Sovereign { address } => {
            let (mut store, _) = build_store(cli.seed.as_ref(), config).await?;
            show_sovereign(&mut store, &address)?;
        }

        Commands::Init { config_file } => {
            init_config(config_file).await?;
        }
    }

    Ok(())
}

/// Initialize tracing with the specified log level
fn init_tracing(log_level: &str) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level))
        .context("Failed to create env filter")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(env_filter)
        .init();

    Ok(())
}

/// Defaults, then the config file, then `LINEAGE_*` environment overrides
async fn load_config(config_path: Option<&PathBuf>) -> Result<Config> {
    dotenv::dotenv().ok();

    let mut config = match config_path {
        Some(path) if path.exists() => {
            info!("Loading configuration from: {:?}", path);
            Config::load_from_file(path)
                .await
                .with_context(|| format!("Failed to load config file: {:?}", path))?
        }
        Some(path) => {
            warn!("Configuration file not found: {:?}. Using defaults.", path);
            Config::default()
        }
        None => Config::default(),
    };

    config
        .apply_env_overrides()
        .context("Invalid environment configuration")?;
    config.validate()?;
    Ok(config)
}

async fn build_store(
    seed_path: Option<&PathBuf>,
    config: Config,
) -> Result<(LineageStore, HashMap<String, String>)> {
    let seed = match seed_path {
        Some(path) => SeedDocument::load_from_file(path).await?,
        None => {
            info!("No seed file given, using the demo lineage");
            SeedDocument::demo()
        }
    };

    let mut store = LineageStore::with_config(config);
    let keys = seed.apply(&mut store).context("Failed to apply seed")?;

    Ok((store, keys))
}

async fn export(store: &LineageStore, format: &str, output_file: Option<&PathBuf>) -> Result<()> {
    let content = match format.to_lowercase().as_str() {
        "cypher" => store.export_as_cypher(),
        "json" => ReportGenerator::new().generate_snapshot(&store.snapshot())?,
        _ => return Err(anyhow::anyhow!("Unsupported export format: {}", format)),
    };

    if let Some(file_path) = output_file {
        tokio::fs::write(file_path, &content)
            .await
            .with_context(|| format!("Failed to write output to: {:?}", file_path))?;
        info!("Export written to: {:?}", file_path);
    } else {
        println!("{}", content);
    }

    Ok(())
}

/// Seed keys take precedence; anything else is used as a node id
fn resolve_start<'a>(keys: &'a HashMap<String, String>, start: &'a str) -> &'a str {
    match keys.get(start) {
        Some(id) => {
            info!("Starting traversal at seed key {} ({})", start, id);
            id.as_str()
        }
        None => {
            warn!("{} is not a seed key, treating it as a node id", start);
            start
        }
    }
}

fn traverse(
    store: &mut LineageStore,
    keys: &HashMap<String, String>,
    start: &str,
    depth: Option<usize>,
    direction: &str,
) -> Result<()> {
    let start_id = resolve_start(keys, start);
    let depth = depth.unwrap_or(store.config().traversal.default_max_depth);
    let direction: TraversalDirection = direction.parse()?;

    let lineage = store
        .traverse_lineage_directed(start_id, depth, direction)
        .with_context(|| {
            if start_id == start {
                format!("Traversal from {} failed (not a seed key, used as node id)", start)
            } else {
                format!("Traversal from seed key {} ({}) failed", start, start_id)
            }
        })?;

    for entry in lineage {
        println!(
            "{}{} ({})",
            "  ".repeat(entry.depth),
            entry.node.node_type,
            entry.node.id
        );
    }

    Ok(())
}

fn list_nodes(store: &mut LineageStore, type_name: &str, limit: Option<usize>) -> Result<()> {
    let node_type: NodeType = type_name.parse()?;

    for node in store.query_nodes_by_type_limited(node_type, limit) {
        println!("{} ({} properties)", node.id, node.properties.len());
    }

    Ok(())
}

fn show_sovereign(store: &mut LineageStore, address: &str) -> Result<()> {
    match store.get_sovereign_scalability_metrics(address) {
        Some(metrics) => {
            println!("{}", ReportGenerator::new().generate_scalability(&metrics));
            for (node_type, count) in &metrics.node_types {
                println!("  {}: {}", node_type, count);
            }
        }
        None => {
            warn!("No sovereign registered for {}", address);
            println!("No sovereign found for {}", address);
        }
    }

    Ok(())
}

/// Write the default configuration to disk
async fn init_config(config_file: PathBuf) -> Result<()> {
    info!("Initializing configuration file: {:?}", config_file);

    if config_file.exists() {
        warn!("Configuration file already exists: {:?}", config_file);
        print!("Overwrite existing file? (y/N): ");
        use std::io::{self, Write};
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().to_lowercase().starts_with('y') {
            info!("Configuration initialization cancelled");
            return Ok(());
        }
    }

    Config::default()
        .save_to_file(&config_file)
        .await
        .with_context(|| format!("Failed to write configuration file: {:?}", config_file))?;

    println!("Configuration file created: {:?}", config_file);
    println!("Edit this file to customize the store behavior.");

    Ok(())
}
