mod cli;

use clap::{Parser, Subcommand, builder::styling};
use eyre::Result;
use owo_colors::OwoColorize;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// Chunked Extractor: pull time-ordered data out of Elasticsearch in density-sized chunks
#[derive(Parser)]
#[command(name = "chunkx", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source connection settings from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// The extraction config file
    #[arg(short, long, global = true, default_value = "extraction.yml")]
    config: String,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Test authorization to an Elasticsearch cluster
    Auth,

    /// Summarize the documents in a time range
    Summary {
        /// Range start, epoch milliseconds (inclusive)
        #[arg(long)]
        start: i64,

        /// Range end, epoch milliseconds (exclusive)
        #[arg(long)]
        end: i64,
    },

    /// Show the chunks a time range would be extracted in
    Plan {
        /// Range start, epoch milliseconds (inclusive)
        #[arg(long)]
        start: i64,

        /// Range end, epoch milliseconds (exclusive)
        #[arg(long)]
        end: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Err(e) = dotenvy::from_filename(&cli.env) {
        // Connection settings may come from the real environment instead
        eprintln!("Not loading {}: {}", cli.env, e);
    }

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    match cli.command {
        Commands::Auth => {
            log::info!("Testing authorization");
            let version = cli::test_auth().await?;
            log::info!("✓ Connected to Elasticsearch {}", version.green());
        }
        Commands::Summary { start, end } => {
            let context = cli::load_context(&cli.config, start, end)?;
            log::info!(
                "Summarizing {} in [{}, {})",
                context.indices().join(",").bright_black(),
                start,
                end
            );
            let summary = cli::summarize(&context).await?;
            log::info!("✓ {}", summary.cyan());
        }
        Commands::Plan { start, end } => {
            let context = cli::load_context(&cli.config, start, end)?;
            log::info!(
                "Planning chunks for {} in [{}, {})",
                context.job_id().bright_black(),
                start,
                end
            );
            let chunks = cli::plan(&context).await?;
            for chunk in &chunks {
                println!("{}\t{}\t{}ms", chunk.start, chunk.end, chunk.span());
            }
            log::info!("✓ Planned {} chunk(s)", chunks.len().cyan());
        }
    }

    Ok(())
}
