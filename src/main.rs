use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use reelstats::{
    config::Config,
    pipeline::{self, RunOptions},
    queries::{self, QueryOptions},
};

#[derive(Debug, Parser)]
#[command(name = "reelstats")]
#[command(about = "Normalize the IMDb movie CSV into SQLite and export analytical queries")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input CSV (overrides MOVIES_CSV)
    #[arg(long, global = true)]
    csv: Option<PathBuf>,

    /// SQLite url (overrides DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Export directory (overrides OUTPUT_DIR)
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    #[command(flatten)]
    query: QueryArgs,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Rebuild the database from the CSV and export every query
    Run,
    /// Rebuild the database from the CSV only
    Import,
    /// Export every query from an existing database
    Query,
    /// Print the query catalog
    List,
}

#[derive(Debug, Args)]
struct QueryArgs {
    /// Rows captured in each preview
    #[arg(long, global = true, default_value_t = 15)]
    preview_rows: usize,

    #[arg(long, global = true)]
    no_preview: bool,

    /// Minimum movies per genre for the average rating query
    #[arg(long, global = true, default_value_t = 1)]
    min_genre_support: u32,

    /// Queries executed at once
    #[arg(long, global = true, default_value_t = 4)]
    concurrency: usize,
}

impl QueryArgs {
    fn run_options(&self) -> RunOptions {
        RunOptions {
            queries: QueryOptions { min_genre_support: self.min_genre_support, ..QueryOptions::default() },
            concurrency: self.concurrency,
            preview_rows: (!self.no_preview).then_some(self.preview_rows),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,reelstats=debug,sqlx=warn".to_string()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(csv) = cli.csv {
        config.csv_path = csv;
    }
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }
    if let Some(out) = cli.out {
        config.output_dir = out;
    }
    config.validate()?;

    let options = cli.query.run_options();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let manifest = pipeline::run(&config, &options).await?;
            println!(
                "run complete: queries={} out={}",
                manifest.queries.len(),
                config.output_dir.display()
            );
        },
        Commands::Import => {
            let summary = pipeline::import_only(&config).await?;
            println!(
                "import complete: movies={} genres={} directors={} movie_genres={}",
                summary.movies, summary.genres, summary.directors, summary.movie_genres
            );
        },
        Commands::Query => {
            let manifest = pipeline::query_only(&config, &options).await?;
            println!(
                "query complete: queries={} out={}",
                manifest.queries.len(),
                config.output_dir.display()
            );
        },
        Commands::List => {
            for spec in queries::catalog(&options.queries) {
                let columns: Vec<_> = spec.columns.iter().map(|(name, _)| *name).collect();
                println!("{:<32} {}", spec.name, columns.join(", "));
            }
        },
    }

    Ok(())
}
