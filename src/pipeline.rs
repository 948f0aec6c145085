use std::path::Path;

use sea_orm::DatabaseConnection;
use tracing::info;

use crate::{
    config::Config,
    db,
    error::AppResult,
    export::{self, Manifest, NoopSnapshot, Snapshot, TextPreview},
    models::NormalizeSummary,
    normalizer, queries,
    queries::QueryOptions,
    reader,
};

#[derive(Clone, Debug)]
pub struct RunOptions {
    pub queries: QueryOptions,
    pub concurrency: usize,
    /// Rows captured per preview; `None` disables previews.
    pub preview_rows: Option<usize>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { queries: QueryOptions::default(), concurrency: 4, preview_rows: Some(15) }
    }
}

/// Validates the whole file before touching the database, then rebuilds and fills the schema.
pub async fn import(db: &DatabaseConnection, csv_path: &Path) -> AppResult<NormalizeSummary> {
    let records = reader::read_movies_file(csv_path)?;
    db::rebuild_schema(db).await?;
    normalizer::normalize(db, &records).await
}

pub async fn export_queries(
    db: &DatabaseConnection,
    out_dir: &Path,
    options: &RunOptions,
    input: Option<&Path>,
    normalized: Option<NormalizeSummary>,
) -> AppResult<Manifest> {
    let specs = queries::catalog(&options.queries);
    let tables = queries::run_catalog(db, &specs, options.concurrency).await?;

    let snapshot: Box<dyn Snapshot> = match options.preview_rows {
        Some(rows) => Box::new(TextPreview { rows }),
        None => Box::new(NoopSnapshot),
    };

    let exported = tables
        .iter()
        .map(|table| export::export_table(table, out_dir, snapshot.as_ref()))
        .collect::<AppResult<Vec<_>>>()?;

    let manifest = Manifest {
        generated_at: jiff::Timestamp::now(),
        input: input.map(|p| p.display().to_string()),
        normalized,
        queries: exported,
    };
    let path = export::write_manifest(&manifest, out_dir)?;
    info!(queries = manifest.queries.len(), manifest = %path.display(), "query results exported");

    Ok(manifest)
}

/// Import then export, holding one connection for the duration of the run.
pub async fn run(config: &Config, options: &RunOptions) -> AppResult<Manifest> {
    let db = db::connect(&config.database_url).await?;

    let result = async {
        let summary = import(&db, &config.csv_path).await?;
        export_queries(&db, &config.output_dir, options, Some(&config.csv_path), Some(summary))
            .await
    }
    .await;

    db::close(db).await?;
    result
}

/// Queries an already-populated database without rebuilding it.
pub async fn query_only(config: &Config, options: &RunOptions) -> AppResult<Manifest> {
    let db = db::connect(&config.database_url).await?;

    let result = async {
        db::migrate(&db).await?;
        export_queries(&db, &config.output_dir, options, None, None).await
    }
    .await;

    db::close(db).await?;
    result
}

pub async fn import_only(config: &Config) -> AppResult<NormalizeSummary> {
    let db = db::connect(&config.database_url).await?;
    let result = import(&db, &config.csv_path).await;
    db::close(db).await?;
    result
}
