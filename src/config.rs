use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    pub csv_path: PathBuf,
    pub database_url: String,
    pub output_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let csv_path = std::env::var("MOVIES_CSV")
            .unwrap_or_else(|_| "IMDB-Movie-Data.csv".to_string())
            .into();

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://imdb_top1000.db?mode=rwc".to_string());

        let output_dir =
            std::env::var("OUTPUT_DIR").unwrap_or_else(|_| "query_results".to_string()).into();

        let config = Self { csv_path, database_url, output_dir };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.database_url.starts_with("sqlite:") {
            anyhow::bail!("DATABASE_URL must be a sqlite url, got {}", self.database_url);
        }
        Ok(())
    }
}
