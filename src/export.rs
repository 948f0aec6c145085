use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;
use tracing::debug;

use crate::{error::AppResult, models::NormalizeSummary, queries::ResultTable};

/// Captures a preview of the leading rows of a result next to its csv export.
pub trait Snapshot {
    fn capture(&self, table: &ResultTable, dir: &Path) -> AppResult<Option<PathBuf>>;
}

pub struct NoopSnapshot;

impl Snapshot for NoopSnapshot {
    fn capture(&self, _table: &ResultTable, _dir: &Path) -> AppResult<Option<PathBuf>> {
        Ok(None)
    }
}

/// Renders the first `rows` rows as an aligned plain-text table in `<query>.txt`.
pub struct TextPreview {
    pub rows: usize,
}

impl TextPreview {
    pub fn render(&self, table: &ResultTable) -> String {
        let cells: Vec<Vec<String>> = table
            .rows
            .iter()
            .take(self.rows)
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect();

        let widths: Vec<usize> = table
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                cells.iter().map(|r| r[i].chars().count()).chain([name.len()]).max().unwrap_or(0)
            })
            .collect();

        let line = |values: Vec<&str>| {
            values
                .iter()
                .zip(&widths)
                .map(|(v, w)| format!("{v:<width$}", width = *w))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let mut out = Vec::with_capacity(cells.len() + 2);
        out.push(line(table.columns.clone()));
        out.push(widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-"));
        for row in &cells {
            out.push(line(row.iter().map(String::as_str).collect()));
        }
        out.join("\n") + "\n"
    }
}

impl Snapshot for TextPreview {
    fn capture(&self, table: &ResultTable, dir: &Path) -> AppResult<Option<PathBuf>> {
        let path = dir.join(format!("{}.txt", table.query));
        fs::write(&path, self.render(table))?;
        Ok(Some(path))
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ExportedQuery {
    pub query: &'static str,
    pub rows: usize,
    pub sql_file: String,
    pub csv_file: String,
    pub preview_file: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Manifest {
    pub generated_at: jiff::Timestamp,
    pub input: Option<String>,
    pub normalized: Option<NormalizeSummary>,
    pub queries: Vec<ExportedQuery>,
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

/// Writes `<query>.sql` and `<query>.csv`, then hands the table to `snapshot`.
pub fn export_table(
    table: &ResultTable,
    dir: &Path,
    snapshot: &dyn Snapshot,
) -> AppResult<ExportedQuery> {
    fs::create_dir_all(dir)?;

    let sql_path = dir.join(format!("{}.sql", table.query));
    fs::write(&sql_path, format!("{}\n", table.sql.trim()))?;

    let csv_path = dir.join(format!("{}.csv", table.query));
    let mut wtr = csv::Writer::from_path(&csv_path)?;
    wtr.write_record(&table.columns)?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(|c| c.to_string()))?;
    }
    wtr.flush()?;

    let preview = snapshot.capture(table, dir)?;

    debug!(query = table.query, rows = table.rows.len(), csv = %csv_path.display(), "exported");

    Ok(ExportedQuery {
        query: table.query,
        rows: table.rows.len(),
        sql_file: file_name(&sql_path),
        csv_file: file_name(&csv_path),
        preview_file: preview.as_deref().map(file_name),
    })
}

pub fn write_manifest(manifest: &Manifest, dir: &Path) -> AppResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join("manifest.json");
    fs::write(&path, serde_json::to_string_pretty(manifest)?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::Cell;

    fn table() -> ResultTable {
        ResultTable {
            query: "02_average_rating_per_genre",
            sql: "SELECT 1\n",
            columns: vec!["Genre", "avg_rating"],
            rows: vec![
                vec![Cell::Text("Drama, Noir".into()), Cell::Real(8.5)],
                vec![Cell::Text("Action".into()), Cell::Real(8.0)],
                vec![Cell::Text("Comedy".into()), Cell::Null],
            ],
        }
    }

    #[test]
    fn writes_sql_and_csv_with_header() {
        let dir = tempfile::tempdir().unwrap();

        let exported = export_table(&table(), dir.path(), &NoopSnapshot).unwrap();
        assert_eq!(exported.rows, 3);
        assert_eq!(exported.csv_file, "02_average_rating_per_genre.csv");
        assert_eq!(exported.preview_file, None);

        let csv = fs::read_to_string(dir.path().join(&exported.csv_file)).unwrap();
        assert_eq!(csv, "Genre,avg_rating\n\"Drama, Noir\",8.5\nAction,8.0\nComedy,\n");

        let sql = fs::read_to_string(dir.path().join(&exported.sql_file)).unwrap();
        assert_eq!(sql, "SELECT 1\n");
    }

    #[test]
    fn text_preview_limits_rows() {
        let preview = TextPreview { rows: 2 };
        let rendered = preview.render(&table());
        assert_eq!(
            rendered,
            "Genre       | avg_rating\n\
             ------------+-----------\n\
             Drama, Noir | 8.5\n\
             Action      | 8.0\n"
        );
    }

    #[test]
    fn preview_is_written_next_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        let exported = export_table(&table(), dir.path(), &TextPreview { rows: 15 }).unwrap();
        assert_eq!(exported.preview_file.as_deref(), Some("02_average_rating_per_genre.txt"));
        assert!(dir.path().join("02_average_rating_per_genre.txt").exists());
    }
}
