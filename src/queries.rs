use std::fmt;

use futures::{StreamExt, TryStreamExt, stream};
use sea_orm::{ConnectionTrait, DbBackend, QueryResult, Statement, Value};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};

#[derive(Clone, Debug)]
pub struct QueryOptions {
    pub top_rated_limit: u32,
    pub min_genre_support: u32,
    pub director_count_limit: u32,
    pub revenue_per_year: u32,
    pub min_director_movies: u32,
    pub director_revenue_limit: u32,
    pub genre_count_limit: u32,
    pub top_per_genre: u32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            top_rated_limit: 10,
            min_genre_support: 1,
            director_count_limit: 10,
            revenue_per_year: 5,
            min_director_movies: 2,
            director_revenue_limit: 10,
            genre_count_limit: 5,
            top_per_genre: 3,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
}

/// One catalog entry. `name` doubles as the export file stem.
#[derive(Clone, Debug)]
pub struct QuerySpec {
    pub name: &'static str,
    pub sql: &'static str,
    pub params: Vec<Value>,
    pub columns: &'static [(&'static str, ColumnKind)],
}

#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Integer(v) => write!(f, "{v}"),
            Cell::Real(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{v:.1}"),
            Cell::Real(v) => write!(f, "{v}"),
            Cell::Text(v) => f.write_str(v),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ResultTable {
    pub query: &'static str,
    pub sql: &'static str,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<Cell>>,
}

impl ResultTable {
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.columns.iter().position(|c| *c == name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }
}

const TOP_RATED: &str = "\
SELECT title AS Title, year AS Year, rating AS Rating
FROM movies
ORDER BY rating DESC, votes DESC, id ASC
LIMIT ?";

const AVG_RATING_PER_GENRE: &str = "\
SELECT g.name AS Genre, ROUND(AVG(m.rating), 2) AS avg_rating, COUNT(*) AS movie_count
FROM movies m
JOIN movie_genres mg ON mg.movie_id = m.id
JOIN genres g ON g.id = mg.genre_id
GROUP BY g.id, g.name
HAVING COUNT(*) >= ?
ORDER BY avg_rating DESC, Genre ASC";

const COUNT_PER_DIRECTOR: &str = "\
SELECT d.name AS Director, COUNT(*) AS movie_count
FROM movie_directors md
JOIN directors d ON d.id = md.director_id
GROUP BY d.id, d.name
ORDER BY movie_count DESC, Director ASC
LIMIT ?";

const COUNT_PER_YEAR: &str = "\
SELECT year AS Year, COUNT(*) AS movie_count
FROM movies
GROUP BY year
ORDER BY year DESC";

const TOP_MOVIE_PER_YEAR: &str = "\
SELECT Year, Title, Rating, Votes
FROM (
    SELECT year AS Year, title AS Title, rating AS Rating, votes AS Votes,
           ROW_NUMBER() OVER (PARTITION BY year ORDER BY rating DESC, votes DESC, id ASC) AS rn
    FROM movies
) t
WHERE rn = 1
ORDER BY Year DESC";

const TOP_REVENUE_PER_YEAR: &str = "\
SELECT Year, rn AS rank_in_year, Title, Revenue
FROM (
    SELECT year AS Year, title AS Title, revenue AS Revenue,
           ROW_NUMBER() OVER (PARTITION BY year ORDER BY revenue DESC, votes DESC, id ASC) AS rn
    FROM movies
    WHERE revenue IS NOT NULL
) t
WHERE rn <= ?
ORDER BY Year DESC, rn";

const AVG_REVENUE_PER_DIRECTOR: &str = "\
SELECT d.name AS Director, ROUND(AVG(m.revenue), 2) AS avg_revenue, COUNT(*) AS movies_count
FROM movies m
JOIN movie_directors md ON md.movie_id = m.id
JOIN directors d ON d.id = md.director_id
WHERE m.revenue IS NOT NULL
GROUP BY d.id, d.name
HAVING COUNT(*) >= ?
ORDER BY avg_revenue DESC, Director ASC
LIMIT ?";

const TOP_GENRES_BY_COUNT: &str = "\
SELECT g.name AS Genre, COUNT(*) AS movie_count
FROM movie_genres mg
JOIN genres g ON g.id = mg.genre_id
GROUP BY g.id, g.name
ORDER BY movie_count DESC, Genre ASC
LIMIT ?";

const AVG_RUNTIME_PER_GENRE: &str = "\
SELECT g.name AS Genre, ROUND(AVG(m.runtime), 2) AS avg_runtime
FROM movies m
JOIN movie_genres mg ON mg.movie_id = m.id
JOIN genres g ON g.id = mg.genre_id
GROUP BY g.id, g.name
ORDER BY avg_runtime DESC, Genre ASC";

const AVG_RATING_PER_DECADE: &str = "\
SELECT (year / 10) * 10 AS decade, ROUND(AVG(rating), 2) AS avg_rating, COUNT(*) AS movie_count
FROM movies
GROUP BY decade
ORDER BY decade";

const TOP_MOVIES_PER_GENRE: &str = "\
SELECT Genre, rn AS rank_in_genre, Title, Rating
FROM (
    SELECT g.name AS Genre, m.title AS Title, m.rating AS Rating,
           ROW_NUMBER() OVER (PARTITION BY g.id ORDER BY m.rating DESC, m.votes DESC, m.id ASC) AS rn
    FROM movie_genres mg
    JOIN movies m ON m.id = mg.movie_id
    JOIN genres g ON g.id = mg.genre_id
) t
WHERE rn <= ?
ORDER BY Genre ASC, rn";

use ColumnKind::{Integer, Real, Text};

fn param(v: u32) -> Value {
    i64::from(v).into()
}

/// The fixed query battery, in export order.
pub fn catalog(options: &QueryOptions) -> Vec<QuerySpec> {
    vec![
        QuerySpec {
            name: "01_top_highest_rated",
            sql: TOP_RATED,
            params: vec![param(options.top_rated_limit)],
            columns: &[("Title", Text), ("Year", Integer), ("Rating", Real)],
        },
        QuerySpec {
            name: "02_average_rating_per_genre",
            sql: AVG_RATING_PER_GENRE,
            params: vec![param(options.min_genre_support)],
            columns: &[("Genre", Text), ("avg_rating", Real), ("movie_count", Integer)],
        },
        QuerySpec {
            name: "03_movies_count_per_director",
            sql: COUNT_PER_DIRECTOR,
            params: vec![param(options.director_count_limit)],
            columns: &[("Director", Text), ("movie_count", Integer)],
        },
        QuerySpec {
            name: "04_movies_count_per_year",
            sql: COUNT_PER_YEAR,
            params: vec![],
            columns: &[("Year", Integer), ("movie_count", Integer)],
        },
        QuerySpec {
            name: "05_top_movie_per_year",
            sql: TOP_MOVIE_PER_YEAR,
            params: vec![],
            columns: &[("Year", Integer), ("Title", Text), ("Rating", Real), ("Votes", Integer)],
        },
        QuerySpec {
            name: "06_top_revenue_per_year",
            sql: TOP_REVENUE_PER_YEAR,
            params: vec![param(options.revenue_per_year)],
            columns: &[
                ("Year", Integer),
                ("rank_in_year", Integer),
                ("Title", Text),
                ("Revenue", Real),
            ],
        },
        QuerySpec {
            name: "07_avg_revenue_per_director",
            sql: AVG_REVENUE_PER_DIRECTOR,
            params: vec![param(options.min_director_movies), param(options.director_revenue_limit)],
            columns: &[("Director", Text), ("avg_revenue", Real), ("movies_count", Integer)],
        },
        QuerySpec {
            name: "08_top_genres_by_count",
            sql: TOP_GENRES_BY_COUNT,
            params: vec![param(options.genre_count_limit)],
            columns: &[("Genre", Text), ("movie_count", Integer)],
        },
        QuerySpec {
            name: "09_avg_runtime_per_genre",
            sql: AVG_RUNTIME_PER_GENRE,
            params: vec![],
            columns: &[("Genre", Text), ("avg_runtime", Real)],
        },
        QuerySpec {
            name: "10_avg_rating_per_decade",
            sql: AVG_RATING_PER_DECADE,
            params: vec![],
            columns: &[("decade", Integer), ("avg_rating", Real), ("movie_count", Integer)],
        },
        QuerySpec {
            name: "11_top_movies_per_genre",
            sql: TOP_MOVIES_PER_GENRE,
            params: vec![param(options.top_per_genre)],
            columns: &[
                ("Genre", Text),
                ("rank_in_genre", Integer),
                ("Title", Text),
                ("Rating", Real),
            ],
        },
    ]
}

pub async fn execute<C: ConnectionTrait>(conn: &C, spec: &QuerySpec) -> AppResult<ResultTable> {
    let stmt = Statement::from_sql_and_values(DbBackend::Sqlite, spec.sql, spec.params.clone());
    let rows = conn.query_all(stmt).await.map_err(|e| AppError::query(spec.name, e))?;

    let rows = rows
        .iter()
        .map(|row| decode_row(row, spec.columns))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::query(spec.name, e))?;

    debug!(query = spec.name, rows = rows.len(), "query executed");

    Ok(ResultTable {
        query: spec.name,
        sql: spec.sql,
        columns: spec.columns.iter().map(|(name, _)| *name).collect(),
        rows,
    })
}

fn decode_row(
    row: &QueryResult,
    columns: &[(&'static str, ColumnKind)],
) -> Result<Vec<Cell>, sea_orm::DbErr> {
    columns
        .iter()
        .map(|(name, kind)| {
            let cell = match kind {
                ColumnKind::Text => row.try_get::<Option<String>>("", name)?.map(Cell::Text),
                ColumnKind::Integer => row.try_get::<Option<i64>>("", name)?.map(Cell::Integer),
                ColumnKind::Real => row.try_get::<Option<f64>>("", name)?.map(Cell::Real),
            };
            Ok(cell.unwrap_or(Cell::Null))
        })
        .collect()
}

/// Runs every query read-only with at most `concurrency` in flight. Results keep catalog order.
pub async fn run_catalog<C: ConnectionTrait>(
    conn: &C,
    specs: &[QuerySpec],
    concurrency: usize,
) -> AppResult<Vec<ResultTable>> {
    info!(queries = specs.len(), concurrency = concurrency, "running query catalog");

    let mut results: Vec<(usize, ResultTable)> = stream::iter(specs.iter().enumerate())
        .map(|(idx, spec)| async move { execute(conn, spec).await.map(|table| (idx, table)) })
        .buffer_unordered(concurrency.max(1))
        .try_collect()
        .await?;

    results.sort_by_key(|(idx, _)| *idx);
    Ok(results.into_iter().map(|(_, table)| table).collect())
}
