use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("row {row}: missing required field `{field}`")]
    MissingRequiredField { row: usize, field: &'static str },

    #[error("row {row}: field `{field}` has malformed numeric value {value:?}")]
    MalformedNumericField { row: usize, field: &'static str, value: String },

    #[error("row {row}: duplicate movie id {id}")]
    DuplicateKey { row: usize, id: i32 },

    #[error("query `{query}` failed: {source}")]
    QueryExecution {
        query: &'static str,
        #[source]
        source: sea_orm::DbErr,
    },

    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Wraps a database error raised while running the named catalog query.
    pub fn query(query: &'static str, source: sea_orm::DbErr) -> Self {
        Self::QueryExecution { query, source }
    }
}

pub type AppResult<T> = Result<T, AppError>;
