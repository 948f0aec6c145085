use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// One CSV row as read, before any validation.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawMovieRow {
    #[serde(rename = "Rank")]
    pub rank: Option<String>,
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Genre")]
    pub genre: Option<String>,
    #[serde(rename = "Description")]
    pub description: Option<String>,
    #[serde(rename = "Director")]
    pub director: Option<String>,
    #[serde(rename = "Actors")]
    pub actors: Option<String>,
    #[serde(rename = "Year")]
    pub year: Option<String>,
    #[serde(rename = "Runtime (Minutes)")]
    pub runtime: Option<String>,
    #[serde(rename = "Rating")]
    pub rating: Option<String>,
    #[serde(rename = "Votes")]
    pub votes: Option<String>,
    #[serde(rename = "Revenue (Millions)")]
    pub revenue: Option<String>,
    #[serde(rename = "Metascore")]
    pub metascore: Option<String>,
}

/// A validated movie ready for normalization.
#[derive(Clone, Debug, PartialEq)]
pub struct MovieRecord {
    pub id: i32,
    pub title: String,
    pub genre_field: String,
    pub description: String,
    pub director: String,
    pub actors: Option<String>,
    pub year: i32,
    pub runtime: i32,
    pub rating: f64,
    pub votes: i64,
    pub revenue: Option<f64>,
    pub metascore: Option<i32>,
}

impl RawMovieRow {
    /// Validates the row. `row` is the 1-based data row number used in errors.
    pub fn into_record(self, row: usize) -> AppResult<MovieRecord> {
        let id = parse_number(row, "Rank", required_text(row, "Rank", self.rank)?)?;
        let title = required_text(row, "Title", self.title)?;
        let director = required_text(row, "Director", self.director)?;
        let year = required_number(row, "Year", self.year)?;
        let runtime = required_number(row, "Runtime (Minutes)", self.runtime)?;
        let rating: f64 = required_number(row, "Rating", self.rating.clone())?;
        if !(0.0..=10.0).contains(&rating) {
            return Err(AppError::MalformedNumericField {
                row,
                field: "Rating",
                value: self.rating.unwrap_or_default(),
            });
        }
        let votes: i64 = required_number(row, "Votes", self.votes.clone())?;
        if votes < 0 {
            return Err(AppError::MalformedNumericField {
                row,
                field: "Votes",
                value: self.votes.unwrap_or_default(),
            });
        }

        Ok(MovieRecord {
            id,
            title,
            genre_field: self.genre.unwrap_or_default(),
            description: self.description.map(|d| d.trim().to_string()).unwrap_or_default(),
            director,
            actors: non_empty(self.actors),
            year,
            runtime,
            rating,
            votes,
            revenue: nullable_amount(row, "Revenue (Millions)", self.revenue),
            metascore: nullable_number(row, "Metascore", self.metascore),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    })
}

fn required_text(row: usize, field: &'static str, value: Option<String>) -> AppResult<String> {
    non_empty(value).ok_or(AppError::MissingRequiredField { row, field })
}

fn required_number<T: FromStr>(
    row: usize,
    field: &'static str,
    value: Option<String>,
) -> AppResult<T> {
    let raw = non_empty(value).unwrap_or_default();
    parse_number(row, field, raw)
}

fn parse_number<T: FromStr>(row: usize, field: &'static str, raw: String) -> AppResult<T> {
    raw.parse().map_err(|_| AppError::MalformedNumericField { row, field, value: raw })
}

fn nullable_number<T: FromStr>(row: usize, field: &'static str, value: Option<String>) -> Option<T> {
    let raw = non_empty(value)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::debug!(row = row, field = field, value = %raw, "unparseable nullable value stored as null");
            None
        },
    }
}

/// Like `nullable_number`, but infinities, NaN and negative amounts are also stored as null.
fn nullable_amount(row: usize, field: &'static str, value: Option<String>) -> Option<f64> {
    let amount: f64 = nullable_number(row, field, value)?;
    if !amount.is_finite() || amount < 0.0 {
        tracing::debug!(row = row, field = field, value = amount, "out of range amount stored as null");
        return None;
    }
    Some(amount)
}

/// Counts produced by one normalization run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeSummary {
    pub movies: usize,
    pub genres: usize,
    pub directors: usize,
    pub movie_genres: usize,
    pub movie_directors: usize,
}


#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawMovieRow {
        RawMovieRow {
            rank: Some("1".into()),
            title: Some("Guardians of the Galaxy".into()),
            genre: Some("Action,Adventure,Sci-Fi".into()),
            description: Some(" A group of intergalactic criminals. ".into()),
            director: Some("James Gunn".into()),
            actors: Some("Chris Pratt, Vin Diesel".into()),
            year: Some("2014".into()),
            runtime: Some("121".into()),
            rating: Some("8.1".into()),
            votes: Some("757074".into()),
            revenue: Some("333.13".into()),
            metascore: Some("76".into()),
        }
    }

    #[test]
    fn validates_complete_row() {
        let record = raw().into_record(1).unwrap();
        assert_eq!(record.id, 1);
        assert_eq!(record.description, "A group of intergalactic criminals.");
        assert_eq!(record.year, 2014);
        assert_eq!(record.votes, 757_074);
        assert_eq!(record.revenue, Some(333.13));
        assert_eq!(record.metascore, Some(76));
    }

    #[test]
    fn missing_title_is_rejected() {
        let row = RawMovieRow { title: Some("  ".into()), ..raw() };
        let err = row.into_record(7).unwrap_err();
        assert!(matches!(err, AppError::MissingRequiredField { row: 7, field: "Title" }));
    }

    #[test]
    fn missing_rank_is_rejected() {
        let row = RawMovieRow { rank: None, ..raw() };
        let err = row.into_record(2).unwrap_err();
        assert!(matches!(err, AppError::MissingRequiredField { row: 2, field: "Rank" }));
    }

    #[test]
    fn malformed_rating_is_fatal() {
        let row = RawMovieRow { rating: Some("eight".into()), ..raw() };
        let err = row.into_record(3).unwrap_err();
        match err {
            AppError::MalformedNumericField { row, field, value } => {
                assert_eq!(row, 3);
                assert_eq!(field, "Rating");
                assert_eq!(value, "eight");
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn out_of_range_rating_is_fatal() {
        let row = RawMovieRow { rating: Some("11.5".into()), ..raw() };
        assert!(matches!(
            row.into_record(1),
            Err(AppError::MalformedNumericField { field: "Rating", .. })
        ));
    }

    #[test]
    fn non_finite_or_negative_revenue_becomes_none() {
        for bad in ["inf", "-inf", "NaN", "-3.25"] {
            let row = RawMovieRow { revenue: Some(bad.into()), ..raw() };
            assert_eq!(row.into_record(1).unwrap().revenue, None, "revenue {bad}");
        }

        let row = RawMovieRow { revenue: Some("0".into()), ..raw() };
        assert_eq!(row.into_record(1).unwrap().revenue, Some(0.0));
    }

    #[test]
    fn nullable_fields_become_none() {
        let row = RawMovieRow { revenue: Some("".into()), metascore: Some("n/a".into()), ..raw() };
        let record = row.into_record(1).unwrap();
        assert_eq!(record.revenue, None);
        assert_eq!(record.metascore, None);
    }
}
