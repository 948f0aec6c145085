use std::{collections::HashSet, io::Read, path::Path};

use tracing::{debug, info};

use crate::{
    error::{AppError, AppResult},
    models::{MovieRecord, RawMovieRow},
};

pub fn read_movies_file(path: &Path) -> AppResult<Vec<MovieRecord>> {
    info!(path = %path.display(), "reading movies csv");
    let file = std::fs::File::open(path)?;
    read_movies(file)
}

/// Reads and validates every row, including Rank uniqueness. The first invalid row aborts the read.
pub fn read_movies<R: Read>(input: R) -> AppResult<Vec<MovieRecord>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(input);

    let mut out = Vec::new();
    let mut ids = HashSet::new();
    for (idx, row) in reader.deserialize::<RawMovieRow>().enumerate() {
        let row_number = idx + 1;
        let record = row?.into_record(row_number)?;
        if !ids.insert(record.id) {
            return Err(AppError::DuplicateKey { row: row_number, id: record.id });
        }
        out.push(record);
    }

    debug!(rows = out.len(), "validated movie rows");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Rank,Title,Genre,Description,Director,Actors,Year,Runtime (Minutes),Rating,Votes,Revenue (Millions),Metascore\n";

    #[test]
    fn reads_quoted_multi_value_fields() {
        let csv = format!(
            "{HEADER}1,Guardians of the Galaxy,\"Action,Adventure,Sci-Fi\",\"A group, of criminals.\",James Gunn,\"Chris Pratt, Vin Diesel\",2014,121,8.1,757074,333.13,76\n\
             2,Prometheus,\"Adventure,Mystery,Sci-Fi\",Explorers.,Ridley Scott,Noomi Rapace,2012,124,7.0,485820,,65\n"
        );

        let rows = read_movies(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].genre_field, "Action,Adventure,Sci-Fi");
        assert_eq!(rows[0].description, "A group, of criminals.");
        assert_eq!(rows[0].actors.as_deref(), Some("Chris Pratt, Vin Diesel"));
        assert_eq!(rows[1].revenue, None);
        assert_eq!(rows[1].metascore, Some(65));
    }

    #[test]
    fn bad_row_fails_the_whole_read() {
        let csv = format!(
            "{HEADER}1,A,Drama,d,X,a,2000,100,8.0,100,,\n\
             2,B,Drama,d,X,a,two thousand,100,8.0,100,,\n"
        );

        let err = read_movies(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::MalformedNumericField { row: 2, field: "Year", .. }));
    }

    #[test]
    fn repeated_rank_is_rejected_while_reading() {
        let csv = format!(
            "{HEADER}1,A,Drama,d,X,a,2000,100,8.0,100,,\n\
             2,B,Drama,d,X,a,2001,100,8.0,100,,\n\
             2,C,Comedy,d,Y,a,2002,100,7.0,10,,\n"
        );

        let err = read_movies(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::DuplicateKey { row: 3, id: 2 }));
    }

    #[test]
    fn missing_title_reports_row() {
        let csv = format!("{HEADER}1,,Drama,d,X,a,2000,100,8.0,100,,\n");
        let err = read_movies(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::MissingRequiredField { row: 1, field: "Title" }));
    }
}
