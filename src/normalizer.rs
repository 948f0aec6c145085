use std::collections::{HashMap, HashSet};

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::{debug, info};

use crate::{
    entities::{director, genre, movie, movie_director, movie_genre},
    error::{AppError, AppResult},
    models::{MovieRecord, NormalizeSummary},
};

/// Splits a raw genre field into distinct, trimmed, non-empty labels, keeping first-seen order.
pub fn split_genres(field: &str) -> Vec<&str> {
    let mut seen = HashSet::new();
    field.split(',').map(str::trim).filter(|g| !g.is_empty() && seen.insert(*g)).collect()
}

/// Owns genre and director id assignment for one batch.
#[derive(Default)]
struct Normalizer {
    movie_ids: HashSet<i32>,
    genre_ids: HashMap<String, i32>,
    director_ids: HashMap<String, i32>,
    summary: NormalizeSummary,
}

/// Writes all records into an empty schema in one transaction.
///
/// Any error drops the transaction before commit, so a failed batch leaves no rows behind.
pub async fn normalize(
    db: &DatabaseConnection,
    records: &[MovieRecord],
) -> AppResult<NormalizeSummary> {
    info!(records = records.len(), "normalizing movies");

    let txn = db.begin().await?;
    let mut normalizer = Normalizer::default();

    for (idx, record) in records.iter().enumerate() {
        normalizer.insert_record(&txn, idx + 1, record).await?;
    }

    txn.commit().await?;

    let summary = normalizer.summary;
    info!(
        movies = summary.movies,
        genres = summary.genres,
        directors = summary.directors,
        movie_genres = summary.movie_genres,
        "normalization committed"
    );
    Ok(summary)
}

impl Normalizer {
    async fn insert_record<C: ConnectionTrait>(
        &mut self,
        conn: &C,
        row: usize,
        record: &MovieRecord,
    ) -> AppResult<()> {
        if !self.movie_ids.insert(record.id) {
            return Err(AppError::DuplicateKey { row, id: record.id });
        }

        let model = movie::ActiveModel {
            id: Set(record.id),
            title: Set(record.title.clone()),
            description: Set(record.description.clone()),
            director_raw: Set(record.director.clone()),
            actors: Set(record.actors.clone()),
            year: Set(record.year),
            runtime: Set(record.runtime),
            rating: Set(record.rating),
            votes: Set(record.votes),
            revenue: Set(record.revenue),
            metascore: Set(record.metascore),
        };
        movie::Entity::insert(model).exec_without_returning(conn).await?;
        self.summary.movies += 1;

        for label in split_genres(&record.genre_field) {
            let genre_id = self.ensure_genre(conn, label).await?;
            let link = movie_genre::ActiveModel {
                id: Default::default(),
                movie_id: Set(record.id),
                genre_id: Set(genre_id),
            };
            movie_genre::Entity::insert(link).exec_without_returning(conn).await?;
            self.summary.movie_genres += 1;
        }

        let director_id = self.ensure_director(conn, &record.director).await?;
        let link = movie_director::ActiveModel {
            movie_id: Set(record.id),
            director_id: Set(director_id),
        };
        movie_director::Entity::insert(link).exec_without_returning(conn).await?;
        self.summary.movie_directors += 1;

        debug!(row = row, id = record.id, title = %record.title, "movie normalized");
        Ok(())
    }

    async fn ensure_genre<C: ConnectionTrait>(&mut self, conn: &C, label: &str) -> AppResult<i32> {
        if let Some(id) = self.genre_ids.get(label) {
            return Ok(*id);
        }

        let existing =
            genre::Entity::find().filter(genre::Column::Name.eq(label)).one(conn).await?;
        let id = match existing {
            Some(found) => found.id,
            None => {
                let model =
                    genre::ActiveModel { id: Default::default(), name: Set(label.to_string()) };
                self.summary.genres += 1;
                genre::Entity::insert(model).exec(conn).await?.last_insert_id
            },
        };

        self.genre_ids.insert(label.to_string(), id);
        Ok(id)
    }

    async fn ensure_director<C: ConnectionTrait>(
        &mut self,
        conn: &C,
        name: &str,
    ) -> AppResult<i32> {
        if let Some(id) = self.director_ids.get(name) {
            return Ok(*id);
        }

        let existing =
            director::Entity::find().filter(director::Column::Name.eq(name)).one(conn).await?;
        let id = match existing {
            Some(found) => found.id,
            None => {
                let model =
                    director::ActiveModel { id: Default::default(), name: Set(name.to_string()) };
                self.summary.directors += 1;
                director::Entity::insert(model).exec(conn).await?.last_insert_id
            },
        };

        self.director_ids.insert(name.to_string(), id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use sea_orm::{ModelTrait, PaginatorTrait, QueryOrder};

    use super::*;
    use crate::{
        db::{self, test_support::fresh_db},
        models::fixtures::record,
    };

    fn scenario() -> Vec<MovieRecord> {
        vec![
            record(1, "A", "Drama,Action", "X", 2000, 8.0, 100),
            record(2, "B", "Drama", "X", 2001, 9.0, 50),
            record(3, "C", "Comedy", "Y", 2000, 7.0, 10),
        ]
    }

    async fn content(
        db: &DatabaseConnection,
    ) -> (BTreeSet<String>, BTreeSet<String>, BTreeSet<(i32, String)>, BTreeSet<(i32, String)>) {
        let genres: HashMap<i32, String> = genre::Entity::find()
            .all(db)
            .await
            .unwrap()
            .into_iter()
            .map(|g| (g.id, g.name))
            .collect();
        let directors: HashMap<i32, String> = director::Entity::find()
            .all(db)
            .await
            .unwrap()
            .into_iter()
            .map(|d| (d.id, d.name))
            .collect();

        let movie_genres = movie_genre::Entity::find()
            .all(db)
            .await
            .unwrap()
            .into_iter()
            .map(|l| (l.movie_id, genres[&l.genre_id].clone()))
            .collect();
        let movie_directors = movie_director::Entity::find()
            .all(db)
            .await
            .unwrap()
            .into_iter()
            .map(|l| (l.movie_id, directors[&l.director_id].clone()))
            .collect();

        (
            genres.into_values().collect(),
            directors.into_values().collect(),
            movie_genres,
            movie_directors,
        )
    }

    #[test]
    fn splits_trims_and_dedups_genres() {
        assert_eq!(split_genres("Drama, Action ,,Drama,  "), vec!["Drama", "Action"]);
        assert_eq!(split_genres(""), Vec::<&str>::new());
        assert_eq!(split_genres("Sci-Fi"), vec!["Sci-Fi"]);
        // Labels are case-sensitive.
        assert_eq!(split_genres("drama,Drama"), vec!["drama", "Drama"]);
    }

    #[tokio::test]
    async fn builds_lookup_and_junction_rows() {
        let (_dir, db) = fresh_db().await;

        let summary = normalize(&db, &scenario()).await.unwrap();
        assert_eq!(
            summary,
            NormalizeSummary { movies: 3, genres: 3, directors: 2, movie_genres: 4, movie_directors: 3 }
        );

        let (genres, directors, movie_genres, movie_directors) = content(&db).await;
        assert_eq!(genres, BTreeSet::from(["Action", "Comedy", "Drama"].map(String::from)));
        assert_eq!(directors, BTreeSet::from(["X", "Y"].map(String::from)));
        assert_eq!(movie_genres.len(), 4);
        assert!(movie_genres.contains(&(1, "Action".to_string())));
        assert!(movie_genres.contains(&(1, "Drama".to_string())));
        assert_eq!(
            movie_directors,
            BTreeSet::from([(1, "X".to_string()), (2, "X".to_string()), (3, "Y".to_string())])
        );

        let movies = movie::Entity::find().order_by_asc(movie::Column::Id).all(&db).await.unwrap();
        assert_eq!(movies.iter().map(|m| m.title.as_str()).collect::<Vec<_>>(), ["A", "B", "C"]);
    }

    #[tokio::test]
    async fn relations_resolve_through_junction_tables() {
        let (_dir, db) = fresh_db().await;
        normalize(&db, &scenario()).await.unwrap();

        let a = movie::Entity::find_by_id(1).one(&db).await.unwrap().unwrap();
        let mut names: Vec<String> =
            a.find_related(genre::Entity).all(&db).await.unwrap().into_iter().map(|g| g.name).collect();
        names.sort();
        assert_eq!(names, ["Action", "Drama"]);

        let x = director::Entity::find()
            .filter(director::Column::Name.eq("X"))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(x.find_related(movie_director::Entity).count(&db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn repeated_tokens_link_once() {
        let (_dir, db) = fresh_db().await;
        let records = vec![record(7, "Loop", "Drama, Drama ,Thriller,", "Z", 2010, 6.0, 5)];

        normalize(&db, &records).await.unwrap();

        let links = movie_genre::Entity::find().count(&db).await.unwrap();
        assert_eq!(links, 2);
    }

    #[tokio::test]
    async fn rebuild_then_rerun_gives_same_content() {
        let (_dir, db) = fresh_db().await;
        normalize(&db, &scenario()).await.unwrap();
        let first = content(&db).await;

        db::rebuild_schema(&db).await.unwrap();
        normalize(&db, &scenario()).await.unwrap();
        let second = content(&db).await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn duplicate_id_aborts_without_partial_commit() {
        let (_dir, db) = fresh_db().await;
        let mut records = scenario();
        records.push(record(2, "B again", "Horror", "W", 2005, 5.0, 1));

        let err = normalize(&db, &records).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateKey { row: 4, id: 2 }));

        assert_eq!(movie::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(genre::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(director::Entity::find().count(&db).await.unwrap(), 0);
    }
}
