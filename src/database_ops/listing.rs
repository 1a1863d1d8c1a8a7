// Read-only listings for the movies and producers endpoints.

use anyhow::Result;
use indexmap::map::Entry;
use indexmap::IndexMap;
use sqlx::Row;

use super::db::Store;
use crate::models::{MovieRow, ProducerRow};

/// Every movie, ordered by id, with its producers' names.
pub async fn list_records(store: &Store) -> Result<Vec<MovieRow>> {
    let rows = sqlx::query(
        "SELECT m.id, m.title, m.studios, m.year, m.winner, p.name AS producer \
         FROM movies m \
         LEFT JOIN movie_producers mp ON mp.movie_id = m.id \
         LEFT JOIN producers p ON p.id = mp.producer_id \
         ORDER BY m.id, p.name",
    )
    .fetch_all(&store.pool)
    .await?;

    let mut movies: IndexMap<i64, MovieRow> = IndexMap::new();
    for row in rows {
        let id: i64 = row.try_get("id")?;
        let producer: Option<String> = row.try_get("producer")?;
        let movie = match movies.entry(id) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(MovieRow {
                id,
                title: row.try_get("title")?,
                studios: row.try_get("studios")?,
                year: row.try_get("year")?,
                winner: row.try_get("winner")?,
                producers: Vec::new(),
            }),
        };
        if let Some(name) = producer {
            movie.producers.push(name);
        }
    }
    Ok(movies.into_values().collect())
}

/// Every producer, ordered by id, with the titles it is linked to.
pub async fn list_producers(store: &Store) -> Result<Vec<ProducerRow>> {
    let rows = sqlx::query(
        "SELECT p.id, p.name, m.title \
         FROM producers p \
         LEFT JOIN movie_producers mp ON mp.producer_id = p.id \
         LEFT JOIN movies m ON m.id = mp.movie_id \
         ORDER BY p.id, m.year, m.title",
    )
    .fetch_all(&store.pool)
    .await?;

    let mut producers: IndexMap<i64, ProducerRow> = IndexMap::new();
    for row in rows {
        let id: i64 = row.try_get("id")?;
        let title: Option<String> = row.try_get("title")?;
        let entry = match producers.entry(id) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(ProducerRow {
                id,
                name: row.try_get("name")?,
                movies: Vec::new(),
            }),
        };
        if let Some(title) = title {
            entry.movies.push(title);
        }
    }
    Ok(producers.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::bulk_writer::write_batch;
    use crate::database_ops::schema::initialize_schema;
    use crate::models::Record;

    #[tokio::test]
    async fn lists_movies_and_producers_with_their_links() {
        let store = Store::in_memory().await.unwrap();
        initialize_schema(&store).await.unwrap();
        let batch = vec![
            Record {
                title: "Mommie Dearest".into(),
                studio: "Paramount Pictures".into(),
                year: 1981,
                won: true,
                producers: vec!["Frank Yablans".into()],
            },
            Record {
                title: "Inchon".into(),
                studio: "MGM".into(),
                year: 1982,
                won: true,
                producers: vec!["Mitsuharu Ishii".into(), "Frank Yablans".into()],
            },
        ];
        write_batch(&store, &batch).await.unwrap();

        let movies = list_records(&store).await.unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].title, "Mommie Dearest");
        assert!(movies[0].winner);
        assert_eq!(movies[1].producers, vec!["Frank Yablans", "Mitsuharu Ishii"]);

        let producers = list_producers(&store).await.unwrap();
        assert_eq!(producers.len(), 2);
        assert_eq!(producers[0].name, "Frank Yablans");
        assert_eq!(producers[0].movies, vec!["Mommie Dearest", "Inchon"]);
        assert_eq!(producers[1].movies, vec!["Inchon"]);
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let store = Store::in_memory().await.unwrap();
        initialize_schema(&store).await.unwrap();
        assert!(list_records(&store).await.unwrap().is_empty());
        assert!(list_producers(&store).await.unwrap().is_empty());
    }
}
