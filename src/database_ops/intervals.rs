use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};

use super::db::Store;
use crate::models::{Interval, ProducerIntervals};

/// Producers holding the smallest and the largest gap between two consecutive wins.
#[instrument(skip(store))]
pub async fn compute_intervals(store: &Store) -> Result<ProducerIntervals> {
    let wins: Vec<(String, i64)> = sqlx::query_as(
        "SELECT p.name, m.year FROM movies m \
         JOIN movie_producers mp ON mp.movie_id = m.id \
         JOIN producers p ON p.id = mp.producer_id \
         WHERE m.winner = 1",
    )
    .fetch_all(&store.pool)
    .await
    .context("failed to load winning producers")?;

    let intervals = win_intervals(wins);
    debug!(intervals = intervals.len(), "producer intervals computed");
    Ok(extremes(intervals))
}

/// One interval per pair of consecutive winning years of each producer.
///
/// Several wins in the same year count once, so every interval is strictly
/// positive. Output is ordered by producer name, then year.
pub fn win_intervals<I>(wins: I) -> Vec<Interval>
where
    I: IntoIterator<Item = (String, i64)>,
{
    let mut by_producer: BTreeMap<String, BTreeSet<i64>> = BTreeMap::new();
    for (producer, year) in wins {
        by_producer.entry(producer).or_default().insert(year);
    }

    let mut intervals = Vec::new();
    for (producer, years) in &by_producer {
        for (previous, following) in years.iter().zip(years.iter().skip(1)) {
            intervals.push(Interval {
                producer: producer.clone(),
                interval: following - previous,
                previous_win: *previous,
                following_win: *following,
            });
        }
    }
    intervals
}

/// Splits out every interval equal to the global minimum and to the global maximum.
pub fn extremes(intervals: Vec<Interval>) -> ProducerIntervals {
    let (Some(min), Some(max)) = (
        intervals.iter().map(|i| i.interval).min(),
        intervals.iter().map(|i| i.interval).max(),
    ) else {
        return ProducerIntervals::default();
    };

    ProducerIntervals {
        min: intervals.iter().filter(|i| i.interval == min).cloned().collect(),
        max: intervals.into_iter().filter(|i| i.interval == max).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::bulk_writer::write_batch;
    use crate::database_ops::schema::initialize_schema;
    use crate::models::Record;

    fn wins(rows: &[(&str, i64)]) -> Vec<(String, i64)> {
        rows.iter().map(|(p, y)| (p.to_string(), *y)).collect()
    }

    fn interval(producer: &str, previous_win: i64, following_win: i64) -> Interval {
        Interval {
            producer: producer.into(),
            interval: following_win - previous_win,
            previous_win,
            following_win,
        }
    }

    #[test]
    fn consecutive_wins_of_one_producer() {
        let report = extremes(win_intervals(wins(&[
            ("X", 2007),
            ("X", 2000),
            ("X", 2005),
            ("Y", 1999),
        ])));
        assert_eq!(report.min, vec![interval("X", 2005, 2007)]);
        assert_eq!(report.max, vec![interval("X", 2000, 2005)]);
    }

    #[test]
    fn ties_keep_every_producer() {
        let report = extremes(win_intervals(wins(&[
            ("A", 1990),
            ("A", 1991),
            ("B", 2000),
            ("B", 2001),
            ("C", 1980),
            ("C", 2000),
        ])));
        assert_eq!(
            report.min,
            vec![interval("A", 1990, 1991), interval("B", 2000, 2001)]
        );
        assert_eq!(report.max, vec![interval("C", 1980, 2000)]);
    }

    #[test]
    fn single_interval_is_both_min_and_max() {
        let report = extremes(win_intervals(wins(&[("A", 1990), ("A", 1995)])));
        assert_eq!(report.min, report.max);
        assert_eq!(report.min, vec![interval("A", 1990, 1995)]);
    }

    #[test]
    fn no_repeat_winners_yields_empty_lists() {
        let report = extremes(win_intervals(wins(&[("A", 1990), ("B", 1995)])));
        assert!(report.min.is_empty());
        assert!(report.max.is_empty());
    }

    #[test]
    fn same_year_wins_collapse() {
        let intervals = win_intervals(wins(&[("A", 1990), ("A", 1990), ("A", 1992)]));
        assert_eq!(intervals, vec![interval("A", 1990, 1992)]);
        assert!(intervals
            .iter()
            .all(|i| i.previous_win < i.following_win && i.interval == i.following_win - i.previous_win));
    }

    #[tokio::test]
    async fn reads_only_winning_movies_from_the_store() {
        let store = Store::in_memory().await.unwrap();
        initialize_schema(&store).await.unwrap();
        let movie = |title: &str, year: i64, won: bool| Record {
            title: title.into(),
            studio: "S".into(),
            year,
            won,
            producers: vec!["X".into()],
        };
        write_batch(
            &store,
            &[
                movie("First", 2000, true),
                movie("Loser", 2001, false),
                movie("Second", 2005, true),
                movie("Third", 2007, true),
            ],
        )
        .await
        .unwrap();

        let report = compute_intervals(&store).await.unwrap();
        assert_eq!(report.min, vec![interval("X", 2005, 2007)]);
        assert_eq!(report.max, vec![interval("X", 2000, 2005)]);
    }
}
