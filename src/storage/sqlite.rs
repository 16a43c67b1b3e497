use crate::model::{DailyClose, Period, StorageError, Ticker};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};

/// A finished screening run as recorded in `screen_runs`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenRun {
    pub index_name: String,
    pub period: Period,
    pub ma_window: usize,
    pub days_rs_holds_above_ma: usize,
    pub survivors: Vec<Ticker>,
    pub ran_at: DateTime<Utc>,
}

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens the database and creates missing tables.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        Self::with_connection(Connection::open(db_path)?)
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS closes (
                ticker TEXT NOT NULL,
                date TEXT NOT NULL,
                close REAL NOT NULL,
                PRIMARY KEY (ticker, date)
            );

            CREATE TABLE IF NOT EXISTS fetches (
                ticker TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                fetched_at TEXT NOT NULL,
                PRIMARY KEY (ticker, start_date, end_date)
            );

            CREATE TABLE IF NOT EXISTS screen_runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                index_name TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                ma_window INTEGER NOT NULL,
                days_rs_holds_above_ma INTEGER NOT NULL,
                survivors TEXT NOT NULL,
                ran_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(Self { conn })
    }

    /// Stores fetched closes and remembers that `period` was fetched for `ticker`.
    pub fn save_closes(
        &mut self,
        ticker: &Ticker,
        period: &Period,
        bars: &[DailyClose],
    ) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO closes (ticker, date, close) VALUES (?1, ?2, ?3)",
            )?;
            for bar in bars {
                stmt.execute(params![ticker.as_str(), bar.date, bar.close])?;
            }
        }
        tx.execute(
            "INSERT OR REPLACE INTO fetches (ticker, start_date, end_date, fetched_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                ticker.as_str(),
                period.start,
                period.end,
                Utc::now(),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Cached closes for exactly this period, or `None` if it was never fetched
    /// or was fetched before the period closed.
    pub fn cached_closes(
        &self,
        ticker: &Ticker,
        period: &Period,
    ) -> Result<Option<Vec<DailyClose>>, StorageError> {
        let fetched: Option<DateTime<Utc>> = self
            .conn
            .query_row(
                "SELECT fetched_at FROM fetches WHERE ticker = ?1 AND start_date = ?2 AND end_date = ?3",
                params![ticker.as_str(), period.start, period.end],
                |row| row.get(0),
            )
            .optional()?;
        let Some(fetched_at) = fetched else {
            return Ok(None);
        };
        // Bars fetched on or before the last day may still be incomplete.
        if fetched_at.date_naive() <= period.end {
            return Ok(None);
        }

        let mut stmt = self.conn.prepare(
            "SELECT date, close FROM closes
             WHERE ticker = ?1 AND date >= ?2 AND date <= ?3 ORDER BY date ASC",
        )?;
        let rows = stmt.query_map(
            params![ticker.as_str(), period.start, period.end],
            |row| {
                Ok(DailyClose {
                    date: row.get(0)?,
                    close: row.get(1)?,
                })
            },
        )?;
        let bars = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(Some(bars))
    }

    pub fn record_run(&self, run: &ScreenRun) -> Result<(), StorageError> {
        let survivors = run
            .survivors
            .iter()
            .map(Ticker::as_str)
            .collect::<Vec<_>>()
            .join(",");
        self.conn.execute(
            "INSERT INTO screen_runs
                (index_name, start_date, end_date, ma_window, days_rs_holds_above_ma, survivors, ran_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &run.index_name,
                run.period.start,
                run.period.end,
                run.ma_window as i64,
                run.days_rs_holds_above_ma as i64,
                survivors,
                run.ran_at,
            ],
        )?;
        Ok(())
    }

    /// Most recent run for an index.
    pub fn last_run(&self, index_name: &str) -> Result<Option<ScreenRun>, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT start_date, end_date, ma_window, days_rs_holds_above_ma, survivors, ran_at
                 FROM screen_runs WHERE index_name = ?1 ORDER BY id DESC LIMIT 1",
                params![index_name],
                |row| {
                    Ok((
                        row.get::<_, NaiveDate>(0)?,
                        row.get::<_, NaiveDate>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, DateTime<Utc>>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((start, end, ma_window, days, survivors, ran_at)) = row else {
            return Ok(None);
        };
        Ok(Some(ScreenRun {
            index_name: index_name.to_string(),
            period: Period { start, end },
            ma_window: ma_window as usize,
            days_rs_holds_above_ma: days as usize,
            survivors: survivors
                .split(',')
                .filter(|s| !s.is_empty())
                .map(Ticker::from)
                .collect(),
            ran_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn period(start: u32, end: u32) -> Period {
        Period {
            start: day(start),
            end: day(end),
        }
    }

    #[test]
    fn closes_are_cached_per_period() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        let aapl = Ticker::from("AAPL");
        let jan = period(2, 5);
        assert_eq!(storage.cached_closes(&aapl, &jan).unwrap(), None);

        let bars = vec![
            DailyClose { date: day(3), close: 184.25 },
            DailyClose { date: day(2), close: 185.64 },
        ];
        storage.save_closes(&aapl, &jan, &bars).unwrap();

        let cached = storage.cached_closes(&aapl, &jan).unwrap().unwrap();
        assert_eq!(cached, vec![bars[1], bars[0]]);
        // a different window was never fetched
        assert_eq!(storage.cached_closes(&aapl, &period(2, 9)).unwrap(), None);
        assert_eq!(storage.cached_closes(&"MSFT".into(), &jan).unwrap(), None);
    }

    #[test]
    fn empty_fetch_is_still_a_cache_hit() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        let delisted = Ticker::from("GONE");
        storage.save_closes(&delisted, &period(2, 5), &[]).unwrap();
        assert_eq!(
            storage.cached_closes(&delisted, &period(2, 5)).unwrap(),
            Some(Vec::new())
        );
    }

    #[test]
    fn open_period_is_fetched_again() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        let nvda = Ticker::from("NVDA");
        let today = Utc::now().date_naive();
        let running = Period {
            start: today - Days::new(10),
            end: today + Days::new(5),
        };
        let ends_today = Period {
            start: today - Days::new(10),
            end: today,
        };
        let bars = [DailyClose { date: today, close: 1.0 }];
        storage.save_closes(&nvda, &running, &bars).unwrap();
        storage.save_closes(&nvda, &ends_today, &bars).unwrap();

        assert_eq!(storage.cached_closes(&nvda, &running).unwrap(), None);
        assert_eq!(storage.cached_closes(&nvda, &ends_today).unwrap(), None);
    }

    #[test]
    fn last_run_returns_latest_for_index() {
        let storage = SqliteStorage::in_memory().unwrap();
        assert!(storage.last_run("S&P 500").unwrap().is_none());

        let ran_at = DateTime::parse_from_rfc3339("2024-02-01T18:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut run = ScreenRun {
            index_name: "S&P 500".into(),
            period: period(2, 31),
            ma_window: 21,
            days_rs_holds_above_ma: 3,
            survivors: vec![],
            ran_at,
        };
        storage.record_run(&run).unwrap();
        run.survivors = vec!["NVDA".into(), "TSLA".into()];
        storage.record_run(&run).unwrap();

        assert_eq!(storage.last_run("S&P 500").unwrap(), Some(run));
        assert!(storage.last_run("NASDAQ 100").unwrap().is_none());
    }
}
