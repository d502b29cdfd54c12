//! GTFS schedule store over SQLite
//!
//! Read-only lookups used to complete itineraries. The optional `stops.stop_code`
//! column is detected once at construction; without it stops are matched by
//! `stop_id` only.

use std::{future::Future, time::Duration};

use application::{
    error::ApplicationError,
    ports::{ScheduleRoute, ScheduleStorePort},
};
use async_trait::async_trait;
use domain::{GeoLocation, Stop, StopCode};
use sqlx::SqlitePool;
use tracing::{debug, instrument, warn};

use super::{
    error::{DatabaseError, map_sqlx_error},
    schedule_database::ScheduleDatabase,
};
use crate::config::ScheduleStoreConfig;

#[derive(sqlx::FromRow)]
struct RouteRow {
    route_id: String,
    route_short_name: Option<String>,
    route_long_name: Option<String>,
}

impl From<RouteRow> for ScheduleRoute {
    fn from(row: RouteRow) -> Self {
        let short_name = row
            .route_short_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| row.route_id.clone());
        Self {
            id: row.route_id,
            short_name: short_name.trim().to_string(),
            long_name: row.route_long_name.filter(|name| !name.trim().is_empty()),
        }
    }
}

#[derive(sqlx::FromRow)]
struct StopRow {
    stop_id: String,
    stop_code: Option<String>,
    stop_name: String,
    stop_lat: f64,
    stop_lon: f64,
    stop_sequence: Option<i64>,
}

impl StopRow {
    /// `None` for rows whose coordinates are out of range
    fn into_stop(self) -> Option<Stop> {
        let Ok(location) = GeoLocation::new(self.stop_lat, self.stop_lon) else {
            warn!(stop_id = %self.stop_id, "Skipping stop with invalid coordinates");
            return None;
        };

        let code = self
            .stop_code
            .as_deref()
            .and_then(|code| StopCode::parse(code).ok())
            .or_else(|| StopCode::parse(&self.stop_id).ok());

        let stop = match code {
            Some(code) => Stop::new(code, self.stop_name, location),
            None => Stop::synthetic(self.stop_name, location),
        }
        .with_id(self.stop_id);

        Some(match self.stop_sequence.and_then(|s| u32::try_from(s).ok()) {
            Some(sequence) => stop.with_sequence(sequence),
            None => stop,
        })
    }
}

/// SQLite-backed implementation of [`ScheduleStorePort`]
#[derive(Debug, Clone)]
pub struct SqliteScheduleStore {
    pool: SqlitePool,
    query_timeout: Duration,
    stop_code_column: bool,
}

impl SqliteScheduleStore {
    /// Wrap an open database, checking its schema
    pub async fn new(
        database: &ScheduleDatabase,
        query_timeout: Duration,
    ) -> Result<Self, DatabaseError> {
        let missing = database.missing_tables().await?;
        if !missing.is_empty() {
            return Err(DatabaseError::Schema(format!(
                "missing tables: {}",
                missing.join(", ")
            )));
        }

        let stop_code_column = database.has_stop_code_column().await?;
        debug!(stop_code_column, "Schedule schema checked");

        Ok(Self {
            pool: database.pool().clone(),
            query_timeout,
            stop_code_column,
        })
    }

    /// Open the configured database and wrap it
    pub async fn open(config: &ScheduleStoreConfig) -> Result<Self, DatabaseError> {
        let database = ScheduleDatabase::open(config).await?;
        Self::new(&database, config.query_timeout()).await
    }

    fn stop_code_select(&self) -> &'static str {
        if self.stop_code_column {
            "s.stop_code"
        } else {
            "NULL AS stop_code"
        }
    }

    async fn bounded<T>(
        &self,
        query: impl Future<Output = Result<T, sqlx::Error>> + Send,
    ) -> Result<T, ApplicationError> {
        tokio::time::timeout(self.query_timeout, query)
            .await
            .map_err(|_| {
                ApplicationError::ScheduleStore(format!(
                    "Query exceeded {}s",
                    self.query_timeout.as_secs()
                ))
            })?
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl ScheduleStorePort for SqliteScheduleStore {
    #[instrument(skip(self))]
    async fn route_by_name_or_id(
        &self,
        key: &str,
    ) -> Result<Option<ScheduleRoute>, ApplicationError> {
        let key = key.trim();
        if key.is_empty() {
            return Ok(None);
        }

        let row: Option<RouteRow> = self
            .bounded(
                sqlx::query_as(
                    "SELECT route_id, route_short_name, route_long_name FROM routes \
                     WHERE UPPER(TRIM(route_short_name)) = UPPER(?1) OR UPPER(route_id) = UPPER(?1) \
                     ORDER BY UPPER(TRIM(COALESCE(route_short_name, ''))) = UPPER(?1) DESC, route_id \
                     LIMIT 1",
                )
                .bind(key)
                .fetch_optional(&self.pool),
            )
            .await?;

        Ok(row.map(ScheduleRoute::from))
    }

    #[instrument(skip(self))]
    async fn representative_trip(
        &self,
        route_id: &str,
    ) -> Result<Option<String>, ApplicationError> {
        self.bounded(
            sqlx::query_scalar(
                "SELECT t.trip_id FROM trips t \
                 JOIN stop_times st ON st.trip_id = t.trip_id \
                 WHERE t.route_id = ?1 \
                 GROUP BY t.trip_id \
                 ORDER BY COUNT(*) DESC, t.trip_id \
                 LIMIT 1",
            )
            .bind(route_id)
            .fetch_optional(&self.pool),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn stops_for_trip(&self, trip_id: &str) -> Result<Vec<Stop>, ApplicationError> {
        let sql = format!(
            "SELECT s.stop_id, {}, s.stop_name, s.stop_lat, s.stop_lon, st.stop_sequence \
             FROM stop_times st JOIN stops s ON s.stop_id = st.stop_id \
             WHERE st.trip_id = ?1 \
             ORDER BY st.stop_sequence",
            self.stop_code_select()
        );

        let rows: Vec<StopRow> = self
            .bounded(sqlx::query_as(&sql).bind(trip_id).fetch_all(&self.pool))
            .await?;

        Ok(rows.into_iter().filter_map(StopRow::into_stop).collect())
    }

    #[instrument(skip(self))]
    async fn stop_by_code(&self, code: &str) -> Result<Option<Stop>, ApplicationError> {
        let normalized = StopCode::normalize(code);
        if normalized.is_empty() {
            return Ok(None);
        }

        let sql = if self.stop_code_column {
            "SELECT s.stop_id, s.stop_code, s.stop_name, s.stop_lat, s.stop_lon, \
             NULL AS stop_sequence FROM stops s \
             WHERE UPPER(REPLACE(s.stop_code, ' ', '')) = ?1 OR UPPER(s.stop_id) = ?1 \
             ORDER BY UPPER(REPLACE(COALESCE(s.stop_code, ''), ' ', '')) = ?1 DESC \
             LIMIT 1"
        } else {
            "SELECT s.stop_id, NULL AS stop_code, s.stop_name, s.stop_lat, s.stop_lon, \
             NULL AS stop_sequence FROM stops s \
             WHERE UPPER(s.stop_id) = ?1 \
             LIMIT 1"
        };

        let row: Option<StopRow> = self
            .bounded(
                sqlx::query_as(sql)
                    .bind(normalized.as_str())
                    .fetch_optional(&self.pool),
            )
            .await?;

        Ok(row.and_then(StopRow::into_stop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = include_str!("../../tests/fixtures/santiago_gtfs.sql");

    async fn fixture_store() -> SqliteScheduleStore {
        let db = ScheduleDatabase::in_memory().await.unwrap();
        sqlx::raw_sql(FIXTURE).execute(db.pool()).await.unwrap();
        SqliteScheduleStore::new(&db, Duration::from_secs(5))
            .await
            .unwrap()
    }

    fn codes(stops: &[Stop]) -> Vec<Option<String>> {
        stops
            .iter()
            .map(|stop| stop.code.as_ref().map(|code| code.as_str().to_string()))
            .collect()
    }

    #[tokio::test]
    async fn route_found_by_short_name_case_insensitively() {
        let store = fixture_store().await;
        let route = store.route_by_name_or_id(" l1 ").await.unwrap().unwrap();
        assert_eq!(route.id, "L1");
        assert_eq!(route.short_name, "L1");
        assert_eq!(route.long_name.as_deref(), Some("San Pablo - Los Dominicos"));
    }

    #[tokio::test]
    async fn route_found_by_internal_id() {
        let store = fixture_store().await;
        let route = store.route_by_name_or_id("506-i").await.unwrap().unwrap();
        assert_eq!(route.id, "506-I");
        assert_eq!(route.short_name, "506");
    }

    #[tokio::test]
    async fn unknown_or_blank_route_is_none() {
        let store = fixture_store().await;
        assert!(store.route_by_name_or_id("B28").await.unwrap().is_none());
        assert!(store.route_by_name_or_id("  ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn representative_trip_has_most_stops() {
        let store = fixture_store().await;
        assert_eq!(
            store.representative_trip("506-I").await.unwrap().as_deref(),
            Some("506-I-full")
        );
        assert!(store.representative_trip("EMPTY").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn trip_stops_follow_sequence() {
        let store = fixture_store().await;
        let stops = store.stops_for_trip("506-I-full").await.unwrap();

        assert_eq!(
            codes(&stops),
            ["PA433", "PA434", "PA435", "PA436", "PA437"]
                .map(|c| Some(c.to_string()))
                .to_vec()
        );
        let sequences: Vec<_> = stops.iter().map(|s| s.sequence).collect();
        assert_eq!(sequences, vec![Some(1), Some(2), Some(3), Some(4), Some(5)]);
        assert_eq!(stops[3].id.as_deref(), Some("stop-17"));
    }

    #[tokio::test]
    async fn uncoded_stops_are_synthetic_and_bad_rows_skipped() {
        let store = fixture_store().await;
        let stops = store.stops_for_trip("L1-weekday").await.unwrap();

        assert_eq!(stops.len(), 2);
        assert!(stops.iter().all(Stop::is_synthetic));
        assert_eq!(stops[0].id.as_deref(), Some("ML-UCH"));
        assert_eq!(stops[1].name, "Santa Lucia");
    }

    #[tokio::test]
    async fn unknown_trip_has_no_stops() {
        let store = fixture_store().await;
        assert!(store.stops_for_trip("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stop_found_by_code_ignoring_case_and_spaces() {
        let store = fixture_store().await;
        let stop = store.stop_by_code("pa 436").await.unwrap().unwrap();
        assert_eq!(stop.id.as_deref(), Some("stop-17"));
        assert_eq!(stop.code.unwrap().as_str(), "PA436");
        assert!(stop.sequence.is_none());
    }

    #[tokio::test]
    async fn stop_found_by_id_when_code_is_missing() {
        let store = fixture_store().await;
        let stop = store.stop_by_code("pa437").await.unwrap().unwrap();
        assert_eq!(stop.code.unwrap().as_str(), "PA437");

        let station = store.stop_by_code("ml-uch").await.unwrap().unwrap();
        assert!(station.is_synthetic());
        assert_eq!(station.name, "Universidad de Chile");
    }

    #[tokio::test]
    async fn unknown_stop_is_none() {
        let store = fixture_store().await;
        assert!(store.stop_by_code("ZZ999").await.unwrap().is_none());
        assert!(store.stop_by_code("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn schema_without_stop_code_matches_ids() {
        let db = ScheduleDatabase::in_memory().await.unwrap();
        sqlx::raw_sql(
            "CREATE TABLE routes (route_id TEXT, route_short_name TEXT, route_long_name TEXT);
             CREATE TABLE trips (trip_id TEXT, route_id TEXT);
             CREATE TABLE stop_times (trip_id TEXT, stop_id TEXT, stop_sequence INTEGER);
             CREATE TABLE stops (stop_id TEXT, stop_name TEXT, stop_lat REAL, stop_lon REAL);
             INSERT INTO stops VALUES ('PI120', 'Plaza Italia', -33.4372, -70.6345);",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let store = SqliteScheduleStore::new(&db, Duration::from_secs(5))
            .await
            .unwrap();
        let stop = store.stop_by_code("pi120").await.unwrap().unwrap();
        assert_eq!(stop.code.unwrap().as_str(), "PI120");
    }

    #[tokio::test]
    async fn missing_tables_are_rejected() {
        let db = ScheduleDatabase::in_memory().await.unwrap();
        sqlx::raw_sql("CREATE TABLE stops (stop_id TEXT);")
            .execute(db.pool())
            .await
            .unwrap();

        let err = SqliteScheduleStore::new(&db, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Schema(ref m) if m.contains("stop_times")));
    }
}
