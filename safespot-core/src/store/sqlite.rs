//! SQLite-backed record store.
//!
//! The store opens the database read-only. Radius queries prefilter with a
//! degree bounding box in SQL and apply the haversine predicate in Rust.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OpenFlags, Row, params};
use thiserror::Error;

use crate::{
    ApprovalState, FeedbackRecord, GeoPoint, GeoPointError, Rating, RatingError, StoreError,
    SubmitterId, SubmitterIdError, TrustOracle,
    cluster::{search_rect, within_radius},
    feedback::ParseApprovalStateError,
    trust::DEFAULT_TRUSTED_HISTORY,
};

use super::FeedbackStore;

/// Schema of the `feedback` table read by [`SqliteFeedbackStore`].
pub const FEEDBACK_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS feedback (
    id INTEGER PRIMARY KEY,
    submitter_id TEXT NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    rating INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    approval_status TEXT NOT NULL,
    location_name TEXT
)";

const SELECT_COLUMNS: &str = "SELECT id, submitter_id, latitude, longitude, rating, created_at, \
     approval_status, location_name FROM feedback";
const ELIGIBLE_FILTER: &str = "approval_status IN ('approved', 'auto_approved')";

/// Errors raised while reading feedback rows from SQLite.
#[derive(Debug, Error)]
pub enum SqliteFeedbackStoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A stored rating fell outside `1..=10`.
    #[error("feedback {id} has an invalid rating: {source}")]
    InvalidRating {
        /// Offending row.
        id: u64,
        /// Validation failure.
        #[source]
        source: RatingError,
    },
    /// A stored coordinate was out of range.
    #[error("feedback {id} has an invalid location: {source}")]
    InvalidLocation {
        /// Offending row.
        id: u64,
        /// Validation failure.
        #[source]
        source: GeoPointError,
    },
    /// A stored submitter id was blank.
    #[error("feedback {id} has an invalid submitter: {source}")]
    InvalidSubmitter {
        /// Offending row.
        id: u64,
        /// Validation failure.
        #[source]
        source: SubmitterIdError,
    },
    /// A stored timestamp was not RFC 3339.
    #[error("feedback {id} has an unparseable timestamp {value:?}: {source}")]
    InvalidTimestamp {
        /// Offending row.
        id: u64,
        /// Raw column value.
        value: String,
        /// Parser failure.
        #[source]
        source: chrono::ParseError,
    },
    /// A stored approval state was unknown.
    #[error("feedback {id} has an unknown approval state: {source}")]
    InvalidApprovalState {
        /// Offending row.
        id: u64,
        /// Parser failure.
        #[source]
        source: ParseApprovalStateError,
    },
    /// The shared connection was poisoned by a panicking reader.
    #[error("SQLite connection lock was poisoned")]
    PoisonedConnection,
    /// Generic SQLite error when reading rows.
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

impl From<SqliteFeedbackStoreError> for StoreError {
    fn from(err: SqliteFeedbackStoreError) -> Self {
        Self::Backend(Box::new(err))
    }
}

/// Read-only feedback store backed by a SQLite `feedback` table.
pub struct SqliteFeedbackStore {
    connection: Mutex<Connection>,
    path: PathBuf,
    trust_threshold: u32,
}

impl fmt::Debug for SqliteFeedbackStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteFeedbackStore")
            .field("path", &self.path)
            .field("trust_threshold", &self.trust_threshold)
            .finish_non_exhaustive()
    }
}

impl SqliteFeedbackStore {
    /// Open the database at `path` read-only.
    ///
    /// # Errors
    /// Returns [`SqliteFeedbackStoreError::OpenDatabase`] when the file cannot
    /// be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqliteFeedbackStoreError> {
        let db_path = path.as_ref();
        let connection = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|source| SqliteFeedbackStoreError::OpenDatabase {
                path: db_path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            connection: Mutex::new(connection),
            path: db_path.to_path_buf(),
            trust_threshold: DEFAULT_TRUSTED_HISTORY,
        })
    }

    /// Replace the trust threshold while returning `self` for chaining.
    #[must_use]
    pub fn with_trust_threshold(mut self, threshold: u32) -> Self {
        self.trust_threshold = threshold;
        self
    }

    /// Records inside the bounding rectangle of a radius query, filtered by
    /// the exact distance predicate.
    ///
    /// # Errors
    /// Returns [`SqliteFeedbackStoreError`] on query or row validation
    /// failures.
    pub fn records_near(
        &self,
        near: GeoPoint,
        radius_m: f64,
    ) -> Result<Vec<FeedbackRecord>, SqliteFeedbackStoreError> {
        let rect = search_rect(near, radius_m);
        let sql = format!(
            "{SELECT_COLUMNS} WHERE {ELIGIBLE_FILTER} \
             AND latitude BETWEEN ?1 AND ?2 AND longitude BETWEEN ?3 AND ?4 ORDER BY id"
        );
        let connection = self.lock()?;
        let mut statement = connection.prepare(&sql)?;
        let mut rows = statement.query(params![
            rect.min().y,
            rect.max().y,
            rect.min().x,
            rect.max().x
        ])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let record = read_record(row)?;
            if within_radius(near, record.location, radius_m) {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Every eligible record, ordered by id.
    ///
    /// # Errors
    /// Returns [`SqliteFeedbackStoreError`] on query or row validation
    /// failures.
    pub fn records(&self) -> Result<Vec<FeedbackRecord>, SqliteFeedbackStoreError> {
        let sql = format!("{SELECT_COLUMNS} WHERE {ELIGIBLE_FILTER} ORDER BY id");
        let connection = self.lock()?;
        let mut statement = connection.prepare(&sql)?;
        let mut rows = statement.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(read_record(row)?);
        }
        Ok(records)
    }

    /// Eligible records held for `submitter`.
    ///
    /// # Errors
    /// Returns [`SqliteFeedbackStoreError`] when the count query fails.
    pub fn approved_count(
        &self,
        submitter: &SubmitterId,
    ) -> Result<u32, SqliteFeedbackStoreError> {
        let sql =
            format!("SELECT COUNT(*) FROM feedback WHERE submitter_id = ?1 AND {ELIGIBLE_FILTER}");
        let connection = self.lock()?;
        let count: u32 = connection.query_row(&sql, [submitter.as_str()], |row| row.get(0))?;
        Ok(count)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SqliteFeedbackStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteFeedbackStoreError::PoisonedConnection)
    }
}

fn read_record(row: &Row<'_>) -> Result<FeedbackRecord, SqliteFeedbackStoreError> {
    let id: u64 = row.get(0)?;
    let raw_submitter: String = row.get(1)?;
    let latitude: f64 = row.get(2)?;
    let longitude: f64 = row.get(3)?;
    let raw_rating: i64 = row.get(4)?;
    let created_at: String = row.get(5)?;
    let raw_approval: String = row.get(6)?;
    let location_name: Option<String> = row.get(7)?;

    let submitter = SubmitterId::new(raw_submitter)
        .map_err(|source| SqliteFeedbackStoreError::InvalidSubmitter { id, source })?;
    let location = GeoPoint::new(latitude, longitude)
        .map_err(|source| SqliteFeedbackStoreError::InvalidLocation { id, source })?;
    let rating = Rating::from_i64(raw_rating)
        .map_err(|source| SqliteFeedbackStoreError::InvalidRating { id, source })?;
    let submitted_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| SqliteFeedbackStoreError::InvalidTimestamp {
            id,
            value: created_at.clone(),
            source,
        })?;
    let approval = raw_approval
        .parse::<ApprovalState>()
        .map_err(|source| SqliteFeedbackStoreError::InvalidApprovalState { id, source })?;

    Ok(FeedbackRecord {
        id,
        submitter,
        location,
        rating,
        submitted_at,
        approval,
        location_name: location_name.filter(|name| !name.trim().is_empty()),
    })
}

impl FeedbackStore for SqliteFeedbackStore {
    fn fetch_eligible_records(
        &self,
        near: GeoPoint,
        radius_m: f64,
    ) -> Result<Vec<FeedbackRecord>, StoreError> {
        self.records_near(near, radius_m).map_err(|err| {
            log::warn!("feedback radius query against {} failed: {err}", self.path.display());
            StoreError::from(err)
        })
    }

    fn all_eligible_records(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
        self.records().map_err(|err| {
            log::warn!("feedback scan of {} failed: {err}", self.path.display());
            StoreError::from(err)
        })
    }
}

impl TrustOracle for SqliteFeedbackStore {
    fn is_trusted(&self, submitter: &SubmitterId) -> Result<bool, StoreError> {
        Ok(self.approved_count(submitter)? >= self.trust_threshold)
    }
}
