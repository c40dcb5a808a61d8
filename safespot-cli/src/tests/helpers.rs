//! Test helpers for building feedback databases and running queries.

use super::*;
use camino::Utf8PathBuf;
use safespot_core::{
    FeedbackRecord, FixedClock,
    test_support::{reference_now, write_feedback_database},
};
use tempfile::TempDir;

/// A temporary directory holding at most one feedback database.
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn database_path(&self) -> Utf8PathBuf {
        self.root.join("feedback.db")
    }

    pub(super) fn write_database(&self, records: &[FeedbackRecord]) -> Utf8PathBuf {
        let path = self.database_path();
        write_feedback_database(path.as_std_path(), records).expect("write feedback database");
        path
    }
}

/// Validate and execute `query` at the reference instant, decoding the JSON
/// it writes.
pub(super) fn run_query(query: Query) -> Result<serde_json::Value, CliError> {
    query.settings().validate_sources()?;
    let mut output = Vec::new();
    execute(query, FixedClock(reference_now()), &mut output)?;
    Ok(serde_json::from_slice(&output).expect("command writes JSON"))
}
