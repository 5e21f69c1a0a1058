//! Fixtures shared by the handler and service tests.

use crate::images::ImageStore;
use crate::state::{AppState, RecordClock};
use crate::store::Database;
use chrono::{FixedOffset, TimeZone, Utc};
use tempfile::TempDir;

/// 1x1 transparent PNG.
pub const PIXEL: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

/// Fresh in-memory store, temporary uploads directory, clock pinned to
/// 2024-03-15 10:00:00 in Asia/Kolkata. Keep the `TempDir` alive for the
/// duration of the test.
pub fn state() -> (TempDir, AppState) {
    let tmp = TempDir::new().unwrap();
    let offset = FixedOffset::east_opt(330 * 60).unwrap();
    let at = Utc.with_ymd_and_hms(2024, 3, 15, 4, 30, 0).unwrap();
    let state = AppState {
        db: Database::open_in_memory().unwrap(),
        images: ImageStore::new(tmp.path().join("uploads")).unwrap(),
        clock: RecordClock::pinned(offset, at),
    };
    (tmp, state)
}

pub fn uploaded(state: &AppState, name: &str) -> bool {
    state.images.dir().join(name).exists()
}
