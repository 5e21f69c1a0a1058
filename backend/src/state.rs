//! State shared by every request handler.
//!
//! `AppState` is built once in `main.rs` and handed to actix as `web::Data`,
//! so handlers reach the document store, the image store and the clock
//! through one extractor.

use crate::images::ImageStore;
use crate::store::Database;
use chrono::{DateTime, FixedOffset, Utc};

pub struct AppState {
    pub db: Database,
    pub images: ImageStore,
    pub clock: RecordClock,
}

/// `Date` and `Time` strings written onto new records and survey entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:mm:ss`
    pub time: String,
}

/// Wall clock in the fixed zone records are stamped in.
#[derive(Debug, Clone, Copy)]
pub struct RecordClock {
    offset: FixedOffset,
    pinned: Option<DateTime<Utc>>,
}

impl RecordClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            offset,
            pinned: None,
        }
    }

    /// A clock that always reads `at`.
    #[cfg(test)]
    pub fn pinned(offset: FixedOffset, at: DateTime<Utc>) -> Self {
        Self {
            offset,
            pinned: Some(at),
        }
    }

    fn now(&self) -> DateTime<FixedOffset> {
        self.pinned
            .unwrap_or_else(Utc::now)
            .with_timezone(&self.offset)
    }

    pub fn stamp(&self) -> Stamp {
        let now = self.now();
        Stamp {
            date: now.format("%Y-%m-%d").to_string(),
            time: now.format("%H:%M:%S").to_string(),
        }
    }

    pub fn today(&self) -> String {
        self.now().format("%Y-%m-%d").to_string()
    }
}
