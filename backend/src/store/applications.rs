use super::Database;
use crate::error::{ApiError, AppResult};
use crate::identifiers;
use common::model::application::ApplicationRecord;
use common::model::report::WardCount;
use common::model::response::ResponseRecord;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Params};

pub const DUPLICATE_CONSUMER: &str = "Consumer ID already exists";

/// Document paths that the ward reports can group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    /// `WardCommittee` of each application.
    Ward,
    /// `WardCommittee` of every entry of every `Response` array.
    ResponseWard,
}

impl GroupField {
    fn sql(self) -> &'static str {
        match self {
            GroupField::Ward => {
                "SELECT json_extract(document, '$.WardCommittee') AS ward, COUNT(*)
                 FROM applications
                 GROUP BY ward ORDER BY ward"
            }
            GroupField::ResponseWard => {
                "SELECT json_extract(r.value, '$.WardCommittee') AS ward, COUNT(*)
                 FROM applications AS a, json_each(a.document, '$.Response') AS r
                 GROUP BY ward ORDER BY ward"
            }
        }
    }
}

impl Database {
    pub fn consumer_exists(&self, consumer_id: &str) -> AppResult<bool> {
        let conn = self.lock()?;
        consumer_exists(&conn, consumer_id)
    }

    /// Persists a new application under a freshly generated `ApplicationID`.
    ///
    /// Fails with `DuplicateKey` when the `ConsumerID` is taken, whether that
    /// is seen by the pre-check or by the table's UNIQUE constraint.
    pub fn create_application(&self, mut record: ApplicationRecord) -> AppResult<ApplicationRecord> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        if consumer_exists(&tx, &record.consumer_id)? {
            return Err(ApiError::DuplicateKey(DUPLICATE_CONSUMER.to_string()));
        }
        record.application_id = identifiers::generate_unique(|id| application_id_exists(&tx, id))?;
        record.validate().map_err(ApiError::ValidationFailed)?;

        let document = serde_json::to_string(&record)?;
        tx.execute(
            "INSERT INTO applications (application_id, consumer_id, document) VALUES (?1, ?2, ?3)",
            params![record.application_id, record.consumer_id, document],
        )
        .map_err(map_write_error)?;
        tx.commit()?;
        Ok(record)
    }

    pub fn find_all(&self) -> AppResult<Vec<ApplicationRecord>> {
        let conn = self.lock()?;
        query_records(&conn, "SELECT document FROM applications ORDER BY rowid", [])
    }

    pub fn find_by_consumer_id(&self, consumer_id: &str) -> AppResult<Option<ApplicationRecord>> {
        let conn = self.lock()?;
        find_one(&conn, consumer_id)
    }

    /// Exact match on the stored `Date` string.
    pub fn find_by_date(&self, date: &str) -> AppResult<Vec<ApplicationRecord>> {
        let conn = self.lock()?;
        query_records(
            &conn,
            "SELECT document FROM applications
             WHERE json_extract(document, '$.Date') = ?1
             ORDER BY rowid",
            params![date],
        )
    }

    /// Records whose `Date` starts with `YYYY-MM`; the month is zero-padded.
    pub fn find_by_year_month(&self, year: u32, month: u32) -> AppResult<Vec<ApplicationRecord>> {
        let prefix = format!("{:04}-{:02}", year, month);
        let conn = self.lock()?;
        query_records(
            &conn,
            "SELECT document FROM applications
             WHERE substr(json_extract(document, '$.Date'), 1, 7) = ?1
             ORDER BY rowid",
            params![prefix],
        )
    }

    /// Deletes and returns the record. Its image files are left in place.
    pub fn delete_by_consumer_id(&self, consumer_id: &str) -> AppResult<Option<ApplicationRecord>> {
        let conn = self.lock()?;
        conn.query_row(
            "DELETE FROM applications WHERE consumer_id = ?1 RETURNING document",
            params![consumer_id],
            |row| row.get::<_, String>(0),
        )
        .optional()?
        .map(decode)
        .transpose()
    }

    /// `(WardCommittee, count)` pairs sorted ascending by ward.
    pub fn count_grouped_by(&self, field: GroupField) -> AppResult<Vec<WardCount>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(field.sql())?;
        let counts = stmt
            .query_map([], |row| {
                Ok(WardCount {
                    ward_committee: row.get::<_, Option<String>>(0)?,
                    count: row.get::<_, i64>(1)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(counts)
    }

    /// Replaces the stored document with `record` after validating it.
    ///
    /// The keys are immutable: `record` must carry the stored `ConsumerID`
    /// and `ApplicationID`.
    pub fn update_by_consumer_id(
        &self,
        consumer_id: &str,
        record: &ApplicationRecord,
    ) -> AppResult<Option<ApplicationRecord>> {
        if record.consumer_id != consumer_id {
            return Err(ApiError::ValidationFailed("ConsumerID cannot be changed".to_string()));
        }
        record.validate().map_err(ApiError::ValidationFailed)?;

        let conn = self.lock()?;
        let document = serde_json::to_string(record)?;
        let changed = conn
            .execute(
                "UPDATE applications SET document = ?2
                 WHERE consumer_id = ?1 AND application_id = ?3",
                params![consumer_id, document, record.application_id],
            )
            .map_err(map_write_error)?;
        if changed == 0 {
            return Ok(None);
        }
        Ok(Some(record.clone()))
    }

    /// Appends one entry to the record's `Response` array.
    pub fn push_response(
        &self,
        consumer_id: &str,
        response: ResponseRecord,
    ) -> AppResult<Option<ApplicationRecord>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let Some(mut record) = find_one(&tx, consumer_id)? else {
            return Ok(None);
        };
        record.responses.push(response);
        record.validate().map_err(ApiError::ValidationFailed)?;
        write_document(&tx, &record)?;
        tx.commit()?;
        Ok(Some(record))
    }

    /// Removes the entry with `_id == response_id`, returning the updated record
    /// and the removed entry. `None` when either the record or the entry is
    /// missing.
    pub fn pull_response(
        &self,
        consumer_id: &str,
        response_id: &str,
    ) -> AppResult<Option<(ApplicationRecord, ResponseRecord)>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let Some(mut record) = find_one(&tx, consumer_id)? else {
            return Ok(None);
        };
        let Some(position) = record.responses.iter().position(|r| r.id == response_id) else {
            return Ok(None);
        };
        let removed = record.responses.remove(position);
        write_document(&tx, &record)?;
        tx.commit()?;
        Ok(Some((record, removed)))
    }
}

fn consumer_exists(conn: &Connection, consumer_id: &str) -> AppResult<bool> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM applications WHERE consumer_id = ?1",
            params![consumer_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

fn application_id_exists(conn: &Connection, application_id: &str) -> AppResult<bool> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM applications WHERE application_id = ?1",
            params![application_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

fn find_one(conn: &Connection, consumer_id: &str) -> AppResult<Option<ApplicationRecord>> {
    conn.query_row(
        "SELECT document FROM applications WHERE consumer_id = ?1",
        params![consumer_id],
        |row| row.get::<_, String>(0),
    )
    .optional()?
    .map(decode)
    .transpose()
}

fn query_records<P: Params>(conn: &Connection, sql: &str, params: P) -> AppResult<Vec<ApplicationRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let documents = stmt
        .query_map(params, |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    documents.into_iter().map(decode).collect()
}

fn write_document(conn: &Connection, record: &ApplicationRecord) -> AppResult<()> {
    let document = serde_json::to_string(record)?;
    conn.execute(
        "UPDATE applications SET document = ?2 WHERE consumer_id = ?1",
        params![record.consumer_id, document],
    )?;
    Ok(())
}

fn decode(document: String) -> AppResult<ApplicationRecord> {
    Ok(serde_json::from_str(&document)?)
}

fn map_write_error(err: rusqlite::Error) -> ApiError {
    if let rusqlite::Error::SqliteFailure(failure, Some(message)) = &err {
        if failure.code == ErrorCode::ConstraintViolation
            && message.contains("applications.consumer_id")
        {
            return ApiError::DuplicateKey(DUPLICATE_CONSUMER.to_string());
        }
    }
    err.into()
}
