use diesel::prelude::*;
use uuid::Uuid;

use crate::dsp::hashing::HashRecord;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::songs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Song {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    /// Duration in milliseconds.
    pub duration: i64,
    pub source_id: String,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::fingerprints)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FingerprintRow {
    pub hash: i64,
    pub song_id: Uuid,
    pub time_offset: f64,
}

impl From<&HashRecord> for FingerprintRow {
    fn from(record: &HashRecord) -> Self {
        Self {
            hash: i64::from(record.hash),
            song_id: record.song_id,
            time_offset: record.time_offset,
        }
    }
}
