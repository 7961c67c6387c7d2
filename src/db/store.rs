use diesel::connection::SimpleConnection;
use diesel::dsl::insert_into;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use log::debug;
use uuid::Uuid;

use crate::db::models::{FingerprintRow, Song};
use crate::dsp::hashing::HashRecord;
use crate::error::{Error, Result};

/// Maximum rows per INSERT statement.
const BATCH_SIZE: usize = 1000;

/// The persistent multimap `hash -> (song, anchor time)` plus song metadata.
/// The one long-lived piece of state in the system; the matcher only reads.
pub trait FingerprintStore {
    /// Inserts the song row and all of its hashes atomically. Either
    /// everything becomes visible or nothing does.
    fn save_song(&mut self, song: &Song, hashes: &[HashRecord]) -> Result<()>;

    /// Every stored record whose hash value occurs in `values`. Result order
    /// is backend-specific. Empty input returns empty without touching the
    /// backend.
    fn find_by_hash_values(&mut self, values: &[i64]) -> Result<Vec<FingerprintRow>>;

    fn find_song(&mut self, id: Uuid) -> Result<Option<Song>>;
}

/// PostgreSQL-backed store.
pub struct PgStore {
    conn: PgConnection,
}

impl PgStore {
    pub fn connect(database_url: &str) -> Result<Self> {
        let conn = PgConnection::establish(database_url)?;
        Ok(Self { conn })
    }

    /// Creates the songs and fingerprints tables.
    pub fn setup(&mut self) -> Result<()> {
        self.conn
            .batch_execute(include_str!(
                "../../migrations/2025-07-12-000000_create_fingerprint_index/up.sql"
            ))
            .map_err(Error::from)
    }
}

impl FingerprintStore for PgStore {
    fn save_song(&mut self, song: &Song, hashes: &[HashRecord]) -> Result<()> {
        use crate::schema::{fingerprints, songs};

        let rows: Vec<FingerprintRow> = hashes.iter().map(FingerprintRow::from).collect();

        self.conn.transaction::<_, diesel::result::Error, _>(|conn| {
            insert_into(songs::table).values(song).execute(conn)?;
            for batch in rows.chunks(BATCH_SIZE) {
                let inserted = insert_into(fingerprints::table)
                    .values(batch)
                    .execute(conn)?;
                debug!("inserted fingerprint batch: rows={inserted}");
            }
            Ok(())
        })?;
        Ok(())
    }

    fn find_by_hash_values(&mut self, values: &[i64]) -> Result<Vec<FingerprintRow>> {
        use crate::schema::fingerprints::dsl::{fingerprints, hash};

        if values.is_empty() {
            return Ok(Vec::new());
        }
        fingerprints
            .filter(hash.eq_any(values))
            .load::<FingerprintRow>(&mut self.conn)
            .map_err(Error::from)
    }

    fn find_song(&mut self, id: Uuid) -> Result<Option<Song>> {
        use crate::schema::songs::dsl::songs;

        songs
            .find(id)
            .first::<Song>(&mut self.conn)
            .optional()
            .map_err(Error::from)
    }
}
