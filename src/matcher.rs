use std::collections::HashMap;

use log::{debug, info};
use uuid::Uuid;

use crate::db::models::{FingerprintRow, Song};
use crate::db::store::FingerprintStore;
use crate::dsp::hashing::HashRecord;
use crate::error::{Error, Result};

/// Voting resolution: 20 bins per second, 50 ms each. Absorbs the
/// quantisation gap between hop-aligned ingest anchors and arbitrary query
/// anchors.
const BINS_PER_SECOND: f64 = 20.0;
const MIN_SCORE: usize = 5;
const SCORE_RATIO: f64 = 0.015;

#[derive(Debug, Clone)]
pub struct MatchResult {
    pub song: Song,
    /// Estimated position of the query within the song, in seconds.
    pub time_offset: f64,
    /// Votes in the winning (song, time-delta) cell.
    pub score: usize,
}

/// Minimum winning score for a query of `query_len` hashes.
pub fn match_threshold(query_len: usize) -> usize {
    MIN_SCORE.max((query_len as f64 * SCORE_RATIO).floor() as usize)
}

/// Scores candidate songs by time-aligned votes: a true match concentrates
/// `db_time - query_time` into one 50 ms bin, a false one spreads it out.
///
/// When two cells reach the same count, the first to reach it wins, so the
/// store's record order is the tie-break. Returns `Ok(None)` when nothing
/// clears the adaptive threshold.
pub fn identify<S: FingerprintStore>(
    store: &mut S,
    query_hashes: &[HashRecord],
) -> Result<Option<MatchResult>> {
    if query_hashes.is_empty() {
        return Err(Error::NoFingerprints);
    }

    // A hash value may occur at several query anchors.
    let mut query_index: HashMap<i64, Vec<f64>> = HashMap::new();
    for record in query_hashes {
        query_index
            .entry(i64::from(record.hash))
            .or_default()
            .push(record.time_offset);
    }

    let values: Vec<i64> = query_index.keys().copied().collect();
    let db_hashes = fetch_with_retry(store, &values)?;
    if db_hashes.is_empty() {
        return Ok(None);
    }

    let mut votes: HashMap<Uuid, HashMap<i64, usize>> = HashMap::new();
    let mut best_score = 0usize;
    let mut best_song = Uuid::nil();
    let mut best_time_offset = 0.0f64;

    for row in &db_hashes {
        let Some(query_times) = query_index.get(&row.hash) else {
            continue;
        };
        for &query_time in query_times {
            let delta = row.time_offset - query_time;
            let bin = (delta * BINS_PER_SECOND).round() as i64;

            let count = votes
                .entry(row.song_id)
                .or_default()
                .entry(bin)
                .or_insert(0);
            *count += 1;

            if *count > best_score {
                best_score = *count;
                best_song = row.song_id;
                best_time_offset = delta;
            }
        }
    }

    let threshold = match_threshold(query_hashes.len());
    info!(
        "recognition: best_score={best_score} candidates={} threshold={threshold}",
        votes.len()
    );
    if best_score < threshold {
        return Ok(None);
    }

    let song = store
        .find_song(best_song)?
        .ok_or(Error::SongNotFound(best_song))?;

    Ok(Some(MatchResult {
        song,
        time_offset: best_time_offset,
        score: best_score,
    }))
}

/// A transient store failure on this read path is retried once.
fn fetch_with_retry<S: FingerprintStore>(
    store: &mut S,
    values: &[i64],
) -> Result<Vec<FingerprintRow>> {
    match store.find_by_hash_values(values) {
        Ok(rows) => Ok(rows),
        Err(Error::Store(first)) => {
            debug!("retrying hash lookup after store error: {first}");
            store.find_by_hash_values(values)
        }
        Err(err) => Err(err),
    }
}
