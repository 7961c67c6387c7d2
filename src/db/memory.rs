use std::collections::HashMap;

use uuid::Uuid;

use crate::db::models::{FingerprintRow, Song};
use crate::db::store::FingerprintStore;
use crate::dsp::hashing::HashRecord;
use crate::error::Result;

/// Ephemeral store. Lookups come back in insertion order, which makes the
/// matcher's first-to-reach tie policy observable in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    songs: HashMap<Uuid, Song>,
    records: Vec<FingerprintRow>,
    by_hash: HashMap<i64, Vec<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn song_count(&self) -> usize {
        self.songs.len()
    }
}

impl FingerprintStore for MemoryStore {
    fn save_song(&mut self, song: &Song, hashes: &[HashRecord]) -> Result<()> {
        self.songs.insert(song.id, song.clone());
        for record in hashes {
            let row = FingerprintRow::from(record);
            self.by_hash
                .entry(row.hash)
                .or_default()
                .push(self.records.len());
            self.records.push(row);
        }
        Ok(())
    }

    fn find_by_hash_values(&mut self, values: &[i64]) -> Result<Vec<FingerprintRow>> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let mut indices: Vec<usize> = values
            .iter()
            .filter_map(|value| self.by_hash.get(value))
            .flatten()
            .copied()
            .collect();
        indices.sort_unstable();
        indices.dedup();
        Ok(indices.into_iter().map(|i| self.records[i].clone()).collect())
    }

    fn find_song(&mut self, id: Uuid) -> Result<Option<Song>> {
        Ok(self.songs.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(title: &str) -> Song {
        Song {
            id: Uuid::now_v7(),
            title: title.to_string(),
            artist: "artist".to_string(),
            duration: 1000,
            source_id: String::new(),
        }
    }

    fn record(hash: u32, song_id: Uuid, time_offset: f64) -> HashRecord {
        HashRecord {
            hash,
            song_id,
            time_offset,
        }
    }

    #[test]
    fn lookup_preserves_insertion_order() {
        let mut store = MemoryStore::new();
        let first = song("first");
        let second = song("second");

        store
            .save_song(&first, &[record(7, first.id, 0.0), record(9, first.id, 1.0)])
            .unwrap();
        store
            .save_song(&second, &[record(7, second.id, 2.0)])
            .unwrap();

        let rows = store.find_by_hash_values(&[9, 7]).unwrap();
        let owners: Vec<Uuid> = rows.iter().map(|r| r.song_id).collect();
        assert_eq!(owners, vec![first.id, first.id, second.id]);
    }

    #[test]
    fn empty_input_returns_empty() {
        let mut store = MemoryStore::new();
        assert!(store.find_by_hash_values(&[]).unwrap().is_empty());
    }

    #[test]
    fn duplicate_query_values_do_not_duplicate_rows() {
        let mut store = MemoryStore::new();
        let owner = song("only");
        store
            .save_song(&owner, &[record(5, owner.id, 0.5)])
            .unwrap();

        let rows = store.find_by_hash_values(&[5, 5]).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn find_song_returns_saved_metadata() {
        let mut store = MemoryStore::new();
        let saved = song("lookup");
        store.save_song(&saved, &[]).unwrap();

        assert_eq!(store.find_song(saved.id).unwrap(), Some(saved));
        assert_eq!(store.find_song(Uuid::nil()).unwrap(), None);
    }
}
