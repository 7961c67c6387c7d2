use std::fs;
use std::path::Path;

use log::{info, warn};
use uuid::Uuid;

use crate::audio::decoder;
use crate::audio::resample::{self, ResamplerKind};
use crate::db::models::Song;
use crate::db::store::FingerprintStore;
use crate::dsp::hashing::{self, HashRecord};
use crate::dsp::peaks;
use crate::dsp::spectrogram::{SAMPLE_RATE, Spectrogram};
use crate::error::{Error, Result};
use crate::matcher::{self, MatchResult};
use crate::song::{Downloader, MetadataSource, SongMetadata};

/// The shared DSP half of ingest and query: canonical rate, STFT, peaks,
/// hashes stamped with `song_id`.
pub fn fingerprint(
    samples: &[f32],
    sample_rate: u32,
    song_id: Uuid,
    resampler: ResamplerKind,
) -> Result<Vec<HashRecord>> {
    let samples = resample::resample(samples, sample_rate, SAMPLE_RATE, resampler)?;
    let frames = Spectrogram::new(&samples);
    let peaks = peaks::extract_peaks(frames);
    Ok(hashing::create_hashes(&peaks, song_id))
}

/// Fingerprints decoded samples and persists the song with its hashes in a
/// single transaction. All CPU work happens before the transaction opens.
pub fn ingest<S: FingerprintStore>(
    store: &mut S,
    metadata: &SongMetadata,
    source_id: &str,
    samples: &[f32],
    sample_rate: u32,
    resampler: ResamplerKind,
) -> Result<Song> {
    let song = Song {
        id: Uuid::now_v7(),
        title: metadata.title.clone(),
        artist: metadata.artist.clone(),
        duration: metadata.duration_ms,
        source_id: source_id.to_string(),
    };

    let hashes = fingerprint(samples, sample_rate, song.id, resampler)?;
    if hashes.is_empty() {
        return Err(Error::NoFingerprints);
    }
    info!("ingest: fingerprinted song_id={} hashes={}", song.id, hashes.len());

    store.save_song(&song, &hashes)?;
    info!("ingest: persisted song_id={}", song.id);
    Ok(song)
}

/// Identifies a recording against the store. Read-only; the query hashes
/// carry the nil song id.
pub fn recognize<S: FingerprintStore>(
    store: &mut S,
    samples: &[f32],
    sample_rate: u32,
    resampler: ResamplerKind,
) -> Result<Option<MatchResult>> {
    let hashes = fingerprint(samples, sample_rate, Uuid::nil(), resampler)?;
    matcher::identify(store, &hashes)
}

/// Full ingest of an externally sourced song: resolve metadata, download,
/// decode, fingerprint, persist, then delete the downloaded file. Failure at
/// any stage is terminal for the ingest; nothing partial is persisted.
pub fn add_song<M, D, S>(
    store: &mut S,
    metadata_source: &M,
    downloader: &D,
    link: &str,
    working_dir: &Path,
    resampler: ResamplerKind,
) -> Result<Song>
where
    M: MetadataSource,
    D: Downloader,
    S: FingerprintStore,
{
    let source_id = metadata_source.extract_source_id(link)?;
    let metadata = metadata_source.get_metadata(&source_id)?;
    info!(
        "ingest: received title=\"{}\" artist=\"{}\"",
        metadata.title, metadata.artist
    );

    let downloaded = downloader.download(&metadata, working_dir)?;
    let decoded = decoder::decode_file(&downloaded.path);

    let result = decoded.and_then(|audio| {
        info!(
            "ingest: decoded samples={} rate={}",
            audio.samples.len(),
            audio.sample_rate
        );
        ingest(
            store,
            &metadata,
            &downloaded.source_id,
            &audio.samples,
            audio.sample_rate,
            resampler,
        )
    });

    if let Err(err) = fs::remove_file(&downloaded.path) {
        warn!(
            "ingest: failed to remove {}: {err}",
            downloaded.path.display()
        );
    }

    let song = result?;
    info!("ingest: done song_id={}", song.id);
    Ok(song)
}
