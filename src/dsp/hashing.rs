use ordered_float::OrderedFloat;
use uuid::Uuid;

use super::peaks::Peak;
use super::spectrogram::BIN_SIZE;

/// Targets closer than this to their anchor are skipped.
pub const MIN_DELTA: f64 = 0.1;
/// Targets farther than this end the scan for the anchor.
pub const MAX_DELTA: f64 = 3.0;
/// Hashes emitted per anchor, at most.
pub const FAN_OUT: usize = 5;

const FREQ_MASK: u32 = 0x3FF;
const DELTA_MASK: u32 = 0x3FFF;

/// One persisted fingerprint unit: packed hash, owning song, anchor time.
/// The target's time is deliberately not stored.
#[derive(Debug, Clone, PartialEq)]
pub struct HashRecord {
    pub hash: u32,
    pub song_id: Uuid,
    pub time_offset: f64,
}

/// Pairs every peak (anchor) with up to `FAN_OUT` later peaks inside the
/// `[MIN_DELTA, MAX_DELTA]` window and emits one hash per pair.
pub fn create_hashes(peaks: &[Peak], song_id: Uuid) -> Vec<HashRecord> {
    let mut sorted = peaks.to_vec();
    sorted.sort_by_key(|p| (OrderedFloat(p.time), p.bin));

    let mut hashes = Vec::new();
    for (i, anchor) in sorted.iter().enumerate() {
        let mut emitted = 0;
        for target in &sorted[i + 1..] {
            let delta = target.time - anchor.time;
            if delta < MIN_DELTA {
                continue;
            }
            if delta > MAX_DELTA {
                break;
            }

            hashes.push(HashRecord {
                hash: pack(anchor.frequency, target.frequency, delta),
                song_id,
                time_offset: anchor.time,
            });

            emitted += 1;
            if emitted >= FAN_OUT {
                break;
            }
        }
    }
    hashes
}

/// Packs an anchor/target pair into 32 bits:
/// `[freq1: 10][freq2: 10][timeDelta: 14]`, 10 ms delta quantum.
/// Ingest and query must agree on this layout exactly.
pub fn pack(f1: f64, f2: f64, delta: f64) -> u32 {
    let b1 = (f1 / BIN_SIZE).floor() as u32 & FREQ_MASK;
    let b2 = (f2 / BIN_SIZE).floor() as u32 & FREQ_MASK;
    let d = (delta * 100.0).floor() as u32 & DELTA_MASK;
    b1 << 24 | b2 << 14 | d
}

/// Recovers `(freq1Bin, freq2Bin, deltaBin)` from a packed hash.
pub fn unpack(hash: u32) -> (u32, u32, u32) {
    (hash >> 24, (hash >> 14) & FREQ_MASK, hash & DELTA_MASK)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak(time: f64, frequency: f64) -> Peak {
        Peak {
            frequency,
            magnitude: 1.0,
            time,
            band: 0,
            bin: (frequency / BIN_SIZE) as usize,
        }
    }

    #[test]
    fn pack_unpack_round_trip() {
        let hash = pack(1000.0, 1200.0, 0.5);
        let (b1, b2, d) = unpack(hash);
        assert_eq!(b1, 182);
        assert_eq!(b2, 219);
        assert_eq!(d, 50);
        assert_eq!(hash, (182 << 24) | (219 << 14) | 50);
    }

    #[test]
    fn top_six_bits_are_zero() {
        for &(f1, f2, dt) in &[
            (0.0, 0.0, 0.1),
            (5595.0, 5595.0, 3.0),
            (300.0, 4800.0, 1.234),
        ] {
            assert_eq!(pack(f1, f2, dt) >> 30, 0);
        }
    }

    #[test]
    fn target_zone_boundaries() {
        let peaks = vec![
            peak(0.0, 1000.0),
            peak(0.05, 1000.0),
            peak(1.0, 1200.0),
            peak(1.5, 1300.0),
            peak(3.0, 1400.0),
        ];

        let hashes = create_hashes(&peaks, Uuid::nil());

        let anchors_at = |t: f64| hashes.iter().filter(|h| h.time_offset == t).count();
        assert_eq!(anchors_at(0.0), 3); // 1.0, 1.5, 3.0 (delta 3.0 inclusive)
        assert_eq!(anchors_at(0.05), 3); // 1.0, 1.5, 3.0 (0.05 away is below MIN_DELTA)
        assert_eq!(anchors_at(1.0), 2); // 1.5, 3.0
        assert_eq!(anchors_at(1.5), 1); // 3.0
        assert_eq!(anchors_at(3.0), 0); // nothing later
        assert_eq!(hashes.len(), 9);
    }

    #[test]
    fn fan_out_caps_hashes_per_anchor() {
        let mut peaks = vec![peak(0.0, 500.0)];
        for i in 0..10 {
            peaks.push(peak(0.2 + i as f64 * 0.1, 600.0 + i as f64 * 50.0));
        }

        let hashes = create_hashes(&peaks, Uuid::nil());
        let from_first = hashes.iter().filter(|h| h.time_offset == 0.0).count();
        assert_eq!(from_first, FAN_OUT);
    }

    #[test]
    fn deltas_stay_inside_the_window() {
        let peaks: Vec<Peak> = (0..40)
            .map(|i| peak(i as f64 * 0.25, 400.0 + (i % 9) as f64 * 120.0))
            .collect();

        let hashes = create_hashes(&peaks, Uuid::nil());
        assert!(!hashes.is_empty());
        for h in &hashes {
            let (_, _, d) = unpack(h.hash);
            // 10 ms quanta of a delta in [0.1, 3.0].
            assert!((10..=300).contains(&d), "delta bin {d} out of range");
        }
    }

    #[test]
    fn hashing_is_deterministic() {
        let peaks: Vec<Peak> = (0..60)
            .map(|i| peak(i as f64 * 0.17, 300.0 + (i % 13) as f64 * 90.0))
            .collect();

        let song = Uuid::now_v7();
        let first = create_hashes(&peaks, song);
        let second = create_hashes(&peaks, song);
        assert_eq!(first, second);
    }

    #[test]
    fn stamps_the_given_song_id() {
        let song = Uuid::now_v7();
        let hashes = create_hashes(&[peak(0.0, 700.0), peak(0.5, 900.0)], song);
        assert_eq!(hashes.len(), 1);
        assert_eq!(hashes[0].song_id, song);
        assert_eq!(hashes[0].time_offset, 0.0);
    }
}
