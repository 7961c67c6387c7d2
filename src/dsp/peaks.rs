use ordered_float::OrderedFloat;

use super::spectrogram::{BIN_SIZE, Frame, bin_frequency};

/// Frequency bands partitioning per-frame peak extraction, in Hz.
/// Membership is `lo <= f < hi`; bins outside the union are ignored.
pub const BANDS: [(f64, f64); 4] = [
    (0.0, 300.0),
    (300.0, 2000.0),
    (2000.0, 5000.0),
    (5000.0, 5600.0),
];

const MAD_MULTIPLIER: f32 = 3.0;
const NOISE_FLOOR: f32 = 1.0;

/// A per-frame, per-band robust local maximum. Peaks are all that survives
/// the spectrogram stage.
#[derive(Debug, Clone, Copy)]
pub struct Peak {
    pub frequency: f64,
    pub magnitude: f32,
    pub time: f64,
    pub band: usize,
    pub bin: usize,
}

/// Extracts at most one peak per band from every frame, preserving frame
/// (chronological) order.
pub fn extract_peaks(frames: impl Iterator<Item = Frame>) -> Vec<Peak> {
    let mut peaks = Vec::new();
    for frame in frames {
        frame_peaks(&frame, &mut peaks);
    }
    peaks
}

fn frame_peaks(frame: &Frame, out: &mut Vec<Peak>) {
    let mags = &frame.magnitudes;

    for (band_idx, &(lo, hi)) in BANDS.iter().enumerate() {
        let start = (lo / BIN_SIZE).ceil() as usize;
        let end = ((hi / BIN_SIZE).ceil() as usize).min(mags.len());
        if start >= end {
            continue;
        }

        let threshold = robust_threshold(&mags[start..end]);

        let mut best: Option<(usize, f32)> = None;
        for k in start..end {
            let mag = mags[k];
            if mag <= threshold {
                continue;
            }
            // Strict local maximum against spectrum neighbours; ties disqualify.
            if k > 0 && mags[k - 1] >= mag {
                continue;
            }
            if k + 1 < mags.len() && mags[k + 1] >= mag {
                continue;
            }
            // Highest magnitude wins; equal magnitudes keep the lower bin.
            if best.is_none_or(|(_, best_mag)| mag > best_mag) {
                best = Some((k, mag));
            }
        }

        if let Some((k, mag)) = best {
            out.push(Peak {
                frequency: bin_frequency(k),
                magnitude: mag,
                time: frame.time_offset,
                band: band_idx,
                bin: k,
            });
        }
    }
}

/// `median + 3 * MAD`, clamped below at the noise floor.
fn robust_threshold(mags: &[f32]) -> f32 {
    let med = median(mags);
    let deviations: Vec<f32> = mags.iter().map(|&m| (m - med).abs()).collect();
    let mad = median(&deviations);
    (med + MAD_MULTIPLIER * mad).max(NOISE_FLOOR)
}

fn median(values: &[f32]) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by_key(|&v| OrderedFloat(v));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}
