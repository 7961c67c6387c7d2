use std::path::Path;

use hound::{SampleFormat, WavReader};

use crate::error::{Error, Result};

pub struct WavAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Loads a mono integer-PCM WAV file and normalises samples to [-1, 1] by
/// `2^(bits-1)`. Multi-channel input and non-integer formats are rejected.
pub fn load_wav(path: &Path) -> Result<WavAudio> {
    let mut reader =
        WavReader::open(path).map_err(|e| Error::Decode(format!("{}: {e}", path.display())))?;
    let spec = reader.spec();

    if spec.channels != 1 {
        return Err(Error::UnsupportedFormat(format!(
            "expected mono audio, got {} channels",
            spec.channels
        )));
    }
    if spec.sample_format != SampleFormat::Int {
        return Err(Error::UnsupportedFormat(
            "expected integer PCM samples".to_string(),
        ));
    }
    let scale = match spec.bits_per_sample {
        8 | 16 | 24 | 32 => (1i64 << (spec.bits_per_sample - 1)) as f32,
        bits => {
            return Err(Error::UnsupportedFormat(format!(
                "unsupported bit depth: {bits}"
            )));
        }
    };

    let samples = reader
        .samples::<i32>()
        .map(|s| s.map(|v| v as f32 / scale))
        .collect::<std::result::Result<Vec<f32>, _>>()
        .map_err(|e| Error::Decode(e.to_string()))?;

    Ok(WavAudio {
        samples,
        sample_rate: spec.sample_rate,
    })
}
