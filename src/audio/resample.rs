use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::thread;

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::{Error, Result};

/// Which implementation converts audio to the canonical rate. The two are
/// not interchangeable mid-corpus: a deployment picks one and uses it for
/// both ingest and query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResamplerKind {
    /// In-process polyphase sinc resampler.
    Software,
    /// External ffmpeg child process speaking f32le PCM on stdin/stdout.
    Ffmpeg,
}

/// Converts mono samples from `from_rate` to `to_rate`. Equal rates return
/// the input unchanged; otherwise the output has `floor(n * to / from)`
/// samples band-limited at `to_rate / 2`.
pub fn resample(
    samples: &[f32],
    from_rate: u32,
    to_rate: u32,
    kind: ResamplerKind,
) -> Result<Vec<f32>> {
    if from_rate == to_rate {
        return Ok(samples.to_vec());
    }
    if samples.is_empty() {
        return Ok(Vec::new());
    }
    let converted = match kind {
        ResamplerKind::Software => resample_sinc(samples, from_rate, to_rate)?,
        ResamplerKind::Ffmpeg => resample_ffmpeg(samples, from_rate, to_rate)?,
    };
    Ok(fit_length(converted, samples.len(), from_rate, to_rate))
}

fn expected_len(input_len: usize, from_rate: u32, to_rate: u32) -> usize {
    (input_len as u64 * u64::from(to_rate) / u64::from(from_rate)) as usize
}

fn fit_length(mut samples: Vec<f32>, input_len: usize, from_rate: u32, to_rate: u32) -> Vec<f32> {
    let expected = expected_len(input_len, from_rate, to_rate);
    if samples.len() > expected {
        samples.truncate(expected);
    } else if samples.len() < expected {
        samples.resize(expected, 0.0);
    }
    samples
}

fn resample_sinc(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(
        f64::from(to_rate) / f64::from(from_rate),
        2.0,
        params,
        samples.len(),
        1,
    )
    .map_err(|e| Error::Resample(e.to_string()))?;

    let waves_in = vec![samples.to_vec()];
    let mut waves_out = resampler
        .process(&waves_in, None)
        .map_err(|e| Error::Resample(e.to_string()))?;

    Ok(waves_out.swap_remove(0))
}

fn resample_ffmpeg(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    let mut child = Command::new("ffmpeg")
        .args([
            "-v", "error",
            "-f", "f32le",
            "-ar", &from_rate.to_string(),
            "-ac", "1",
            "-i", "-",
            "-ar", &to_rate.to_string(),
            "-ac", "1",
            "-f", "f32le",
            "-",
        ])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| Error::Resample(format!("failed to spawn ffmpeg: {e}")))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| Error::Resample("ffmpeg stdin unavailable".to_string()))?;
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| Error::Resample("ffmpeg stdout unavailable".to_string()))?;

    let mut input = Vec::with_capacity(samples.len() * 4);
    for &sample in samples {
        input.extend_from_slice(&sample.to_le_bytes());
    }

    // Feed stdin from its own thread so a full stdout pipe cannot deadlock us.
    let writer = thread::spawn(move || {
        let result = stdin.write_all(&input);
        drop(stdin);
        result
    });

    let mut raw = Vec::new();
    stdout
        .read_to_end(&mut raw)
        .map_err(|e| Error::Resample(format!("reading ffmpeg output: {e}")))?;

    let status = child
        .wait()
        .map_err(|e| Error::Resample(format!("waiting for ffmpeg: {e}")))?;
    let write_result = writer
        .join()
        .map_err(|_| Error::Resample("ffmpeg writer thread panicked".to_string()))?;

    if !status.success() {
        return Err(Error::Resample(format!("ffmpeg exited with {status}")));
    }
    if let Err(e) = write_result {
        return Err(Error::Resample(format!("writing to ffmpeg: {e}")));
    }
    if raw.len() % 4 != 0 {
        return Err(Error::Resample(format!(
            "transcoder returned {} bytes, not a whole number of samples",
            raw.len()
        )));
    }

    Ok(raw
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, rate: u32, seconds: f32) -> Vec<f32> {
        let n = (rate as f32 * seconds) as usize;
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / rate as f32).sin())
            .collect()
    }

    #[test]
    fn equal_rates_return_input_unchanged() {
        let samples = sine(440.0, 11_200, 0.5);
        for kind in [ResamplerKind::Software, ResamplerKind::Ffmpeg] {
            let out = resample(&samples, 11_200, 11_200, kind).unwrap();
            assert_eq!(out, samples);
        }
    }

    #[test]
    fn empty_input_stays_empty() {
        let out = resample(&[], 44_100, 11_200, ResamplerKind::Software).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn downsampled_length_is_floor_of_the_ratio() {
        let samples = sine(1000.0, 44_100, 1.0);
        let out = resample(&samples, 44_100, 11_200, ResamplerKind::Software).unwrap();
        assert_eq!(out.len(), samples.len() * 11_200 / 44_100);
        assert!(out.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn downsampling_preserves_the_tone() {
        // A 1 kHz tone is far below the 5.6 kHz Nyquist of the target rate
        // and must survive with comparable energy.
        let samples = sine(1000.0, 44_100, 1.0);
        let out = resample(&samples, 44_100, 11_200, ResamplerKind::Software).unwrap();

        let mid = &out[out.len() / 4..out.len() * 3 / 4];
        let rms = (mid.iter().map(|s| s * s).sum::<f32>() / mid.len() as f32).sqrt();
        // RMS of a unit sine is ~0.707.
        assert!((rms - 0.707).abs() < 0.1, "rms {rms}");
    }
}
