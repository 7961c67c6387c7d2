use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, bail};
use rand::Rng;

use crate::audio::resample::ResamplerKind;
use crate::audio::wav;
use crate::db::store::FingerprintStore;
use crate::error::Error;
use crate::pipeline;

/// Cuts random snippets out of every file in `songs_dir` with ffmpeg and
/// reports how many are recognised as the right song. Songs are expected to
/// already be ingested with their file stem as the title.
pub fn run_snippet_eval<S: FingerprintStore>(
    store: &mut S,
    songs_dir: &Path,
    snippets_per_song: u32,
    snippet_secs: u32,
    resampler: ResamplerKind,
) -> anyhow::Result<()> {
    let snippet_path = env::temp_dir().join("hibiki_eval_snippet.wav");
    let mut total = 0u32;
    let mut correct = 0u32;

    println!("snippet eval: {snippets_per_song} snippets x {snippet_secs}s per song");

    let entries = fs::read_dir(songs_dir)
        .with_context(|| format!("reading songs directory {}", songs_dir.display()))?;

    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let true_title = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_string(),
            None => continue,
        };

        let duration = match probe_duration(&path) {
            Ok(secs) => secs,
            Err(err) => {
                println!("  skipping {}: {err}", path.display());
                continue;
            }
        };
        if duration < f64::from(snippet_secs + 5) {
            println!("  skipping {true_title}: too short");
            continue;
        }

        println!("--- {true_title} ---");
        let max_start = duration as u64 - u64::from(snippet_secs);

        for i in 0..snippets_per_song {
            total += 1;
            let start = rand::rng().random_range(0..=max_start);
            print!("  snippet #{} (at {start}s): ", i + 1);

            if let Err(err) = extract_snippet(&path, &snippet_path, start, snippet_secs) {
                println!("extraction failed: {err}");
                continue;
            }

            let audio = wav::load_wav(&snippet_path)?;
            match pipeline::recognize(store, &audio.samples, audio.sample_rate, resampler) {
                Ok(Some(result)) if result.song.title == true_title => {
                    println!("correct (score {})", result.score);
                    correct += 1;
                }
                Ok(Some(result)) => {
                    println!("wrong: matched \"{}\" (score {})", result.song.title, result.score);
                }
                Ok(None) => println!("no match"),
                Err(Error::NoFingerprints) => println!("no fingerprints in snippet"),
                Err(err) => return Err(err.into()),
            }
        }
    }

    let _ = fs::remove_file(&snippet_path);

    if total == 0 {
        bail!("no testable songs in {}", songs_dir.display());
    }
    println!(
        "eval finished: {correct}/{total} correct ({:.1}%)",
        correct as f64 / f64::from(total) * 100.0
    );
    Ok(())
}

fn probe_duration(path: &Path) -> anyhow::Result<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v", "error",
            "-show_entries", "format=duration",
            "-of", "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .context("running ffprobe")?;
    if !output.status.success() {
        bail!("ffprobe exited with {}", output.status);
    }
    String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse::<f64>()
        .context("parsing ffprobe duration")
}

fn extract_snippet(
    input: &Path,
    output: &Path,
    start_secs: u64,
    duration_secs: u32,
) -> anyhow::Result<()> {
    let status = Command::new("ffmpeg")
        .arg("-y")
        .args(["-ss", &start_secs.to_string()])
        .args(["-t", &duration_secs.to_string()])
        .arg("-i")
        .arg(input)
        .args(["-c:a", "pcm_s16le", "-ar", "11200", "-ac", "1"])
        .arg(output)
        .status()
        .context("running ffmpeg")?;
    if !status.success() {
        bail!("ffmpeg exited with {status}");
    }
    Ok(())
}
