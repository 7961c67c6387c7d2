use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use hibiki::audio::{decoder, wav};
use hibiki::config::Config;
use hibiki::db::store::PgStore;
use hibiki::eval;
use hibiki::pipeline;
use hibiki::song::SongMetadata;

#[derive(Parser)]
#[command(name = "hibiki", about = "Landmark audio fingerprinting and recognition")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the songs and fingerprints tables
    Setup,
    /// Fingerprint an audio file and store it
    Ingest {
        file: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long)]
        artist: String,
        #[arg(long, default_value = "")]
        source_id: String,
    },
    /// Identify a WAV recording against the store
    Recognize { file: PathBuf },
    /// Recognition accuracy over random snippets of a song directory
    Eval {
        songs_dir: PathBuf,
        #[arg(long, default_value_t = 3)]
        snippets: u32,
        #[arg(long, default_value_t = 10)]
        seconds: u32,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let mut store = PgStore::connect(&config.database_url)?;

    match cli.command {
        Command::Setup => {
            store.setup()?;
            println!("schema created");
        }
        Command::Ingest {
            file,
            title,
            artist,
            source_id,
        } => {
            let decoded =
                decoder::decode_file(&file).with_context(|| format!("{}", file.display()))?;
            let duration_ms =
                (decoded.samples.len() as f64 / f64::from(decoded.sample_rate) * 1000.0) as i64;
            let metadata = SongMetadata {
                title,
                artist,
                duration_ms,
            };

            let song = pipeline::ingest(
                &mut store,
                &metadata,
                &source_id,
                &decoded.samples,
                decoded.sample_rate,
                config.resampler,
            )?;
            println!("ingested {} - {} as {}", song.artist, song.title, song.id);
        }
        Command::Recognize { file } => {
            let audio = wav::load_wav(&file)?;
            match pipeline::recognize(
                &mut store,
                &audio.samples,
                audio.sample_rate,
                config.resampler,
            )? {
                Some(result) => println!(
                    "found: {} - {} (score {}, offset {:.2}s)",
                    result.song.artist, result.song.title, result.score, result.time_offset
                ),
                None => println!("no match"),
            }
        }
        Command::Eval {
            songs_dir,
            snippets,
            seconds,
        } => {
            eval::run_snippet_eval(&mut store, &songs_dir, snippets, seconds, config.resampler)?;
        }
    }

    Ok(())
}
