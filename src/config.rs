use std::env;

use anyhow::{Context, bail};

use crate::audio::resample::ResamplerKind;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub resampler: ResamplerKind,
}

impl Config {
    /// Reads `.env` (if present) and the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let resampler = match env::var("RESAMPLER").as_deref() {
            Ok("software") | Err(_) => ResamplerKind::Software,
            Ok("ffmpeg") => ResamplerKind::Ffmpeg,
            Ok(other) => bail!("unknown RESAMPLER value: {other}"),
        };

        Ok(Self {
            database_url,
            resampler,
        })
    }
}
