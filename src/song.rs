use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct SongMetadata {
    pub title: String,
    pub artist: String,
    pub duration_ms: i64,
}

#[derive(Debug, Clone)]
pub struct DownloadedSong {
    pub filename: String,
    pub path: PathBuf,
    pub source_id: String,
}

/// Resolves song metadata for a source reference. Implementations must be
/// idempotent; a streaming catalogue, a tag database and manual input all
/// qualify.
pub trait MetadataSource {
    fn get_metadata(&self, source_id: &str) -> Result<SongMetadata>;

    /// Extracts the stable source id out of a user-supplied link.
    fn extract_source_id(&self, link: &str) -> Result<String>;
}

/// Fetches a decodable audio file for the given metadata. The ingest
/// pipeline deletes the file once it has been fingerprinted.
pub trait Downloader {
    fn download(&self, metadata: &SongMetadata, working_dir: &Path) -> Result<DownloadedSong>;
}

/// Metadata supplied directly by the operator, bypassing any catalogue.
#[derive(Debug, Clone)]
pub struct ManualMetadata {
    pub metadata: SongMetadata,
}

impl MetadataSource for ManualMetadata {
    fn get_metadata(&self, _source_id: &str) -> Result<SongMetadata> {
        Ok(self.metadata.clone())
    }

    fn extract_source_id(&self, link: &str) -> Result<String> {
        let trimmed = link.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidLink(link.to_string()));
        }
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_source_echoes_its_metadata() {
        let source = ManualMetadata {
            metadata: SongMetadata {
                title: "Test Song".to_string(),
                artist: "Test Artist".to_string(),
                duration_ms: 180_000,
            },
        };

        let id = source.extract_source_id("  local:track-1  ").unwrap();
        assert_eq!(id, "local:track-1");
        assert_eq!(source.get_metadata(&id).unwrap().title, "Test Song");
    }

    #[test]
    fn blank_link_is_invalid() {
        let source = ManualMetadata {
            metadata: SongMetadata {
                title: String::new(),
                artist: String::new(),
                duration_ms: 0,
            },
        };
        assert!(matches!(
            source.extract_source_id("   "),
            Err(Error::InvalidLink(_))
        ));
    }
}
