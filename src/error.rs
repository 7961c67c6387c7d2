use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds crossing component boundaries. Every variant maps to one of
/// the failure classes the pipeline distinguishes; "no match" is not an error
/// and is represented as `Ok(None)` by the matcher.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to decode audio: {0}")]
    Decode(String),

    #[error("resampling failed: {0}")]
    Resample(String),

    #[error("no fingerprints generated from audio")]
    NoFingerprints,

    #[error("fingerprint store failure: {0}")]
    Store(String),

    #[error("invalid source link: {0}")]
    InvalidLink(String),

    #[error("metadata lookup failed: {0}")]
    Metadata(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error("matched song {0} is missing from the store")]
    SongNotFound(Uuid),
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        Error::Store(err.to_string())
    }
}

impl From<diesel::ConnectionError> for Error {
    fn from(err: diesel::ConnectionError) -> Self {
        Error::Store(err.to_string())
    }
}
