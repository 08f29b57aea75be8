#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Storage adapters for Tower Duel save games.
//!
//! Snapshots are stored as JSON files through [`FilePersistence`] or packed
//! into a single-line transfer string with [`transfer::encode`]. Structural
//! validation is left to the world's `load`; this crate only moves bytes.

use std::{fs, io, path::Path};

use thiserror::Error;
use tower_duel_core::MatchSnapshot;

pub mod transfer;

/// Failure to store or retrieve a snapshot.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Reading or writing the backing file failed.
    #[error("save file i/o failed: {0}")]
    Io(#[from] io::Error),
    /// The snapshot could not be converted to or from JSON.
    #[error("save data is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    /// The transfer string was empty or contained only whitespace.
    #[error("transfer string is empty")]
    EmptyPayload,
    /// The transfer string lacks one of its segments.
    #[error("transfer string is missing the {0}")]
    MissingSegment(&'static str),
    /// The transfer string used an unexpected prefix.
    #[error("transfer prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The transfer string used an unsupported version.
    #[error("transfer version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed or disagree with the payload.
    #[error("could not use grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode transfer payload: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
}

/// Store able to persist a single save slot.
pub trait Persistence {
    /// Writes `snapshot` to `path`, replacing any previous contents.
    fn save(&self, path: &Path, snapshot: &MatchSnapshot) -> Result<(), PersistenceError>;

    /// Reads the snapshot stored at `path`.
    fn load(&self, path: &Path) -> Result<MatchSnapshot, PersistenceError>;
}

/// JSON file store.
#[derive(Clone, Copy, Debug, Default)]
pub struct FilePersistence {
    pretty: bool,
}

impl FilePersistence {
    /// Creates a store writing compact JSON.
    #[must_use]
    pub const fn new() -> Self {
        Self { pretty: false }
    }

    /// Creates a store writing indented, human-editable JSON.
    #[must_use]
    pub const fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Persistence for FilePersistence {
    fn save(&self, path: &Path, snapshot: &MatchSnapshot) -> Result<(), PersistenceError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(snapshot)?
        } else {
            serde_json::to_vec(snapshot)?
        };
        fs::write(path, bytes)?;
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<MatchSnapshot, PersistenceError> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
