//! Single-line transfer strings for sharing a save game through the clipboard.
//!
//! Format: `duel:v1:<rows>x<columns>:<payload>` where the payload is the
//! snapshot as JSON encoded with unpadded standard base64.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use tower_duel_core::MatchSnapshot;

use crate::PersistenceError;

const TRANSFER_DOMAIN: &str = "duel";
const TRANSFER_VERSION: &str = "v1";
const FIELD_DELIMITER: char = ':';

/// Encodes the snapshot into a transfer string.
pub fn encode(snapshot: &MatchSnapshot) -> Result<String, PersistenceError> {
    let json = serde_json::to_vec(snapshot)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    Ok(format!(
        "{TRANSFER_DOMAIN}{FIELD_DELIMITER}{TRANSFER_VERSION}{FIELD_DELIMITER}{}x{}{FIELD_DELIMITER}{encoded}",
        snapshot.rows, snapshot.columns
    ))
}

/// Decodes a snapshot from a transfer string.
///
/// The dimensions in the header must match the ones inside the payload.
pub fn decode(value: &str) -> Result<MatchSnapshot, PersistenceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PersistenceError::EmptyPayload);
    }

    let mut parts = trimmed.split(FIELD_DELIMITER);
    let domain = parts
        .next()
        .ok_or(PersistenceError::MissingSegment("prefix"))?;
    let version = parts
        .next()
        .ok_or(PersistenceError::MissingSegment("version"))?;
    let dimensions = parts
        .next()
        .ok_or(PersistenceError::MissingSegment("grid dimensions"))?;
    let payload = parts
        .next()
        .ok_or(PersistenceError::MissingSegment("payload"))?;

    if domain != TRANSFER_DOMAIN {
        return Err(PersistenceError::InvalidPrefix(domain.to_owned()));
    }
    if version != TRANSFER_VERSION {
        return Err(PersistenceError::UnsupportedVersion(version.to_owned()));
    }

    let (rows, columns) = parse_dimensions(dimensions)?;
    let bytes = STANDARD_NO_PAD.decode(payload.as_bytes())?;
    let snapshot: MatchSnapshot = serde_json::from_slice(&bytes)?;
    if snapshot.rows != rows || snapshot.columns != columns {
        return Err(PersistenceError::InvalidDimensions(dimensions.to_owned()));
    }
    Ok(snapshot)
}

fn parse_dimensions(value: &str) -> Result<(u32, u32), PersistenceError> {
    let invalid = || PersistenceError::InvalidDimensions(value.to_owned());
    let (rows, columns) = value.split_once('x').ok_or_else(invalid)?;
    let rows = rows.parse().map_err(|_| invalid())?;
    let columns = columns.parse().map_err(|_| invalid())?;
    Ok((rows, columns))
}
