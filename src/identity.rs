//! Locally persisted client identity.
//!
//! A device mints one opaque token on first use and rereads it on every
//! later run, so a reconnecting client can recognize the slot it already
//! holds. The token carries no authentication weight.

use crate::record::{ClientId, token};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Reads the client identity from `path`, minting and persisting a fresh
/// one if the file is missing or empty.
#[instrument]
pub fn get_or_create_client_id(path: &Path) -> io::Result<ClientId> {
    if let Ok(contents) = fs::read_to_string(path) {
        let existing = contents.trim();
        if !existing.is_empty() {
            debug!(client_id = existing, "Loaded existing client identity");
            return Ok(existing.to_string());
        }
    }

    let id = token(8);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, &id)?;
    info!(client_id = %id, "Minted new client identity");
    Ok(id)
}
