use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| Error::InputAccess {
        path: path.to_path_buf(),
        source,
    })
}

/// Short hex SHA-256 of `bytes`, for log lines only.
pub fn short_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(&digest[..6])
}
