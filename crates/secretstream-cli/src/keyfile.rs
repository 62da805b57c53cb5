//! Hex-encoded key files.
//!
//! A key file holds the [`KEY_SIZE`] key bytes as lowercase hex followed by a
//! newline. Surrounding whitespace is ignored when reading.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::Path,
};

use secretstream::{KEY_SIZE, Key};

use crate::error::CliError;

/// Parse a key from the contents of a key file.
pub fn parse(contents: &str) -> Result<Key, CliError> {
    let bytes = hex::decode(contents.trim())
        .map_err(|e| CliError::Key(format!("key file is not valid hex: {e}")))?;
    if bytes.len() != KEY_SIZE {
        return Err(CliError::Key(format!(
            "key file holds {} bytes (expected {KEY_SIZE})",
            bytes.len()
        )));
    }
    Key::from_bytes(&bytes).map_err(|e| CliError::Key(e.to_string()))
}

/// Render a key in key file format.
pub fn render(key: &Key) -> String {
    let mut out = hex::encode(key.as_bytes());
    out.push('\n');
    out
}

/// Load a key from `path`.
pub fn load(path: &Path) -> Result<Key, CliError> {
    let contents = fs::read_to_string(path)?;
    parse(&contents)
}

/// Write `key` to a new file at `path`.
///
/// Refuses to overwrite an existing file. On Unix the file is created
/// readable and writable by the owner only.
pub fn store(path: &Path, key: &Key) -> Result<(), CliError> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(render(key).as_bytes())?;
    file.sync_all()?;
    Ok(())
}
