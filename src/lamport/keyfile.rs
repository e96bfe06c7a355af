//! Hex key and signature files
//!
//! Files hold the single-line hex encodings of [`PublicKey`], [`SecretKey`]
//! and [`Signature`]. Writes go through a temp file, `fsync` and rename so a
//! crash leaves either the old file or the complete new one, never a torn
//! key.

use crate::lamport::{keygen::*, sign::Signature, LamportError, Result};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

/// Atomically replace `path` with `contents`
///
/// 1. Write to `<path>.tmp`
/// 2. `sync_all()` the temp file
/// 3. `rename()` over the destination
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let temp_path = path.with_extension("tmp");

    let mut file = fs::File::create(&temp_path)
        .map_err(|e| LamportError::Io(format!("Failed to create temp: {}", e)))?;

    file.write_all(contents.as_bytes())
        .map_err(|e| LamportError::Io(format!("Failed to write: {}", e)))?;
    file.write_all(b"\n")
        .map_err(|e| LamportError::Io(format!("Failed to write: {}", e)))?;

    file.sync_all()
        .map_err(|e| LamportError::Io(format!("Failed to fsync: {}", e)))?;

    drop(file);

    fs::rename(&temp_path, path)
        .map_err(|e| LamportError::Io(format!("Failed to rename: {}", e)))?;

    Ok(())
}

/// Read a whole file into one buffer sized up front and trim it in place
///
/// The returned `String` is the only heap copy of the contents, so zeroizing
/// it wipes the file text.
fn read_trimmed(path: &Path) -> Result<String> {
    let read_err = |e: std::io::Error| LamportError::Io(format!("Failed to read {}: {}", path.display(), e));

    let mut file = fs::File::open(path).map_err(read_err)?;
    let len = file.metadata().map(|m| m.len() as usize).unwrap_or(0);
    let mut text = String::with_capacity(len + 1);
    file.read_to_string(&mut text).map_err(read_err)?;

    trim_in_place(&mut text);
    Ok(text)
}

fn trim_in_place(text: &mut String) {
    let end = text.trim_end().len();
    text.truncate(end);
    let start = text.len() - text.trim_start().len();
    text.drain(..start);
}

pub fn write_public_key(path: &Path, public_key: &PublicKey) -> Result<()> {
    write_atomic(path, &public_key.to_hex())
}

pub fn read_public_key(path: &Path) -> Result<PublicKey> {
    PublicKey::from_hex(&read_trimmed(path)?)
}

pub fn write_secret_key(path: &Path, secret_key: &SecretKey) -> Result<()> {
    let mut hex = secret_key.to_hex();
    let result = write_atomic(path, &hex);
    zeroize::Zeroize::zeroize(&mut hex);
    result
}

pub fn read_secret_key(path: &Path) -> Result<SecretKey> {
    let mut hex = read_trimmed(path)?;
    let result = SecretKey::from_hex(&hex);
    zeroize::Zeroize::zeroize(&mut hex);
    result
}

pub fn write_signature(path: &Path, signature: &Signature) -> Result<()> {
    write_atomic(path, &signature.to_hex())
}

pub fn read_signature(path: &Path) -> Result<Signature> {
    Signature::from_hex(&read_trimmed(path)?)
}
