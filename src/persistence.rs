//! File helpers shared by [`Network`](crate::Network) and
//! [`AutoEncoder`](crate::AutoEncoder): plain JSON and `.pere` (gzipped JSON).
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

fn create(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    File::create(path).with_context(|| format!("failed to create {}", path.display()))
}

/// Writes `value` as JSON, creating parent directories as needed.
pub fn save_json<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(create(path)?);
    serde_json::to_writer(&mut writer, value)
        .with_context(|| format!("failed to serialize {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse {}", path.display()))
}

/// Writes `value` as gzipped JSON.
pub fn save_pere<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_vec(value)?;
    let mut encoder = GzEncoder::new(create(path)?, Compression::default());
    encoder.write_all(&json)?;
    encoder.finish()?;
    Ok(())
}

pub fn load_pere<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut decoder = GzDecoder::new(file);
    let mut buf = Vec::new();
    decoder
        .read_to_end(&mut buf)
        .with_context(|| format!("failed to decompress {}", path.display()))?;
    serde_json::from_slice(&buf).with_context(|| format!("failed to parse {}", path.display()))
}
