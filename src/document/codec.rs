//! Document codec: full-document read with validation, full-document write
//!
//! Read pipeline:
//! 1. Read bytes
//! 2. Parse JSON
//! 3. Check against `{nextId: number, items: [item]}`
//! 4. Revive (or deserialize) each item
//!
//! Atomic write pattern:
//! 1. Write to a uniquely named sibling temp file
//! 2. fsync temp file
//! 3. Rename temp over target

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

use super::errors::{DocumentError, DocumentResult};
use super::types::{document_descriptor, Revive, StorageDocument, WriteOptions};
use crate::descriptor::{check, Mismatch, TypeDescriptor};

/// Reads and validates the document at `path`.
///
/// Items are passed through `revive` when supplied, otherwise deserialized
/// directly into `T`.
pub async fn read<T: DeserializeOwned>(
    path: &Path,
    item_descriptor: &TypeDescriptor,
    revive: Option<&Revive<T>>,
) -> DocumentResult<StorageDocument<T>> {
    match revive {
        Some(revive) => read_with(path, item_descriptor, |item| Ok(revive(item))).await,
        None => read_with(path, item_descriptor, serde_json::from_value).await,
    }
}

/// Reads and validates the document at `path`, turning each conforming
/// item into `T` with `decode`.
pub async fn read_with<T, F>(
    path: &Path,
    item_descriptor: &TypeDescriptor,
    decode: F,
) -> DocumentResult<StorageDocument<T>>
where
    F: Fn(Value) -> serde_json::Result<T>,
{
    let bytes = fs::read(path)
        .await
        .map_err(|e| DocumentError::io(path, e))?;

    let raw: Value = serde_json::from_slice(&bytes).map_err(|source| DocumentError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let descriptor = document_descriptor(item_descriptor.clone());
    if let Some(mismatch) = check(Some(&raw), &descriptor)? {
        return Err(DocumentError::Conformance {
            path: path.to_path_buf(),
            value: raw,
            mismatch,
        });
    }

    // `number` admits floats and negatives; the counter must be a positive integer.
    if raw.get("nextId").and_then(Value::as_u64).filter(|id| *id >= 1).is_none() {
        let actual = raw.get("nextId").map(Value::to_string).unwrap_or_default();
        return Err(DocumentError::Conformance {
            path: path.to_path_buf(),
            value: raw,
            mismatch: Mismatch {
                path: "$.nextId".into(),
                expected: "positive integer".into(),
                actual,
            },
        });
    }

    let wire: StorageDocument<Value> =
        serde_json::from_value(raw).map_err(|source| DocumentError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    let items = wire
        .items
        .into_iter()
        .map(decode)
        .collect::<Result<Vec<T>, _>>()
        .map_err(|source| DocumentError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    debug!(target: "shelfdb::document", path = %path.display(), next_id = wire.next_id, "document read");

    Ok(StorageDocument::new(wire.next_id, items))
}

/// Serializes `document` and replaces the file at `path` with it.
///
/// Missing parent directories are created.
pub async fn write<T: Serialize>(
    path: &Path,
    document: &StorageDocument<T>,
    options: &WriteOptions,
) -> DocumentResult<()> {
    let bytes = encode(document, options.indent)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| DocumentError::io(parent, e))?;
    }

    if options.atomic {
        write_atomic(path, &bytes).await?;
    } else {
        fs::write(path, &bytes)
            .await
            .map_err(|e| DocumentError::io(path, e))?;
    }

    debug!(
        target: "shelfdb::document",
        path = %path.display(),
        bytes = bytes.len(),
        atomic = options.atomic,
        "document written"
    );
    Ok(())
}

/// Pretty-prints `document` with `indent` spaces per level and a trailing newline.
pub fn encode<T: Serialize>(document: &StorageDocument<T>, indent: usize) -> DocumentResult<Vec<u8>> {
    let indent = vec![b' '; indent];
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(&indent));
    document
        .serialize(&mut serializer)
        .map_err(DocumentError::Serialize)?;
    out.push(b'\n');
    Ok(out)
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> DocumentResult<()> {
    let temp = temp_path(path);

    let result: io::Result<()> = async {
        let mut file = fs::File::create(&temp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        fs::rename(&temp, path).await
    }
    .await;

    if let Err(e) = result {
        let _ = fs::remove_file(&temp).await;
        return Err(DocumentError::io(path, e));
    }

    // fsync the directory so the rename itself is durable
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Ok(dir) = fs::File::open(parent).await {
            let _ = dir.sync_all().await;
        }
    }

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    path.with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4()))
}
