//! Binary snapshot storage for the in-memory store.
//!
//! File format: vectors.bin
//!
//! Header (49 bytes):
//! - version: u8 (1)
//! - index_id: [u8; 32] (SHA256 hash of index name)
//! - dimensions: u32 (little-endian)
//! - entry_count: u64 (little-endian)
//! - checksum: u32 (CRC32 of header fields before checksum)
//!
//! Entries (repeated):
//! - id: u16 length + UTF-8 bytes
//! - content: u32 length + UTF-8 bytes
//! - metadata: u32 length + JSON bytes
//! - embedding: [f32; dimensions] (little-endian)

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::model::{Document, Metadata};

/// Current file format version
const FORMAT_VERSION: u8 = 1;

/// Header size in bytes: version(1) + index_id(32) + dimensions(4) + entry_count(8) + checksum(4)
const HEADER_SIZE: usize = 49;

/// Length prefixes of one entry: id(2) + content(4) + metadata(4)
const MIN_ENTRY_OVERHEAD: usize = 10;

/// Errors that can occur during snapshot operations.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("Metadata encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: file version {0}, supported version {1}")]
    VersionMismatch(u8, u8),

    #[error("Index mismatch: file belongs to a different index")]
    IndexMismatch,

    #[error("Checksum mismatch: file may be corrupted")]
    ChecksumMismatch,

    #[error("Dimension mismatch: expected {expected}, file has {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Snapshot file manager.
#[derive(Debug, Clone)]
pub struct SnapshotStorage {
    path: PathBuf,
}

impl SnapshotStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// SHA256 of the index name, used to tie a file to its index.
    pub fn index_id(index_name: &str) -> [u8; 32] {
        Sha256::digest(index_name.as_bytes()).into()
    }

    /// Load all documents, checking the file belongs to `index_name` and
    /// holds vectors of `expected_dimensions`.
    pub fn load(
        &self,
        index_name: &str,
        expected_dimensions: usize,
    ) -> Result<Vec<Document>, SnapshotError> {
        let file = File::open(&self.path)?;
        let body_len = file.metadata()?.len().saturating_sub(HEADER_SIZE as u64);
        let mut reader = BufReader::new(file);

        let header = read_header(&mut reader)?;
        validate_header(&header, &Self::index_id(index_name), expected_dimensions)?;

        let dimensions = header.dimensions as usize;
        let min_entry_len = (MIN_ENTRY_OVERHEAD + dimensions * 4) as u64;
        if header.entry_count.saturating_mul(min_entry_len) > body_len {
            return Err(SnapshotError::InvalidFormat(format!(
                "{} entries do not fit in {} bytes",
                header.entry_count, body_len
            )));
        }

        let max_field_len = usize::try_from(body_len).unwrap_or(usize::MAX);
        (0..header.entry_count)
            .map(|_| read_entry(&mut reader, dimensions, max_field_len))
            .collect()
    }

    /// Save documents to the snapshot file.
    ///
    /// Uses atomic write: temp file -> fsync -> rename
    pub fn save(
        &self,
        index_name: &str,
        dimensions: usize,
        documents: &[Document],
    ) -> Result<(), SnapshotError> {
        let dims = u32::try_from(dimensions).map_err(|_| {
            SnapshotError::InvalidFormat(format!("dimensions {} do not fit in u32", dimensions))
        })?;

        let temp_path = self.path.with_extension("tmp");

        let result = self.write_to_file(&temp_path, index_name, dims, documents);
        if result.is_err() {
            let _ = std::fs::remove_file(&temp_path);
            return result;
        }

        std::fs::rename(&temp_path, &self.path)?;

        Ok(())
    }

    /// Delete the snapshot file if it exists.
    pub fn delete(&self) -> Result<(), SnapshotError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    fn write_to_file(
        &self,
        path: &Path,
        index_name: &str,
        dimensions: u32,
        documents: &[Document],
    ) -> Result<(), SnapshotError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        let header = Header {
            version: FORMAT_VERSION,
            index_id: Self::index_id(index_name),
            dimensions,
            entry_count: documents.len() as u64,
        };
        write_header(&mut writer, &header)?;

        for doc in documents {
            if doc.embedding.len() != dimensions as usize {
                return Err(SnapshotError::DimensionMismatch {
                    expected: dimensions as usize,
                    got: doc.embedding.len(),
                });
            }
            write_entry(&mut writer, doc)?;
        }

        writer.flush()?;
        let file = writer
            .into_inner()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        file.sync_all()?;

        Ok(())
    }
}

/// File header structure.
#[derive(Debug)]
struct Header {
    version: u8,
    index_id: [u8; 32],
    dimensions: u32,
    entry_count: u64,
}

fn read_header<R: Read>(reader: &mut R) -> Result<Header, SnapshotError> {
    let mut header_bytes = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header_bytes)?;

    let version = header_bytes[0];
    if version > FORMAT_VERSION {
        return Err(SnapshotError::VersionMismatch(version, FORMAT_VERSION));
    }

    // Verify checksum (computed over header without checksum field)
    let stored_checksum = u32::from_le_bytes(le_array(&header_bytes[45..49]));
    if stored_checksum != crc32fast::hash(&header_bytes[0..45]) {
        return Err(SnapshotError::ChecksumMismatch);
    }

    Ok(Header {
        version,
        index_id: le_array(&header_bytes[1..33]),
        dimensions: u32::from_le_bytes(le_array(&header_bytes[33..37])),
        entry_count: u64::from_le_bytes(le_array(&header_bytes[37..45])),
    })
}

fn validate_header(
    header: &Header,
    expected_index_id: &[u8; 32],
    expected_dimensions: usize,
) -> Result<(), SnapshotError> {
    if header.version == 0 {
        return Err(SnapshotError::InvalidFormat("version 0".to_string()));
    }

    if header.index_id != *expected_index_id {
        return Err(SnapshotError::IndexMismatch);
    }

    if header.dimensions as usize != expected_dimensions {
        return Err(SnapshotError::DimensionMismatch {
            expected: expected_dimensions,
            got: header.dimensions as usize,
        });
    }

    Ok(())
}

fn write_header<W: Write>(writer: &mut W, header: &Header) -> Result<(), SnapshotError> {
    let mut header_bytes = [0u8; HEADER_SIZE];

    header_bytes[0] = header.version;
    header_bytes[1..33].copy_from_slice(&header.index_id);
    header_bytes[33..37].copy_from_slice(&header.dimensions.to_le_bytes());
    header_bytes[37..45].copy_from_slice(&header.entry_count.to_le_bytes());

    let checksum = crc32fast::hash(&header_bytes[0..45]);
    header_bytes[45..49].copy_from_slice(&checksum.to_le_bytes());

    writer.write_all(&header_bytes)?;
    Ok(())
}

fn read_entry<R: Read>(
    reader: &mut R,
    dimensions: usize,
    max_field_len: usize,
) -> Result<Document, SnapshotError> {
    let mut len16 = [0u8; 2];
    reader.read_exact(&mut len16)?;
    let id_len = check_field_len("id", u16::from_le_bytes(len16) as usize, max_field_len)?;
    let id = read_string(reader, id_len)?;

    let content_len = check_field_len("content", read_u32(reader)? as usize, max_field_len)?;
    let content = read_string(reader, content_len)?;

    let metadata_len = check_field_len("metadata", read_u32(reader)? as usize, max_field_len)?;
    let mut metadata_bytes = vec![0u8; metadata_len];
    reader.read_exact(&mut metadata_bytes)?;
    let metadata: Metadata = serde_json::from_slice(&metadata_bytes)?;

    let mut embedding = Vec::with_capacity(dimensions);
    for _ in 0..dimensions {
        let mut float_bytes = [0u8; 4];
        reader.read_exact(&mut float_bytes)?;
        embedding.push(f32::from_le_bytes(float_bytes));
    }

    Ok(Document {
        id,
        content,
        embedding,
        metadata,
        score: 0.0,
    })
}

fn write_entry<W: Write>(writer: &mut W, doc: &Document) -> Result<(), SnapshotError> {
    let id_len = u16::try_from(doc.id.len())
        .map_err(|_| SnapshotError::InvalidFormat(format!("id too long: {}", doc.id.len())))?;
    writer.write_all(&id_len.to_le_bytes())?;
    writer.write_all(doc.id.as_bytes())?;

    write_bytes(writer, doc.content.as_bytes())?;
    write_bytes(writer, &serde_json::to_vec(&doc.metadata)?)?;

    for &value in &doc.embedding {
        writer.write_all(&value.to_le_bytes())?;
    }

    Ok(())
}

fn write_bytes<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<(), SnapshotError> {
    let len = u32::try_from(bytes.len())
        .map_err(|_| SnapshotError::InvalidFormat(format!("field too long: {}", bytes.len())))?;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(bytes)?;
    Ok(())
}

/// Reject a length prefix longer than the file body itself.
fn check_field_len(field: &str, len: usize, max: usize) -> Result<usize, SnapshotError> {
    if len > max {
        return Err(SnapshotError::InvalidFormat(format!(
            "{field} length {len} exceeds file body of {max} bytes"
        )));
    }
    Ok(len)
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32, SnapshotError> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes)?;
    Ok(u32::from_le_bytes(bytes))
}

fn read_string<R: Read>(reader: &mut R, len: usize) -> Result<String, SnapshotError> {
    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|e| SnapshotError::InvalidFormat(e.to_string()))
}

fn le_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}
