//! Reader for the git on-disk index (`.git/index`).
//!
//! ```text
//! Header (12 bytes):   "DIRC" | version (be32) | entry count (be32)
//! Entry (v2/v3):       62-byte fixed prefix | [2 extended flag bytes, v3] | path | 1..8 NUL
//!   prefix offsets:    8 mtime seconds, 36 size, 40 object id (20), 60 flags (be16)
//! ```
//!
//! Extensions and the trailing checksum are not interpreted.

use crate::error::{RepoError, Result};
use std::fs;
use std::path::Path;

pub const INDEX_SIGNATURE: &[u8; 4] = b"DIRC";

const HEADER_LEN: usize = 12;
const ENTRY_PREFIX_LEN: usize = 62;
const OID_LEN: usize = 20;

const MTIME_OFFSET: usize = 8;
const SIZE_OFFSET: usize = 36;
const OID_OFFSET: usize = 40;
const FLAGS_OFFSET: usize = 60;

const NAME_MASK: u16 = 0x0FFF;
const EXTENDED_FLAG: u16 = 0x4000;
const EXTENDED_FLAGS_LEN: usize = 2;

/// One decoded index record. Owns its path bytes; nothing borrows the
/// decode buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Repository-relative path with `/` separators
    pub path: String,
    pub oid: [u8; OID_LEN],
    pub size: u32,
    pub mtime_seconds: u32,
}

impl IndexEntry {
    /// Lowercase hex of the 160-bit object id.
    pub fn object_hash(&self) -> String {
        hex_lower(&self.oid)
    }
}

/// Read and decode the index at `index_path`.
pub fn parse_index(index_path: &Path) -> Result<Vec<IndexEntry>> {
    let data = fs::read(index_path)?;
    parse_index_bytes(&data)
}

/// Decode an in-memory index.
///
/// A short header or a wrong signature is an error. Running out of data in
/// the middle of an entry stops decoding and returns what was read so far.
pub fn parse_index_bytes(data: &[u8]) -> Result<Vec<IndexEntry>> {
    if data.len() < HEADER_LEN {
        return Err(RepoError::InvalidIndex(format!(
            "{} bytes is shorter than the {HEADER_LEN}-byte header",
            data.len()
        )));
    }
    if &data[..4] != INDEX_SIGNATURE {
        return Err(RepoError::InvalidIndex("bad signature".to_string()));
    }

    let version = be32(data, 4);
    if !matches!(version, 2 | 3) {
        return Err(RepoError::UnsupportedIndexVersion(version));
    }

    let count = be32(data, 8) as usize;
    let mut entries = Vec::with_capacity(count.min(data.len() / ENTRY_PREFIX_LEN));
    let mut offset = HEADER_LEN;

    for decoded in 0..count {
        match decode_entry(data, offset, version) {
            Some((entry, next)) => {
                entries.push(entry);
                offset = next;
            }
            None => {
                log::warn!("Index truncated after {decoded} of {count} entries");
                break;
            }
        }
    }

    Ok(entries)
}

fn decode_entry(data: &[u8], start: usize, version: u32) -> Option<(IndexEntry, usize)> {
    let prefix = data.get(start..start.checked_add(ENTRY_PREFIX_LEN)?)?;

    let mtime_seconds = be32(prefix, MTIME_OFFSET);
    let size = be32(prefix, SIZE_OFFSET);
    let mut oid = [0u8; OID_LEN];
    oid.copy_from_slice(&prefix[OID_OFFSET..OID_OFFSET + OID_LEN]);
    let flags = u16::from_be_bytes([prefix[FLAGS_OFFSET], prefix[FLAGS_OFFSET + 1]]);

    let mut name_start = start + ENTRY_PREFIX_LEN;
    if version >= 3 && flags & EXTENDED_FLAG != 0 {
        data.get(name_start..name_start + EXTENDED_FLAGS_LEN)?;
        name_start += EXTENDED_FLAGS_LEN;
    }

    let name_len = usize::from(flags & NAME_MASK);
    let raw_name = if flags & NAME_MASK < NAME_MASK {
        data.get(name_start..name_start + name_len)?
    } else {
        // Saturated length: the path runs to its NUL terminator.
        let rest = data.get(name_start..)?;
        let nul = rest.iter().position(|b| *b == 0)?;
        &rest[..nul]
    };

    let mut name = raw_name;
    while let Some((&0, head)) = name.split_last() {
        name = head;
    }

    // At least one NUL follows the path; the whole entry is 8-byte aligned.
    let fixed_len = name_start - start;
    let entry_len = (fixed_len + raw_name.len() + 8) & !7;
    let next = start + entry_len;
    if next > data.len() {
        return None;
    }

    let entry = IndexEntry {
        path: String::from_utf8_lossy(name).into_owned(),
        oid,
        size,
        mtime_seconds,
    };
    Some((entry, next))
}

fn be32(buf: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

pub(crate) fn hex_lower(bytes: &[u8]) -> String {
    use std::fmt::Write as _;

    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(any(test, feature = "test-support"))]
impl IndexEntry {
    /// Entry matching `content` as git would stage it, with a zero mtime.
    pub fn for_content(path: &str, content: &[u8]) -> Self {
        use sha1::{Digest, Sha1};

        let mut hasher = Sha1::new();
        hasher.update(format!("blob {}\0", content.len()).as_bytes());
        hasher.update(content);
        let mut oid = [0u8; OID_LEN];
        oid.copy_from_slice(&hasher.finalize());
        Self {
            path: path.to_string(),
            oid,
            size: u32::try_from(content.len()).unwrap_or(u32::MAX),
            mtime_seconds: 0,
        }
    }
}

/// Encode a version 2 index holding `entries`, checksum included.
#[cfg(any(test, feature = "test-support"))]
pub fn encode_index(entries: &[IndexEntry]) -> Vec<u8> {
    use sha1::{Digest, Sha1};

    let mut out = Vec::new();
    out.extend_from_slice(INDEX_SIGNATURE);
    out.extend_from_slice(&2u32.to_be_bytes());
    out.extend_from_slice(&u32::try_from(entries.len()).unwrap_or(u32::MAX).to_be_bytes());

    for entry in entries {
        let start = out.len();
        let mut prefix = [0u8; ENTRY_PREFIX_LEN];
        prefix[MTIME_OFFSET..MTIME_OFFSET + 4].copy_from_slice(&entry.mtime_seconds.to_be_bytes());
        // mode 100644
        prefix[24..28].copy_from_slice(&0o100_644u32.to_be_bytes());
        prefix[SIZE_OFFSET..SIZE_OFFSET + 4].copy_from_slice(&entry.size.to_be_bytes());
        prefix[OID_OFFSET..OID_OFFSET + OID_LEN].copy_from_slice(&entry.oid);
        let name_len = u16::try_from(entry.path.len()).unwrap_or(NAME_MASK).min(NAME_MASK);
        prefix[FLAGS_OFFSET..FLAGS_OFFSET + 2].copy_from_slice(&name_len.to_be_bytes());
        out.extend_from_slice(&prefix);
        out.extend_from_slice(entry.path.as_bytes());
        let entry_len = (ENTRY_PREFIX_LEN + entry.path.len() + 8) & !7;
        out.resize(start + entry_len, 0);
    }

    let checksum = Sha1::digest(&out);
    out.extend_from_slice(&checksum);
    out
}

/// Write [`encode_index`] output to `path`.
#[cfg(any(test, feature = "test-support"))]
pub fn write_index(path: &Path, entries: &[IndexEntry]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, encode_index(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(path: &str, fill: u8, size: u32, mtime: u32) -> IndexEntry {
        IndexEntry {
            path: path.to_string(),
            oid: [fill; OID_LEN],
            size,
            mtime_seconds: mtime,
        }
    }

    #[test]
    fn decodes_entries_in_order() {
        let entries = vec![
            entry("go.mod", 0x11, 42, 1_700_000_000),
            entry("svc/svc.go", 0xab, 100, 1_700_000_001),
            // 62 + 2 is already aligned: a full block of NULs follows the name.
            entry("ab", 0x22, 7, 3),
        ];
        let decoded = parse_index_bytes(&encode_index(&entries)).unwrap();
        assert_eq!(decoded, entries);
        assert_eq!(decoded[1].object_hash(), "ab".repeat(OID_LEN));
    }

    /// Index written by `git add` (git 2.39) for four files, with a `TREE`
    /// extension after the entries.
    const GIT_WRITTEN_INDEX: &[u8] = include_bytes!("../tests/fixtures/git_index_v2.bin");

    #[test]
    fn decodes_index_written_by_git() {
        let decoded = parse_index_bytes(GIT_WRITTEN_INDEX).unwrap();
        let summary: Vec<_> = decoded
            .iter()
            .map(|entry| (entry.path.as_str(), entry.size, entry.object_hash()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("a.go", 10, "2a93cdef549545101b086408d9ee767fda0c02c2".to_string()),
                ("ab", 0, "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391".to_string()),
                (
                    "deep/er/path/file_name.go",
                    13,
                    "529c23ca5fe3284ec47affd9daa1fb17d9a8e7c2".to_string()
                ),
                ("x", 6, "ce013625030ba8dba906f756967f9e9ca394464a".to_string()),
            ]
        );
        assert!(decoded
            .iter()
            .all(|entry| entry.mtime_seconds == 1_792_045_121));
        assert_eq!(
            decoded[3],
            IndexEntry {
                mtime_seconds: 1_792_045_121,
                ..IndexEntry::for_content("x", b"hello\n")
            }
        );
    }

    #[test]
    fn rejects_short_file() {
        let err = parse_index_bytes(b"DIRC\0\0\0\x02").unwrap_err();
        assert!(matches!(err, RepoError::InvalidIndex(_)));
    }

    #[test]
    fn rejects_bad_signature() {
        let mut data = encode_index(&[entry("a.go", 1, 1, 1)]);
        data[0] = b'X';
        let err = parse_index_bytes(&data).unwrap_err();
        assert!(matches!(err, RepoError::InvalidIndex(_)));
    }

    #[test]
    fn rejects_path_compressed_v4() {
        let mut data = encode_index(&[]);
        data[4..8].copy_from_slice(&4u32.to_be_bytes());
        let err = parse_index_bytes(&data).unwrap_err();
        assert!(matches!(err, RepoError::UnsupportedIndexVersion(4)));
    }

    #[test]
    fn truncated_entry_returns_prefix() {
        let entries = vec![entry("a.go", 1, 1, 1), entry("b/c.go", 2, 2, 2)];
        let data = encode_index(&entries);
        let first_len = (ENTRY_PREFIX_LEN + "a.go".len() + 8) & !7;
        let cut = HEADER_LEN + first_len + 30;
        let decoded = parse_index_bytes(&data[..cut]).unwrap();
        assert_eq!(decoded, entries[..1].to_vec());
    }

    #[test]
    fn header_only_index_is_empty() {
        let decoded = parse_index_bytes(&encode_index(&[])).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn v3_extended_flags_shift_the_path() {
        let mut data = Vec::new();
        data.extend_from_slice(INDEX_SIGNATURE);
        data.extend_from_slice(&3u32.to_be_bytes());
        data.extend_from_slice(&1u32.to_be_bytes());
        let mut prefix = [0u8; ENTRY_PREFIX_LEN];
        prefix[SIZE_OFFSET..SIZE_OFFSET + 4].copy_from_slice(&9u32.to_be_bytes());
        let flags = EXTENDED_FLAG | 4;
        prefix[FLAGS_OFFSET..FLAGS_OFFSET + 2].copy_from_slice(&flags.to_be_bytes());
        data.extend_from_slice(&prefix);
        data.extend_from_slice(&[0x20, 0x00]);
        data.extend_from_slice(b"x.go");
        let entry_len = (ENTRY_PREFIX_LEN + 2 + 4 + 8) & !7;
        data.resize(HEADER_LEN + entry_len, 0);

        let decoded = parse_index_bytes(&data).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].path, "x.go");
        assert_eq!(decoded[0].size, 9);
    }

    #[test]
    fn parse_index_reads_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(".git").join("index");
        write_index(&path, &[entry("main.go", 3, 5, 6)]).unwrap();
        let decoded = parse_index(&path).unwrap();
        assert_eq!(decoded, vec![entry("main.go", 3, 5, 6)]);
    }
}
