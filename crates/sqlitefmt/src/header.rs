//! Database file header (the first 100 bytes of page 1).

use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::error::{Error, Result};

/// Signature every database file starts with.
pub const MAGIC: &[u8; 16] = b"SQLite format 3\0";

/// Size of the file header in bytes.
pub const HEADER_SIZE: usize = 100;

/// Smallest legal page size.
pub const MIN_PAGE_SIZE: u32 = 512;

/// Largest legal page size. Stored on disk as the value 1.
pub const MAX_PAGE_SIZE: u32 = 65536;

/// Smallest legal usable size (page size minus reserved space).
pub const MIN_USABLE_SIZE: u32 = 480;

/// Text encoding of every string in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Unknown(u32),
}

impl TextEncoding {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => TextEncoding::Utf8,
            2 => TextEncoding::Utf16Le,
            3 => TextEncoding::Utf16Be,
            other => TextEncoding::Unknown(other),
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            TextEncoding::Utf8 => 1,
            TextEncoding::Utf16Le => 2,
            TextEncoding::Utf16Be => 3,
            TextEncoding::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Utf8 => f.write_str("UTF-8"),
            TextEncoding::Utf16Le => f.write_str("UTF-16le"),
            TextEncoding::Utf16Be => f.write_str("UTF-16be"),
            TextEncoding::Unknown(raw) => write!(f, "unknown ({raw})"),
        }
    }
}

/// File format read/write version byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum FormatVersion {
    Legacy,
    Wal,
    Unknown(u8),
}

impl FormatVersion {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => FormatVersion::Legacy,
            2 => FormatVersion::Wal,
            other => FormatVersion::Unknown(other),
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            FormatVersion::Legacy => 1,
            FormatVersion::Wal => 2,
            FormatVersion::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatVersion::Legacy => f.write_str("legacy"),
            FormatVersion::Wal => f.write_str("WAL"),
            FormatVersion::Unknown(raw) => write!(f, "unknown ({raw})"),
        }
    }
}

/// The decoded 100-byte file header. All fields are big-endian on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct FileHeader {
    /// Bytes 0..16.
    pub magic: [u8; 16],
    /// Page size in bytes, with the on-disk value 1 already mapped to 65536.
    pub page_size: u32,
    pub write_version: FormatVersion,
    pub read_version: FormatVersion,
    /// Bytes reserved at the end of every page.
    pub reserved_space: u8,
    pub max_payload_fraction: u8,
    pub min_payload_fraction: u8,
    pub leaf_payload_fraction: u8,
    pub file_change_counter: u32,
    /// Size of the database in pages.
    pub page_count: u32,
    /// First free-list trunk page (0 = empty free list).
    pub freelist_trunk: u32,
    pub freelist_count: u32,
    pub schema_cookie: u32,
    pub schema_format: u32,
    pub default_cache_size: u32,
    /// Largest root b-tree page in auto-vacuum mode, else 0.
    pub largest_root_page: u32,
    pub text_encoding: TextEncoding,
    pub user_version: u32,
    pub incremental_vacuum: u32,
    pub application_id: u32,
    /// Bytes 72..92, reserved for expansion.
    pub reserved: [u8; 20],
    pub version_valid_for: u32,
    /// `SQLITE_VERSION_NUMBER` of the library that last wrote the file.
    pub library_version: u32,
}

impl FileHeader {
    /// Decode a header from the first 100 bytes of `buf`.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::TruncatedInput {
                expected: HEADER_SIZE,
                actual: buf.len(),
            });
        }

        let mut magic = [0u8; 16];
        magic.copy_from_slice(&buf[0..16]);
        if &magic != MAGIC {
            return Err(Error::InvalidMagic { found: magic });
        }

        let raw_page_size = get_u16(buf, 16);
        let page_size = decode_page_size(raw_page_size)?;
        let reserved_space = buf[20];
        if page_size - u32::from(reserved_space) < MIN_USABLE_SIZE {
            return Err(Error::InvalidReservedSpace {
                page_size,
                reserved: reserved_space,
            });
        }

        let mut reserved = [0u8; 20];
        reserved.copy_from_slice(&buf[72..92]);

        Ok(Self {
            magic,
            page_size,
            write_version: FormatVersion::from_raw(buf[18]),
            read_version: FormatVersion::from_raw(buf[19]),
            reserved_space,
            max_payload_fraction: buf[21],
            min_payload_fraction: buf[22],
            leaf_payload_fraction: buf[23],
            file_change_counter: get_u32(buf, 24),
            page_count: get_u32(buf, 28),
            freelist_trunk: get_u32(buf, 32),
            freelist_count: get_u32(buf, 36),
            schema_cookie: get_u32(buf, 40),
            schema_format: get_u32(buf, 44),
            default_cache_size: get_u32(buf, 48),
            largest_root_page: get_u32(buf, 52),
            text_encoding: TextEncoding::from_raw(get_u32(buf, 56)),
            user_version: get_u32(buf, 60),
            incremental_vacuum: get_u32(buf, 64),
            application_id: get_u32(buf, 68),
            reserved,
            version_valid_for: get_u32(buf, 92),
            library_version: get_u32(buf, 96),
        })
    }

    /// Page size minus the reserved trailer; the `U` of all payload math.
    pub fn usable_size(&self) -> u32 {
        self.page_size - u32::from(self.reserved_space)
    }

    /// Total bytes the header claims the database occupies.
    pub fn database_size(&self) -> u64 {
        u64::from(self.page_size) * u64::from(self.page_count)
    }

    /// The magic string without its trailing NUL.
    pub fn magic_str(&self) -> &str {
        std::str::from_utf8(&self.magic[..15]).unwrap_or("<invalid>")
    }

    /// `major.minor.patch` of the library that last wrote the file.
    pub fn library_version_string(&self) -> String {
        let v = self.library_version;
        format!("{}.{}.{}", v / 1_000_000, v / 1000 % 1000, v % 1000)
    }
}

fn decode_page_size(raw: u16) -> Result<u32> {
    let size = if raw == 1 {
        MAX_PAGE_SIZE
    } else {
        u32::from(raw)
    };
    if !size.is_power_of_two() || !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&size) {
        return Err(Error::InvalidPageSize { raw });
    }
    Ok(size)
}

pub(crate) fn get_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

pub(crate) fn get_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}
