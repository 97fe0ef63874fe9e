//! Error type shared by every decoder in the crate.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::pager::PageNum;

/// Everything that can go wrong while opening or decoding a database file.
///
/// Truncation and corruption are never transient, so nothing here is
/// retried. Variants carry the page number and/or byte offset of the fault.
#[derive(Error, Debug)]
pub enum Error {
    /// The database file could not be opened or its header could not be read.
    #[error("cannot open database '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An I/O error while reading a page.
    #[error("I/O error reading page {page}: {source}")]
    Io {
        page: PageNum,
        #[source]
        source: io::Error,
    },

    /// Fewer bytes than a fixed-size structure needs.
    #[error("truncated input: need {expected} bytes, got {actual}")]
    TruncatedInput { expected: usize, actual: usize },

    /// The file ended before a whole page could be read.
    #[error("short read on page {page}: expected {expected} bytes, got {actual}")]
    ShortRead {
        page: PageNum,
        expected: usize,
        actual: usize,
    },

    /// Input ended before a varint's terminal byte.
    #[error("truncated varint: input ended after {available} bytes")]
    TruncatedVarint { available: usize },

    /// A cell is shorter than its varints, inline payload and overflow pointer.
    #[error("truncated cell: need {needed} bytes, window holds {available}")]
    TruncatedCell { needed: u64, available: usize },

    /// An overflow chain ended before the declared payload was read.
    #[error("overflow chain ended after page {last_page}: got {got} of {expected} bytes")]
    ShortChain {
        last_page: PageNum,
        expected: u64,
        got: u64,
    },

    /// The first 16 bytes are not the SQLite signature.
    #[error("file is not a database: bad magic {found:02x?}")]
    InvalidMagic { found: [u8; 16] },

    /// The header's page size is not a power of two in `[512, 65536]`.
    #[error("invalid page size {raw}")]
    InvalidPageSize { raw: u16 },

    /// Reserved space leaves fewer than 480 usable bytes per page.
    #[error("page size {page_size} with {reserved} reserved bytes leaves fewer than 480 usable")]
    InvalidReservedSpace { page_size: u32, reserved: u8 },

    /// The page-local type byte is not one of the four B-tree kinds.
    #[error("invalid b-tree page type {tag:#04x} on page {page} at offset {offset}")]
    InvalidPageType { page: PageNum, offset: usize, tag: u8 },

    /// A cell pointer (or the pointer array itself) lies outside the page.
    #[error("cell pointer {index} on page {page} references offset {offset} outside the page")]
    CellOffsetOutOfBounds {
        page: PageNum,
        index: usize,
        offset: usize,
    },

    /// Caller asked for a page outside `[1, page_count]`.
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: PageNum, page_count: u32 },

    /// An overflow chain visits the same page twice.
    #[error("overflow chain revisits page {page}")]
    CyclicChain { page: PageNum },

    /// A payload larger than the file could possibly hold.
    #[error("payload of {requested} bytes exceeds file capacity of {limit} bytes")]
    PayloadTooLarge { requested: u64, limit: u64 },

    /// The header claims more pages than the file contains.
    #[error("header claims {page_count} pages of {page_size} bytes but file is {file_len} bytes")]
    PageCountExceedsFile {
        page_count: u32,
        page_size: u32,
        file_len: u64,
    },

    /// The store was closed.
    #[error("page store is closed")]
    Closed,

    /// A cell on a table-leaf page failed to decode.
    #[error("cell {index} on page {page} at offset {offset}: {source}")]
    Cell {
        page: PageNum,
        index: usize,
        offset: usize,
        #[source]
        source: Box<Error>,
    },
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Strips [`Error::Cell`] wrappers and returns the underlying error.
    pub fn root(&self) -> &Error {
        match self {
            Error::Cell { source, .. } => source.root(),
            other => other,
        }
    }
}
