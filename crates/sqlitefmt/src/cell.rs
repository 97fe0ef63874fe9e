//! Table-leaf cells and the inline/overflow payload split.
//!
//! ```text
//! [payload size varint] [row key varint] [inline payload] [overflow page u32]?
//! ```
//!
//! With usable size `U`, a table-leaf page keeps at most `X = U - 35` payload
//! bytes inline. Larger payloads keep `K = M + (P - M) % (U - 4)` bytes
//! inline when `K <= X` (so every overflow page ends up full), else `M`,
//! where `M = (U - 12) * 32 / 255 - 23`.

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::error::{Error, Result};
use crate::header::get_u32;
use crate::pager::PageNum;
use crate::varint::read_varint;

/// Size of the overflow page pointer that follows a spilled inline payload.
pub const OVERFLOW_POINTER_SIZE: usize = 4;

/// Most payload bytes a table-leaf cell stores on the page (`X`).
///
/// `usable_size` must be at least 480, as [`FileHeader::decode`] enforces.
///
/// [`FileHeader::decode`]: crate::header::FileHeader::decode
pub const fn max_local_payload(usable_size: u32) -> u32 {
    usable_size - 35
}

/// Fewest payload bytes an overflowing cell stores on the page (`M`).
/// Same precondition as [`max_local_payload`].
pub const fn min_local_payload(usable_size: u32) -> u32 {
    (usable_size - 12) * 32 / 255 - 23
}

/// Inline byte count for a payload of `payload_size` bytes.
/// Same precondition as [`max_local_payload`].
pub const fn local_payload_size(payload_size: u64, usable_size: u32) -> u64 {
    let max_local = max_local_payload(usable_size) as u64;
    if payload_size <= max_local {
        return payload_size;
    }
    let min_local = min_local_payload(usable_size) as u64;
    let surplus = (usable_size - 4) as u64;
    let local = min_local + (payload_size - min_local) % surplus;
    if local <= max_local {
        local
    } else {
        min_local
    }
}

/// One row of a table b-tree leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Cell {
    /// Declared size of the whole payload, inline and overflow.
    pub payload_size: u64,
    /// The row's integer key.
    pub rowid: i64,
    /// Payload bytes stored on the page.
    pub inline_payload: Vec<u8>,
    /// First page of the overflow chain, present iff the payload spills.
    pub overflow_page: Option<PageNum>,
    /// Bytes taken by the two varints.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub header_len: usize,
}

impl Cell {
    /// Payload bytes that live in the overflow chain.
    pub fn overflow_len(&self) -> u64 {
        self.payload_size - self.inline_payload.len() as u64
    }

    /// Bytes the cell occupies on its page.
    pub fn on_page_size(&self) -> usize {
        let pointer = if self.overflow_page.is_some() {
            OVERFLOW_POINTER_SIZE
        } else {
            0
        };
        self.header_len + self.inline_payload.len() + pointer
    }
}

/// Decode the table-leaf cell at the front of `cell`.
///
/// `cell` runs from the cell's offset to the end of the page's usable area.
pub fn decode_table_leaf_cell(usable_size: u32, cell: &[u8]) -> Result<Cell> {
    let (payload_size, size_len) = read_varint(cell)?;
    let (raw_rowid, rowid_len) = read_varint(&cell[size_len..])?;
    let header_len = size_len + rowid_len;

    let local = local_payload_size(payload_size, usable_size);
    let spills = local < payload_size;
    let pointer = if spills { OVERFLOW_POINTER_SIZE as u64 } else { 0 };

    let needed = header_len as u64 + local + pointer;
    if needed > cell.len() as u64 {
        return Err(Error::TruncatedCell {
            needed,
            available: cell.len(),
        });
    }

    let payload_end = header_len + local as usize;
    let inline_payload = cell[header_len..payload_end].to_vec();
    let overflow_page = spills.then(|| get_u32(cell, payload_end));

    Ok(Cell {
        payload_size,
        rowid: raw_rowid as i64,
        inline_payload,
        overflow_page,
        header_len,
    })
}
