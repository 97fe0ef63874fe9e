//! B-tree page decoding.
//!
//! ## Page Layout
//!
//! The page-local header starts at byte 0, or byte 100 on page 1.
//!
//! ```text
//! [0]      page_type: u8  (0x02 index interior, 0x05 table interior,
//!                          0x0A index leaf, 0x0D table leaf)
//! [1..3]   first_freeblock: u16
//! [3..5]   cell_count: u16
//! [5..7]   cell_content_start: u16 (0 means 65536)
//! [7]      fragmented_free_bytes: u8
//! [8..12]  right_child: u32 (interior pages only)
//! ```
//!
//! The cell pointer array follows the header: `cell_count` big-endian u16
//! offsets, each relative to the start of the page (not the header).
//!
//! Only table-leaf cells are decoded. Interior and index pages stop at the
//! header because walking them needs key comparison.

#[cfg(feature = "serde")]
use serde::Serialize;
use tracing::{debug, warn};

use crate::cell::{decode_table_leaf_cell, Cell};
use crate::error::{Error, Result};
use crate::header::{get_u16, get_u32};
use crate::pager::{Page, PageNum};

/// Page type markers.
pub const PAGE_TYPE_INDEX_INTERIOR: u8 = 0x02;
pub const PAGE_TYPE_TABLE_INTERIOR: u8 = 0x05;
pub const PAGE_TYPE_INDEX_LEAF: u8 = 0x0A;
pub const PAGE_TYPE_TABLE_LEAF: u8 = 0x0D;

/// Size of a leaf page header.
pub const LEAF_HEADER_SIZE: usize = 8;

/// Size of an interior page header (leaf header + right child).
pub const INTERIOR_HEADER_SIZE: usize = 12;

/// Size of a cell pointer in the offset array.
const CELL_PTR_SIZE: usize = 2;

/// The four b-tree page kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum PageKind {
    IndexInterior,
    TableInterior,
    IndexLeaf,
    TableLeaf,
}

impl PageKind {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            PAGE_TYPE_INDEX_INTERIOR => Some(PageKind::IndexInterior),
            PAGE_TYPE_TABLE_INTERIOR => Some(PageKind::TableInterior),
            PAGE_TYPE_INDEX_LEAF => Some(PageKind::IndexLeaf),
            PAGE_TYPE_TABLE_LEAF => Some(PageKind::TableLeaf),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            PageKind::IndexInterior => PAGE_TYPE_INDEX_INTERIOR,
            PageKind::TableInterior => PAGE_TYPE_TABLE_INTERIOR,
            PageKind::IndexLeaf => PAGE_TYPE_INDEX_LEAF,
            PageKind::TableLeaf => PAGE_TYPE_TABLE_LEAF,
        }
    }

    pub fn is_interior(self) -> bool {
        matches!(self, PageKind::IndexInterior | PageKind::TableInterior)
    }

    fn header_size(self) -> usize {
        if self.is_interior() {
            INTERIOR_HEADER_SIZE
        } else {
            LEAF_HEADER_SIZE
        }
    }
}

/// Fields shared by every b-tree page header.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PageHeader {
    pub kind: PageKind,
    /// Offset of the first freeblock, 0 if none.
    pub first_freeblock: u16,
    pub cell_count: u16,
    /// Start of the cell content area, with the on-disk 0 mapped to 65536.
    pub cell_content_start: u32,
    pub fragmented_free_bytes: u8,
}

/// An interior page: header plus the rightmost child pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct InteriorPage {
    pub header: PageHeader,
    pub right_child: PageNum,
}

/// An index leaf. Index keys are not decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct IndexLeafPage {
    pub header: PageHeader,
}

/// A table leaf with its cells in cell-pointer order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct TableLeafPage {
    pub header: PageHeader,
    /// Offsets from the start of the page, in pointer-array order.
    pub cell_pointers: Vec<u16>,
    pub cells: Vec<Cell>,
}

/// A decoded b-tree page.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum BTreePage {
    IndexInterior(InteriorPage),
    TableInterior(InteriorPage),
    IndexLeaf(IndexLeafPage),
    TableLeaf(TableLeafPage),
}

impl BTreePage {
    pub fn header(&self) -> &PageHeader {
        match self {
            BTreePage::IndexInterior(page) | BTreePage::TableInterior(page) => &page.header,
            BTreePage::IndexLeaf(page) => &page.header,
            BTreePage::TableLeaf(page) => &page.header,
        }
    }

    pub fn kind(&self) -> PageKind {
        self.header().kind
    }
}

/// Decode `page` as a b-tree page.
///
/// `usable_size` bounds cell content; bytes past it are the reserved
/// trailer and never belong to a cell.
pub fn decode_page(page: &Page, usable_size: u32) -> Result<BTreePage> {
    let data = page.data();
    let page_num = page.number();
    let hdr = page.header_offset();

    let tag = *data.get(hdr).ok_or(Error::TruncatedInput {
        expected: hdr + 1,
        actual: data.len(),
    })?;
    let kind = PageKind::from_tag(tag).ok_or(Error::InvalidPageType {
        page: page_num,
        offset: hdr,
        tag,
    })?;

    let header_end = hdr + kind.header_size();
    if header_end > data.len() {
        return Err(Error::TruncatedInput {
            expected: header_end,
            actual: data.len(),
        });
    }

    let raw_content_start = get_u16(data, hdr + 5);
    let header = PageHeader {
        kind,
        first_freeblock: get_u16(data, hdr + 1),
        cell_count: get_u16(data, hdr + 3),
        cell_content_start: if raw_content_start == 0 {
            65536
        } else {
            u32::from(raw_content_start)
        },
        fragmented_free_bytes: data[hdr + 7],
    };

    debug!(
        page = page_num,
        kind = ?kind,
        cell_count = header.cell_count,
        "decoded b-tree page header"
    );

    match kind {
        PageKind::IndexInterior | PageKind::TableInterior => {
            let interior = InteriorPage {
                header,
                right_child: get_u32(data, hdr + 8),
            };
            Ok(if kind == PageKind::IndexInterior {
                BTreePage::IndexInterior(interior)
            } else {
                BTreePage::TableInterior(interior)
            })
        }
        PageKind::IndexLeaf => Ok(BTreePage::IndexLeaf(IndexLeafPage { header })),
        PageKind::TableLeaf => {
            decode_table_leaf(data, page_num, header_end, header, usable_size)
                .map(BTreePage::TableLeaf)
        }
    }
}

fn decode_table_leaf(
    data: &[u8],
    page_num: PageNum,
    header_end: usize,
    header: PageHeader,
    usable_size: u32,
) -> Result<TableLeafPage> {
    let cell_count = header.cell_count as usize;
    let usable_end = (usable_size as usize).min(data.len());
    let ptr_array_end = header_end + cell_count * CELL_PTR_SIZE;
    if ptr_array_end > usable_end {
        warn!(
            page = page_num,
            cell_count, "cell pointer array runs past the page"
        );
        let index = (usable_end.saturating_sub(header_end)) / CELL_PTR_SIZE;
        return Err(Error::CellOffsetOutOfBounds {
            page: page_num,
            index,
            offset: header_end + index * CELL_PTR_SIZE,
        });
    }

    let cell_pointers: Vec<u16> = (0..cell_count)
        .map(|i| get_u16(data, header_end + i * CELL_PTR_SIZE))
        .collect();

    let mut cells = Vec::with_capacity(cell_count);
    for (index, &ptr) in cell_pointers.iter().enumerate() {
        let offset = ptr as usize;
        if offset < ptr_array_end || offset >= usable_end {
            warn!(
                page = page_num,
                index, offset, "cell pointer outside the cell content area"
            );
            return Err(Error::CellOffsetOutOfBounds {
                page: page_num,
                index,
                offset,
            });
        }

        let cell = decode_table_leaf_cell(usable_size, &data[offset..usable_end]).map_err(
            |source| Error::Cell {
                page: page_num,
                index,
                offset,
                source: Box::new(source),
            },
        )?;
        cells.push(cell);
    }

    Ok(TableLeafPage {
        header,
        cell_pointers,
        cells,
    })
}
