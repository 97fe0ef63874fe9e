//! Read-only decoder for the SQLite 3 database file format.
//!
//! This crate provides:
//! - File header decoding (magic, page size, page count, encodings, etc.)
//! - Page-addressed reads through [`PageStore`]
//! - B-tree page classification and table-leaf cell decoding
//! - Overflow chain reassembly for payloads that do not fit on their page
//!
//! Nothing is ever written. Interior-page traversal and index keys are left
//! to callers.
//!
//! ```no_run
//! use sqlitefmt::{BTreePage, PageStore};
//!
//! let mut store = PageStore::open("test.db")?;
//! if let BTreePage::TableLeaf(leaf) = store.decode_page(1)? {
//!     for cell in &leaf.cells {
//!         let payload = sqlitefmt::read_payload(&mut store, cell)?;
//!         println!("{}: {} bytes", cell.rowid, payload.len());
//!     }
//! }
//! # Ok::<(), sqlitefmt::Error>(())
//! ```

pub mod btree;
pub mod cell;
pub mod config;
pub mod error;
pub mod header;
pub mod overflow;
pub mod pager;
pub mod varint;

#[cfg(test)]
mod test_util;

pub use btree::{decode_page, BTreePage, PageKind};
pub use cell::{decode_table_leaf_cell, Cell};
pub use config::StoreConfig;
pub use error::{Error, Result};
pub use header::FileHeader;
pub use overflow::{read_overflow_chain, read_payload};
pub use pager::{Page, PageNum, PageStore};
pub use varint::read_varint;
