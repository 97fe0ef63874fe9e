//! Overflow page chains.
//!
//! A payload too large for its cell continues in a linked list of pages:
//!
//! ```text
//! [0..4]  next overflow page: u32 (0 = last page)
//! [4..U]  payload continuation bytes
//! ```

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::cell::Cell;
use crate::error::{Error, Result};
use crate::header::get_u32;
use crate::pager::{PageNum, PageStore};

/// Read `total_len` payload bytes from the chain starting at `first_page`.
pub fn read_overflow_chain(
    store: &mut PageStore,
    first_page: PageNum,
    total_len: u64,
) -> Result<Vec<u8>> {
    let capacity = u64::from(store.usable_size()) - 4;
    // Pages actually on disk, not the header's claim.
    let pages_on_disk = store.file_len() / store.page_size() as u64;
    let limit = capacity * pages_on_disk.min(u64::from(store.page_count()));
    if total_len > limit {
        warn!(
            first_page,
            total_len, limit, "overflow payload larger than the file"
        );
        return Err(Error::PayloadTooLarge {
            requested: total_len,
            limit,
        });
    }

    let mut out = Vec::with_capacity(total_len as usize);
    let mut seen = HashSet::new();
    let mut current = first_page;
    let mut last_page = first_page;

    while (out.len() as u64) < total_len {
        if current == 0 {
            warn!(
                last_page,
                expected = total_len,
                got = out.len(),
                "overflow chain ended early"
            );
            return Err(Error::ShortChain {
                last_page,
                expected: total_len,
                got: out.len() as u64,
            });
        }
        if !seen.insert(current) {
            warn!(page = current, "overflow chain cycle");
            return Err(Error::CyclicChain { page: current });
        }

        let page = store.read_page(current)?;
        let data = page.data();
        let next = get_u32(data, 0);

        let needed = total_len - out.len() as u64;
        let take = needed.min(capacity) as usize;
        out.extend_from_slice(&data[4..4 + take]);

        last_page = current;
        current = next;
    }

    debug!(first_page, pages = seen.len(), total_len, "read overflow chain");
    Ok(out)
}

/// The complete payload of `cell`: inline bytes followed by its overflow.
pub fn read_payload(store: &mut PageStore, cell: &Cell) -> Result<Vec<u8>> {
    let Some(first_page) = cell.overflow_page else {
        return Ok(cell.inline_payload.clone());
    };

    let tail = read_overflow_chain(store, first_page, cell.overflow_len())?;
    let mut payload = Vec::with_capacity(cell.inline_payload.len() + tail.len());
    payload.extend_from_slice(&cell.inline_payload);
    payload.extend_from_slice(&tail);
    Ok(payload)
}
