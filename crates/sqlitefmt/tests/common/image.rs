// Database image builders shared by the unit tests (`src/test_util.rs`) and
// the integration tests (`tests/common/mod.rs`). The including module brings
// `Write`, `NamedTempFile`, `HEADER_SIZE`, `MAGIC`, `PageNum` and
// `write_varint` into scope.

pub(crate) struct DbImage {
    page_size: usize,
    bytes: Vec<u8>,
}

impl DbImage {
    /// A zeroed image with a valid header and `page_count` pages.
    pub(crate) fn new(page_size: u32, page_count: u32) -> Self {
        Self::with_reserved(page_size, page_count, 0)
    }

    pub(crate) fn with_reserved(page_size: u32, page_count: u32, reserved: u8) -> Self {
        let mut bytes = vec![0u8; page_size as usize * page_count as usize];
        bytes[0..16].copy_from_slice(MAGIC);
        let raw_size: u16 = if page_size == 65536 {
            1
        } else {
            page_size as u16
        };
        bytes[16..18].copy_from_slice(&raw_size.to_be_bytes());
        bytes[18] = 1;
        bytes[19] = 1;
        bytes[20] = reserved;
        bytes[21] = 64;
        bytes[22] = 32;
        bytes[23] = 32;
        bytes[28..32].copy_from_slice(&page_count.to_be_bytes());
        bytes[44..48].copy_from_slice(&4u32.to_be_bytes());
        bytes[56..60].copy_from_slice(&1u32.to_be_bytes());
        Self {
            page_size: page_size as usize,
            bytes,
        }
    }

    pub(crate) fn page_mut(&mut self, page_num: PageNum) -> &mut [u8] {
        let start = (page_num as usize - 1) * self.page_size;
        &mut self.bytes[start..start + self.page_size]
    }

    /// Write a table-leaf page holding `cells` (already encoded), placing
    /// cell content from the end of the usable area downward.
    pub(crate) fn table_leaf(&mut self, page_num: PageNum, usable: usize, cells: &[Vec<u8>]) {
        let hdr = if page_num == 1 { HEADER_SIZE } else { 0 };
        let page = self.page_mut(page_num);
        page[hdr] = 0x0D;
        page[hdr + 3..hdr + 5].copy_from_slice(&(cells.len() as u16).to_be_bytes());

        let mut content = usable;
        for (i, cell) in cells.iter().enumerate() {
            content -= cell.len();
            page[content..content + cell.len()].copy_from_slice(cell);
            let ptr = hdr + 8 + 2 * i;
            page[ptr..ptr + 2].copy_from_slice(&(content as u16).to_be_bytes());
        }
        page[hdr + 5..hdr + 7].copy_from_slice(&(content as u16).to_be_bytes());
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub(crate) fn write_temp(&self) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&self.bytes).unwrap();
        file.flush().unwrap();
        file
    }
}

/// Encode a table-leaf cell: payload size, row key, `inline`, and an
/// overflow pointer when given.
pub(crate) fn leaf_cell(
    payload_size: u64,
    rowid: i64,
    inline: &[u8],
    overflow: Option<u32>,
) -> Vec<u8> {
    let mut buf = [0u8; 9];
    let mut cell = Vec::new();
    let n = write_varint(&mut buf, payload_size);
    cell.extend_from_slice(&buf[..n]);
    let n = write_varint(&mut buf, rowid as u64);
    cell.extend_from_slice(&buf[..n]);
    cell.extend_from_slice(inline);
    if let Some(page) = overflow {
        cell.extend_from_slice(&page.to_be_bytes());
    }
    cell
}
