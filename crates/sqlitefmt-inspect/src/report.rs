//! Collects decoded pages and renders them as text or JSON.

use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use sqlitefmt::btree::{BTreePage, TableLeafPage};
use sqlitefmt::{decode_page, read_payload, Error, FileHeader, PageNum, PageStore};
use tracing::warn;

#[derive(Debug, Clone, Copy, Default)]
pub struct InspectOptions {
    pub payloads: bool,
    pub hexdump: bool,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub header: FileHeader,
    pub pages: Vec<PageReport>,
}

#[derive(Debug, Serialize)]
pub struct PageReport {
    pub number: PageNum,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<BTreePage>,
    /// Set for pages that are not b-tree pages (overflow, free-list, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_btree: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub payloads: Vec<Vec<u8>>,
    #[serde(skip)]
    pub cell_content: Vec<u8>,
}

impl Report {
    pub fn build(
        store: &mut PageStore,
        pages: &[PageNum],
        options: InspectOptions,
    ) -> Result<Self> {
        let usable = store.usable_size();
        let mut reports = Vec::with_capacity(pages.len());

        for &number in pages {
            let raw = store
                .read_page(number)
                .with_context(|| format!("failed to read page {number}"))?;

            let page = match decode_page(&raw, usable) {
                Ok(page) => page,
                Err(Error::InvalidPageType { tag, .. }) => {
                    warn!(page = number, tag, "skipping non-b-tree page");
                    reports.push(PageReport {
                        number,
                        page: None,
                        not_btree: Some(format!("page type byte {tag:#04x}")),
                        payloads: Vec::new(),
                        cell_content: Vec::new(),
                    });
                    continue;
                }
                Err(e) => return Err(e).with_context(|| format!("failed to decode page {number}")),
            };

            let mut payloads = Vec::new();
            let mut cell_content = Vec::new();
            if let BTreePage::TableLeaf(leaf) = &page {
                if options.payloads {
                    for (i, cell) in leaf.cells.iter().enumerate() {
                        let payload = read_payload(store, cell).with_context(|| {
                            format!("failed to read payload of cell {i} on page {number}")
                        })?;
                        payloads.push(payload);
                    }
                }
                if options.hexdump {
                    cell_content = content_area(leaf, raw.data(), usable).to_vec();
                }
            }

            reports.push(PageReport {
                number,
                page: Some(page),
                not_btree: None,
                payloads,
                cell_content,
            });
        }

        Ok(Self {
            header: store.header().clone(),
            pages: reports,
        })
    }

    pub fn write_text<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write_header(out, &self.header)?;
        for page in &self.pages {
            writeln!(out)?;
            page.write_text(out)?;
        }
        Ok(())
    }
}

impl PageReport {
    fn write_text<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let Some(page) = &self.page else {
            let reason = self.not_btree.as_deref().unwrap_or("unknown");
            return writeln!(out, "page {}: not a b-tree page ({reason})", self.number);
        };

        let header = page.header();
        writeln!(
            out,
            "page {}: {:?}, {} cells, content start {}, first freeblock {}, fragmented {}",
            self.number,
            header.kind,
            header.cell_count,
            header.cell_content_start,
            header.first_freeblock,
            header.fragmented_free_bytes,
        )?;

        match page {
            BTreePage::TableInterior(interior) | BTreePage::IndexInterior(interior) => {
                writeln!(out, "  right child: {}", interior.right_child)?;
            }
            BTreePage::IndexLeaf(_) => {}
            BTreePage::TableLeaf(leaf) => {
                for (i, (cell, ptr)) in leaf.cells.iter().zip(&leaf.cell_pointers).enumerate() {
                    let overflow = match cell.overflow_page {
                        Some(p) => format!(", overflow page {p}"),
                        None => String::new(),
                    };
                    writeln!(
                        out,
                        "  cell {i} @{ptr}: rowid {}, payload {} bytes ({} inline{overflow})",
                        cell.rowid,
                        cell.payload_size,
                        cell.inline_payload.len(),
                    )?;
                    if let Some(payload) = self.payloads.get(i) {
                        hex_dump(out, payload, "    ")?;
                    }
                }
                if !self.cell_content.is_empty() {
                    writeln!(out, "  cell content:")?;
                    hex_dump(out, &self.cell_content, "    ")?;
                }
            }
        }
        Ok(())
    }
}

fn write_header<W: Write>(out: &mut W, h: &FileHeader) -> io::Result<()> {
    writeln!(out, "Header string:       {}", h.magic_str())?;
    writeln!(out, "Page size:           {}", h.page_size)?;
    writeln!(out, "Reserved space:      {}", h.reserved_space)?;
    writeln!(out, "Usable size:         {}", h.usable_size())?;
    writeln!(out, "Number of pages:     {}", h.page_count)?;
    writeln!(out, "File change count:   {}", h.file_change_counter)?;
    writeln!(out, "First freelist page: {}", h.freelist_trunk)?;
    writeln!(out, "Freelist page count: {}", h.freelist_count)?;
    writeln!(out, "Schema cookie:       {}", h.schema_cookie)?;
    writeln!(out, "Schema format:       {}", h.schema_format)?;
    writeln!(out, "Text encoding:       {}", h.text_encoding)?;
    writeln!(out, "Read version:        {}", h.read_version)?;
    writeln!(out, "Write version:       {}", h.write_version)?;
    writeln!(out, "User version:        {}", h.user_version)?;
    writeln!(out, "Application id:      {:#010x}", h.application_id)?;
    writeln!(out, "SQLite version:      {}", h.library_version_string())
}

/// The cell content area of a table leaf, clamped to the usable bytes.
fn content_area<'a>(leaf: &TableLeafPage, data: &'a [u8], usable: u32) -> &'a [u8] {
    let end = (usable as usize).min(data.len());
    let start = (leaf.header.cell_content_start as usize).min(end);
    &data[start..end]
}

/// Sixteen bytes per line: offset, hex, printable ASCII.
fn hex_dump<W: Write>(out: &mut W, bytes: &[u8], indent: &str) -> io::Result<()> {
    for (line, chunk) in bytes.chunks(16).enumerate() {
        write!(out, "{indent}{:08x} ", line * 16)?;
        for i in 0..16 {
            if i == 8 {
                write!(out, " ")?;
            }
            match chunk.get(i) {
                Some(b) => write!(out, " {b:02x}")?,
                None => write!(out, "   ")?,
            }
        }
        let ascii: String = chunk
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        writeln!(out, "  |{ascii}|")?;
    }
    Ok(())
}
