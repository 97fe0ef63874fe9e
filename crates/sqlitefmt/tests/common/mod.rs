//! In-memory database images for integration tests.

#![allow(dead_code)]

use std::io::Write;

use sqlitefmt::header::{HEADER_SIZE, MAGIC};
use sqlitefmt::varint::write_varint;
use sqlitefmt::PageNum;
use tempfile::NamedTempFile;

include!("image.rs");
