//! In-memory database images for unit tests.

use std::io::Write;

use tempfile::NamedTempFile;

use crate::header::{HEADER_SIZE, MAGIC};
use crate::pager::PageNum;
use crate::varint::write_varint;

include!("../tests/common/image.rs");
