//! Pager: page-level read access to a database file.
//!
//! The store owns the file handle and the decoded header. Every read goes
//! straight to the file; there is no buffer pool, so two reads of the same
//! page return equal but independently allocated buffers.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::btree::{self, BTreePage};
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::header::{FileHeader, HEADER_SIZE};

/// A page number (1-based). Page 1 starts with the file header.
pub type PageNum = u32;

/// One page exactly as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    number: PageNum,
    data: Vec<u8>,
}

impl Page {
    pub fn new(number: PageNum, data: Vec<u8>) -> Self {
        Self { number, data }
    }

    pub fn number(&self) -> PageNum {
        self.number
    }

    /// All `page_size` bytes, including the file header on page 1.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Offset of the page-local b-tree header: 100 on page 1, else 0.
    pub fn header_offset(&self) -> usize {
        if self.number == 1 {
            HEADER_SIZE
        } else {
            0
        }
    }
}

/// Read-only, bounds-checked page access to one database file.
pub struct PageStore {
    path: PathBuf,
    /// `None` once closed.
    file: Option<File>,
    header: FileHeader,
    file_len: u64,
}

impl PageStore {
    /// Open a database file and decode its header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, StoreConfig::default())
    }

    pub fn open_with_config<P: AsRef<Path>>(path: P, config: StoreConfig) -> Result<Self> {
        let path = path.as_ref();
        let open_err = |source| Error::Open {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(open_err)?;
        let file_len = file.metadata().map_err(open_err)?.len();

        let mut buf = [0u8; HEADER_SIZE];
        let got = read_full(&mut file, &mut buf).map_err(open_err)?;
        let header = FileHeader::decode(&buf[..got])?;

        if header.database_size() > file_len {
            if config.strict_page_count {
                return Err(Error::PageCountExceedsFile {
                    page_count: header.page_count,
                    page_size: header.page_size,
                    file_len,
                });
            }
            warn!(
                path = %path.display(),
                page_count = header.page_count,
                page_size = header.page_size,
                file_len,
                "header page count overruns the file"
            );
        }

        debug!(
            path = %path.display(),
            page_size = header.page_size,
            page_count = header.page_count,
            usable_size = header.usable_size(),
            "opened database"
        );

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            header,
            file_len,
        })
    }

    /// Returns a reference to the file header.
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Length of the file at open time.
    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    pub fn page_size(&self) -> usize {
        self.header.page_size as usize
    }

    pub fn usable_size(&self) -> u32 {
        self.header.usable_size()
    }

    /// Number of pages according to the header.
    pub fn page_count(&self) -> u32 {
        self.header.page_count
    }

    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    /// Read page `page_num` in full.
    pub fn read_page(&mut self, page_num: PageNum) -> Result<Page> {
        if page_num == 0 || page_num > self.header.page_count {
            return Err(Error::PageOutOfRange {
                page: page_num,
                page_count: self.header.page_count,
            });
        }
        let page_size = self.page_size();
        let file = self.file.as_mut().ok_or(Error::Closed)?;

        let offset = u64::from(page_num - 1) * page_size as u64;
        let io_err = |source| Error::Io {
            page: page_num,
            source,
        };
        file.seek(SeekFrom::Start(offset)).map_err(io_err)?;

        let mut data = vec![0u8; page_size];
        let got = read_full(file, &mut data).map_err(io_err)?;
        if got < page_size {
            warn!(
                page = page_num,
                expected = page_size,
                got,
                "short read: file truncated"
            );
            return Err(Error::ShortRead {
                page: page_num,
                expected: page_size,
                actual: got,
            });
        }

        debug!(page = page_num, offset, "read page");
        Ok(Page::new(page_num, data))
    }

    /// Read page `page_num` and decode it as a b-tree page.
    pub fn decode_page(&mut self, page_num: PageNum) -> Result<BTreePage> {
        let page = self.read_page(page_num)?;
        btree::decode_page(&page, self.usable_size())
    }

    /// Release the file handle. Safe to call more than once.
    pub fn close(&mut self) {
        if self.file.take().is_some() {
            debug!(path = %self.path.display(), "closed database");
        }
    }
}

/// Read until `buf` is full or EOF, returning the byte count.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::DbImage;

    #[test]
    fn open_reads_header() {
        let image = DbImage::new(1024, 3);
        let file = image.write_temp();

        let store = PageStore::open(file.path()).unwrap();
        assert_eq!(store.page_size(), 1024);
        assert_eq!(store.page_count(), 3);
        assert_eq!(store.usable_size(), 1024);
        assert_eq!(store.file_len(), 3 * 1024);
        assert_eq!(store.path(), file.path());
    }

    #[test]
    fn open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.db");
        match PageStore::open(&path) {
            Err(Error::Open { path: p, source }) => {
                assert_eq!(p, path);
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected Open error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn open_file_shorter_than_header() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"SQLite format 3\0").unwrap();
        assert!(matches!(
            PageStore::open(file.path()),
            Err(Error::TruncatedInput {
                expected: 100,
                actual: 16
            })
        ));
    }

    #[test]
    fn read_page_bounds() {
        let file = DbImage::new(512, 2).write_temp();
        let mut store = PageStore::open(file.path()).unwrap();

        assert!(matches!(
            store.read_page(0),
            Err(Error::PageOutOfRange {
                page: 0,
                page_count: 2
            })
        ));
        assert!(matches!(
            store.read_page(3),
            Err(Error::PageOutOfRange {
                page: 3,
                page_count: 2
            })
        ));

        for n in 1..=2 {
            let page = store.read_page(n).unwrap();
            assert_eq!(page.number(), n);
            assert_eq!(page.data().len(), 512);
        }
    }

    #[test]
    fn read_page_returns_bytes_at_offset() {
        let mut image = DbImage::new(512, 3);
        image.page_mut(2)[0..5].copy_from_slice(b"hello");
        image.page_mut(3)[507..512].copy_from_slice(b"world");
        let file = image.write_temp();

        let mut store = PageStore::open(file.path()).unwrap();
        let page1 = store.read_page(1).unwrap();
        assert_eq!(&page1.data()[0..16], crate::header::MAGIC);
        assert_eq!(page1.header_offset(), 100);

        let page2 = store.read_page(2).unwrap();
        assert_eq!(&page2.data()[0..5], b"hello");
        assert_eq!(page2.header_offset(), 0);

        let page3 = store.read_page(3).unwrap();
        assert_eq!(&page3.data()[507..], b"world");
    }

    #[test]
    fn repeated_reads_are_equal() {
        let file = DbImage::new(512, 2).write_temp();
        let mut store = PageStore::open(file.path()).unwrap();
        assert_eq!(store.read_page(2).unwrap(), store.read_page(2).unwrap());
    }

    #[test]
    fn truncated_file_short_read() {
        let image = DbImage::new(512, 3);
        let mut bytes = image.into_bytes();
        bytes.truncate(512 * 2 + 100);
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), &bytes).unwrap();

        let mut store = PageStore::open(file.path()).unwrap();
        assert!(store.read_page(2).is_ok());
        assert!(matches!(
            store.read_page(3),
            Err(Error::ShortRead {
                page: 3,
                expected: 512,
                actual: 100
            })
        ));
    }

    #[test]
    fn strict_config_rejects_overrun() {
        let image = DbImage::new(512, 3);
        let mut bytes = image.into_bytes();
        bytes.truncate(512 * 2);
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), &bytes).unwrap();

        assert!(matches!(
            PageStore::open_with_config(file.path(), StoreConfig::strict()),
            Err(Error::PageCountExceedsFile {
                page_count: 3,
                page_size: 512,
                file_len: 1024
            })
        ));
        assert!(PageStore::open(file.path()).is_ok());
    }

    #[test]
    fn close_is_idempotent() {
        let file = DbImage::new(512, 1).write_temp();
        let mut store = PageStore::open(file.path()).unwrap();
        assert!(!store.is_closed());

        store.close();
        store.close();
        assert!(store.is_closed());
        assert!(matches!(store.read_page(1), Err(Error::Closed)));
    }

    #[test]
    fn close_after_failed_read() {
        let file = DbImage::new(512, 1).write_temp();
        let mut store = PageStore::open(file.path()).unwrap();
        assert!(store.read_page(5).is_err());
        store.close();
        assert!(store.is_closed());
    }

    #[test]
    fn independent_stores_on_one_file() {
        let mut image = DbImage::new(512, 2);
        image.page_mut(2)[0] = 0xAB;
        let file = image.write_temp();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let path = file.path().to_path_buf();
                std::thread::spawn(move || {
                    let mut store = PageStore::open(path).unwrap();
                    store.read_page(2).unwrap().data()[0]
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 0xAB);
        }
    }
}
