//! Options for opening a [`PageStore`](crate::PageStore).

/// How strictly `PageStore::open` validates the file against its header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Fail the open when `page_count * page_size` exceeds the file length.
    ///
    /// When unset the mismatch is only logged, and reading a page past the
    /// end of the file fails with `ShortRead`.
    pub strict_page_count: bool,
}

impl StoreConfig {
    pub fn strict() -> Self {
        Self {
            strict_page_count: true,
        }
    }
}
