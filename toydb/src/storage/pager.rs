//! Page cache over the database file.
//!
//! The pager maps page numbers to in-memory page buffers. Pages are read
//! from the file lazily on first access and held until the pager is
//! flushed; nothing reaches the disk before then.
//!
//! # Invariants
//!
//! - The file size is always a multiple of `PAGE_SIZE`
//! - `num_pages <= max_pages`
//! - Every page number below `num_pages` is either on disk or cached

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::storage::page::{PAGE_SIZE_U64, Page, PageNum};

/// A file-backed page cache with a fixed page capacity.
pub struct Pager {
    file: File,
    /// Cache arena indexed by page number. Grows on demand up to `max_pages`.
    pages: Vec<Option<Page>>,
    /// High-water page count (on disk or allocated in this session).
    num_pages: PageNum,
    /// Number of whole pages present in the file.
    file_pages: PageNum,
    max_pages: PageNum,
}

impl Pager {
    /// Open or create the database file at `path`.
    ///
    /// Fails with `CorruptFile` if the file is not a whole number of pages.
    pub fn open(path: &Path, max_pages: PageNum) -> Result<Self, PagerError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let file_size = file.metadata()?.len();
        if file_size % PAGE_SIZE_U64 != 0 {
            return Err(PagerError::CorruptFile { file_size });
        }

        let pages = file_size / PAGE_SIZE_U64;
        let file_pages = match PageNum::try_from(pages) {
            Ok(n) if n <= max_pages => n,
            _ => return Err(PagerError::TooManyPages { pages, max_pages }),
        };

        tracing::debug!(
            "opened {} ({file_size} bytes, {file_pages} pages, capacity {max_pages})",
            path.display()
        );

        Ok(Self {
            file,
            pages: Vec::new(),
            num_pages: file_pages,
            file_pages,
            max_pages,
        })
    }

    /// Number of pages in use (on disk or allocated).
    #[must_use]
    pub const fn num_pages(&self) -> PageNum {
        self.num_pages
    }

    /// Number of pages that can still be allocated.
    #[must_use]
    pub const fn free_pages(&self) -> PageNum {
        self.max_pages - self.num_pages
    }

    /// Get a page, loading it from disk if it is not cached.
    pub fn page(&mut self, page_num: PageNum) -> Result<&Page, PagerError> {
        self.load(page_num)?;
        self.pages[page_num as usize]
            .as_ref()
            .ok_or(PagerError::PageOutOfBounds {
                page_num,
                max_pages: self.max_pages,
            })
    }

    /// Get mutable access to a page, loading it from disk if it is not cached.
    pub fn page_mut(&mut self, page_num: PageNum) -> Result<&mut Page, PagerError> {
        self.load(page_num)?;
        let max_pages = self.max_pages;
        self.pages[page_num as usize]
            .as_mut()
            .ok_or(PagerError::PageOutOfBounds {
                page_num,
                max_pages,
            })
    }

    /// Allocate the next unused page number and cache a zeroed page for it.
    pub fn allocate_page(&mut self) -> Result<PageNum, PagerError> {
        if self.num_pages >= self.max_pages {
            tracing::warn!("page cache exhausted at {} pages", self.max_pages);
            return Err(PagerError::TableFull {
                max_pages: self.max_pages,
            });
        }

        let page_num = self.num_pages;
        self.num_pages += 1;
        *self.slot(page_num) = Some(Page::new());
        tracing::trace!("allocated page {page_num}");
        Ok(page_num)
    }

    /// Write every cached page back to its file offset, in page order.
    ///
    /// Pages that were never read or allocated are left untouched on disk.
    pub fn flush(&mut self) -> Result<(), PagerError> {
        let mut written = 0usize;
        for (page_num, slot) in self.pages.iter().enumerate() {
            let Some(page) = slot else {
                continue;
            };
            let offset = page_num as u64 * PAGE_SIZE_U64;
            self.file.seek(SeekFrom::Start(offset))?;
            self.file.write_all(page.as_bytes())?;
            written += 1;
        }
        self.file.sync_all()?;
        self.file_pages = self.file_pages.max(self.num_pages);

        tracing::debug!("flushed {written} pages ({} in use)", self.num_pages);
        Ok(())
    }

    /// Flush all cached pages and close the file.
    pub fn close(mut self) -> Result<(), PagerError> {
        self.flush()
    }

    fn slot(&mut self, page_num: PageNum) -> &mut Option<Page> {
        let idx = page_num as usize;
        if self.pages.len() <= idx {
            self.pages.resize_with(idx + 1, || None);
        }
        &mut self.pages[idx]
    }

    fn load(&mut self, page_num: PageNum) -> Result<(), PagerError> {
        if page_num >= self.max_pages {
            return Err(PagerError::PageOutOfBounds {
                page_num,
                max_pages: self.max_pages,
            });
        }

        if self.slot(page_num).is_some() {
            return Ok(());
        }

        // Pages past the end of the file have never been flushed and read as zeroes.
        let mut page = Page::new();
        if page_num < self.file_pages {
            self.file
                .seek(SeekFrom::Start(u64::from(page_num) * PAGE_SIZE_U64))?;
            self.file.read_exact(page.as_bytes_mut())?;
        }
        tracing::trace!("loaded page {page_num}");

        *self.slot(page_num) = Some(page);
        if page_num >= self.num_pages {
            self.num_pages = page_num + 1;
        }
        Ok(())
    }
}

/// Errors that can occur during pager operations.
#[derive(Debug)]
pub enum PagerError {
    /// I/O error.
    Io(std::io::Error),
    /// File size is not a whole number of pages.
    CorruptFile { file_size: u64 },
    /// File holds more pages than the cache can address.
    TooManyPages { pages: u64, max_pages: PageNum },
    /// Page number beyond the cache capacity.
    PageOutOfBounds { page_num: PageNum, max_pages: PageNum },
    /// No page left to allocate.
    TableFull { max_pages: PageNum },
}

impl std::fmt::Display for PagerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::CorruptFile { file_size } => write!(
                f,
                "db file is not a whole number of pages ({file_size} bytes), corrupt file"
            ),
            Self::TooManyPages { pages, max_pages } => {
                write!(f, "db file holds {pages} pages but capacity is {max_pages}")
            }
            Self::PageOutOfBounds {
                page_num,
                max_pages,
            } => write!(
                f,
                "tried to fetch page {page_num} out of bounds (max pages: {max_pages})"
            ),
            Self::TableFull { max_pages } => write!(f, "table is full ({max_pages} pages)"),
        }
    }
}

impl std::error::Error for PagerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::CorruptFile { .. }
            | Self::TooManyPages { .. }
            | Self::PageOutOfBounds { .. }
            | Self::TableFull { .. } => None,
        }
    }
}

impl From<std::io::Error> for PagerError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
