
use std::{
    fs::File,
    io::{Read, Seek, SeekFrom, Write},
    path::Path,
};

use log::{debug, info};

use super::{error::PagerError, page::Page, PAGE_SIZE, TABLE_MAX_PAGES};

#[derive(Debug)]
pub struct Pager {
    file: Option<File>,
    file_length: u64,

    pages_num: u32,
    // Pages in memory
    pages: Vec<Option<Page>>,
}

impl Pager {
    pub fn open<P: AsRef<Path>>(filename: P) -> Result<Self, PagerError> {
        let mut file = File::options()
            .write(true)
            .create(true)
            .read(true)
            .open(filename.as_ref())?;
        let file_length = file.seek(SeekFrom::End(0))?;
        if file_length % PAGE_SIZE as u64 != 0 {
            return Err(PagerError::CorruptFile { file_length });
        }

        let pages_num = (file_length / PAGE_SIZE as u64) as u32;
        info!(
            "Opened {} with {} page(s)",
            filename.as_ref().display(),
            pages_num
        );
        Ok(Self {
            file: Some(file),
            file_length,
            pages_num,
            pages: (0..TABLE_MAX_PAGES).map(|_| None).collect(),
        })
    }

    pub fn num_pages(&self) -> u32 {
        self.pages_num
    }

    /// Page numbers are handed out monotonically and never reused.
    pub fn unused_page_num(&self) -> u32 {
        self.pages_num
    }

    pub fn is_cached(&self, page_num: u32) -> bool {
        self.pages
            .get(page_num as usize)
            .map_or(false, |page| page.is_some())
    }

    pub fn get_page(&mut self, page_num: u32) -> Result<&mut Page, PagerError> {
        // There are 3 cases that should be handled:
        // - Requested page not allowed (pass limit)
        // - Cache miss, page is on disk or not initialized yet
        // - Page already in cache
        let idx = page_num as usize;
        if idx >= TABLE_MAX_PAGES {
            return Err(PagerError::PageOutOfBounds(page_num));
        }

        if self.pages[idx].is_none() {
            let file = self.file.as_mut().ok_or(PagerError::Closed)?;
            let mut page = Page::init();
            let mut pages_on_disk = self.file_length / PAGE_SIZE as u64;
            if self.file_length % PAGE_SIZE as u64 != 0 {
                pages_on_disk += 1;
            }

            if (page_num as u64) < pages_on_disk {
                debug!("Loading page {} from disk", page_num);
                file.seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
                file.read_exact(page.as_mut_slice())?;
            }
            self.pages[idx] = Some(page);
        }

        if page_num >= self.pages_num {
            self.pages_num = page_num + 1;
        }

        self.pages[idx].as_mut().ok_or(PagerError::NullPage(page_num))
    }

    pub fn flush(&mut self, page_num: u32, size: usize) -> Result<(), PagerError> {
        let page = self
            .pages
            .get(page_num as usize)
            .and_then(Option::as_ref)
            .ok_or(PagerError::NullPage(page_num))?;
        let file = self.file.as_mut().ok_or(PagerError::Closed)?;

        debug!("Flushing page {}", page_num);
        file.seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
        file.write_all(&page[..size.min(PAGE_SIZE)])?;
        Ok(())
    }

    /// Flushes every cached page below the page count, then releases the file.
    /// Closing twice is a no-op.
    pub fn close(&mut self) -> Result<(), PagerError> {
        if self.file.is_none() {
            return Ok(());
        }

        for page_num in 0..self.pages_num {
            if !self.is_cached(page_num) {
                continue;
            }
            self.flush(page_num, PAGE_SIZE)?;
            self.pages[page_num as usize] = None;
        }

        if let Some(file) = self.file.take() {
            file.sync_all()?;
        }
        self.pages.iter_mut().for_each(|page| *page = None);
        info!("Closed pager after writing {} page(s)", self.pages_num);
        Ok(())
    }
}
