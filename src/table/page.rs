use std::ops::{Deref, DerefMut};

use super::PAGE_SIZE;

/// One page-sized buffer, the unit of caching and file I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    buffer: Box<[u8; PAGE_SIZE]>,
}

impl Deref for Page {
    type Target = [u8; PAGE_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl DerefMut for Page {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl Page {
    pub fn init() -> Self {
        Self {
            buffer: Box::new([0; PAGE_SIZE]),
        }
    }

    pub fn read_u8_at(&self, pos: usize) -> u8 {
        self.buffer[pos]
    }

    pub fn write_u8_at(&mut self, pos: usize, val: u8) {
        self.buffer[pos] = val;
    }

    pub fn read_u32_at(&self, pos: usize) -> u32 {
        let mut bytes = [0; 4];
        bytes.copy_from_slice(&self.buffer[pos..pos + 4]);
        u32::from_le_bytes(bytes)
    }

    pub fn write_u32_at(&mut self, pos: usize, val: u32) {
        self.buffer[pos..pos + 4].copy_from_slice(&val.to_le_bytes());
    }

    pub fn read_buf_at(&self, pos: usize, len: usize) -> &[u8] {
        &self.buffer[pos..pos + len]
    }

    pub fn write_buf_at(&mut self, pos: usize, buf: &[u8]) {
        self.buffer[pos..pos + buf.len()].copy_from_slice(buf);
    }
}

#[cfg(test)]
mod page {
    use crate::table::PAGE_SIZE;

    use super::Page;

    #[test]
    fn init() {
        let page = Page::init();
        assert_eq!(*page.buffer, [0; PAGE_SIZE]);
    }

    #[test]
    fn write_read_buf() {
        let mut page = Page::init();
        page.write_buf_at(0, &[1, 2, 3]);
        page.write_buf_at(0, &[1, 2, 3]);
        assert_eq!(page.read_buf_at(0, 3), &[1, 2, 3]);
    }

    #[test]
    fn simple_read_write() {
        let mut page = Page::init();
        page.write_u32_at(0, 12);
        assert_eq!(page.read_u32_at(0), 12);
    }

    #[test]
    fn unaligned_read_write() {
        let mut page = Page::init();
        page.write_u32_at(2, 0x12345678);
        assert_eq!(page.read_u32_at(2), 0x12345678);
        assert_eq!(page.read_buf_at(2, 4), &[0x78, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn last_word_of_page() {
        let mut page = Page::init();
        page.write_u32_at(PAGE_SIZE - 4, u32::MAX);
        assert_eq!(page.read_u32_at(PAGE_SIZE - 4), u32::MAX);
    }

    #[test]
    #[should_panic]
    fn write_out_of_bound() {
        let mut page = Page::init();
        page.write_u32_at(PAGE_SIZE - 2, 1);
    }
}
