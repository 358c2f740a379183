use std::io::Write;

use super::{page::Page, Pager, PagerError, Row, Table, TableError};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MetaCommandStatus {
    Success,
    UnrecognizedCommand,
}

/// Raw page access handed out by a storage engine.
pub trait PageAccess {
    fn get_page(&mut self, page_num: u32) -> Result<&mut Page, PagerError>;
    fn flush(&mut self, page_num: u32, size: usize) -> Result<(), PagerError>;
    fn num_pages(&self) -> u32;
}

/// What a command dispatcher needs from a storage engine.
pub trait Storage {
    type Pager: PageAccess;

    fn insert(&mut self, row: &Row) -> Result<(), TableError>;
    fn select(&mut self) -> Result<Vec<Row>, TableError>;
    fn close(&mut self) -> Result<(), TableError>;
    fn pager(&mut self) -> &mut Self::Pager;
    /// Runs a dot-command such as `.btree`, writing its output to `out`.
    fn execute_meta(
        &mut self,
        command: &[u8],
        out: &mut dyn Write,
    ) -> Result<MetaCommandStatus, TableError>;
}

impl PageAccess for Pager {
    fn get_page(&mut self, page_num: u32) -> Result<&mut Page, PagerError> {
        Pager::get_page(self, page_num)
    }

    fn flush(&mut self, page_num: u32, size: usize) -> Result<(), PagerError> {
        Pager::flush(self, page_num, size)
    }

    fn num_pages(&self) -> u32 {
        Pager::num_pages(self)
    }
}

impl Storage for Table {
    type Pager = Pager;

    fn insert(&mut self, row: &Row) -> Result<(), TableError> {
        Table::insert(self, row)
    }

    fn select(&mut self) -> Result<Vec<Row>, TableError> {
        Table::select(self)
    }

    fn close(&mut self) -> Result<(), TableError> {
        Table::close(self)
    }

    fn pager(&mut self) -> &mut Pager {
        Table::pager(self)
    }

    fn execute_meta(
        &mut self,
        command: &[u8],
        out: &mut dyn Write,
    ) -> Result<MetaCommandStatus, TableError> {
        Table::execute_meta(self, command, out)
    }
}
