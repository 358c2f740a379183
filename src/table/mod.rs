use std::mem::size_of;

pub mod btree;
mod cursor;
mod error;
mod page;
mod pager;
mod row;
mod storage;
mod table;

pub use cursor::Cursor;
pub use error::{NodeError, PagerError, TableError};
pub use page::Page;
pub use pager::Pager;
pub use row::Row;
pub use storage::{MetaCommandStatus, PageAccess, Storage};
pub use table::Table;

pub const COLUMN_ID_SIZE: usize = size_of::<u32>();
pub const COLUMN_USERNAME_SIZE: usize = 255;
pub const COLUMN_EMAIL_SIZE: usize = 255;
pub const PAGE_SIZE: usize = 1 << 12;
pub const TABLE_MAX_PAGES: usize = 100;
/// Payload slot reserved for a row inside a leaf cell.
pub const ROW_SIZE: usize = COLUMN_ID_SIZE + COLUMN_USERNAME_SIZE + COLUMN_EMAIL_SIZE;
