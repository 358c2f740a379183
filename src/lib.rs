//! A disk-backed table of `(id, username, email)` rows kept in a paged B-tree.

pub mod table;

pub use table::{
    MetaCommandStatus, PageAccess, Pager, PagerError, Row, Storage, Table, TableError,
};
