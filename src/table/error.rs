use std::{fmt, io};

#[derive(Debug)]
pub enum PagerError {
    /// The backing file is not a whole number of pages.
    CorruptFile { file_length: u64 },
    PageOutOfBounds(u32),
    /// Flush was asked for a page that is not in the cache.
    NullPage(u32),
    Closed,
    Io(io::Error),
}

impl fmt::Display for PagerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CorruptFile { file_length } => write!(
                f,
                "db file is not a whole number of pages ({} bytes), corrupt file",
                file_length
            ),
            Self::PageOutOfBounds(page_num) => {
                write!(f, "tried to fetch page number out of bounds: {}", page_num)
            }
            Self::NullPage(page_num) => write!(f, "tried to flush null page {}", page_num),
            Self::Closed => write!(f, "pager is closed"),
            Self::Io(err) => write!(f, "i/o error: {}", err),
        }
    }
}

impl std::error::Error for PagerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for PagerError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum NodeError {
    InvalidNodeType(u8),
    ChildOutOfRange { child_num: u32, num_keys: u32 },
    /// A stored cell or key count that cannot fit in one page.
    CellCountOutOfRange { count: u32, max: u32 },
    /// A child pointer naming its own page, a page past the end, or an ancestor.
    InvalidChildPointer { page_num: u32, child: u32 },
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidNodeType(byte) => write!(f, "invalid node type: {}", byte),
            Self::ChildOutOfRange {
                child_num,
                num_keys,
            } => write!(
                f,
                "tried to access child_num {} > num_keys {}",
                child_num, num_keys
            ),
            Self::CellCountOutOfRange { count, max } => {
                write!(f, "cell count {} exceeds the maximum of {}", count, max)
            }
            Self::InvalidChildPointer { page_num, child } => {
                write!(f, "page {} has invalid child pointer {}", page_num, child)
            }
        }
    }
}

impl std::error::Error for NodeError {}

#[derive(Debug)]
pub enum TableError {
    CorruptFile { file_length: u64 },
    PageFetch(PagerError),
    Node(NodeError),
    DuplicateKey(u32),
    /// A leaf cell decoded to nothing.
    RowNotFound { page_num: u32, cell_num: u32 },
    RowTooLarge { id: u32, size: usize },
    /// Multi-level search or split propagation, which this engine does not do.
    NotImplemented(&'static str),
    Io(io::Error),
}

impl TableError {
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented(_))
    }
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CorruptFile { file_length } => write!(
                f,
                "db file is not a whole number of pages ({} bytes), corrupt file",
                file_length
            ),
            Self::PageFetch(err) => write!(f, "page fetch error: {}", err),
            Self::Node(err) => write!(f, "malformed node: {}", err),
            Self::DuplicateKey(key) => write!(f, "duplicate key {}", key),
            Self::RowNotFound { page_num, cell_num } => {
                write!(f, "no row at page {} cell {}", page_num, cell_num)
            }
            Self::RowTooLarge { id, size } => {
                write!(f, "row {} needs {} bytes, cell holds at most {}", id, size, super::ROW_SIZE)
            }
            Self::NotImplemented(what) => write!(f, "not implemented: {}", what),
            Self::Io(err) => write!(f, "i/o error: {}", err),
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PageFetch(err) => Some(err),
            Self::Node(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PagerError> for TableError {
    fn from(err: PagerError) -> Self {
        match err {
            PagerError::CorruptFile { file_length } => Self::CorruptFile { file_length },
            err => Self::PageFetch(err),
        }
    }
}

impl From<NodeError> for TableError {
    fn from(err: NodeError) -> Self {
        Self::Node(err)
    }
}

impl From<io::Error> for TableError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}
