use std::mem::size_of;

use crate::table::{error::NodeError, page::Page, PAGE_SIZE, ROW_SIZE};

pub type NodeKey = u32;
pub type NodePointer = u32;
pub type CellsCount = u32;

/// Common Node Header Layout
/// (<offset>, <size>)
pub const NODE_TYPE: (usize, usize) = (0, size_of::<u8>());
/// (<offset>, <size>)
pub const IS_ROOT: (usize, usize) = (NODE_TYPE.0 + NODE_TYPE.1, size_of::<u8>());
/// (<offset>, <size>)
pub const PARENT_POINTER: (usize, usize) = (IS_ROOT.0 + IS_ROOT.1, size_of::<NodePointer>());
pub const COMMON_NODE_HEADER_SIZE: usize = NODE_TYPE.1 + IS_ROOT.1 + PARENT_POINTER.1;

/// Leaf Node Header Layout
/// (<offset>, <size>)
pub const LEAF_NODE_NUM_CELLS: (usize, usize) = (COMMON_NODE_HEADER_SIZE, size_of::<CellsCount>());
pub const LEAF_NODE_HEADER_SIZE: usize = COMMON_NODE_HEADER_SIZE + LEAF_NODE_NUM_CELLS.1;

/// Leaf Node Body Layout
/// (<offset>, <size>)
pub const LEAF_NODE_KEY: (usize, usize) = (0, size_of::<NodeKey>());
/// (<offset>, <size>)
pub const LEAF_NODE_VAL: (usize, usize) = (LEAF_NODE_KEY.0 + LEAF_NODE_KEY.1, ROW_SIZE);
pub const LEAF_NODE_CELL_SIZE: usize = LEAF_NODE_KEY.1 + LEAF_NODE_VAL.1;
pub const LEAF_NODE_SPACE_FOR_CELLS: usize = PAGE_SIZE - LEAF_NODE_HEADER_SIZE;
pub const LEAF_NODE_MAX_CELLS: usize = LEAF_NODE_SPACE_FOR_CELLS / LEAF_NODE_CELL_SIZE;

/// Cells kept by the page that was split. These are the upper-sorted half.
pub const LEAF_NODE_RIGHT_SPLIT_COUNT: usize = (LEAF_NODE_MAX_CELLS + 2) / 2;
/// Cells moved to the freshly allocated page. These are the lower-sorted half.
pub const LEAF_NODE_LEFT_SPLIT_COUNT: usize = (LEAF_NODE_MAX_CELLS + 1) - LEAF_NODE_RIGHT_SPLIT_COUNT;

/// Internal Node Header Layout
/// (<offset>, <size>)
pub const INTERNAL_NODE_NUM_KEYS: (usize, usize) = (COMMON_NODE_HEADER_SIZE, size_of::<CellsCount>());
/// (<offset>, <size>)
pub const INTERNAL_NODE_RIGHT_CHILD: (usize, usize) = (
    INTERNAL_NODE_NUM_KEYS.0 + INTERNAL_NODE_NUM_KEYS.1,
    size_of::<NodePointer>(),
);
pub const INTERNAL_NODE_HEADER_SIZE: usize =
    COMMON_NODE_HEADER_SIZE + INTERNAL_NODE_NUM_KEYS.1 + INTERNAL_NODE_RIGHT_CHILD.1;

/// Internal Node Body Layout
/// (<offset>, <size>)
pub const INTERNAL_NODE_KEY: (usize, usize) = (0, size_of::<NodeKey>());
/// (<offset>, <size>)
pub const INTERNAL_NODE_CHILD: (usize, usize) = (
    INTERNAL_NODE_KEY.0 + INTERNAL_NODE_KEY.1,
    size_of::<NodePointer>(),
);
pub const INTERNAL_NODE_CELL_SIZE: usize = INTERNAL_NODE_KEY.1 + INTERNAL_NODE_CHILD.1;
pub const INTERNAL_NODE_MAX_CELLS: usize =
    (PAGE_SIZE - INTERNAL_NODE_HEADER_SIZE) / INTERNAL_NODE_CELL_SIZE;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum NodeType {
    Internal,
    Leaf,
}

impl NodeType {
    pub fn from_u8(byte: u8) -> Result<Self, NodeError> {
        match byte {
            0x0 => Ok(Self::Internal),
            0x1 => Ok(Self::Leaf),
            _ => Err(NodeError::InvalidNodeType(byte)),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Self::Internal => 0x0,
            Self::Leaf => 0x1,
        }
    }
}

/// Each node of the btree is contained inside 1 page
pub struct Node<'a> {
    page: &'a mut Page,
}

impl<'a> Node<'a> {
    pub fn new(page: &'a mut Page) -> Self {
        Node { page }
    }

    /// Resets the header to an empty, non-root leaf.
    pub fn initialize_leaf(&mut self) {
        self.write_node_type(NodeType::Leaf);
        self.write_is_root(false);
        self.write_num_cells(0);
    }

    /// Resets the header to an internal node with no keys.
    pub fn initialize_internal(&mut self) {
        self.write_node_type(NodeType::Internal);
        self.write_is_root(false);
        self.write_num_keys(0);
    }

    pub fn read_node_type(&self) -> Result<NodeType, NodeError> {
        NodeType::from_u8(self.page.read_u8_at(NODE_TYPE.0))
    }

    pub fn write_node_type(&mut self, node_type: NodeType) {
        self.page.write_u8_at(NODE_TYPE.0, node_type.to_u8());
    }

    pub fn read_is_root(&self) -> bool {
        self.page.read_u8_at(IS_ROOT.0) == 1
    }

    pub fn write_is_root(&mut self, is_root: bool) {
        self.page.write_u8_at(IS_ROOT.0, is_root as u8);
    }

    pub fn read_parent_pointer(&self) -> NodePointer {
        self.page.read_u32_at(PARENT_POINTER.0)
    }

    pub fn write_parent_pointer(&mut self, parent_pointer: NodePointer) {
        self.page.write_u32_at(PARENT_POINTER.0, parent_pointer);
    }

    /// Largest key stored in the node, `None` when it is empty.
    pub fn max_key(&self) -> Result<Option<NodeKey>, NodeError> {
        let key = match self.read_node_type()? {
            NodeType::Leaf => self
                .checked_num_cells()?
                .checked_sub(1)
                .map(|cell_num| self.read_key(cell_num)),
            NodeType::Internal => self
                .checked_num_keys()?
                .checked_sub(1)
                .map(|key_num| self.read_internal_key(key_num)),
        };
        Ok(key)
    }

    // Leaf accessors

    pub fn read_num_cells(&self) -> CellsCount {
        self.page.read_u32_at(LEAF_NODE_NUM_CELLS.0)
    }

    /// Cell count as stored, rejected when it is more than a leaf can hold.
    pub fn checked_num_cells(&self) -> Result<CellsCount, NodeError> {
        let count = self.read_num_cells();
        if count as usize > LEAF_NODE_MAX_CELLS {
            return Err(NodeError::CellCountOutOfRange {
                count,
                max: LEAF_NODE_MAX_CELLS as u32,
            });
        }
        Ok(count)
    }

    pub fn write_num_cells(&mut self, num_cells: CellsCount) {
        self.page.write_u32_at(LEAF_NODE_NUM_CELLS.0, num_cells);
    }

    fn cell_pos(cell_num: u32) -> usize {
        LEAF_NODE_HEADER_SIZE + (cell_num as usize * LEAF_NODE_CELL_SIZE)
    }

    pub fn read_key(&self, cell_num: u32) -> NodeKey {
        self.page
            .read_u32_at(Self::cell_pos(cell_num) + LEAF_NODE_KEY.0)
    }

    pub fn write_key(&mut self, cell_num: u32, key: NodeKey) {
        self.page
            .write_u32_at(Self::cell_pos(cell_num) + LEAF_NODE_KEY.0, key);
    }

    pub fn read_val(&self, cell_num: u32) -> &[u8] {
        let val_start = Self::cell_pos(cell_num) + LEAF_NODE_VAL.0;
        self.page.read_buf_at(val_start, LEAF_NODE_VAL.1)
    }

    /// Writes `val` into the cell's payload slot and zeroes the rest of it.
    pub fn write_val(&mut self, cell_num: u32, val: &[u8]) {
        assert!(val.len() <= LEAF_NODE_VAL.1, "Value does not fit in a cell");
        let val_start = Self::cell_pos(cell_num) + LEAF_NODE_VAL.0;
        let slot = &mut self.page[val_start..val_start + LEAF_NODE_VAL.1];
        slot[..val.len()].copy_from_slice(val);
        slot[val.len()..].fill(0);
    }

    pub fn read_cell(&self, cell_num: u32) -> &[u8] {
        self.page
            .read_buf_at(Self::cell_pos(cell_num), LEAF_NODE_CELL_SIZE)
    }

    pub fn write_cell(&mut self, cell_num: u32, cell: &[u8]) {
        assert_eq!(cell.len(), LEAF_NODE_CELL_SIZE);
        self.page.write_buf_at(Self::cell_pos(cell_num), cell);
    }

    /// Inserts `(key, val)` at `cell_num`, shifting the cells after it one slot
    /// to the right. The leaf must have room for one more cell.
    pub fn insert(&mut self, cell_num: u32, key: NodeKey, val: &[u8]) {
        let num_cells = self.read_num_cells();
        assert!(
            (num_cells as usize) < LEAF_NODE_MAX_CELLS,
            "Leaf node is full, it has to be split"
        );
        assert!(cell_num <= num_cells);

        if cell_num < num_cells {
            let from = Self::cell_pos(cell_num);
            let to = Self::cell_pos(num_cells);
            self.page.copy_within(from..to, from + LEAF_NODE_CELL_SIZE);
        }

        self.write_key(cell_num, key);
        self.write_val(cell_num, val);
        self.write_num_cells(num_cells + 1);
    }

    /// Index of the first cell whose key is `>= key`.
    pub fn find_cell(&self, key: NodeKey) -> Result<u32, NodeError> {
        let mut lo = 0;
        let mut hi = self.checked_num_cells()?;
        while lo != hi {
            let mid = (lo + hi) / 2;
            let key_at_mid = self.read_key(mid);
            if key_at_mid == key {
                return Ok(mid);
            }
            if key < key_at_mid {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        Ok(lo)
    }

    // Internal accessors

    pub fn read_num_keys(&self) -> CellsCount {
        self.page.read_u32_at(INTERNAL_NODE_NUM_KEYS.0)
    }

    pub fn checked_num_keys(&self) -> Result<CellsCount, NodeError> {
        let count = self.read_num_keys();
        if count as usize > INTERNAL_NODE_MAX_CELLS {
            return Err(NodeError::CellCountOutOfRange {
                count,
                max: INTERNAL_NODE_MAX_CELLS as u32,
            });
        }
        Ok(count)
    }

    pub fn write_num_keys(&mut self, num_keys: CellsCount) {
        self.page.write_u32_at(INTERNAL_NODE_NUM_KEYS.0, num_keys);
    }

    pub fn read_right_child(&self) -> NodePointer {
        self.page.read_u32_at(INTERNAL_NODE_RIGHT_CHILD.0)
    }

    pub fn write_right_child(&mut self, page_num: NodePointer) {
        self.page.write_u32_at(INTERNAL_NODE_RIGHT_CHILD.0, page_num);
    }

    fn internal_cell_pos(cell_num: u32) -> usize {
        INTERNAL_NODE_HEADER_SIZE + (cell_num as usize * INTERNAL_NODE_CELL_SIZE)
    }

    pub fn read_internal_key(&self, key_num: u32) -> NodeKey {
        self.page
            .read_u32_at(Self::internal_cell_pos(key_num) + INTERNAL_NODE_KEY.0)
    }

    pub fn write_internal_key(&mut self, key_num: u32, key: NodeKey) {
        self.page
            .write_u32_at(Self::internal_cell_pos(key_num) + INTERNAL_NODE_KEY.0, key);
    }

    /// Offset of the pointer to child `child_num`; `num_keys` names the right child.
    fn child_pos(&self, child_num: u32) -> Result<usize, NodeError> {
        let num_keys = self.checked_num_keys()?;
        if child_num > num_keys {
            Err(NodeError::ChildOutOfRange {
                child_num,
                num_keys,
            })
        } else if child_num == num_keys {
            Ok(INTERNAL_NODE_RIGHT_CHILD.0)
        } else {
            Ok(Self::internal_cell_pos(child_num) + INTERNAL_NODE_CHILD.0)
        }
    }

    pub fn read_child(&self, child_num: u32) -> Result<NodePointer, NodeError> {
        let pos = self.child_pos(child_num)?;
        Ok(self.page.read_u32_at(pos))
    }

    pub fn write_child(&mut self, child_num: u32, page_num: NodePointer) -> Result<(), NodeError> {
        let pos = self.child_pos(child_num)?;
        self.page.write_u32_at(pos, page_num);
        Ok(())
    }
}

#[cfg(test)]
mod node {
    use crate::table::{error::NodeError, page::Page, ROW_SIZE};

    use super::*;

    #[test]
    fn layout_constants() {
        assert_eq!(ROW_SIZE, 514);
        assert_eq!(COMMON_NODE_HEADER_SIZE, 6);
        assert_eq!(LEAF_NODE_HEADER_SIZE, 10);
        assert_eq!(LEAF_NODE_CELL_SIZE, 518);
        assert_eq!(LEAF_NODE_SPACE_FOR_CELLS, 4086);
        assert_eq!(LEAF_NODE_MAX_CELLS, 7);
        assert_eq!(LEAF_NODE_RIGHT_SPLIT_COUNT, 4);
        assert_eq!(LEAF_NODE_LEFT_SPLIT_COUNT, 4);
        assert_eq!(INTERNAL_NODE_HEADER_SIZE, 14);
        assert_eq!(INTERNAL_NODE_CELL_SIZE, 8);
    }

    #[test]
    fn node_type() {
        let mut page = Page::init();
        let mut node = Node::new(&mut page);
        node.write_node_type(NodeType::Leaf);
        assert_eq!(node.read_node_type(), Ok(NodeType::Leaf));
        node.write_node_type(NodeType::Internal);
        assert_eq!(node.read_node_type(), Ok(NodeType::Internal));
    }

    #[test]
    fn invalid_node_type() {
        let mut page = Page::init();
        page[0] = 0x9;
        let node = Node::new(&mut page);
        assert_eq!(node.read_node_type(), Err(NodeError::InvalidNodeType(0x9)));
    }

    #[test]
    fn header_bytes() {
        let mut page = Page::init();
        let mut node = Node::new(&mut page);
        node.initialize_leaf();
        node.write_is_root(true);
        node.write_parent_pointer(0x0a0b0c0d);
        node.write_num_cells(3);
        assert_eq!(&page[..10], &[1, 1, 0x0d, 0x0c, 0x0b, 0x0a, 3, 0, 0, 0]);
    }

    #[test]
    fn parent_pointer() {
        let mut page = Page::init();
        let mut node = Node::new(&mut page);
        node.write_parent_pointer(10);
        assert_eq!(node.read_parent_pointer(), 10);
    }

    #[test]
    fn is_root_is_independent_of_type() {
        let mut page = Page::init();
        let mut node = Node::new(&mut page);
        node.write_is_root(true);
        node.initialize_internal();
        assert!(!node.read_is_root());
        node.write_is_root(true);
        assert_eq!(node.read_node_type(), Ok(NodeType::Internal));
        assert!(node.read_is_root());
    }

    #[test]
    fn cell_nums() {
        let mut page = Page::init();
        let mut node = Node::new(&mut page);
        node.write_num_cells(10);
        assert_eq!(node.read_num_cells(), 10);
        node.initialize_leaf();
        assert_eq!(node.read_num_cells(), 0);
    }

    #[test]
    fn write_key() {
        let mut page = Page::init();
        let mut node = Node::new(&mut page);
        node.write_key(0, 10);
        assert_eq!(node.read_key(0), 10);
        assert_eq!(page.read_u32_at(LEAF_NODE_HEADER_SIZE), 10);
    }

    #[test]
    fn write_val_clears_stale_bytes() {
        let mut page = Page::init();
        let mut node = Node::new(&mut page);
        node.write_val(1, &[0xff; ROW_SIZE]);
        node.write_val(1, &[1, 2, 3]);
        let val = node.read_val(1);
        assert_eq!(&val[..3], &[1, 2, 3]);
        assert!(val[3..].iter().all(|b| *b == 0));
    }

    #[test]
    fn basic_insert() {
        let mut page = Page::init();
        let mut node = Node::new(&mut page);
        node.initialize_leaf();
        let dummy_val = [12; ROW_SIZE];
        node.insert(0, 10, &dummy_val);
        node.insert(0, 20, &dummy_val);
        assert_eq!(node.read_key(0), 20);
        assert_eq!(node.read_key(1), 10);
    }

    #[test]
    fn insert_at_the_back() {
        let mut page = Page::init();
        let mut node = Node::new(&mut page);
        node.initialize_leaf();
        node.insert(0, 10, &[1; ROW_SIZE]);
        node.insert(1, 20, &[2; ROW_SIZE]);
        node.insert(2, 30, &[3; ROW_SIZE]);
        assert_eq!(node.read_key(0), 10);
        assert_eq!(node.read_key(1), 20);
        assert_eq!(node.read_key(2), 30);
        assert_eq!(node.read_val(2), &[3; ROW_SIZE]);
    }

    #[test]
    fn insert_in_the_middle() {
        let mut page = Page::init();
        let mut node = Node::new(&mut page);
        node.initialize_leaf();
        node.insert(0, 10, &[1; ROW_SIZE]);
        node.insert(1, 30, &[3; ROW_SIZE]);
        node.insert(1, 20, &[2; ROW_SIZE]);

        assert_eq!(node.read_num_cells(), 3);
        assert_eq!(node.read_key(0), 10);
        assert_eq!(node.read_key(1), 20);
        assert_eq!(node.read_key(2), 30);
        assert_eq!(node.read_val(0), &[1; ROW_SIZE]);
        assert_eq!(node.read_val(1), &[2; ROW_SIZE]);
        assert_eq!(node.read_val(2), &[3; ROW_SIZE]);
    }

    #[test]
    #[should_panic]
    fn insert_over_limit() {
        let mut page = Page::init();
        let mut node = Node::new(&mut page);
        node.initialize_leaf();
        for i in 0..=LEAF_NODE_MAX_CELLS as u32 {
            node.insert(i, i, &[0]);
        }
    }

    #[test]
    fn find_cell() {
        let mut page = Page::init();
        let mut node = Node::new(&mut page);
        node.initialize_leaf();
        assert_eq!(node.find_cell(5), Ok(0));
        for (i, key) in [2, 4, 6, 8].into_iter().enumerate() {
            node.insert(i as u32, key, &[0]);
        }
        assert_eq!(node.find_cell(1), Ok(0));
        assert_eq!(node.find_cell(2), Ok(0));
        assert_eq!(node.find_cell(5), Ok(2));
        assert_eq!(node.find_cell(6), Ok(2));
        assert_eq!(node.find_cell(8), Ok(3));
        assert_eq!(node.find_cell(9), Ok(4));
    }

    #[test]
    fn cell_count_past_page_end() {
        let mut page = Page::init();
        let mut node = Node::new(&mut page);
        node.initialize_leaf();
        node.write_num_cells(LEAF_NODE_MAX_CELLS as u32);
        assert_eq!(node.checked_num_cells(), Ok(LEAF_NODE_MAX_CELLS as u32));

        node.write_num_cells(200);
        let err = NodeError::CellCountOutOfRange {
            count: 200,
            max: LEAF_NODE_MAX_CELLS as u32,
        };
        assert_eq!(node.checked_num_cells(), Err(err));
        assert_eq!(
            node.find_cell(u32::MAX),
            Err(NodeError::CellCountOutOfRange {
                count: 200,
                max: LEAF_NODE_MAX_CELLS as u32
            })
        );
        assert!(node.max_key().is_err());
    }

    #[test]
    fn key_count_past_page_end() {
        let mut page = Page::init();
        let mut node = Node::new(&mut page);
        node.initialize_internal();
        node.write_num_keys(INTERNAL_NODE_MAX_CELLS as u32 + 1);
        let err = NodeError::CellCountOutOfRange {
            count: INTERNAL_NODE_MAX_CELLS as u32 + 1,
            max: INTERNAL_NODE_MAX_CELLS as u32,
        };
        assert_eq!(node.checked_num_keys(), Err(err));
        assert!(node.read_child(INTERNAL_NODE_MAX_CELLS as u32).is_err());
        assert!(node.write_child(0, 1).is_err());
    }

    #[test]
    fn internal_children() {
        let mut page = Page::init();
        let mut node = Node::new(&mut page);
        node.initialize_internal();
        node.write_num_keys(2);
        node.write_child(0, 3).unwrap();
        node.write_internal_key(0, 100);
        node.write_child(1, 4).unwrap();
        node.write_internal_key(1, 200);
        node.write_child(2, 5).unwrap();

        assert_eq!(node.read_child(0), Ok(3));
        assert_eq!(node.read_child(1), Ok(4));
        assert_eq!(node.read_child(2), Ok(5));
        assert_eq!(node.read_right_child(), 5);
        assert_eq!(node.max_key(), Ok(Some(200)));
        assert_eq!(
            node.read_child(3),
            Err(NodeError::ChildOutOfRange {
                child_num: 3,
                num_keys: 2
            })
        );
    }

    #[test]
    fn max_key() {
        let mut page = Page::init();
        let mut node = Node::new(&mut page);
        node.initialize_leaf();
        assert_eq!(node.max_key(), Ok(None));
        node.insert(0, 7, &[0]);
        node.insert(1, 42, &[0]);
        assert_eq!(node.max_key(), Ok(Some(42)));
    }
}
