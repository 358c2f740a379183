use std::{io::Write, path::Path};

use log::{debug, error, info};

use super::{
    btree::{
        node::{
            COMMON_NODE_HEADER_SIZE, INTERNAL_NODE_CELL_SIZE, INTERNAL_NODE_HEADER_SIZE,
            INTERNAL_NODE_MAX_CELLS, LEAF_NODE_CELL_SIZE, LEAF_NODE_HEADER_SIZE,
            LEAF_NODE_LEFT_SPLIT_COUNT, LEAF_NODE_MAX_CELLS, LEAF_NODE_RIGHT_SPLIT_COUNT,
            LEAF_NODE_SPACE_FOR_CELLS,
        },
        Node, NodeKey, NodeType,
    },
    cursor::Cursor,
    error::NodeError,
    page::Page,
    MetaCommandStatus, Pager, Row, TableError, PAGE_SIZE, ROW_SIZE,
};

pub struct Table {
    root_page_num: u32,
    pager: Pager,
}

impl Table {
    /// Opens the table stored in `filename`, creating an empty one if needed.
    pub fn open<P: AsRef<Path>>(filename: P) -> Result<Self, TableError> {
        let pager = Pager::open(filename)?;
        let mut table = Self {
            root_page_num: 0,
            pager,
        };

        if table.pager.num_pages() == 0 {
            let mut root = Node::new(table.page(0)?);
            root.initialize_leaf();
            root.write_is_root(true);
            info!("Initialized empty root leaf");
        } else {
            let root_page_num = table.root_page_num;
            let root = Node::new(table.page(root_page_num)?);
            root.read_node_type()?;
        }
        Ok(table)
    }

    pub fn root_page_num(&self) -> u32 {
        self.root_page_num
    }

    pub fn pager(&mut self) -> &mut Pager {
        &mut self.pager
    }

    pub(crate) fn page(&mut self, page_num: u32) -> Result<&mut Page, TableError> {
        self.pager.get_page(page_num).map_err(|err| {
            error!("Failed to fetch page {}: {}", page_num, err);
            TableError::from(err)
        })
    }

    /// Inserts `row` keyed by its id.
    ///
    /// The encoded row must fit in a `ROW_SIZE` (514 byte) cell. A row with
    /// both strings at their 255 byte maximum encodes to 530 bytes and is
    /// rejected with `RowTooLarge`; username and email together may hold at
    /// most 494 bytes.
    pub fn insert(&mut self, row: &Row) -> Result<(), TableError> {
        let payload = row.serialize();
        if payload.len() > ROW_SIZE {
            return Err(TableError::RowTooLarge {
                id: row.id,
                size: payload.len(),
            });
        }

        let cursor = Cursor::table_find(self, row.id)?;
        self.leaf_node_insert(cursor, row.id, &payload)
    }

    fn leaf_node_insert(
        &mut self,
        cursor: Cursor,
        key: NodeKey,
        payload: &[u8],
    ) -> Result<(), TableError> {
        let mut node = Node::new(self.page(cursor.page_num)?);
        let num_cells = node.checked_num_cells()?;
        if cursor.cell_num < num_cells && node.read_key(cursor.cell_num) == key {
            return Err(TableError::DuplicateKey(key));
        }

        if num_cells as usize >= LEAF_NODE_MAX_CELLS {
            return self.leaf_node_split_and_insert(cursor, key, payload);
        }

        node.insert(cursor.cell_num, key, payload);
        debug!(
            "Inserted key {} at page {} cell {}",
            key, cursor.page_num, cursor.cell_num
        );
        Ok(())
    }

    /// Splits a full leaf while inserting `(key, payload)` into it.
    ///
    /// The `LEAF_NODE_MAX_CELLS + 1` entries are laid out in key order; the
    /// lowest `LEAF_NODE_LEFT_SPLIT_COUNT` go to a newly allocated page and the
    /// remaining `LEAF_NODE_RIGHT_SPLIT_COUNT` stay on the original page.
    fn leaf_node_split_and_insert(
        &mut self,
        cursor: Cursor,
        key: NodeKey,
        payload: &[u8],
    ) -> Result<(), TableError> {
        let mut old_page = self.page(cursor.page_num)?.clone();
        if !Node::new(&mut old_page).read_is_root() {
            return Err(TableError::NotImplemented("updating parent after split"));
        }

        let new_page_num = self.pager.unused_page_num();
        info!(
            "Splitting leaf page {} into new page {}",
            cursor.page_num, new_page_num
        );
        Node::new(self.page(new_page_num)?).initialize_leaf();

        let old = Node::new(&mut old_page);
        for i in (0..=LEAF_NODE_MAX_CELLS as u32).rev() {
            let (dest_page_num, dest_cell_num) = if (i as usize) < LEAF_NODE_LEFT_SPLIT_COUNT {
                (new_page_num, i)
            } else {
                (cursor.page_num, i - LEAF_NODE_LEFT_SPLIT_COUNT as u32)
            };

            let mut dest = Node::new(self.page(dest_page_num)?);
            if i == cursor.cell_num {
                dest.write_key(dest_cell_num, key);
                dest.write_val(dest_cell_num, payload);
            } else if i > cursor.cell_num {
                dest.write_cell(dest_cell_num, old.read_cell(i - 1));
            } else {
                dest.write_cell(dest_cell_num, old.read_cell(i));
            }
        }

        Node::new(self.page(new_page_num)?).write_num_cells(LEAF_NODE_LEFT_SPLIT_COUNT as u32);
        Node::new(self.page(cursor.page_num)?)
            .write_num_cells(LEAF_NODE_RIGHT_SPLIT_COUNT as u32);

        self.create_new_root(new_page_num)
    }

    /// Turns the root into an internal node over two leaves, keeping its page
    /// number. The root's current content moves to a newly allocated page,
    /// which holds the upper keys and becomes the right child;
    /// `lower_child_page_num` becomes child 0.
    /// This child order is not the classic one: files that store the relocated
    /// page as child 0 will read back with their two leaves swapped.
    fn create_new_root(&mut self, lower_child_page_num: u32) -> Result<(), TableError> {
        let root_page_num = self.root_page_num;
        let root_content = self.page(root_page_num)?.clone();

        let upper_child_page_num = self.pager.unused_page_num();
        let upper_child = self.page(upper_child_page_num)?;
        *upper_child = root_content;
        Node::new(upper_child).write_is_root(false);

        let lower_max_key = Node::new(self.page(lower_child_page_num)?)
            .max_key()?
            .unwrap_or_default();

        let mut root = Node::new(self.page(root_page_num)?);
        root.initialize_internal();
        root.write_is_root(true);
        root.write_num_keys(1);
        root.write_child(0, lower_child_page_num)?;
        root.write_internal_key(0, lower_max_key);
        root.write_right_child(upper_child_page_num);

        info!(
            "Grew root page {}: children {} and {}, separator {}",
            root_page_num, lower_child_page_num, upper_child_page_num, lower_max_key
        );
        Ok(())
    }

    pub fn select(&mut self) -> Result<Vec<Row>, TableError> {
        let mut rows = Vec::new();
        let mut cursor = Cursor::table_start(self)?;
        while !cursor.end_of_table {
            rows.push(cursor.value(self)?);
            cursor.advance(self)?;
        }
        Ok(rows)
    }

    /// Writes every cached page back and releases the file.
    pub fn close(&mut self) -> Result<(), TableError> {
        self.pager.close().map_err(|err| {
            error!("Failed to close table: {}", err);
            TableError::from(err)
        })
    }

    pub fn execute_meta(
        &mut self,
        command: &[u8],
        out: &mut dyn Write,
    ) -> Result<MetaCommandStatus, TableError> {
        match command {
            b".constants" => {
                writeln!(out, "Constants:")?;
                self.write_constants(out)?;
                Ok(MetaCommandStatus::Success)
            }
            b".btree" => {
                writeln!(out, "Tree:")?;
                let root_page_num = self.root_page_num;
                self.write_tree(out, root_page_num, 0)?;
                Ok(MetaCommandStatus::Success)
            }
            _ => Ok(MetaCommandStatus::UnrecognizedCommand),
        }
    }

    fn write_constants(&self, out: &mut dyn Write) -> Result<(), TableError> {
        writeln!(out, "ROW_SIZE: {}", ROW_SIZE)?;
        writeln!(out, "PAGE_SIZE: {}", PAGE_SIZE)?;
        writeln!(out, "COMMON_NODE_HEADER_SIZE: {}", COMMON_NODE_HEADER_SIZE)?;
        writeln!(out, "LEAF_NODE_HEADER_SIZE: {}", LEAF_NODE_HEADER_SIZE)?;
        writeln!(out, "LEAF_NODE_CELL_SIZE: {}", LEAF_NODE_CELL_SIZE)?;
        writeln!(out, "LEAF_NODE_SPACE_FOR_CELLS: {}", LEAF_NODE_SPACE_FOR_CELLS)?;
        writeln!(out, "LEAF_NODE_MAX_CELLS: {}", LEAF_NODE_MAX_CELLS)?;
        writeln!(out, "LEAF_NODE_LEFT_SPLIT_COUNT: {}", LEAF_NODE_LEFT_SPLIT_COUNT)?;
        writeln!(out, "LEAF_NODE_RIGHT_SPLIT_COUNT: {}", LEAF_NODE_RIGHT_SPLIT_COUNT)?;
        writeln!(out, "INTERNAL_NODE_HEADER_SIZE: {}", INTERNAL_NODE_HEADER_SIZE)?;
        writeln!(out, "INTERNAL_NODE_CELL_SIZE: {}", INTERNAL_NODE_CELL_SIZE)?;
        writeln!(out, "INTERNAL_NODE_MAX_CELLS: {}", INTERNAL_NODE_MAX_CELLS)?;
        Ok(())
    }

    fn write_tree(
        &mut self,
        out: &mut dyn Write,
        page_num: u32,
        indent: usize,
    ) -> Result<(), TableError> {
        let pad = "  ".repeat(indent);
        let num_pages = self.pager.num_pages();
        let node = Node::new(self.page(page_num)?);
        match node.read_node_type()? {
            NodeType::Leaf => {
                let keys: Vec<NodeKey> = (0..node.checked_num_cells()?)
                    .map(|i| node.read_key(i))
                    .collect();
                writeln!(out, "{}- leaf (size {})", pad, keys.len())?;
                for key in keys {
                    writeln!(out, "{}  - {}", pad, key)?;
                }
            }
            NodeType::Internal => {
                let num_keys = node.checked_num_keys()?;
                let mut children = Vec::with_capacity(num_keys as usize);
                for i in 0..num_keys {
                    children.push((node.read_child(i)?, node.read_internal_key(i)));
                }
                let right_child = node.read_right_child();

                // A chain deeper than the page count has to revisit a page.
                let too_deep = indent + 1 >= num_pages as usize;
                for child in children.iter().map(|(child, _)| *child).chain([right_child]) {
                    if child == page_num || child >= num_pages || too_deep {
                        return Err(NodeError::InvalidChildPointer { page_num, child }.into());
                    }
                }

                writeln!(out, "{}- internal (size {})", pad, num_keys)?;
                for (child, key) in children {
                    self.write_tree(out, child, indent + 1)?;
                    writeln!(out, "{}  - key {}", pad, key)?;
                }
                self.write_tree(out, right_child, indent + 1)?;
            }
        }
        Ok(())
    }
}
