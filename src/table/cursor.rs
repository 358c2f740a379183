use super::{
    btree::{Node, NodeKey, NodeType},
    Row, Table, TableError,
};

/// Position of a cell inside a leaf.
///
/// The cursor holds no reference into the table; every access goes back
/// through the pager, so a cursor is only meaningful until the next insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub page_num: u32,
    pub cell_num: u32,
    pub end_of_table: bool,
}

impl Cursor {
    pub fn table_start(table: &mut Table) -> Result<Self, TableError> {
        let page_num = table.root_page_num();
        let node = Node::new(table.page(page_num)?);
        if node.read_node_type()? == NodeType::Internal {
            return Err(TableError::NotImplemented("scanning across multiple leaves"));
        }
        Ok(Cursor {
            page_num,
            cell_num: 0,
            end_of_table: node.checked_num_cells()? == 0,
        })
    }

    /// Positions the cursor on `key`, or where `key` would be inserted.
    pub fn table_find(table: &mut Table, key: NodeKey) -> Result<Self, TableError> {
        let page_num = table.root_page_num();
        let node = Node::new(table.page(page_num)?);
        match node.read_node_type()? {
            NodeType::Leaf => {
                let num_cells = node.checked_num_cells()?;
                let cell_num = node.find_cell(key)?;
                Ok(Cursor {
                    page_num,
                    cell_num,
                    end_of_table: cell_num >= num_cells,
                })
            }
            NodeType::Internal => Err(TableError::NotImplemented("searching an internal node")),
        }
    }

    pub fn advance(&mut self, table: &mut Table) -> Result<(), TableError> {
        let node = Node::new(table.page(self.page_num)?);
        self.cell_num += 1;
        if self.cell_num >= node.checked_num_cells()? {
            self.end_of_table = true;
        }
        Ok(())
    }

    pub fn key(&self, table: &mut Table) -> Result<NodeKey, TableError> {
        let node = Node::new(table.page(self.page_num)?);
        if self.cell_num >= node.checked_num_cells()? {
            return Err(self.row_not_found());
        }
        Ok(node.read_key(self.cell_num))
    }

    pub fn value(&self, table: &mut Table) -> Result<Row, TableError> {
        let node = Node::new(table.page(self.page_num)?);
        if self.cell_num >= node.checked_num_cells()? {
            return Err(self.row_not_found());
        }
        Row::deserialize(node.read_val(self.cell_num)).ok_or_else(|| self.row_not_found())
    }

    fn row_not_found(&self) -> TableError {
        TableError::RowNotFound {
            page_num: self.page_num,
            cell_num: self.cell_num,
        }
    }
}
