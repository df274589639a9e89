//! The toroidal node structure behind the Dancing Links solver.
//!
//! Nodes live in growable arenas and link to each other by index, one
//! [`NodeLinks`] arena for the horizontal direction and one for the
//! vertical. Index `0` is the root: its horizontal cycle threads every
//! currently-uncovered column header. Covering a column unlinks it and
//! every row it intersects in O(1) per node; uncovering relinks them from
//! the links the unlink left undisturbed.

use std::ops;

/// Index of a node in the arenas. The root is always [`ROOT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct NodeId(usize);

/// The root node: owner of the header cycle, member of no column.
pub(crate) const ROOT: NodeId = NodeId(0);

/// Marker stored as the "source row" of headers and the root.
const NO_ROW: usize = usize::MAX;

/// prev/next pair for one node in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Link {
    pub(crate) prev: NodeId,
    pub(crate) next: NodeId,
}

/// One direction's worth of links for every node, stored as an arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NodeLinks {
    data: Vec<Link>,
}

impl NodeLinks {
    fn new() -> Self {
        NodeLinks { data: Vec::new() }
    }

    /// Allocate the next node, initially linked to itself.
    fn alloc(&mut self) -> NodeId {
        let node = NodeId(self.data.len());
        self.data.push(Link {
            prev: node,
            next: node,
        });
        node
    }

    /// Insert `node` directly after `after`.
    fn insert_after(&mut self, after: NodeId, node: NodeId) {
        let next = self[after].next;
        self[node].prev = after;
        self[node].next = next;
        self[after].next = node;
        self[next].prev = node;
    }

    /// Remove `node` from its cycle, leaving `node`'s own links untouched
    /// so [`relink`](NodeLinks::relink) can restore it.
    fn unlink(&mut self, node: NodeId) {
        let Link { prev, next } = self[node];
        self[prev].next = next;
        self[next].prev = prev;
    }

    /// Put `node` back where [`unlink`](NodeLinks::unlink) took it from.
    fn relink(&mut self, node: NodeId) {
        let Link { prev, next } = self[node];
        self[prev].next = node;
        self[next].prev = node;
    }
}

impl ops::Index<NodeId> for NodeLinks {
    type Output = Link;

    fn index(&self, index: NodeId) -> &Self::Output {
        &self.data[index.0]
    }
}

impl ops::IndexMut<NodeId> for NodeLinks {
    fn index_mut(&mut self, index: NodeId) -> &mut Self::Output {
        &mut self.data[index.0]
    }
}

/// The full four-way-linked structure: headers, nodes, sizes, and the side
/// tables mapping nodes back to their column header and source row.
#[derive(Debug)]
pub(crate) struct Grid {
    horizontal: NodeLinks,
    vertical: NodeLinks,
    // per node; only meaningful for headers
    sizes: Vec<usize>,
    // column index -> header node
    headers: Vec<NodeId>,
    // node -> its column's header (headers and root point at themselves)
    header_of: Vec<NodeId>,
    // node -> source matrix row, NO_ROW for headers and root
    row_of: Vec<usize>,
}

impl Grid {
    /// Create a grid with `num_columns` headers chained onto the root, all
    /// columns initially empty.
    pub(crate) fn new(num_columns: usize) -> Self {
        let mut grid = Grid {
            horizontal: NodeLinks::new(),
            vertical: NodeLinks::new(),
            sizes: Vec::new(),
            headers: Vec::with_capacity(num_columns),
            header_of: Vec::new(),
            row_of: Vec::new(),
        };

        let root = grid.alloc(ROOT, NO_ROW);
        debug_assert_eq!(root, ROOT);

        for _ in 0..num_columns {
            let header = grid.alloc(ROOT, NO_ROW);
            grid.header_of[header.0] = header;
            grid.headers.push(header);
            // Chain headers left-to-right off the root.
            let last = grid.horizontal[ROOT].prev;
            grid.horizontal.insert_after(last, header);
        }

        grid
    }

    fn alloc(&mut self, header: NodeId, row: usize) -> NodeId {
        let node = self.horizontal.alloc();
        let twin = self.vertical.alloc();
        debug_assert_eq!(node, twin);
        self.sizes.push(0);
        self.header_of.push(header);
        self.row_of.push(row);
        node
    }

    /// Append one matrix row: a node per listed column, linked into a
    /// horizontal cycle in the given order and onto the bottom of each
    /// column's vertical cycle.
    pub(crate) fn add_row(&mut self, row_index: usize, columns: &[usize]) {
        let mut previous: Option<NodeId> = None;
        for &column in columns {
            let header = self.headers[column];
            let node = self.alloc(header, row_index);

            let bottom = self.vertical[header].prev;
            self.vertical.insert_after(bottom, node);
            self.sizes[header.0] += 1;

            if let Some(previous) = previous {
                self.horizontal.insert_after(previous, node);
            }
            previous = Some(node);
        }
    }

    /// The header node of column `column`.
    #[cfg(test)]
    pub(crate) fn header(&self, column: usize) -> NodeId {
        self.headers[column]
    }

    /// Number of nodes currently in the column under `header`.
    pub(crate) fn size(&self, header: NodeId) -> usize {
        self.sizes[header.0]
    }

    /// The source matrix row of a non-header node.
    pub(crate) fn row_of(&self, node: NodeId) -> usize {
        debug_assert_ne!(self.row_of[node.0], NO_ROW);
        self.row_of[node.0]
    }

    /// The uncovered column header with the fewest nodes, first encountered
    /// wins ties. `None` when every column is covered.
    pub(crate) fn min_size_header(&self) -> Option<NodeId> {
        let mut best: Option<NodeId> = None;
        let mut best_size = usize::MAX;
        let mut header = self.horizontal[ROOT].next;
        while header != ROOT {
            if self.sizes[header.0] < best_size {
                best = Some(header);
                best_size = self.sizes[header.0];
            }
            header = self.horizontal[header].next;
        }
        best
    }

    /// Next node downward in a column cycle (wraps through the header).
    pub(crate) fn down(&self, node: NodeId) -> NodeId {
        self.vertical[node].next
    }

    /// Next node rightward in a row cycle.
    pub(crate) fn right(&self, node: NodeId) -> NodeId {
        self.horizontal[node].next
    }

    /// Next node leftward in a row cycle.
    pub(crate) fn left(&self, node: NodeId) -> NodeId {
        self.horizontal[node].prev
    }

    /// The column header a node belongs to.
    pub(crate) fn header_of(&self, node: NodeId) -> NodeId {
        self.header_of[node.0]
    }

    /// Cover a column: unlink its header from the header cycle, then for
    /// every row in the column unlink that row's other nodes from their
    /// columns.
    pub(crate) fn cover(&mut self, header: NodeId) {
        self.horizontal.unlink(header);

        let mut row_node = self.vertical[header].next;
        while row_node != header {
            let mut node = self.horizontal[row_node].next;
            while node != row_node {
                self.vertical.unlink(node);
                self.sizes[self.header_of[node.0].0] -= 1;
                node = self.horizontal[node].next;
            }
            row_node = self.vertical[row_node].next;
        }
    }

    /// Exact inverse of [`cover`](Grid::cover): walk upward and leftward,
    /// relinking, then relink the header.
    pub(crate) fn uncover(&mut self, header: NodeId) {
        let mut row_node = self.vertical[header].prev;
        while row_node != header {
            let mut node = self.horizontal[row_node].prev;
            while node != row_node {
                self.sizes[self.header_of[node.0].0] += 1;
                self.vertical.relink(node);
                node = self.horizontal[node].prev;
            }
            row_node = self.vertical[row_node].prev;
        }

        self.horizontal.relink(header);
    }

    /// Complete link-state snapshot, for asserting that cover/uncover pairs
    /// restore the structure exactly.
    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> (NodeLinks, NodeLinks, Vec<usize>) {
        (
            self.horizontal.clone(),
            self.vertical.clone(),
            self.sizes.clone(),
        )
    }
}
