//! The playing field: a fixed grid of cell marks.

use lightrace_protocol::{CELL_BLOCKED, CELL_EMPTY, PlayerId};

/// One cell of the [`Board`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    /// Left behind by a crash. Impassable.
    Blocked,
    /// Part of a player's trail. Impassable, including for its owner.
    Trail(PlayerId),
}

impl Cell {
    /// The integer this cell is sent as.
    pub fn to_wire(self) -> i64 {
        match self {
            Self::Empty => CELL_EMPTY,
            Self::Blocked => CELL_BLOCKED,
            Self::Trail(owner) => owner.as_cell(),
        }
    }
}

/// A `width × height` grid, row-major, `(0, 0)` top left.
///
/// Coordinates are signed so a step off the edge can be represented and
/// tested with [`in_bounds`](Self::in_bounds) before touching the grid.
/// Writing outside the grid is a logic error and panics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Creates an empty board.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::Empty; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns `true` if `(x, y)` lies on the grid.
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// The cell at `(x, y)`, or `None` off the grid.
    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        self.in_bounds(x, y).then(|| self.cells[self.index(x, y)])
    }

    /// `true` iff `(x, y)` is on the grid and empty.
    pub fn is_empty(&self, x: i32, y: i32) -> bool {
        self.get(x, y) == Some(Cell::Empty)
    }

    /// Marks `(x, y)` as part of `owner`'s trail.
    pub fn place(&mut self, x: i32, y: i32, owner: PlayerId) {
        let index = self.index(x, y);
        self.cells[index] = Cell::Trail(owner);
    }

    /// Marks `(x, y)` as a crash site.
    pub fn block(&mut self, x: i32, y: i32) {
        let index = self.index(x, y);
        self.cells[index] = Cell::Blocked;
    }

    /// Returns `true` if at least one cell is still empty.
    pub fn has_empty(&self) -> bool {
        self.cells.contains(&Cell::Empty)
    }

    /// The grid as sent to clients: `cells[y][x]`.
    pub fn to_wire(&self) -> Vec<Vec<i64>> {
        if self.width == 0 {
            return vec![Vec::new(); self.height];
        }
        self.cells
            .chunks(self.width)
            .map(|row| row.iter().map(|c| c.to_wire()).collect())
            .collect()
    }

    fn index(&self, x: i32, y: i32) -> usize {
        assert!(
            self.in_bounds(x, y),
            "cell ({x}, {y}) outside {}x{} board",
            self.width,
            self.height
        );
        y as usize * self.width + x as usize
    }
}
