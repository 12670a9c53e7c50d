//! Player piece: a small cluster of coloured tiles hovered over the board
//! and committed onto open cells.

use crate::board::Board;
use crate::tile::TileColor;

/// Piece shapes (1-3 tiles).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceShape {
    Dot,
    Dash,
    El,
}

impl PieceShape {
    pub const ALL: [Self; 3] = [Self::Dot, Self::Dash, Self::El];

    /// Cells relative to origin for a rotation step (0..4), each (dc, dr).
    pub fn cells(self, rotation: u8) -> &'static [(i32, i32)] {
        match self {
            Self::Dot => &[(0, 0)],
            Self::Dash => match rotation % 2 {
                0 => &[(0, 0), (1, 0)],
                _ => &[(0, 0), (0, 1)],
            },
            Self::El => match rotation % 4 {
                0 => &[(0, 0), (0, 1), (1, 1)],
                1 => &[(0, 0), (1, 0), (0, 1)],
                2 => &[(0, 0), (1, 0), (1, 1)],
                _ => &[(1, 0), (0, 1), (1, 1)],
            },
        }
    }

    pub fn size(self) -> usize {
        self.cells(0).len()
    }
}

/// The in-hand piece: shape, rotation, board position and one colour per
/// cell (colours keep their cell order across rotations).
#[derive(Debug, Clone)]
pub struct Piece {
    pub shape: PieceShape,
    pub rotation: u8,
    pub col: i32,
    pub row: i32,
    pub colors: Vec<TileColor>,
}

impl Piece {
    pub fn new(shape: PieceShape, colors: Vec<TileColor>, col: i32, row: i32) -> Self {
        assert_eq!(colors.len(), shape.size(), "one colour per piece cell");
        Self {
            shape,
            rotation: 0,
            col,
            row,
            colors,
        }
    }

    pub fn size(&self) -> usize {
        self.shape.size()
    }

    /// Absolute (col, row) for each piece cell.
    pub fn cell_positions(&self) -> Vec<(i32, i32)> {
        self.shape
            .cells(self.rotation)
            .iter()
            .map(|&(dc, dr)| (self.col + dc, self.row + dr))
            .collect()
    }

    fn fits(&self, board: &Board) -> bool {
        self.cell_positions().iter().all(|&(c, r)| {
            c >= 0 && r >= 0 && (c as usize) < board.columns() && (r as usize) < board.rows()
        })
    }

    /// Move by (dc, dr) if every cell stays on the grid.
    pub fn shift(&mut self, dc: i32, dr: i32, board: &Board) {
        self.col += dc;
        self.row += dr;
        if !self.fits(board) {
            self.col -= dc;
            self.row -= dr;
        }
    }

    /// Rotate clockwise, nudging back onto the grid if the new footprint
    /// pokes over an edge.
    pub fn rotate(&mut self, board: &Board) {
        self.rotation = (self.rotation + 1) % 4;
        while !self.fits(board) && self.col > 0 {
            self.col -= 1;
        }
        while !self.fits(board) && self.row > 0 {
            self.row -= 1;
        }
        if !self.fits(board) {
            self.rotation = (self.rotation + 3) % 4;
        }
    }

    /// True if every covered cell is open (in range, empty, unrestricted).
    /// Commit is all-or-nothing; a single bad cell rejects the placement
    /// with no mutation.
    pub fn can_commit(&self, board: &Board) -> bool {
        self.fits(board)
            && self.cell_positions().iter().all(|&(c, r)| {
                board.is_open(board.index(c as usize, r as usize))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{TileColor, TileKind};

    fn dash(col: i32, row: i32) -> Piece {
        Piece::new(
            PieceShape::Dash,
            vec![TileColor::Red, TileColor::Blue],
            col,
            row,
        )
    }

    #[test]
    fn shift_clamps_to_grid() {
        let board = Board::new(8, 10);
        let mut p = dash(0, 0);
        p.shift(-1, 0, &board);
        assert_eq!((p.col, p.row), (0, 0));
        p.shift(6, 0, &board);
        assert_eq!(p.col, 6);
        p.shift(1, 0, &board);
        assert_eq!(p.col, 6); // (7,0)+(8,0) would poke past the right edge
    }

    #[test]
    fn rotation_cycles_dash_orientation() {
        let board = Board::new(8, 10);
        let mut p = dash(3, 3);
        assert_eq!(p.cell_positions(), vec![(3, 3), (4, 3)]);
        p.rotate(&board);
        assert_eq!(p.cell_positions(), vec![(3, 3), (3, 4)]);
    }

    #[test]
    fn commit_rejected_on_occupied_cell() {
        let mut board = Board::new(8, 10);
        let p = dash(3, 3);
        assert!(p.can_commit(&board));
        board.create_tile(board.index(4, 3), TileColor::Green, TileKind::Normal);
        assert!(!p.can_commit(&board));
    }

    #[test]
    fn commit_rejected_on_restricted_cell() {
        let mut board = Board::new(8, 10);
        let p = dash(3, 3);
        board.set_restricted(board.index(3, 3), true);
        assert!(!p.can_commit(&board));
    }
}
