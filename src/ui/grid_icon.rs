use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    Current,
    Occupied,
    Empty,
}

impl CellState {
    fn glyph(self) -> char {
        match self {
            CellState::Current => '#',
            CellState::Occupied => 'o',
            CellState::Empty => '.',
        }
    }
}

/// What the tray icon shows, independent of how it gets drawn.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridIcon {
    rows: usize,
    columns: usize,
    cells: Vec<CellState>,
}

impl GridIcon {
    /// `occupied` is indexed by desktop; missing entries count as empty.
    pub fn new(rows: usize, columns: usize, current: usize, occupied: &[bool]) -> GridIcon {
        let cells = (0..rows * columns)
            .map(|index| {
                if index == current {
                    CellState::Current
                } else if occupied.get(index).copied().unwrap_or(false) {
                    CellState::Occupied
                } else {
                    CellState::Empty
                }
            })
            .collect();
        GridIcon { rows, columns, cells }
    }

    pub fn rows(&self) -> usize { self.rows }

    pub fn columns(&self) -> usize { self.columns }

    pub fn cell(&self, row: usize, column: usize) -> Option<CellState> {
        if column >= self.columns {
            return None;
        }
        self.cells.get(row * self.columns + column).copied()
    }

    pub fn cells(&self) -> &[CellState] { &self.cells }

    pub fn current(&self) -> Option<usize> {
        self.cells.iter().position(|&cell| cell == CellState::Current)
    }
}

impl fmt::Display for GridIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.chunks(self.columns.max(1)).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for cell in row {
                write!(f, "{}", cell.glyph())?;
            }
        }
        Ok(())
    }
}
