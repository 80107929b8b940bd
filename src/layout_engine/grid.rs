use serde::{Deserialize, Serialize};

use super::Direction;
use crate::common::config::Settings;

/// Row-major arrangement of the desktops.
///
/// Index `i` sits at column `i mod columns` and row `i div columns`. All
/// navigation is pure; out-of-grid inputs are normalized back into the grid
/// before comparing positions, which is what makes the edge tests work.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridLayout {
    pub rows: usize,
    pub columns: usize,
    pub wrap_around: bool,
}

impl GridLayout {
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn new(rows: usize, columns: usize, wrap_around: bool) -> GridLayout {
        assert!(rows > 0 && columns > 0, "grid needs at least one cell");
        GridLayout { rows, columns, wrap_around }
    }

    pub fn from_settings(settings: &Settings) -> GridLayout {
        GridLayout::new(settings.rows.max(1), settings.columns.max(1), settings.wrap_around)
    }

    pub fn len(&self) -> usize { self.rows * self.columns }

    pub fn contains(&self, index: usize) -> bool { index < self.len() }

    pub fn column_of(&self, index: isize) -> usize {
        index.rem_euclid(self.columns as isize) as usize
    }

    pub fn row_of(&self, index: isize) -> usize {
        index.div_euclid(self.columns as isize).rem_euclid(self.rows as isize) as usize
    }

    pub fn left(&self, index: usize) -> usize {
        let i = index as isize;
        if self.column_of(i - 1) < self.column_of(i) {
            index - 1
        } else if self.wrap_around {
            index + self.columns - 1
        } else {
            index
        }
    }

    pub fn right(&self, index: usize) -> usize {
        let i = index as isize;
        if self.column_of(i + 1) > self.column_of(i) {
            index + 1
        } else if self.wrap_around {
            index + 1 - self.columns
        } else {
            index
        }
    }

    pub fn up(&self, index: usize) -> usize {
        let i = index as isize;
        let columns = self.columns as isize;
        if self.row_of(i - columns) < self.row_of(i) {
            index - self.columns
        } else if self.wrap_around {
            (self.rows - 1) * self.columns + self.column_of(i)
        } else {
            index
        }
    }

    pub fn down(&self, index: usize) -> usize {
        let i = index as isize;
        let columns = self.columns as isize;
        if self.row_of(i + columns) > self.row_of(i) {
            index + self.columns
        } else if self.wrap_around {
            self.column_of(i)
        } else {
            index
        }
    }

    pub fn neighbor(&self, index: usize, direction: Direction) -> usize {
        match direction {
            Direction::Left => self.left(index),
            Direction::Right => self.right(index),
            Direction::Up => self.up(index),
            Direction::Down => self.down(index),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn corner_without_wrap_around() {
        let grid = GridLayout::new(3, 3, false);
        assert_eq!(grid.left(0), 0);
        assert_eq!(grid.up(0), 0);
        assert_eq!(grid.right(0), 1);
        assert_eq!(grid.down(0), 3);

        assert_eq!(grid.right(8), 8);
        assert_eq!(grid.down(8), 8);
        assert_eq!(grid.left(8), 7);
        assert_eq!(grid.up(8), 5);
    }

    #[test]
    fn corner_with_wrap_around() {
        let grid = GridLayout::new(3, 3, true);
        assert_eq!(grid.left(0), 2);
        assert_eq!(grid.up(0), 6);
        assert_eq!(grid.right(2), 0);
        assert_eq!(grid.down(7), 1);
        assert_eq!(grid.left(3), 5);
    }

    #[test]
    fn rectangular_grid_wraps_within_row_and_column() {
        let grid = GridLayout::new(2, 4, true);
        assert_eq!(grid.right(3), 0);
        assert_eq!(grid.left(4), 7);
        assert_eq!(grid.up(1), 5);
        assert_eq!(grid.down(6), 2);
    }

    #[test]
    fn single_row_or_column_is_identity_without_wrap() {
        let row = GridLayout::new(1, 4, false);
        for i in 0..row.len() {
            assert_eq!(row.up(i), i);
            assert_eq!(row.down(i), i);
        }
        let column = GridLayout::new(4, 1, false);
        for i in 0..column.len() {
            assert_eq!(column.left(i), i);
            assert_eq!(column.right(i), i);
        }
        let single = GridLayout::new(1, 1, true);
        for direction in Direction::iter() {
            assert_eq!(single.neighbor(0, direction), 0);
        }
    }

    #[test]
    fn moves_invert_each_other_on_a_torus() {
        for rows in 1..=5 {
            for columns in 1..=5 {
                let grid = GridLayout::new(rows, columns, true);
                for i in 0..grid.len() {
                    for direction in Direction::iter() {
                        let there = grid.neighbor(i, direction);
                        assert!(grid.contains(there), "{rows}x{columns} {i} {direction}");
                        assert_eq!(grid.neighbor(there, direction.opposite()), i);
                    }
                }
            }
        }
    }

    #[test]
    fn positions_are_normalized_for_out_of_grid_inputs() {
        let grid = GridLayout::new(3, 4, false);
        for i in -30isize..30 {
            assert!(grid.column_of(i) < 4);
            assert!(grid.row_of(i) < 3);
        }
        assert_eq!(grid.column_of(-1), 3);
        assert_eq!(grid.row_of(-1), 2);
        assert_eq!(grid.row_of(12), 0);
    }

    #[test]
    fn neighbors_stay_in_range_without_wrap() {
        let grid = GridLayout::new(3, 5, false);
        for i in 0..grid.len() {
            for direction in Direction::iter() {
                assert!(grid.contains(grid.neighbor(i, direction)));
            }
        }
    }
}
