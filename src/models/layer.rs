//! Layer grid data structures.

use crate::error::{ValidationError, ValidationErrorKind};
use crate::models::KeyAssignment;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Position of a key in the matrix grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Row (0-based, top row first)
    pub row: usize,
    /// Column (0-based)
    pub col: usize,
}

impl Position {
    /// Creates a new Position with the given row and column.
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// One complete keymap: a fixed `rows × cols` grid of assignments.
///
/// Keys are stored row-major, so the flattened key index of
/// `(row, col)` is `row * cols + col`. Snapshots store a layer as nested
/// rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    rows: usize,
    cols: usize,
    keys: Vec<KeyAssignment>,
}

impl Layer {
    /// Creates a layer with every position set to `KC.NO`.
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            keys: vec![KeyAssignment::NoOp; rows * cols],
        }
    }

    /// Builds a layer from nested rows.
    ///
    /// The grid is as wide as the widest row; short rows are padded with
    /// `KC.NO`.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<KeyAssignment>>) -> Self {
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        let row_count = rows.len();
        let mut keys = Vec::with_capacity(row_count * cols);
        for mut row in rows {
            row.resize(cols, KeyAssignment::NoOp);
            keys.extend(row);
        }
        Self {
            rows: row_count,
            cols,
            keys,
        }
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when the grid has no positions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Flattened key index for a position, if it lies inside the grid.
    #[must_use]
    pub const fn index_of(&self, position: Position) -> Option<usize> {
        if position.row < self.rows && position.col < self.cols {
            Some(position.row * self.cols + position.col)
        } else {
            None
        }
    }

    /// Position of a flattened key index, if it lies inside the grid.
    #[must_use]
    pub const fn position_of(&self, index: usize) -> Option<Position> {
        if index < self.rows * self.cols {
            Some(Position::new(index / self.cols, index % self.cols))
        } else {
            None
        }
    }

    /// Gets the key at a flattened index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&KeyAssignment> {
        self.keys.get(index)
    }

    /// Gets the key at a grid position.
    #[must_use]
    pub fn get_at(&self, position: Position) -> Option<&KeyAssignment> {
        self.index_of(position).and_then(|i| self.keys.get(i))
    }

    /// Replaces the key at a flattened index.
    ///
    /// # Errors
    ///
    /// Returns `KeyIndexOutOfRange` if the index is outside the grid, or
    /// `InvalidKeycode` if `key` has no stable token form.
    pub fn set(&mut self, index: usize, key: KeyAssignment) -> Result<(), ValidationError> {
        key.check_token().map_err(|e| e.with_key(index))?;
        let len = self.keys.len();
        let slot = self.keys.get_mut(index).ok_or_else(|| {
            ValidationError::new(
                ValidationErrorKind::KeyIndexOutOfRange,
                format!("Key index {index} is outside 0..{len}"),
            )
            .with_key(index)
        })?;
        *slot = key;
        Ok(())
    }

    /// All keys in row-major order.
    #[must_use]
    pub fn keys(&self) -> &[KeyAssignment] {
        &self.keys
    }

    /// Iterates rows as slices.
    pub fn rows_iter(&self) -> impl Iterator<Item = &[KeyAssignment]> {
        // chunks(0) panics; an empty grid has no rows to yield anyway
        self.keys.chunks(self.cols.max(1))
    }

    /// Returns a copy padded or truncated to `rows × cols`.
    ///
    /// Positions that exist in both grids keep their assignment; new
    /// positions become `KC.NO`.
    #[must_use]
    pub fn resized(&self, rows: usize, cols: usize) -> Self {
        let mut out = Self::new(rows, cols);
        for row in 0..rows.min(self.rows) {
            for col in 0..cols.min(self.cols) {
                out.keys[row * cols + col] = self.keys[row * self.cols + col].clone();
            }
        }
        out
    }
}

impl Serialize for Layer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rows_iter())
    }
}

impl<'de> Deserialize<'de> for Layer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rows = Vec::<Vec<KeyAssignment>>::deserialize(deserializer)?;
        Ok(Self::from_rows(rows))
    }
}
