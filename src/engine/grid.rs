use std::fmt;

use serde::{Deserialize, Serialize};

use super::Position;
use crate::error::EngineError;

/// Index of a tile in its grid's tile table.
///
/// Ids are only meaningful for the grid that issued them, and only until the
/// next move is simulated on that grid (moves compact the table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(usize);

impl TileId {
    #[inline]
    pub fn index(self) -> usize { self.0 }
}

/// One numbered piece on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub position: Position,
    pub value: u32,
    /// Position before the current move.
    pub previous_position: Option<Position>,
    /// The (moving, stationary) tiles consumed to create this one in the current move.
    pub merged_from: Option<(TileId, TileId)>,
}

impl Tile {
    pub fn new(position: Position, value: u32) -> Self {
        Tile { position, value, previous_position: None, merged_from: None }
    }

    #[inline]
    pub fn save_position(&mut self) { self.previous_position = Some(self.position); }

    #[inline]
    pub fn update_position(&mut self, position: Position) { self.position = position; }
}

/// Canonical encoding of grid contents: one exponent byte per cell (0 = empty).
///
/// Two grids have equal keys iff they hold the same values in the same cells,
/// which makes it a valid transposition-table key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridKey(Box<[u8]>);

impl GridKey {
    pub fn as_bytes(&self) -> &[u8] { &self.0 }
}

/// Plain-data copy of a grid: `cells[x][y]` holds the tile value, if any.
///
/// This is the only wire format the engine speaks; it round-trips through JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub size: usize,
    pub cells: Vec<Vec<Option<u32>>>,
}

impl TryFrom<GridSnapshot> for Grid {
    type Error = EngineError;

    fn try_from(snapshot: GridSnapshot) -> Result<Self, Self::Error> {
        Grid::from_cells(snapshot.size, &snapshot.cells)
    }
}

/// Square lattice of cells, each holding at most one tile.
///
/// Cells are stored column by column (`x * size + y`), so every enumeration
/// (`each_cell`, `available_cells`, move traversals) visits x outer, y inner.
#[derive(Clone)]
pub struct Grid {
    size: usize,
    cells: Vec<Option<TileId>>,
    tiles: Vec<Tile>,
}

impl Grid {
    /// An empty grid of side `size`.
    ///
    /// ```
    /// use ai_2048_grid::engine::Grid;
    /// let grid = Grid::new(4).unwrap();
    /// assert_eq!(grid.available_cells().len(), 16);
    /// ```
    pub fn new(size: usize) -> Result<Self, EngineError> {
        if size == 0 {
            return Err(EngineError::InvalidSize);
        }
        Ok(Grid { size, cells: vec![None; size * size], tiles: Vec::new() })
    }

    /// Build a grid from a `cells[x][y]` layout, deep-copying every value.
    pub fn from_cells(size: usize, cells: &[Vec<Option<u32>>]) -> Result<Self, EngineError> {
        let mut grid = Grid::new(size)?;
        if cells.len() != size || cells.iter().any(|column| column.len() != size) {
            let found = format!("{}x{:?}", cells.len(), cells.iter().map(Vec::len).collect::<Vec<_>>());
            return Err(EngineError::GridDimensionMismatch { expected: size, found });
        }
        for (x, column) in cells.iter().enumerate() {
            for (y, value) in column.iter().enumerate() {
                if let Some(value) = *value {
                    validate_value(value)?;
                    grid.insert_tile(Tile::new(Position::new(x as i32, y as i32), value));
                }
            }
        }
        Ok(grid)
    }

    /// Build a grid from rows as they appear on screen (`rows[y][x]`, 0 = empty).
    ///
    /// ```
    /// use ai_2048_grid::engine::{Grid, Position};
    /// let grid = Grid::from_rows(&[[2, 2], [0, 4]]).unwrap();
    /// assert_eq!(grid.cell_content(Position::new(1, 1)).unwrap().value, 4);
    /// ```
    pub fn from_rows<const N: usize>(rows: &[[u32; N]]) -> Result<Self, EngineError> {
        let size = rows.len();
        let mut grid = Grid::new(size)?;
        if N != size {
            return Err(EngineError::GridDimensionMismatch { expected: size, found: format!("{size} rows of length {N}") });
        }
        for (y, row) in rows.iter().enumerate() {
            for (x, &value) in row.iter().enumerate() {
                if value != 0 {
                    validate_value(value)?;
                    grid.insert_tile(Tile::new(Position::new(x as i32, y as i32), value));
                }
            }
        }
        Ok(grid)
    }

    #[inline]
    pub fn size(&self) -> usize { self.size }

    #[inline]
    pub fn within_bounds(&self, pos: Position) -> bool {
        let n = self.size as i32;
        pos.x >= 0 && pos.x < n && pos.y >= 0 && pos.y < n
    }

    #[inline]
    fn cell_index(&self, pos: Position) -> Option<usize> {
        if self.within_bounds(pos) {
            Some(pos.x as usize * self.size + pos.y as usize)
        } else {
            None
        }
    }

    /// Id of the tile occupying `pos`, if any. Out-of-bounds positions are empty.
    #[inline]
    pub fn cell_id(&self, pos: Position) -> Option<TileId> {
        self.cell_index(pos).and_then(|idx| self.cells[idx])
    }

    /// Tile occupying `pos`, if any. Out-of-bounds positions are empty.
    #[inline]
    pub fn cell_content(&self, pos: Position) -> Option<&Tile> {
        self.cell_id(pos).map(|id| &self.tiles[id.0])
    }

    #[inline]
    pub fn cell_available(&self, pos: Position) -> bool {
        matches!(self.cell_index(pos), Some(idx) if self.cells[idx].is_none())
    }

    /// Look up a tile by id. Consumed tiles stay readable until the next move.
    ///
    /// # Panics
    /// Panics if `id` was not issued by this grid.
    #[inline]
    pub fn tile(&self, id: TileId) -> &Tile { &self.tiles[id.0] }

    #[inline]
    pub(crate) fn tile_mut(&mut self, id: TileId) -> &mut Tile { &mut self.tiles[id.0] }

    /// Place `tile` at its own position, replacing whatever the cell pointed at.
    ///
    /// The replaced tile stays in the table (a merge still refers to it) until
    /// the next [`compact`](Self::compact). Callers must pass an in-bounds
    /// position; the public entry point is [`add_tile`](super::add_tile).
    pub(crate) fn insert_tile(&mut self, tile: Tile) -> TileId {
        let idx = self
            .cell_index(tile.position)
            .unwrap_or_else(|| panic!("tile position {:?} outside a {}x{} grid", tile.position, self.size, self.size));
        let id = TileId(self.tiles.len());
        self.tiles.push(tile);
        self.cells[idx] = Some(id);
        id
    }

    /// Clear the cell at the tile's recorded position.
    pub fn remove_tile(&mut self, id: TileId) {
        if let Some(idx) = self.cell_index(self.tiles[id.0].position) {
            self.cells[idx] = None;
        }
    }

    /// Move a live tile to `cell`, updating both the lattice and the tile.
    pub(crate) fn move_tile(&mut self, id: TileId, cell: Position) {
        self.remove_tile(id);
        if let Some(idx) = self.cell_index(cell) {
            self.cells[idx] = Some(id);
        }
        self.tiles[id.0].update_position(cell);
    }

    /// Drop consumed and overwritten tiles from the table and clear merge markers.
    ///
    /// Invalidates every previously issued [`TileId`].
    pub(crate) fn compact(&mut self) {
        let mut tiles = Vec::with_capacity(self.cells.len());
        for slot in self.cells.iter_mut().flatten() {
            let mut tile = self.tiles[slot.0];
            tile.merged_from = None;
            *slot = TileId(tiles.len());
            tiles.push(tile);
        }
        self.tiles = tiles;
    }

    /// [`compact`](Self::compact), then save every tile's position for the next move.
    pub(crate) fn prepare_tiles(&mut self) {
        self.compact();
        self.tiles.iter_mut().for_each(Tile::save_position);
    }

    /// Every empty in-bounds cell, x outer, y inner.
    pub fn available_cells(&self) -> Vec<Position> {
        let mut out = Vec::with_capacity(self.cells.len());
        self.each_cell(|x, y, tile| {
            if tile.is_none() {
                out.push(Position::new(x as i32, y as i32));
            }
        });
        out
    }

    #[inline]
    pub fn cells_available(&self) -> bool { self.cells.iter().any(Option::is_none) }

    /// Visit each cell once, x outer, y inner.
    pub fn each_cell<F: FnMut(usize, usize, Option<&Tile>)>(&self, mut visitor: F) {
        for x in 0..self.size {
            for y in 0..self.size {
                let tile = self.cells[x * self.size + y].map(|id| &self.tiles[id.0]);
                visitor(x, y, tile);
            }
        }
    }

    /// Live tiles in cell order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.cells.iter().filter_map(move |slot| slot.map(|id| &self.tiles[id.0]))
    }

    /// Independent plain-data copy of the current cells.
    pub fn serialize(&self) -> GridSnapshot {
        let cells = (0..self.size)
            .map(|x| {
                (0..self.size)
                    .map(|y| self.cells[x * self.size + y].map(|id| self.tiles[id.0].value))
                    .collect()
            })
            .collect();
        GridSnapshot { size: self.size, cells }
    }

    /// Canonical content key, see [`GridKey`].
    pub fn key(&self) -> GridKey {
        let bytes: Vec<u8> = self
            .cells
            .iter()
            .map(|slot| slot.map_or(0, |id| self.tiles[id.0].value.trailing_zeros() as u8))
            .collect();
        GridKey(bytes.into_boxed_slice())
    }

    /// Highest tile value on the grid (0 when empty).
    pub fn highest_tile(&self) -> u32 { self.tiles().map(|t| t.value).max().unwrap_or(0) }

    /// Value at `(x, y)` or 0 when empty/out of bounds.
    #[inline]
    pub fn value_at(&self, x: i32, y: i32) -> u32 {
        self.cell_content(Position::new(x, y)).map_or(0, |t| t.value)
    }
}

pub(crate) fn validate_value(value: u32) -> Result<(), EngineError> {
    if value < 2 || !value.is_power_of_two() {
        return Err(EngineError::InvalidTileValue { value });
    }
    Ok(())
}

impl PartialEq for Grid {
    /// Grids compare by contents; tile tables and merge markers are ignored.
    fn eq(&self, other: &Self) -> bool { self.size == other.size && self.key() == other.key() }
}

impl Eq for Grid {}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid").field("size", &self.size).field("cells", &self.serialize().cells).finish()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = "-".repeat(self.size * 8);
        for y in 0..self.size as i32 {
            if y > 0 {
                writeln!(f, "{separator}")?;
            }
            let row: Vec<String> = (0..self.size as i32).map(|x| format_val(self.value_at(x, y))).collect();
            writeln!(f, "{}", row.join("|"))?;
        }
        Ok(())
    }
}

fn format_val(val: u32) -> String {
    match val {
        0 => String::from("       "),
        v => format!("{:^7}", v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_zero_size() {
        assert!(matches!(Grid::new(0), Err(EngineError::InvalidSize)));
    }

    #[test]
    fn from_cells_rejects_mismatched_layout() {
        let cells = vec![vec![None; 4]; 3];
        let err = Grid::from_cells(4, &cells).unwrap_err();
        assert!(matches!(err, EngineError::GridDimensionMismatch { expected: 4, .. }));

        let mut ragged = vec![vec![None; 4]; 4];
        ragged[2].pop();
        assert!(Grid::from_cells(4, &ragged).is_err());
    }

    #[test]
    fn from_cells_rejects_bad_values() {
        let mut cells = vec![vec![None; 2]; 2];
        cells[0][1] = Some(3);
        assert!(matches!(Grid::from_cells(2, &cells), Err(EngineError::InvalidTileValue { value: 3 })));
        cells[0][1] = Some(1);
        assert!(matches!(Grid::from_cells(2, &cells), Err(EngineError::InvalidTileValue { value: 1 })));
    }

    #[test]
    fn layout_is_column_major_cells_x_y() {
        let mut cells = vec![vec![None; 4]; 4];
        cells[3][0] = Some(8);
        let grid = Grid::from_cells(4, &cells).unwrap();
        assert_eq!(grid.cell_content(Position::new(3, 0)).unwrap().value, 8);
        assert_eq!(grid.serialize().cells, cells);
        assert_eq!(grid, Grid::from_rows(&[[0, 0, 0, 8], [0; 4], [0; 4], [0; 4]]).unwrap());
    }

    #[test]
    fn out_of_bounds_access_is_empty() {
        let grid = Grid::from_rows(&[[2, 2], [2, 2]]).unwrap();
        assert!(!grid.within_bounds(Position::new(-1, 0)));
        assert!(!grid.within_bounds(Position::new(0, 2)));
        assert!(grid.cell_content(Position::new(2, 0)).is_none());
        assert!(!grid.cell_available(Position::new(-1, -1)));
        assert!(!grid.cells_available());
    }

    #[test]
    fn available_cells_enumerate_x_outer() {
        let grid = Grid::from_rows(&[[2, 0], [0, 0]]).unwrap();
        assert_eq!(
            grid.available_cells(),
            vec![Position::new(0, 1), Position::new(1, 0), Position::new(1, 1)]
        );
    }

    #[test]
    fn insert_overwrites_and_remove_clears() {
        let mut grid = Grid::new(4).unwrap();
        let pos = Position::new(1, 2);
        let first = grid.insert_tile(Tile::new(pos, 2));
        let second = grid.insert_tile(Tile::new(pos, 4));
        assert_ne!(first, second);
        assert_eq!(grid.cell_content(pos).unwrap().value, 4);
        assert_eq!(grid.tiles().count(), 1);
        grid.remove_tile(second);
        assert!(grid.cell_available(pos));
    }

    #[test]
    fn compact_keeps_only_live_tiles() {
        let mut grid = Grid::new(2).unwrap();
        let pos = Position::new(0, 1);
        grid.insert_tile(Tile::new(pos, 2));
        grid.insert_tile(Tile::new(pos, 4));
        let mut merged = Tile::new(Position::new(1, 1), 8);
        merged.merged_from = Some((TileId(0), TileId(1)));
        grid.insert_tile(merged);
        assert_eq!(grid.tiles.len(), 3);

        let before = grid.clone();
        grid.compact();
        assert_eq!(grid.tiles.len(), 2);
        assert_eq!(grid, before);
        assert!(grid.tiles().all(|t| t.merged_from.is_none()));
        assert_eq!(grid.cell_content(pos).unwrap().value, 4);
        assert_eq!(grid.tile(grid.cell_id(Position::new(1, 1)).unwrap()).value, 8);
    }

    #[test]
    fn largest_u32_power_of_two_is_accepted() {
        let grid = Grid::from_rows(&[[1 << 31, 0], [0, 2]]).unwrap();
        assert_eq!(grid.highest_tile(), 1 << 31);
        assert_eq!(grid.key().as_bytes()[0], 31);
    }

    #[test]
    fn clones_and_snapshots_do_not_alias() {
        let original = Grid::from_rows(&[[2, 0], [0, 4]]).unwrap();
        let mut copy = original.clone();
        copy.insert_tile(Tile::new(Position::new(1, 0), 8));
        assert_eq!(original.value_at(1, 0), 0);

        let mut snapshot = original.serialize();
        snapshot.cells[0][0] = None;
        assert_eq!(original.value_at(0, 0), 2);
    }

    #[test]
    fn snapshot_json_round_trip() {
        let grid = Grid::from_rows(&[[2, 0, 0, 0], [0, 4, 0, 0], [0, 0, 0, 0], [0, 0, 0, 2048]]).unwrap();
        let json = serde_json::to_string(&grid.serialize()).unwrap();
        let back: GridSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(Grid::try_from(back).unwrap(), grid);
    }

    #[test]
    fn key_encodes_exponents() {
        let grid = Grid::from_rows(&[[2, 0], [0, 1024]]).unwrap();
        assert_eq!(grid.key().as_bytes(), &[1, 0, 0, 10]);
        assert_eq!(grid.highest_tile(), 1024);
    }

    #[test]
    fn display_renders_rows() {
        let grid = Grid::from_rows(&[[2, 0], [0, 16]]).unwrap();
        let text = grid.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("   2   |"));
        assert!(lines[2].ends_with("  16   "));
    }
}
