use crate::engine::{find_farthest_position, Direction, Grid, Position};

/// Bonus for every empty cell.
pub const EMPTY_CELL_BONUS: f64 = 8.0;

/// Positional weights for 4x4 grids, indexed `[x][y]`.
///
/// Antisymmetric: the (3, 0) corner weighs 1, the (0, 3) corner -1.
const WEIGHTS_4X4: [[f64; 4]; 4] = [
    [0.0, -0.3, -0.6, -1.0],
    [0.3, 0.0, 0.0, -0.6],
    [0.6, 0.0, 0.0, -0.3],
    [1.0, 0.6, 0.3, 0.0],
];

/// Positional weight of cell `(x, y)` on a grid of side `size`.
///
/// 4x4 grids use the fixed table. Other sizes get the same shape as a
/// ramp: border cells weigh `(x - y) / (size - 1)`, interior cells weigh 0.
pub fn position_weight(size: usize, x: usize, y: usize) -> f64 {
    if size == 4 {
        return WEIGHTS_4X4[x][y];
    }
    let last = size.saturating_sub(1);
    if last == 0 {
        return 0.0;
    }
    let on_border = x == 0 || y == 0 || x == last || y == last;
    if on_border { (x as f64 - y as f64) / last as f64 } else { 0.0 }
}

/// Rate a grid by positional weight, raw tile mass, emptiness and latent merges.
///
/// Latent merges look past empty cells: a tile whose first occupied neighbour
/// along a line has the same value earns its value again, once per direction.
///
/// ```
/// use ai_2048_grid::engine::Grid;
/// use ai_2048_grid::expectimax::rate_grid;
/// assert_eq!(rate_grid(&Grid::new(4).unwrap()), 16.0 * 8.0);
/// ```
pub fn rate_grid(grid: &Grid) -> f64 {
    let size = grid.size();
    let mut points = 0.0;
    grid.each_cell(|x, y, tile| {
        let v = tile.map_or(0, |t| t.value);
        let value = f64::from(v);
        points += position_weight(size, x, y) * value;
        points += value;
        if v == 0 {
            points += EMPTY_CELL_BONUS;
        }
        let cell = Position::new(x as i32, y as i32);
        for dir in Direction::ALL {
            let farthest = find_farthest_position(grid, cell, dir.vector());
            if grid.cell_content(farthest.next).is_some_and(|next| next.value == v) {
                points += value;
            }
        }
    });
    points
}
