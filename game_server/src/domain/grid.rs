// Broad-phase spatial partition. Rebuilt from scratch every physics substep,
// so cells hold plain indices into the live entity list.

#[derive(Debug)]
pub struct SpatialGrid {
    rows: usize,
    cols: usize,
    cell_width: f64,
    cell_height: f64,
    cells: Vec<Vec<usize>>,
}

impl SpatialGrid {
    pub fn new(width: f64, height: f64, rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cell_width: width / cols as f64,
            cell_height: height / rows as f64,
            cells: vec![Vec::new(); rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Empties all cells without dropping their allocations.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Inserts `slot` into every cell the box overlaps. An entity spanning a
    /// cell boundary lands in each of the touched cells; parts hanging
    /// outside the grid are skipped.
    pub fn insert(&mut self, slot: usize, x: f64, y: f64, width: f64, height: f64) {
        let left_col = (x / self.cell_width).floor() as i64;
        let right_col = ((x + width) / self.cell_width).floor() as i64;
        let top_row = (y / self.cell_height).floor() as i64;
        let bottom_row = ((y + height) / self.cell_height).floor() as i64;

        for row in top_row..=bottom_row {
            for col in left_col..=right_col {
                if row >= 0 && (row as usize) < self.rows && col >= 0 && (col as usize) < self.cols
                {
                    let index = self.index(row as usize, col as usize);
                    self.cells[index].push(slot);
                }
            }
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> &[usize] {
        &self.cells[self.index(row, col)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_spanning_cells_lands_in_each() {
        let mut grid = SpatialGrid::new(1000.0, 1000.0, 4, 4);
        // 250px cells; a box from 200 to 300 straddles columns 0 and 1.
        grid.insert(7, 200.0, 10.0, 100.0, 50.0);
        assert!(grid.cell(0, 0).contains(&7));
        assert!(grid.cell(0, 1).contains(&7));
        assert!(grid.cell(1, 0).is_empty());
    }

    #[test]
    fn overlapping_entities_share_at_least_one_cell() {
        // Two boxes overlapping in world space must always be co-tested: the
        // cells covering the overlap region receive both indices.
        let mut grid = SpatialGrid::new(1000.0, 1000.0, 4, 4);
        grid.insert(0, 240.0, 240.0, 60.0, 60.0);
        grid.insert(1, 260.0, 260.0, 60.0, 60.0);

        let mut shared = false;
        for row in 0..4 {
            for col in 0..4 {
                let cell = grid.cell(row, col);
                if cell.contains(&0) && cell.contains(&1) {
                    shared = true;
                }
            }
        }
        assert!(shared);
    }

    #[test]
    fn distant_entities_never_share_a_cell() {
        let mut grid = SpatialGrid::new(1000.0, 1000.0, 4, 4);
        grid.insert(0, 10.0, 10.0, 30.0, 30.0);
        grid.insert(1, 900.0, 900.0, 30.0, 30.0);

        for row in 0..4 {
            for col in 0..4 {
                let cell = grid.cell(row, col);
                assert!(!(cell.contains(&0) && cell.contains(&1)));
            }
        }
    }

    #[test]
    fn out_of_bounds_insertion_is_skipped() {
        let mut grid = SpatialGrid::new(1000.0, 1000.0, 4, 4);
        grid.insert(3, -80.0, -80.0, 50.0, 50.0);
        for row in 0..4 {
            for col in 0..4 {
                assert!(grid.cell(row, col).is_empty());
            }
        }
    }

    #[test]
    fn clear_empties_every_cell() {
        let mut grid = SpatialGrid::new(1000.0, 1000.0, 4, 4);
        grid.insert(0, 100.0, 100.0, 700.0, 700.0);
        grid.clear();
        for row in 0..4 {
            for col in 0..4 {
                assert!(grid.cell(row, col).is_empty());
            }
        }
    }
}
