// Arena layout: fixed world bounds carved into a square cell grid, with
// unwalkable wall spans expressed in grid coordinates.

use rand::Rng;

use super::entity::Entity;

/// A rectangular wall region in grid coordinates, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallSpan {
    pub x_start: i32,
    pub y_start: i32,
    pub x_end: i32,
    pub y_end: i32,
}

impl WallSpan {
    pub fn cell(x: i32, y: i32) -> Self {
        Self {
            x_start: x,
            y_start: y,
            x_end: x,
            y_end: y,
        }
    }

    /// Every individual grid cell the span covers.
    pub fn cells(&self) -> Vec<(i32, i32)> {
        let mut coordinates = Vec::new();
        for x in self.x_start..=self.x_end {
            for y in self.y_start..=self.y_end {
                coordinates.push((x, y));
            }
        }
        coordinates
    }

    /// Extends spans that touch the grid border one cell past it, so an
    /// entity squeezed between a border wall and the world bounds clamp is
    /// still pushed out of the wall rather than trapped inside it.
    pub fn overshoot(&self, cols: i32, rows: i32) -> WallSpan {
        WallSpan {
            x_start: if self.x_start == 0 { -1 } else { self.x_start },
            y_start: if self.y_start == 0 { -1 } else { self.y_start },
            x_end: if self.x_end == cols - 1 {
                cols
            } else {
                self.x_end
            },
            y_end: if self.y_end == rows - 1 {
                rows
            } else {
                self.y_end
            },
        }
    }
}

/// World bounds plus the unwalkable wall set. The same cell count describes
/// both the broad-phase grid and the path grid.
#[derive(Debug, Clone)]
pub struct ArenaLayout {
    pub cell_count: usize,
    pub cell_size: f64,
    pub walls: Vec<WallSpan>,
}

impl Default for ArenaLayout {
    fn default() -> Self {
        let cell_count = 10;
        Self {
            cell_count,
            cell_size: 250.0,
            walls: border_ring(cell_count as i32),
        }
    }
}

impl ArenaLayout {
    pub fn width(&self) -> f64 {
        self.cell_size * self.cell_count as f64
    }

    pub fn height(&self) -> f64 {
        self.cell_size * self.cell_count as f64
    }

    pub fn rows(&self) -> usize {
        self.cell_count
    }

    pub fn cols(&self) -> usize {
        self.cell_count
    }

    /// Wall spans adjusted for border overshoot, the set used by the
    /// per-substep penetration resolve.
    pub fn overshoot_walls(&self) -> Vec<WallSpan> {
        let n = self.cell_count as i32;
        self.walls.iter().map(|w| w.overshoot(n, n)).collect()
    }

    /// Flat list of every wall cell, the form the agent bridge consumes.
    pub fn expanded_wall_cells(&self) -> Vec<(i32, i32)> {
        self.walls.iter().flat_map(|w| w.cells()).collect()
    }

    /// Random position inside a one-cell inset of the world bounds.
    pub fn random_spawn<R: Rng>(&self, rng: &mut R) -> (f64, f64) {
        let inset = 1.0;
        let min = self.cell_size * inset;
        let max = self.cell_size * (self.cell_count as f64 - 1.0 - inset);
        (
            min + rng.gen_range(0.0..1.0) * max,
            min + rng.gen_range(0.0..1.0) * max,
        )
    }
}

/// The default wall set: a one-cell ring around the whole arena.
pub fn border_ring(cell_count: i32) -> Vec<WallSpan> {
    let mut walls = Vec::new();
    for i in 0..cell_count {
        walls.push(WallSpan::cell(0, i));
        walls.push(WallSpan::cell(cell_count - 1, i));
        walls.push(WallSpan::cell(i, 0));
        walls.push(WallSpan::cell(i, cell_count - 1));
    }
    walls
}

/// If the entity's box overlaps a wall span, pushes it fully outside along
/// whichever boundary is closest.
pub fn resolve_wall_penetration(entity: &mut Entity, walls: &[WallSpan], layout: &ArenaLayout) {
    let cell_width = layout.width() / layout.cols() as f64;
    let cell_height = layout.height() / layout.rows() as f64;

    for wall in walls {
        let left = wall.x_start as f64 * cell_width;
        let top = wall.y_start as f64 * cell_height;
        let right = left + (wall.x_end - wall.x_start + 1) as f64 * cell_width;
        let bottom = top + (wall.y_end - wall.y_start + 1) as f64 * cell_height;

        let overlaps = entity.x + entity.width > left
            && entity.x < right
            && entity.y + entity.height > top
            && entity.y < bottom;
        if overlaps {
            push_outside(entity, left, right, top, bottom);
        }
    }
}

fn push_outside(entity: &mut Entity, min_x: f64, max_x: f64, min_y: f64, max_y: f64) {
    let from_top = min_y - entity.y;
    let from_bottom = entity.y + entity.height - max_y;
    let from_left = min_x - entity.x;
    let from_right = entity.x + entity.width - max_x;
    let deepest = from_left.max(from_right).max(from_top).max(from_bottom);

    if from_left == deepest {
        entity.x = min_x - entity.width;
    } else if from_right == deepest {
        entity.x = max_x;
    } else if from_top == deepest {
        entity.y = min_y - entity.height;
    } else {
        entity.y = max_y;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::entity::{EntityKind, Progress, Shape};

    fn walker(x: f64, y: f64) -> Entity {
        Entity {
            id: 1,
            name: None,
            x,
            y,
            width: 35.0,
            height: 35.0,
            color: "#ffffff".to_string(),
            speed: 10.0,
            direction: None,
            shape: Shape::Ellipse,
            max_health: 100.0,
            current_health: 100.0,
            regen_rate: 0.5,
            regen_delay: Duration::from_secs(10),
            last_damage: None,
            body_damage: 20.0,
            last_damager: None,
            kind: EntityKind::Agent {
                progress: Progress::new(1000.0),
            },
        }
    }

    #[test]
    fn border_ring_covers_all_four_edges() {
        let layout = ArenaLayout::default();
        let cells = layout.expanded_wall_cells();
        assert!(cells.contains(&(0, 4)));
        assert!(cells.contains(&(9, 4)));
        assert!(cells.contains(&(4, 0)));
        assert!(cells.contains(&(4, 9)));
        assert!(!cells.contains(&(4, 4)));
    }

    #[test]
    fn overshoot_extends_border_spans_past_the_grid() {
        let span = WallSpan::cell(0, 3).overshoot(10, 10);
        assert_eq!(span.x_start, -1);
        assert_eq!(span.y_start, 3);

        let span = WallSpan::cell(9, 9).overshoot(10, 10);
        assert_eq!(span.x_end, 10);
        assert_eq!(span.y_end, 10);
    }

    #[test]
    fn entity_inside_a_wall_is_pushed_out_along_nearest_edge() {
        let layout = ArenaLayout::default();
        let walls = layout.overshoot_walls();

        // Barely into the left border wall (cells x=0 span world x 0..250,
        // overshot to -250..250): nearest boundary is the right one.
        let mut e = walker(230.0, 1200.0);
        resolve_wall_penetration(&mut e, &walls, &layout);
        assert_eq!(e.x, 250.0);
        assert_eq!(e.y, 1200.0);
    }

    #[test]
    fn entity_clear_of_walls_is_untouched() {
        let layout = ArenaLayout::default();
        let walls = layout.overshoot_walls();
        let mut e = walker(1200.0, 1200.0);
        resolve_wall_penetration(&mut e, &walls, &layout);
        assert_eq!((e.x, e.y), (1200.0, 1200.0));
    }

    #[test]
    fn random_spawn_stays_inside_the_inset() {
        let layout = ArenaLayout::default();
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let (x, y) = layout.random_spawn(&mut rng);
            assert!(x >= layout.cell_size);
            assert!(x <= layout.width() - layout.cell_size);
            assert!(y >= layout.cell_size);
            assert!(y <= layout.height() - layout.cell_size);
        }
    }
}
