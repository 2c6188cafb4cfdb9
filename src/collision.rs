use crate::agent::Motion;
use crate::maze::MazeModel;
use crate::types::{Direction, GridPos, PixelPos, Rect};

/// Wall overlap queries. Walls sit on the grid, so a candidate box only has
/// to be tested against the wall cells it spans. Outside the grid, only the
/// horizontal extension of an open edge cell (a tunnel mouth) is passable.
#[derive(Clone, Debug)]
pub struct CollisionSystem {
    cell_size: i32,
    cols: i32,
    rows: i32,
    wall_mask: Vec<bool>,
    walls: Vec<Rect>,
}

impl CollisionSystem {
    pub fn new(maze: &MazeModel) -> Self {
        let mut wall_mask = Vec::with_capacity((maze.cols * maze.rows) as usize);
        for row in 0..maze.rows {
            for col in 0..maze.cols {
                wall_mask.push(maze.is_wall(GridPos::new(col, row)));
            }
        }
        Self {
            cell_size: maze.cell_size,
            cols: maze.cols,
            rows: maze.rows,
            wall_mask,
            walls: maze.wall_boxes(),
        }
    }

    pub fn walls(&self) -> &[Rect] {
        &self.walls
    }

    pub fn would_collide(&self, candidate: Rect) -> bool {
        if candidate.w <= 0 || candidate.h <= 0 {
            return false;
        }
        let first_col = candidate.x.div_euclid(self.cell_size);
        let last_col = (candidate.x + candidate.w - 1).div_euclid(self.cell_size);
        let first_row = candidate.y.div_euclid(self.cell_size);
        let last_row = (candidate.y + candidate.h - 1).div_euclid(self.cell_size);

        (first_row..=last_row)
            .any(|row| (first_col..=last_col).any(|col| self.is_blocked(col, row)))
    }

    fn is_blocked(&self, col: i32, row: i32) -> bool {
        if row < 0 || row >= self.rows {
            return true;
        }
        let col = col.clamp(0, self.cols - 1);
        self.wall_mask[(row * self.cols + col) as usize]
    }

    /// One-pixel step from the agent's position. `Direction::None` never
    /// collides and leaves the position unchanged.
    pub fn check_direction(&self, motion: &Motion, dir: Direction) -> (bool, PixelPos) {
        if dir == Direction::None {
            return (false, motion.pos);
        }
        let candidate = motion.pos.stepped(dir);
        (self.would_collide(motion.bounds_at(candidate)), candidate)
    }
}
