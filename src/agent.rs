use std::collections::VecDeque;

use crate::types::{Direction, GridPos, PixelPos, Rect};

/// Movement state shared by the player and the pursuers.
#[derive(Clone, Debug)]
pub struct Motion {
    pub pos: PixelPos,
    pub size: i32,
    pub current_dir: Direction,
    pub buffered_dir: Direction,
    pub last_dir: Direction,
    pub waypoints: VecDeque<GridPos>,
    pub next_target: Option<GridPos>,
}

impl Motion {
    pub fn new(pos: PixelPos, size: i32) -> Self {
        Self {
            pos,
            size,
            current_dir: Direction::None,
            buffered_dir: Direction::None,
            last_dir: Direction::None,
            waypoints: VecDeque::new(),
            next_target: None,
        }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds_at(self.pos)
    }

    pub fn bounds_at(&self, pos: PixelPos) -> Rect {
        Rect::square(pos, self.size)
    }

    pub fn grid_cell(&self, cell_size: i32) -> GridPos {
        self.pos.to_grid(cell_size)
    }

    pub fn set_dir(&mut self, dir: Direction) {
        self.current_dir = dir;
        self.buffered_dir = dir;
    }

    pub fn replace_path(&mut self, path: Vec<GridPos>) {
        self.waypoints = path.into();
        self.next_target = self.waypoints.pop_front();
    }

    pub fn advance_waypoint(&mut self) {
        self.next_target = self.waypoints.pop_front();
    }
}
