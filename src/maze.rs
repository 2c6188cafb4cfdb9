use std::collections::{HashSet, VecDeque};

use crate::error::MazeError;
use crate::types::{GridPos, Rect};

const WALL_TILE: char = 'X';
const FLOOR_TILE: char = ' ';
const POWER_TILE: char = 'O';
const PLAYER_SPAWN_TILE: char = 'P';
const PURSUER_SPAWN_TILE: char = 'G';

/// Immutable passability grid plus the cell sets derived from it at load time.
#[derive(Clone, Debug)]
pub struct MazeModel {
    pub cols: i32,
    pub rows: i32,
    pub cell_size: i32,
    passable: Vec<bool>,
    pub walkable_cells: Vec<GridPos>,
    pub item_cells: Vec<GridPos>,
    pub power_item_cells: Vec<GridPos>,
    pub pursuer_spawn_cells: Vec<GridPos>,
    pub player_spawn: GridPos,
    /// Walkable cells connected to the player spawn.
    pub reachable_cells: Vec<GridPos>,
}

impl MazeModel {
    pub fn parse<S: AsRef<str>>(rows: &[S], cell_size: i32) -> Result<Self, MazeError> {
        let Some(first) = rows.first() else {
            return Err(MazeError::Empty);
        };
        let expected = first.as_ref().chars().count();
        if expected == 0 {
            return Err(MazeError::Empty);
        }

        let mut passable = Vec::with_capacity(expected * rows.len());
        let mut walkable_cells = Vec::new();
        let mut power_item_cells = Vec::new();
        let mut pursuer_spawn_cells = Vec::new();
        let mut player_spawn = None;

        for (row_idx, row) in rows.iter().enumerate() {
            let actual = row.as_ref().chars().count();
            if actual != expected {
                return Err(MazeError::NotRectangular {
                    row: row_idx,
                    expected,
                    actual,
                });
            }
            for (col_idx, tile) in row.as_ref().chars().enumerate() {
                let cell = GridPos::new(col_idx as i32, row_idx as i32);
                match tile {
                    WALL_TILE => {
                        passable.push(false);
                        continue;
                    }
                    FLOOR_TILE => {}
                    POWER_TILE => power_item_cells.push(cell),
                    PLAYER_SPAWN_TILE => {
                        if player_spawn.is_none() {
                            player_spawn = Some(cell);
                        }
                    }
                    PURSUER_SPAWN_TILE => pursuer_spawn_cells.push(cell),
                    other => {
                        return Err(MazeError::UnknownTile {
                            row: row_idx,
                            col: col_idx,
                            tile: other,
                        });
                    }
                }
                passable.push(true);
                walkable_cells.push(cell);
            }
        }

        let Some(player_spawn) = player_spawn else {
            return Err(MazeError::MissingPlayerSpawn);
        };
        if pursuer_spawn_cells.is_empty() {
            return Err(MazeError::MissingPursuerSpawn);
        }

        let mut maze = Self {
            cols: expected as i32,
            rows: rows.len() as i32,
            cell_size,
            passable,
            item_cells: walkable_cells.clone(),
            walkable_cells,
            power_item_cells,
            pursuer_spawn_cells,
            player_spawn,
            reachable_cells: Vec::new(),
        };
        let reachable = maze.reachable_from(player_spawn);
        maze.reachable_cells = maze
            .walkable_cells
            .iter()
            .copied()
            .filter(|cell| reachable.contains(cell))
            .collect();
        Ok(maze)
    }

    pub fn in_bounds(&self, cell: GridPos) -> bool {
        cell.col >= 0 && cell.row >= 0 && cell.col < self.cols && cell.row < self.rows
    }

    pub fn is_walkable(&self, cell: GridPos) -> bool {
        if !self.in_bounds(cell) {
            return false;
        }
        self.passable[self.index_of(cell)]
    }

    pub fn is_wall(&self, cell: GridPos) -> bool {
        self.in_bounds(cell) && !self.passable[self.index_of(cell)]
    }

    pub fn width_pixels(&self) -> i32 {
        self.cols * self.cell_size
    }

    pub fn clamp_cell(&self, cell: GridPos) -> GridPos {
        GridPos::new(
            cell.col.clamp(0, self.cols - 1),
            cell.row.clamp(0, self.rows - 1),
        )
    }

    pub fn wall_boxes(&self) -> Vec<Rect> {
        let mut out = Vec::new();
        for row in 0..self.rows {
            for col in 0..self.cols {
                let cell = GridPos::new(col, row);
                if self.is_wall(cell) {
                    out.push(Rect::square(cell.to_pixel(self.cell_size), self.cell_size));
                }
            }
        }
        out
    }

    /// Tiles as the renderer sees them: spawn and power markers are stripped.
    pub fn runtime_tiles(&self) -> Vec<String> {
        (0..self.rows)
            .map(|row| {
                (0..self.cols)
                    .map(|col| {
                        if self.is_wall(GridPos::new(col, row)) {
                            WALL_TILE
                        } else {
                            FLOOR_TILE
                        }
                    })
                    .collect()
            })
            .collect()
    }

    pub fn neighbors(&self, cell: GridPos) -> impl Iterator<Item = GridPos> + '_ {
        [
            GridPos::new(cell.col - 1, cell.row),
            GridPos::new(cell.col + 1, cell.row),
            GridPos::new(cell.col, cell.row - 1),
            GridPos::new(cell.col, cell.row + 1),
        ]
        .into_iter()
        .filter(|next| self.is_walkable(*next))
    }

    pub fn reachable_from(&self, start: GridPos) -> HashSet<GridPos> {
        let mut out = HashSet::new();
        if !self.is_walkable(start) {
            return out;
        }

        let mut queue = VecDeque::new();
        out.insert(start);
        queue.push_back(start);
        while let Some(cell) = queue.pop_front() {
            for next in self.neighbors(cell) {
                if out.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        out
    }

    fn index_of(&self, cell: GridPos) -> usize {
        (cell.row * self.cols + cell.col) as usize
    }
}
