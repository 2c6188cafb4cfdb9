use std::collections::{HashMap, VecDeque};

use crate::maze::MazeModel;
use crate::types::GridPos;

/// Shortest walkable paths over the 4-neighbourhood. Every edge costs the
/// same, so a breadth-first search with a fixed expansion order is optimal
/// and always returns the same path for the same endpoints.
#[derive(Clone, Copy, Debug)]
pub struct PathFinder<'a> {
    maze: &'a MazeModel,
}

impl<'a> PathFinder<'a> {
    pub fn new(maze: &'a MazeModel) -> Self {
        Self { maze }
    }

    /// Cells from `from` (exclusive) to `to` (inclusive). Empty when `to` is
    /// unreachable, not walkable, or equal to `from`.
    pub fn find_path(&self, from: GridPos, to: GridPos) -> Vec<GridPos> {
        if from == to || !self.maze.is_walkable(from) || !self.maze.is_walkable(to) {
            return Vec::new();
        }
        match self.search(from, |cell| cell == to) {
            Some((goal, parents)) => rebuild_path(from, goal, &parents),
            None => Vec::new(),
        }
    }

    /// Path to the closest cell accepted by `is_goal`, excluding `from` itself.
    pub fn nearest<F>(&self, from: GridPos, is_goal: F) -> Vec<GridPos>
    where
        F: Fn(GridPos) -> bool,
    {
        if !self.maze.is_walkable(from) {
            return Vec::new();
        }
        match self.search(from, |cell| cell != from && is_goal(cell)) {
            Some((goal, parents)) => rebuild_path(from, goal, &parents),
            None => Vec::new(),
        }
    }

    fn search<F>(&self, from: GridPos, is_goal: F) -> Option<(GridPos, HashMap<GridPos, GridPos>)>
    where
        F: Fn(GridPos) -> bool,
    {
        let mut parents: HashMap<GridPos, GridPos> = HashMap::new();
        let mut queue = VecDeque::new();
        parents.insert(from, from);
        queue.push_back(from);

        while let Some(cell) = queue.pop_front() {
            if is_goal(cell) {
                return Some((cell, parents));
            }
            for next in self.maze.neighbors(cell) {
                if parents.contains_key(&next) {
                    continue;
                }
                parents.insert(next, cell);
                queue.push_back(next);
            }
        }
        None
    }
}

fn rebuild_path(
    from: GridPos,
    goal: GridPos,
    parents: &HashMap<GridPos, GridPos>,
) -> Vec<GridPos> {
    let mut path = Vec::new();
    let mut cursor = goal;
    while cursor != from {
        path.push(cursor);
        match parents.get(&cursor) {
            Some(parent) => cursor = *parent,
            None => return Vec::new(),
        }
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{CELL_SIZE, DEFAULT_MAZE};

    fn default_maze() -> MazeModel {
        MazeModel::parse(&DEFAULT_MAZE, CELL_SIZE).expect("default maze parses")
    }

    fn bfs_distances(maze: &MazeModel, start: GridPos) -> HashMap<GridPos, usize> {
        let mut dist = HashMap::new();
        let mut queue = VecDeque::new();
        dist.insert(start, 0usize);
        queue.push_back(start);
        while let Some(cell) = queue.pop_front() {
            let d = dist[&cell];
            for (dc, dr) in [(0, 1), (0, -1), (1, 0), (-1, 0)] {
                let next = GridPos::new(cell.col + dc, cell.row + dr);
                if maze.is_walkable(next) && !dist.contains_key(&next) {
                    dist.insert(next, d + 1);
                    queue.push_back(next);
                }
            }
        }
        dist
    }

    #[test]
    fn paths_are_optimal_and_four_adjacent() {
        let maze = default_maze();
        let finder = PathFinder::new(&maze);
        let starts = [
            maze.player_spawn,
            GridPos::new(14, 11),
            GridPos::new(0, 14),
            GridPos::new(24, 20),
        ];
        for start in starts {
            assert!(maze.is_walkable(start), "fixture start {start:?} is a wall");
            let expected = bfs_distances(&maze, start);
            for target in &maze.walkable_cells {
                let path = finder.find_path(start, *target);
                if *target == start {
                    assert!(path.is_empty());
                    continue;
                }
                assert_eq!(path.len(), expected[target], "{start:?} -> {target:?}");
                assert_eq!(path.last(), Some(target));
                let mut prev = start;
                for cell in &path {
                    assert_eq!(prev.manhattan(*cell), 1);
                    assert!(maze.is_walkable(*cell));
                    prev = *cell;
                }
            }
        }
    }

    #[test]
    fn same_query_returns_same_path() {
        let maze = default_maze();
        let finder = PathFinder::new(&maze);
        let a = finder.find_path(GridPos::new(1, 1), GridPos::new(24, 20));
        let b = finder.find_path(GridPos::new(1, 1), GridPos::new(24, 20));
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn walled_off_cell_yields_empty_path() {
        let rows = ["XXXXXXX", "XPG X X", "XXXXXXX"];
        let maze = MazeModel::parse(&rows, CELL_SIZE).expect("maze parses");
        let finder = PathFinder::new(&maze);
        assert!(finder.find_path(GridPos::new(1, 1), GridPos::new(5, 1)).is_empty());
        assert_eq!(
            finder.find_path(GridPos::new(1, 1), GridPos::new(3, 1)),
            vec![GridPos::new(2, 1), GridPos::new(3, 1)]
        );
    }

    #[test]
    fn wall_endpoints_yield_empty_path() {
        let maze = default_maze();
        let finder = PathFinder::new(&maze);
        assert!(finder.find_path(GridPos::new(0, 0), GridPos::new(1, 1)).is_empty());
        assert!(finder.find_path(GridPos::new(1, 1), GridPos::new(0, 0)).is_empty());
        assert!(finder.find_path(GridPos::new(1, 1), GridPos::new(1, 1)).is_empty());
    }

    #[test]
    fn nearest_finds_closest_matching_cell() {
        let maze = default_maze();
        let finder = PathFinder::new(&maze);
        let goal = GridPos::new(1, 5);
        let path = finder.nearest(GridPos::new(1, 1), |cell| cell == goal || cell.col == 26);
        assert_eq!(path.len(), 4);
        assert_eq!(path.last(), Some(&goal));
        assert!(finder.nearest(GridPos::new(1, 1), |_| false).is_empty());
    }
}
