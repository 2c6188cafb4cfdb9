use crate::engine::GameEngine;
use crate::maze::MazeModel;
use crate::pathfinding::PathFinder;
use crate::types::{Direction, GridPos, PixelPos, Rect};

/// Manhattan distance at which an unpowered player starts running away.
const DANGER_DISTANCE: i32 = 3;

/// Input for the player this tick. Flees nearby pursuers unless powered,
/// hunts the nearest pursuer while powered, and otherwise walks to the
/// closest remaining item.
pub fn choose_direction(engine: &GameEngine) -> Direction {
    let Some(bounds) = engine.player_bounds() else {
        return Direction::None;
    };
    let maze = engine.maze();
    let here = center_cell(maze, bounds);
    let threats: Vec<GridPos> = engine
        .pursuer_bounds()
        .into_iter()
        .map(|pursuer| center_cell(maze, pursuer))
        .collect();
    let finder = PathFinder::new(maze);

    if engine.session().power_active {
        let path = finder.nearest(here, |cell| threats.contains(&cell));
        if let Some(dir) = first_step(here, &path) {
            return dir;
        }
    } else if threats
        .iter()
        .any(|threat| threat.manhattan(here) <= DANGER_DISTANCE)
    {
        if let Some(dir) = escape_direction(maze, here, &threats) {
            return dir;
        }
    }

    let items = engine.items();
    let path = finder.nearest(here, |cell| items.contains(&cell));
    first_step(here, &path).unwrap_or(Direction::None)
}

fn center_cell(maze: &MazeModel, bounds: Rect) -> GridPos {
    let center = PixelPos::new(bounds.x + bounds.w / 2, bounds.y + bounds.h / 2);
    maze.clamp_cell(center.to_grid(maze.cell_size))
}

fn escape_direction(maze: &MazeModel, here: GridPos, threats: &[GridPos]) -> Option<Direction> {
    let mut best: Option<(i32, GridPos)> = None;
    for next in maze.neighbors(here) {
        let clearance = threats
            .iter()
            .map(|threat| threat.manhattan(next))
            .min()
            .unwrap_or(i32::MAX);
        match best {
            Some((score, _)) if score >= clearance => {}
            _ => best = Some((clearance, next)),
        }
    }
    best.map(|(_, next)| direction_between(here, next))
}

fn first_step(here: GridPos, path: &[GridPos]) -> Option<Direction> {
    path.first().map(|next| direction_between(here, *next))
}

fn direction_between(from: GridPos, to: GridPos) -> Direction {
    match (to.col - from.col, to.row - from.row) {
        (dc, 0) if dc < 0 => Direction::Left,
        (dc, 0) if dc > 0 => Direction::Right,
        (0, dr) if dr < 0 => Direction::Up,
        (0, dr) if dr > 0 => Direction::Down,
        _ => Direction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TICK_MS;
    use crate::engine::GameEngineOptions;

    fn engine_with(rows: &[&str]) -> GameEngine {
        GameEngine::new(GameEngineOptions {
            seed: 5,
            maze_rows: rows.iter().map(|row| row.to_string()).collect(),
        })
        .expect("fixture maze parses")
    }

    #[test]
    fn heads_for_the_nearest_item() {
        let engine = GameEngine::new(GameEngineOptions::default()).expect("default maze parses");
        assert_eq!(choose_direction(&engine), Direction::Right);
    }

    #[test]
    fn flees_a_close_pursuer() {
        let engine = engine_with(&["XXXXXXX", "XG P  X", "XXXXXXX"]);
        assert_eq!(choose_direction(&engine), Direction::Right);
    }

    #[test]
    fn hunts_pursuers_while_powered() {
        let mut engine = engine_with(&["XXXXXXXX", "XG  OP X", "XXXXXXXX"]);
        for _ in 0..20 {
            if engine.session().power_active {
                break;
            }
            engine.receive_input(Direction::Left);
            engine.step(TICK_MS);
        }
        assert!(engine.session().power_active);
        assert_eq!(choose_direction(&engine), Direction::Left);
    }

    #[test]
    fn direction_between_adjacent_cells() {
        let here = GridPos::new(4, 4);
        assert_eq!(direction_between(here, GridPos::new(3, 4)), Direction::Left);
        assert_eq!(direction_between(here, GridPos::new(5, 4)), Direction::Right);
        assert_eq!(direction_between(here, GridPos::new(4, 3)), Direction::Up);
        assert_eq!(direction_between(here, GridPos::new(4, 5)), Direction::Down);
        assert_eq!(direction_between(here, here), Direction::None);
    }
}
