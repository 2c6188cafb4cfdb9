use super::*;

use rand::Rng;

use super::utils::{steer_toward, Steer};
use crate::pathfinding::PathFinder;

impl GameEngine {
    pub(super) fn tick_pursuer(&mut self, slot: usize) {
        let cell_size = self.maze.cell_size;
        let steer = {
            let Some(pursuer) = self.pursuers.get_mut(slot).and_then(Option::as_mut) else {
                return;
            };
            let motion = &mut pursuer.motion;
            if motion
                .next_target
                .is_some_and(|target| motion.pos == target.to_pixel(cell_size))
            {
                motion.advance_waypoint();
            }
            steer_toward(motion.pos, motion.next_target, cell_size)
        };

        let dir = match steer {
            Steer::Move(dir) => dir,
            Steer::Hold => Direction::None,
            Steer::Replan => {
                self.request_path(slot);
                Direction::None
            }
        };

        // Waypoints are adjacent walkable cells, so the step is not re-checked
        // against walls.
        if let Some(pursuer) = self.pursuers.get_mut(slot).and_then(Option::as_mut) {
            pursuer.motion.current_dir = dir;
            pursuer.motion.pos = pursuer.motion.pos.stepped(dir);
        }
    }

    fn request_path(&mut self, slot: usize) {
        let cell_size = self.maze.cell_size;
        let Some(from) = self
            .pursuers
            .get(slot)
            .and_then(Option::as_ref)
            .map(|pursuer| pursuer.motion.grid_cell(cell_size))
        else {
            return;
        };

        let chase_target = if self.session.is_pursuit_active() {
            self.player
                .as_ref()
                .map(|player| self.maze.clamp_cell(player.motion.grid_cell(cell_size)))
        } else {
            None
        };
        let Some(target) = chase_target.or_else(|| self.random_wander_cell()) else {
            return;
        };

        let path = PathFinder::new(&self.maze).find_path(from, target);
        if path.is_empty() {
            debug!(
                tick = self.tick_counter,
                pursuer = slot,
                from = ?from,
                target = ?target,
                "no path for pursuer"
            );
        }
        if let Some(pursuer) = self.pursuers.get_mut(slot).and_then(Option::as_mut) {
            pursuer.motion.replace_path(path);
        }
    }

    fn random_wander_cell(&mut self) -> Option<GridPos> {
        let cells = &self.maze.reachable_cells;
        if cells.is_empty() {
            return None;
        }
        let idx = self.rng.random_range(0..cells.len());
        cells.get(idx).copied()
    }
}
