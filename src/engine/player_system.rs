use super::*;

use crate::constants::{ITEM_SCORE, POWER_ITEM_SCORE, PURSUER_SCORE};

impl GameEngine {
    pub(super) fn tick_player(&mut self, now_ms: u64) {
        let width = self.maze.width_pixels();
        let collision = &self.collision;
        let Some(player) = self.player.as_mut() else {
            return;
        };
        let motion = &mut player.motion;

        if motion.pos.x < 0 {
            motion.pos.x = width;
        } else if motion.pos.x > width {
            motion.pos.x = 0;
        }
        player.last_safe = motion.pos;

        let (buffered_blocked, _) = collision.check_direction(motion, motion.buffered_dir);
        if buffered_blocked {
            let dir = motion.current_dir;
            step_player(collision, motion, dir);
        } else {
            let dir = motion.buffered_dir;
            step_player(collision, motion, dir);
            motion.current_dir = dir;
        }

        if collision.would_collide(motion.bounds()) {
            motion.pos = player.last_safe;
        }

        self.collect_items();
        if !self.session.won && self.items.is_empty() {
            self.session.set_won();
            self.events.push(RuntimeEvent::Victory);
            info!(
                tick = self.tick_counter,
                score = self.session.score,
                "all items collected"
            );
        }
        self.collect_power_items(now_ms);
        self.resolve_pursuer_contacts();
    }

    fn collect_items(&mut self) {
        let Some(player_box) = self.player_bounds() else {
            return;
        };
        let cell_size = self.maze.cell_size;
        let eaten: Vec<GridPos> = self
            .items
            .iter()
            .copied()
            .filter(|cell| pickup_box(*cell, cell_size, ITEM_SIZE).overlaps(&player_box))
            .collect();
        for cell in eaten {
            if self.items.remove(&cell) {
                self.session.add_score(ITEM_SCORE);
                self.events.push(RuntimeEvent::ItemEaten {
                    col: cell.col,
                    row: cell.row,
                });
            }
        }
    }

    fn collect_power_items(&mut self, now_ms: u64) {
        let Some(player_box) = self.player_bounds() else {
            return;
        };
        let cell_size = self.maze.cell_size;
        let touched: Vec<GridPos> = self
            .power_items
            .iter()
            .copied()
            .filter(|cell| pickup_box(*cell, cell_size, POWER_ITEM_SIZE).overlaps(&player_box))
            .collect();
        for cell in touched {
            let mode_before = self.session.mode;
            if !self.session.activate_power(now_ms) {
                continue;
            }
            if self.session.mode != mode_before {
                self.events.push(RuntimeEvent::ModeChanged {
                    mode: self.session.mode,
                    phase_index: self.session.phase_index,
                });
            }
            self.power_items.remove(&cell);
            self.session.add_score(POWER_ITEM_SCORE);
            self.events.push(RuntimeEvent::PowerItemTaken {
                col: cell.col,
                row: cell.row,
            });
            debug!(tick = self.tick_counter, col = cell.col, row = cell.row, "power active");
        }
    }

    pub(super) fn resolve_pursuer_contacts(&mut self) {
        let Some(player_box) = self.player_bounds() else {
            return;
        };
        let touching: Vec<usize> = self
            .pursuers
            .iter()
            .enumerate()
            .filter_map(|(slot, pursuer)| {
                let pursuer = pursuer.as_ref()?;
                pursuer
                    .motion
                    .bounds()
                    .overlaps(&player_box)
                    .then_some(slot)
            })
            .collect();

        for slot in touching {
            if self.session.power_active {
                if let Some(pursuer) = self.pursuers[slot].take() {
                    self.session.add_score(PURSUER_SCORE);
                    self.events.push(RuntimeEvent::PursuerEaten {
                        pursuer_id: pursuer.id,
                    });
                }
            } else if !self.session.won {
                self.lose_life();
                break;
            }
        }
    }

    fn lose_life(&mut self) {
        let lives_left = self.session.lose_life();
        self.events.push(RuntimeEvent::LifeLost { lives_left });
        info!(tick = self.tick_counter, lives_left, "life lost");

        if lives_left == 0 {
            self.player = None;
            return;
        }
        if let Some(player) = self.player.as_mut() {
            player.motion.pos = player.spawn;
            player.motion.set_dir(Direction::None);
            player.last_safe = player.spawn;
        }
    }
}

/// One-pixel step that remembers the direction it came from. A blocked step
/// falls back to that remembered direction instead of moving.
fn step_player(collision: &CollisionSystem, motion: &mut Motion, dir: Direction) {
    let (blocked, candidate) = collision.check_direction(motion, dir);
    if blocked {
        motion.current_dir = motion.last_dir;
    } else {
        motion.last_dir = motion.current_dir;
        motion.pos = candidate;
    }
}
