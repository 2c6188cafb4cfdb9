use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::agent::Motion;
use crate::collision::CollisionSystem;
use crate::constants::{
    default_maze_rows, phase_durations_ms, CELL_SIZE, ITEM_SIZE, MOUTH_TOGGLE_MS, PHASE_TABLE,
    POWER_DURATION_MS, POWER_ITEM_SIZE, STARTING_LIVES, TICK_RATE,
};
use crate::error::MazeError;
use crate::maze::MazeModel;
use crate::session::{SessionState, TimerEvent};
use crate::types::{
    Direction, GameConfig, GameOverReason, GameSummary, GridPos, PhaseView, PickupView,
    PixelPos, PlayerView, PursuerPalette, PursuerView, Rect, RuntimeEvent, Snapshot, WorldInit,
};

mod player_system;
mod pursuer_system;
mod utils;

use self::utils::pickup_box;

/// Tick order entry. Pursuers come first in maze scan order, the player last.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ActorRef {
    Player,
    Pursuer(usize),
}

#[derive(Clone, Debug)]
struct PlayerInternal {
    motion: Motion,
    spawn: PixelPos,
    last_safe: PixelPos,
    mouth_open: bool,
}

#[derive(Clone, Debug)]
struct PursuerInternal {
    id: usize,
    motion: Motion,
    palette: PursuerPalette,
}

#[derive(Clone, Debug)]
pub struct GameEngineOptions {
    pub seed: u64,
    pub maze_rows: Vec<String>,
}

impl Default for GameEngineOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            maze_rows: default_maze_rows(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GameEngine {
    pub config: GameConfig,

    maze: MazeModel,
    collision: CollisionSystem,
    session: SessionState,
    rng: StdRng,
    player: Option<PlayerInternal>,
    pursuers: Vec<Option<PursuerInternal>>,
    registration: Vec<ActorRef>,
    items: BTreeSet<GridPos>,
    power_items: BTreeSet<GridPos>,
    events: Vec<RuntimeEvent>,

    elapsed_ms: u64,
    tick_counter: u64,
    end_reason: Option<GameOverReason>,
}

impl GameEngine {
    pub fn new(options: GameEngineOptions) -> Result<Self, MazeError> {
        let maze = MazeModel::parse(&options.maze_rows, CELL_SIZE)?;
        let collision = CollisionSystem::new(&maze);

        let config = GameConfig {
            tick_rate: TICK_RATE,
            cell_size: CELL_SIZE,
            starting_lives: STARTING_LIVES,
            power_duration_ms: POWER_DURATION_MS,
            mouth_toggle_ms: MOUTH_TOGGLE_MS,
            phases: (0..PHASE_TABLE.len())
                .map(|idx| {
                    let (scatter_ms, chase_ms) = phase_durations_ms(idx);
                    PhaseView {
                        scatter_ms,
                        chase_ms,
                    }
                })
                .collect(),
            seed: options.seed,
        };

        let mut pursuers = Vec::new();
        let mut registration = Vec::new();
        for (index, cell) in maze.pursuer_spawn_cells.iter().enumerate() {
            pursuers.push(Some(PursuerInternal {
                id: index + 1,
                motion: Motion::new(cell.to_pixel(CELL_SIZE), CELL_SIZE),
                palette: PursuerPalette::for_spawn_index(index),
            }));
            registration.push(ActorRef::Pursuer(index));
        }
        registration.push(ActorRef::Player);

        let spawn = maze.player_spawn.to_pixel(CELL_SIZE);
        let player = PlayerInternal {
            motion: Motion::new(spawn, CELL_SIZE),
            spawn,
            last_safe: spawn,
            mouth_open: true,
        };

        debug!(
            cols = maze.cols,
            rows = maze.rows,
            items = maze.item_cells.len(),
            pursuers = pursuers.len(),
            seed = options.seed,
            "maze loaded"
        );

        Ok(Self {
            config,
            items: maze.item_cells.iter().copied().collect(),
            power_items: maze.power_item_cells.iter().copied().collect(),
            collision,
            maze,
            session: SessionState::new(0),
            rng: StdRng::seed_from_u64(options.seed),
            player: Some(player),
            pursuers,
            registration,
            events: Vec::new(),
            elapsed_ms: 0,
            tick_counter: 0,
            end_reason: None,
        })
    }

    pub fn is_ended(&self) -> bool {
        self.end_reason.is_some()
    }

    pub fn end_reason(&self) -> Option<GameOverReason> {
        self.end_reason
    }

    pub fn maze(&self) -> &MazeModel {
        &self.maze
    }

    pub fn collision(&self) -> &CollisionSystem {
        &self.collision
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn items(&self) -> &BTreeSet<GridPos> {
        &self.items
    }

    pub fn power_items(&self) -> &BTreeSet<GridPos> {
        &self.power_items
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    pub fn player_position(&self) -> Option<PixelPos> {
        self.player.as_ref().map(|player| player.motion.pos)
    }

    pub fn player_bounds(&self) -> Option<Rect> {
        self.player.as_ref().map(|player| player.motion.bounds())
    }

    pub fn pursuer_bounds(&self) -> Vec<Rect> {
        self.pursuers
            .iter()
            .flatten()
            .map(|pursuer| pursuer.motion.bounds())
            .collect()
    }

    pub fn get_world_init(&self) -> WorldInit {
        WorldInit {
            cols: self.maze.cols,
            rows: self.maze.rows,
            cell_size: self.maze.cell_size,
            tiles: self.maze.runtime_tiles(),
            walls: self.collision.walls().to_vec(),
            config: self.config.clone(),
        }
    }

    /// Sets the buffered direction; applied on the player's next tick.
    pub fn receive_input(&mut self, dir: Direction) {
        if let Some(player) = self.player.as_mut() {
            player.motion.buffered_dir = dir;
        }
    }

    pub fn step(&mut self, dt_ms: u64) {
        if self.is_ended() {
            return;
        }
        self.tick_counter += 1;
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        let now_ms = self.elapsed_ms;

        self.apply_timers(now_ms);
        for order in 0..self.registration.len() {
            match self.registration[order] {
                ActorRef::Pursuer(slot) => self.tick_pursuer(slot),
                ActorRef::Player => self.tick_player(now_ms),
            }
        }
        self.compact_registration();
        self.check_game_over();
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let cell_size = self.maze.cell_size;
        let frightened = self.session.power_active;
        Snapshot {
            tick: self.tick_counter,
            elapsed_ms: self.elapsed_ms,
            hud: self.session.hud(self.is_ended()),
            player: self.player.as_ref().map(|player| PlayerView {
                x: player.motion.pos.x,
                y: player.motion.pos.y,
                size: player.motion.size,
                dir: player.motion.current_dir,
                mouth_open: player.mouth_open,
            }),
            pursuers: self
                .pursuers
                .iter()
                .flatten()
                .map(|pursuer| PursuerView {
                    id: pursuer.id,
                    x: pursuer.motion.pos.x,
                    y: pursuer.motion.pos.y,
                    size: pursuer.motion.size,
                    dir: pursuer.motion.current_dir,
                    frightened,
                    palette: pursuer.palette,
                })
                .collect(),
            items: self
                .items
                .iter()
                .map(|cell| pickup_view(*cell, cell_size, ITEM_SIZE))
                .collect(),
            power_items: self
                .power_items
                .iter()
                .map(|cell| pickup_view(*cell, cell_size, POWER_ITEM_SIZE))
                .collect(),
            events: if include_events {
                std::mem::take(&mut self.events)
            } else {
                Vec::new()
            },
        }
    }

    pub fn build_summary(&self) -> GameSummary {
        GameSummary {
            reason: self.end_reason,
            duration_ms: self.elapsed_ms,
            ticks: self.tick_counter,
            score: self.session.score,
            lives: self.session.lives,
            items_left: self.items.len(),
            pursuers_left: self.pursuers.iter().flatten().count(),
            phase_index: self.session.phase_index,
        }
    }

    fn apply_timers(&mut self, now_ms: u64) {
        for fired in self.session.advance_timers(now_ms) {
            match fired {
                TimerEvent::ModeSwitched { mode, phase_index } => {
                    self.events
                        .push(RuntimeEvent::ModeChanged { mode, phase_index });
                }
                TimerEvent::PowerExpired => {
                    debug!(tick = self.tick_counter, "power expired");
                    self.events.push(RuntimeEvent::PowerExpired);
                }
                TimerEvent::MouthToggled => {
                    if let Some(player) = self.player.as_mut() {
                        player.mouth_open = !player.mouth_open;
                    }
                }
            }
        }
    }

    fn compact_registration(&mut self) {
        let pursuers = &self.pursuers;
        let player_alive = self.player.is_some();
        self.registration.retain(|actor| match actor {
            ActorRef::Player => player_alive,
            ActorRef::Pursuer(slot) => matches!(pursuers.get(*slot), Some(Some(_))),
        });
    }

    fn check_game_over(&mut self) {
        let reason = if self.session.won {
            GameOverReason::Victory
        } else if self.player.is_none() {
            GameOverReason::LivesExhausted
        } else {
            return;
        };
        self.end_reason = Some(reason);
        self.events.push(RuntimeEvent::GameOver { reason });
        info!(
            tick = self.tick_counter,
            elapsed_ms = self.elapsed_ms,
            score = self.session.score,
            reason = ?reason,
            "game over"
        );
    }
}

fn pickup_view(cell: GridPos, cell_size: i32, size: i32) -> PickupView {
    let bounds = pickup_box(cell, cell_size, size);
    PickupView {
        col: cell.col,
        row: cell.row,
        x: bounds.x,
        y: bounds.y,
        size,
    }
}
