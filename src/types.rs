use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::None => (0, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GridPos {
    pub col: i32,
    pub row: i32,
}

impl GridPos {
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    pub fn to_pixel(self, cell_size: i32) -> PixelPos {
        PixelPos {
            x: self.col * cell_size,
            y: self.row * cell_size,
        }
    }

    pub fn manhattan(self, other: GridPos) -> i32 {
        (self.col - other.col).abs() + (self.row - other.row).abs()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct PixelPos {
    pub x: i32,
    pub y: i32,
}

impl PixelPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn to_grid(self, cell_size: i32) -> GridPos {
        GridPos {
            col: self.x.div_euclid(cell_size),
            row: self.y.div_euclid(cell_size),
        }
    }

    pub fn stepped(self, dir: Direction) -> PixelPos {
        let (dx, dy) = dir.delta();
        PixelPos {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Axis-aligned box. Boxes that only share an edge do not overlap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn square(pos: PixelPos, size: i32) -> Self {
        Self::new(pos.x, pos.y, size, size)
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        if self.w <= 0 || self.h <= 0 || other.w <= 0 || other.h <= 0 {
            return false;
        }
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorMode {
    Scatter,
    Chase,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PursuerPalette {
    Red,
    Pink,
    Orange,
    Blue,
}

impl PursuerPalette {
    pub fn for_spawn_index(index: usize) -> Self {
        match index % 4 {
            0 => Self::Red,
            1 => Self::Pink,
            2 => Self::Orange,
            _ => Self::Blue,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    Victory,
    LivesExhausted,
}

#[derive(Clone, Debug, Serialize)]
pub struct PhaseView {
    #[serde(rename = "scatterMs")]
    pub scatter_ms: u64,
    #[serde(rename = "chaseMs")]
    pub chase_ms: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameConfig {
    #[serde(rename = "tickRate")]
    pub tick_rate: u32,
    #[serde(rename = "cellSize")]
    pub cell_size: i32,
    #[serde(rename = "startingLives")]
    pub starting_lives: u32,
    #[serde(rename = "powerDurationMs")]
    pub power_duration_ms: u64,
    #[serde(rename = "mouthToggleMs")]
    pub mouth_toggle_ms: u64,
    pub phases: Vec<PhaseView>,
    pub seed: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct WorldInit {
    pub cols: i32,
    pub rows: i32,
    #[serde(rename = "cellSize")]
    pub cell_size: i32,
    pub tiles: Vec<String>,
    pub walls: Vec<Rect>,
    pub config: GameConfig,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
    pub size: i32,
    pub dir: Direction,
    #[serde(rename = "mouthOpen")]
    pub mouth_open: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct PursuerView {
    pub id: usize,
    pub x: i32,
    pub y: i32,
    pub size: i32,
    pub dir: Direction,
    pub frightened: bool,
    pub palette: PursuerPalette,
}

#[derive(Clone, Debug, Serialize)]
pub struct PickupView {
    pub col: i32,
    pub row: i32,
    pub x: i32,
    pub y: i32,
    pub size: i32,
}

#[derive(Clone, Debug, Serialize)]
pub struct HudView {
    pub score: u32,
    pub lives: u32,
    pub mode: BehaviorMode,
    #[serde(rename = "powerActive")]
    pub power_active: bool,
    #[serde(rename = "phaseIndex")]
    pub phase_index: usize,
    pub won: bool,
    #[serde(rename = "gameOver")]
    pub game_over: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    ItemEaten {
        col: i32,
        row: i32,
    },
    PowerItemTaken {
        col: i32,
        row: i32,
    },
    PowerExpired,
    PursuerEaten {
        #[serde(rename = "pursuerId")]
        pursuer_id: usize,
    },
    LifeLost {
        #[serde(rename = "livesLeft")]
        lives_left: u32,
    },
    ModeChanged {
        mode: BehaviorMode,
        #[serde(rename = "phaseIndex")]
        phase_index: usize,
    },
    Victory,
    GameOver {
        reason: GameOverReason,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
    pub hud: HudView,
    pub player: Option<PlayerView>,
    pub pursuers: Vec<PursuerView>,
    pub items: Vec<PickupView>,
    #[serde(rename = "powerItems")]
    pub power_items: Vec<PickupView>,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    pub reason: Option<GameOverReason>,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    pub ticks: u64,
    pub score: u32,
    pub lives: u32,
    #[serde(rename = "itemsLeft")]
    pub items_left: usize,
    #[serde(rename = "pursuersLeft")]
    pub pursuers_left: usize,
    #[serde(rename = "phaseIndex")]
    pub phase_index: usize,
}
