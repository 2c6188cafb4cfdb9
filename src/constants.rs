pub const CELL_SIZE: i32 = 32;

pub const TICK_RATE: u32 = 120;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const STARTING_LIVES: u32 = 3;
pub const ITEM_SCORE: u32 = 10;
pub const POWER_ITEM_SCORE: u32 = 50;
pub const PURSUER_SCORE: u32 = 400;

pub const ITEM_SIZE: i32 = 4;
pub const POWER_ITEM_SIZE: i32 = 8;

pub const POWER_DURATION_MS: u64 = 10_000;
pub const MOUTH_TOGGLE_MS: u64 = 200;

/// (scatter seconds, chase seconds) per phase. The last entry repeats forever.
pub const PHASE_TABLE: [(u64, u64); 4] = [(7, 99_999), (7, 100), (5, 100), (5, 999_999)];

pub const DEFAULT_MAZE: [&str; 22] = [
    "XXXXXXXXXXXXXXXXXXXXXXXXXXXX",
    "XP           XX            X",
    "X XXXX XXXXX XX XXXXX XXXX X",
    "X XXXXOXXXXX XX XXXXXOXXXX X",
    "X XXXX XXXXX XX XXXXX XXXX X",
    "X                          X",
    "X XXXX XX XXXXXXXX XX XXXX X",
    "X XXXX XX XXXXXXXX XX XXXX X",
    "X      XX    XX    XX      X",
    "XXXXXX XXXXX XX XXXXX XXXXXX",
    "XXXXXX XXXXX XX XXXXX XXXXXX",
    "XXXXXX XX     G    XX XXXXXX",
    "XXXXXX XX XXX  XXX XX XXXXXX",
    "XXXXXX XX X      X XX XXXXXX",
    "   G      X      X          ",
    "XXX XX XX X      X XX XX XXX",
    "XXX XX XX XXXXXXXX XX XX XXX",
    "XXX    XX    G     XX    XXX",
    "XXX XX XX XXXXXXXX XX XX XXX",
    "XXX XXOXX XXXXXXXX XXOXX XXX",
    "XXX          G           XXX",
    "XXXXXXXXXXXXXXXXXXXXXXXXXXXX",
];

pub fn phase_durations_ms(phase_index: usize) -> (u64, u64) {
    let (scatter, chase) = PHASE_TABLE[phase_index.min(PHASE_TABLE.len() - 1)];
    (scatter * 1000, chase * 1000)
}

pub fn default_maze_rows() -> Vec<String> {
    DEFAULT_MAZE.iter().map(|row| row.to_string()).collect()
}
