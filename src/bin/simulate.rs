use chrono::{SecondsFormat, Utc};
use clap::Parser;
use maze_chase_engine::autopilot;
use maze_chase_engine::collision::CollisionSystem;
use maze_chase_engine::constants::{default_maze_rows, TICK_MS, TICK_RATE};
use maze_chase_engine::engine::{GameEngine, GameEngineOptions};
use maze_chase_engine::types::{GameOverReason, GameSummary, Rect, RuntimeEvent, Snapshot};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_MAX_TICKS: u64 = TICK_RATE as u64 * 60 * 10;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u64>,
    /// Maze file: rectangular rows of `X`, ` `, `O`, `P`, `G`.
    #[arg(long)]
    maze: Option<PathBuf>,
    #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
    max_ticks: u64,
    /// Pace ticks at the real tick rate instead of running flat out.
    #[arg(long)]
    realtime: bool,
    /// Print one JSON snapshot per tick to stdout.
    #[arg(long)]
    emit_snapshots: bool,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Serialize)]
struct EventTally {
    #[serde(rename = "itemsEaten")]
    items_eaten: u32,
    #[serde(rename = "powerItemsTaken")]
    power_items_taken: u32,
    #[serde(rename = "pursuersEaten")]
    pursuers_eaten: u32,
    #[serde(rename = "livesLost")]
    lives_lost: u32,
    #[serde(rename = "modeChanges")]
    mode_changes: u32,
}

impl EventTally {
    fn record(&mut self, events: &[RuntimeEvent]) {
        for event in events {
            match event {
                RuntimeEvent::ItemEaten { .. } => self.items_eaten += 1,
                RuntimeEvent::PowerItemTaken { .. } => self.power_items_taken += 1,
                RuntimeEvent::PursuerEaten { .. } => self.pursuers_eaten += 1,
                RuntimeEvent::LifeLost { .. } => self.lives_lost += 1,
                RuntimeEvent::ModeChanged { .. } => self.mode_changes += 1,
                _ => {}
            }
        }
    }
}

#[derive(Clone, Debug, Serialize)]
struct RunResultLine {
    #[serde(rename = "matchId")]
    match_id: String,
    seed: u64,
    reason: Option<GameOverReason>,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    ticks: u64,
    score: u32,
    lives: u32,
    #[serde(rename = "itemsLeft")]
    items_left: usize,
    #[serde(flatten)]
    tally: EventTally,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    result: RunResultLine,
    session: GameSummary,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    timestamp: String,
    level: String,
    event: String,
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

/// What the previous tick looked like, for the monotonicity checks.
#[derive(Clone, Debug, Default)]
struct Observed {
    score: u32,
    lives: u32,
    items: HashSet<(i32, i32)>,
}

impl Observed {
    fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            score: snapshot.hud.score,
            lives: snapshot.hud.lives,
            items: snapshot.items.iter().map(|item| (item.col, item.row)).collect(),
        }
    }
}

struct RunOutcome {
    result: RunResultLine,
    session: GameSummary,
    anomaly_records: Vec<AnomalyRecord>,
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let seed = cli.seed.unwrap_or_else(rand::random);
    let started_at = Utc::now();
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed, started_at.timestamp_millis()));

    let maze_rows = match load_maze_rows(cli.maze.as_deref()) {
        Ok(rows) => rows,
        Err(error) => {
            emit_log(
                "error",
                "maze_read_failed",
                &match_id,
                Some(seed),
                None,
                json!({
                    "path": cli.maze.as_ref().map(|path| path.to_string_lossy().to_string()),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
    };
    let mut engine = match GameEngine::new(GameEngineOptions { seed, maze_rows }) {
        Ok(engine) => engine,
        Err(error) => {
            emit_log(
                "error",
                "maze_invalid",
                &match_id,
                Some(seed),
                None,
                json!({ "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    };

    let world = engine.get_world_init();
    emit_log(
        "info",
        "run_started",
        &match_id,
        Some(seed),
        None,
        json!({
            "cols": world.cols,
            "rows": world.rows,
            "items": engine.items().len(),
            "maxTicks": cli.max_ticks,
            "realtime": cli.realtime,
        }),
    );

    let outcome = run_session(&mut engine, &cli, &match_id, seed).await;
    for anomaly in &outcome.anomaly_records {
        emit_log(
            "warn",
            "anomaly_detected",
            &match_id,
            Some(seed),
            Some(anomaly.tick),
            json!({ "message": anomaly.message }),
        );
    }
    if outcome.result.reason.is_none() {
        emit_log(
            "warn",
            "tick_limit_reached",
            &match_id,
            Some(seed),
            Some(outcome.result.ticks),
            json!({ "maxTicks": cli.max_ticks }),
        );
    }
    print_json_line(&outcome.result, &match_id);

    let has_anomaly = !outcome.result.anomalies.is_empty();
    let summary = RunSummary {
        started_at: started_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        finished_at: timestamp_now(),
        result: outcome.result,
        session: outcome.session,
        anomaly_records: outcome.anomaly_records,
    };

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &match_id,
                Some(seed),
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &match_id,
        Some(seed),
        Some(summary.result.ticks),
        json!({
            "reason": summary.result.reason,
            "score": summary.result.score,
            "anomalyCount": summary.anomaly_records.len(),
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
}

async fn run_session(engine: &mut GameEngine, cli: &Cli, match_id: &str, seed: u64) -> RunOutcome {
    let mut interval = cli
        .realtime
        .then(|| tokio::time::interval(Duration::from_millis(TICK_MS)));
    let mut tally = EventTally::default();
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut observed = Observed::from_snapshot(&engine.build_snapshot(false));

    while !engine.is_ended() && engine.tick() < cli.max_ticks {
        if let Some(interval) = interval.as_mut() {
            interval.tick().await;
        }
        engine.receive_input(autopilot::choose_direction(engine));
        engine.step(TICK_MS);
        let snapshot = engine.build_snapshot(true);

        for message in collect_snapshot_anomalies(engine.collision(), &observed, &snapshot) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
        tally.record(&snapshot.events);
        for event in &snapshot.events {
            if let RuntimeEvent::ModeChanged { mode, phase_index } = event {
                emit_log(
                    "info",
                    "mode_changed",
                    match_id,
                    Some(seed),
                    Some(snapshot.tick),
                    json!({ "mode": mode, "phaseIndex": phase_index }),
                );
            }
        }
        if cli.emit_snapshots {
            print_json_line(&snapshot, match_id);
        }
        observed = Observed::from_snapshot(&snapshot);
    }

    let session = engine.build_summary();
    RunOutcome {
        result: RunResultLine {
            match_id: match_id.to_string(),
            seed,
            reason: session.reason,
            duration_ms: session.duration_ms,
            ticks: session.ticks,
            score: session.score,
            lives: session.lives,
            items_left: session.items_left,
            tally,
            anomalies,
        },
        session,
        anomaly_records,
    }
}

fn collect_snapshot_anomalies(
    collision: &CollisionSystem,
    previous: &Observed,
    snapshot: &Snapshot,
) -> Vec<String> {
    let mut anomalies = Vec::new();

    if let Some(player) = &snapshot.player {
        if collision.would_collide(Rect::new(player.x, player.y, player.size, player.size)) {
            anomalies.push(format!("player overlaps a wall at ({}, {})", player.x, player.y));
        }
    }
    for pursuer in &snapshot.pursuers {
        if collision.would_collide(Rect::new(pursuer.x, pursuer.y, pursuer.size, pursuer.size)) {
            anomalies.push(format!("pursuer {} overlaps a wall", pursuer.id));
        }
    }

    if snapshot.hud.score < previous.score {
        anomalies.push(format!(
            "score decreased: {} -> {}",
            previous.score, snapshot.hud.score
        ));
    }
    if snapshot.hud.lives > previous.lives {
        anomalies.push(format!(
            "lives increased: {} -> {}",
            previous.lives, snapshot.hud.lives
        ));
    }

    let reappeared: BTreeSet<(i32, i32)> = snapshot
        .items
        .iter()
        .map(|item| (item.col, item.row))
        .filter(|cell| !previous.items.contains(cell))
        .collect();
    for (col, row) in reappeared {
        anomalies.push(format!("item reappeared at ({col}, {row})"));
    }
    anomalies
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn load_maze_rows(path: Option<&Path>) -> io::Result<Vec<String>> {
    let Some(path) = path else {
        return Ok(default_maze_rows());
    };
    let text = std::fs::read_to_string(path)?;
    let mut rows: Vec<String> = text.lines().map(str::to_string).collect();
    while rows.last().is_some_and(|row| row.is_empty()) {
        rows.pop();
    }
    Ok(rows)
}

fn default_match_id(seed: u64, timestamp_ms: i64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn print_json_line<T: Serialize>(value: &T, match_id: &str) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(error) => emit_log(
            "error",
            "serialize_failed",
            match_id,
            None,
            None,
            json!({ "error": error.to_string() }),
        ),
    }
}

fn emit_log(
    level: &str,
    event: &str,
    match_id: &str,
    seed: Option<u64>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp: timestamp_now(),
        level: level.to_string(),
        event: event.to_string(),
        match_id: match_id.to_string(),
        seed,
        tick,
        details,
    };
    match serde_json::to_string(&log_line) {
        Ok(line) => eprintln!("{line}"),
        Err(error) => tracing::error!(%error, event, "structured log failed to serialize"),
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn make_engine() -> GameEngine {
        GameEngine::new(GameEngineOptions {
            seed: 42,
            ..GameEngineOptions::default()
        })
        .expect("default maze parses")
    }

    fn make_summary(engine: &GameEngine) -> RunSummary {
        let session = engine.build_summary();
        RunSummary {
            started_at: timestamp_now(),
            finished_at: timestamp_now(),
            result: RunResultLine {
                match_id: "sim-42-1".to_string(),
                seed: 42,
                reason: session.reason,
                duration_ms: session.duration_ms,
                ticks: session.ticks,
                score: session.score,
                lives: session.lives,
                items_left: session.items_left,
                tally: EventTally::default(),
                anomalies: Vec::new(),
            },
            session,
            anomaly_records: Vec::new(),
        }
    }

    #[test]
    fn default_match_id_contains_seed_and_timestamp() {
        assert_eq!(default_match_id(42, 123456789), "sim-42-123456789");
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let target = std::env::temp_dir()
            .join(format!("maze-chase-missing-{now}"))
            .join("summary.json");
        let summary = make_summary(&make_engine());
        assert!(write_summary(&target, &summary).is_err());
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(&mut anomalies, &mut records, &mut seen, 10, "same anomaly".to_string());
        push_anomaly(&mut anomalies, &mut records, &mut seen, 11, "same anomaly".to_string());

        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tick, 10);
        assert_eq!(records[1].tick, 11);
    }

    #[test]
    fn clean_tick_has_no_anomalies() {
        let mut engine = make_engine();
        let observed = Observed::from_snapshot(&engine.build_snapshot(false));
        engine.step(TICK_MS);
        let snapshot = engine.build_snapshot(true);
        assert!(collect_snapshot_anomalies(engine.collision(), &observed, &snapshot).is_empty());
    }

    #[test]
    fn regressions_are_reported() {
        let mut engine = make_engine();
        let mut snapshot = engine.build_snapshot(false);
        let mut observed = Observed::from_snapshot(&snapshot);
        observed.score = 100;
        observed.lives = 1;
        let restored = snapshot.items.remove(0);
        observed.items.remove(&(restored.col, restored.row));
        snapshot.items.push(restored);
        if let Some(player) = snapshot.player.as_mut() {
            player.x = 0;
            player.y = 0;
        }

        let anomalies = collect_snapshot_anomalies(engine.collision(), &observed, &snapshot);
        assert_eq!(anomalies.len(), 4, "{anomalies:?}");
        assert!(anomalies.iter().any(|a| a.starts_with("player overlaps a wall")));
        assert!(anomalies.iter().any(|a| a.starts_with("score decreased")));
        assert!(anomalies.iter().any(|a| a.starts_with("lives increased")));
        assert!(anomalies.iter().any(|a| a.starts_with("item reappeared")));
    }

    #[test]
    fn tally_counts_runtime_events() {
        let mut tally = EventTally::default();
        tally.record(&[
            RuntimeEvent::ItemEaten { col: 1, row: 1 },
            RuntimeEvent::ItemEaten { col: 2, row: 1 },
            RuntimeEvent::LifeLost { lives_left: 2 },
            RuntimeEvent::PowerExpired,
        ]);
        assert_eq!(tally.items_eaten, 2);
        assert_eq!(tally.lives_lost, 1);
        assert_eq!(tally.pursuers_eaten, 0);
    }

    #[test]
    fn missing_maze_file_is_an_io_error() {
        let path = std::env::temp_dir().join("maze-chase-no-such-maze.txt");
        assert!(load_maze_rows(Some(&path)).is_err());
        assert_eq!(load_maze_rows(None).expect("built-in maze").len(), 22);
    }

    #[tokio::test]
    async fn session_runs_to_the_tick_limit_without_anomalies() {
        let mut engine = make_engine();
        let cli = Cli::parse_from(["simulate", "--max-ticks", "600"]);
        let outcome = run_session(&mut engine, &cli, "sim-42-1", 42).await;
        assert!(outcome.result.ticks <= 600);
        assert!(outcome.result.anomalies.is_empty(), "{:?}", outcome.result.anomalies);
        assert!(outcome.result.tally.items_eaten > 0);
    }
}
