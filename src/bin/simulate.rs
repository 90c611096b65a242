use adaptive_ghost_ai::clock::{Clock, ManualClock, MonotonicClock};
use adaptive_ghost_ai::constants::LEARNING_DATA_FILE;
use adaptive_ghost_ai::learning::{LearningConfig, PredictionModel};
use adaptive_ghost_ai::maze::Maze;
use adaptive_ghost_ai::player::autopilot_direction;
use adaptive_ghost_ai::session::{GameSession, SessionConfig};
use adaptive_ghost_ai::types::{RuntimeEvent, SessionStatus, Snapshot};
use chrono::{DateTime, Utc};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, default_value_t = 6_000)]
    ticks: u64,
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    maze: Option<PathBuf>,
    #[arg(long, default_value = LEARNING_DATA_FILE)]
    learning_data: PathBuf,
    #[arg(long)]
    realtime: bool,
    #[arg(long, default_value_t = 0)]
    snapshot_every: u64,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct RunStats {
    ghosts_eaten: u32,
    player_hits: u32,
    power_ups: u32,
}

impl RunStats {
    fn absorb(&mut self, snapshot: &Snapshot) {
        for event in &snapshot.events {
            match event {
                RuntimeEvent::GhostEaten { .. } => self.ghosts_eaten += 1,
                RuntimeEvent::PlayerHit { .. } => self.player_hits += 1,
                RuntimeEvent::PowerUp => self.power_ups += 1,
                _ => {}
            }
        }
    }
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    seed: u64,
    status: SessionStatus,
    ticks: u64,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    score: i32,
    lives: i32,
    #[serde(rename = "pelletsRemaining")]
    pellets_remaining: usize,
    #[serde(rename = "learningPhase")]
    learning_phase: usize,
    #[serde(rename = "moveCount")]
    move_count: u32,
    #[serde(rename = "ghostsEaten")]
    ghosts_eaten: u32,
    #[serde(rename = "playerHits")]
    player_hits: u32,
    #[serde(rename = "powerUps")]
    power_ups: u32,
    #[serde(rename = "finishedAt")]
    finished_at: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("adaptive_ghost_ai=info,simulate=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let maze = match load_maze(cli.maze.as_deref()) {
        Ok(maze) => maze,
        Err(error) => {
            error!(%error, "failed to read maze file");
            std::process::exit(2);
        }
    };
    let seed = cli.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let learning = PredictionModel::open(&cli.learning_data, LearningConfig::default());
    info!(
        seed,
        phase = learning.phase(),
        moves = learning.move_count(),
        "simulation starting"
    );

    let (mut session, stats, started_ms, finished_ms) = if cli.realtime {
        let clock = MonotonicClock::new();
        let pace = Duration::from_millis(cli.tick_ms);
        run(&cli, maze, learning, &mut rng, &clock, |_| {
            std::thread::sleep(pace)
        })
    } else {
        let clock = ManualClock::new(0);
        run(&cli, maze, learning, &mut rng, &clock, |clock| {
            clock.advance(cli.tick_ms)
        })
    };

    if let Err(error) = session.finish(&cli.learning_data) {
        warn!(path = %cli.learning_data.display(), %error, "failed to save learning data");
    }

    let summary = build_run_summary(
        seed,
        &mut session,
        &stats,
        finished_ms.saturating_sub(started_ms),
        Utc::now(),
    );
    match serde_json::to_string(&summary) {
        Ok(line) => println!("{line}"),
        Err(error) => error!(%error, "failed to serialize run summary"),
    }

    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            error!(path = %path.display(), %error, "failed to write run summary");
            std::process::exit(2);
        }
    }
}

fn run<C: Clock>(
    cli: &Cli,
    maze: Maze,
    learning: PredictionModel,
    rng: &mut StdRng,
    clock: &C,
    mut wait: impl FnMut(&C),
) -> (GameSession, RunStats, u64, u64) {
    let started_ms = clock.now_ms();
    let mut session = GameSession::new(maze, learning, SessionConfig::default(), started_ms);
    let mut stats = RunStats::default();

    while !session.is_ended() && session.tick() < cli.ticks {
        wait(clock);
        steer(&mut session, rng);
        session.step(clock.now_ms());

        let snapshot = session.build_snapshot(true);
        stats.absorb(&snapshot);
        if cli.snapshot_every > 0 && snapshot.tick % cli.snapshot_every == 0 {
            match serde_json::to_string(&snapshot) {
                Ok(line) => println!("{line}"),
                Err(error) => warn!(%error, "failed to serialize snapshot"),
            }
        }
    }

    let finished_ms = clock.now_ms();
    (session, stats, started_ms, finished_ms)
}

fn steer(session: &mut GameSession, rng: &mut StdRng) {
    let ghosts = session.fleet().positions();
    let (player, maze, pathfinder) = session.autopilot_parts();
    if let Some(dir) = autopilot_direction(player, maze, &ghosts, pathfinder, rng) {
        session.player_mut().set_next_direction(dir);
    }
}

fn load_maze(path: Option<&Path>) -> io::Result<Maze> {
    match path {
        Some(path) => Ok(Maze::parse(&std::fs::read_to_string(path)?)),
        None => Ok(Maze::default_map()),
    }
}

fn build_run_summary(
    seed: u64,
    session: &mut GameSession,
    stats: &RunStats,
    duration_ms: u64,
    finished_at: DateTime<Utc>,
) -> RunSummary {
    let snapshot = session.build_snapshot(false);
    RunSummary {
        seed,
        status: snapshot.status,
        ticks: snapshot.tick,
        duration_ms,
        score: snapshot.player.score,
        lives: snapshot.player.lives,
        pellets_remaining: snapshot.pellets_remaining,
        learning_phase: snapshot.learning_phase,
        move_count: session.learning().move_count(),
        ghosts_eaten: stats.ghosts_eaten,
        player_hits: stats.player_hits,
        power_ups: stats.power_ups,
        finished_at: finished_at.to_rfc3339(),
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
