use std::path::Path;

use tracing::{debug, info};

use crate::constants::{DEATH_PAUSE_MS, GHOST_BASE_SCORE, PATH_CACHE_CAPACITY};
use crate::engine::{GhostContext, GhostFleet, GhostTuning};
use crate::error::LearningStoreError;
use crate::learning::PredictionModel;
use crate::maze::Maze;
use crate::pathfinding::PathFinder;
use crate::player::{Player, PlayerStatus, PlayerTuning};
use crate::types::{GhostState, RuntimeEvent, SessionStatus, Snapshot};

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub ghosts: GhostTuning,
    pub player: PlayerTuning,
    pub path_cache_capacity: usize,
    pub death_pause_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ghosts: GhostTuning::default(),
            player: PlayerTuning::default(),
            path_cache_capacity: PATH_CACHE_CAPACITY,
            death_pause_ms: DEATH_PAUSE_MS,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GameSession {
    maze: Maze,
    player: Player,
    fleet: GhostFleet,
    learning: PredictionModel,
    config: SessionConfig,
    status: SessionStatus,
    paused_until_ms: u64,
    tick: u64,
    now_ms: u64,
    events: Vec<RuntimeEvent>,
}

impl GameSession {
    pub fn new(maze: Maze, learning: PredictionModel, config: SessionConfig, now_ms: u64) -> Self {
        let player = Player::new(maze.player_spawn(), config.player.clone(), now_ms);
        let fleet = GhostFleet::spawn(
            &maze,
            &config.ghosts,
            PathFinder::with_capacity(config.path_cache_capacity),
            now_ms,
        );
        Self {
            maze,
            player,
            fleet,
            learning,
            config,
            status: SessionStatus::Playing,
            paused_until_ms: 0,
            tick: 0,
            now_ms,
            events: Vec::new(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_ended(&self) -> bool {
        matches!(
            self.status,
            SessionStatus::GameOver | SessionStatus::LevelComplete
        )
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn fleet(&self) -> &GhostFleet {
        &self.fleet
    }

    pub fn autopilot_parts(&mut self) -> (&Player, &Maze, &mut PathFinder) {
        (&self.player, &self.maze, self.fleet.pathfinder_mut())
    }

    pub fn learning(&self) -> &PredictionModel {
        &self.learning
    }

    pub fn step(&mut self, now_ms: u64) {
        if self.is_ended() {
            return;
        }
        self.tick += 1;
        self.now_ms = self.now_ms.max(now_ms);
        let now_ms = self.now_ms;

        if self.status == SessionStatus::Paused {
            if now_ms < self.paused_until_ms {
                return;
            }
            debug!(tick = self.tick, "resuming after death pause");
            self.status = SessionStatus::Playing;
        }

        let ghost_positions = self.fleet.positions();
        let player_step = self.player.update(
            now_ms,
            &mut self.maze,
            &mut self.learning,
            &ghost_positions,
        );
        if player_step.powered_up {
            self.events.push(RuntimeEvent::PowerUp);
        }

        let ctx = GhostContext {
            maze: &self.maze,
            player: &self.player,
            learning: &self.learning,
        };
        self.fleet.update(now_ms, &ctx);

        self.resolve_collisions(now_ms);

        if self.status == SessionStatus::Playing && self.maze.all_pellets_collected() {
            info!(tick = self.tick, score = self.player.score(), "level complete");
            self.status = SessionStatus::LevelComplete;
            self.events.push(RuntimeEvent::LevelComplete);
        }
    }

    fn resolve_collisions(&mut self, now_ms: u64) {
        let player_pos = self.player.position();
        for idx in 0..self.fleet.ghosts().len() {
            let ghost = &self.fleet.ghosts()[idx];
            if !ghost.is_collidable(now_ms) || ghost.position() != player_pos {
                continue;
            }
            let archetype = ghost.archetype();
            if ghost.state() == GhostState::Frightened {
                self.player.add_score(GHOST_BASE_SCORE);
                self.fleet.ghosts_mut()[idx].reset(now_ms);
                info!(?archetype, "ghost eaten");
                self.events.push(RuntimeEvent::GhostEaten {
                    archetype,
                    score: GHOST_BASE_SCORE,
                });
                continue;
            }

            let out_of_lives = self.player.lose_life();
            info!(?archetype, lives = self.player.lives(), "player caught");
            self.events.push(RuntimeEvent::PlayerHit {
                archetype,
                lives_left: self.player.lives(),
            });
            if out_of_lives {
                self.status = SessionStatus::GameOver;
                self.events.push(RuntimeEvent::GameOver);
            } else {
                self.fleet.reset(now_ms);
                self.status = SessionStatus::Paused;
                self.paused_until_ms = now_ms.saturating_add(self.config.death_pause_ms);
            }
            return;
        }
    }

    pub fn restart(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
        self.maze.reset();
        self.player.restart(self.now_ms);
        self.fleet.reset(self.now_ms);
        self.fleet.clear_path_cache();
        self.status = SessionStatus::Playing;
        self.paused_until_ms = 0;
        self.tick = 0;
        self.events.clear();
    }

    pub fn finish(&self, path: &Path) -> Result<(), LearningStoreError> {
        self.learning.save(path)?;
        info!(
            path = %path.display(),
            moves = self.learning.move_count(),
            phase = self.learning.phase(),
            "learning data saved"
        );
        Ok(())
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            tick: self.tick,
            now_ms: self.now_ms,
            status: self.status,
            learning_phase: self.learning.phase(),
            pellets_remaining: self.maze.pellets_remaining(),
            player: self.player.view(),
            ghosts: self.fleet.views(),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }
}
