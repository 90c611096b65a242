use rand::Rng;
use tracing::debug;

use crate::constants::{
    AUTOPILOT_DANGER_DISTANCE, AVOID_SAFETY_RADIUS, ESCAPE_MAX_HOPS, PLAYER_LIVES,
    PLAYER_MOVE_INTERVAL_MS, POWER_DURATION_MS, POWER_PELLET_SCORE,
};
use crate::learning::PredictionModel;
use crate::maze::{GridOracle, Maze};
use crate::pathfinding::{direction_between, PathFinder};
use crate::types::{Direction, MoveContext, PlayerView, Tile};

pub trait PlayerStatus {
    fn position(&self) -> Tile;
    fn is_powered_up(&self) -> bool;
    fn facing_direction(&self) -> Option<Direction>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub position: Tile,
    pub powered_up: bool,
    pub facing: Option<Direction>,
}

impl PlayerStatus for PlayerSnapshot {
    fn position(&self) -> Tile {
        self.position
    }

    fn is_powered_up(&self) -> bool {
        self.powered_up
    }

    fn facing_direction(&self) -> Option<Direction> {
        self.facing
    }
}

#[derive(Clone, Debug)]
pub struct PlayerTuning {
    pub move_interval_ms: u64,
    pub power_duration_ms: u64,
    pub lives: i32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            move_interval_ms: PLAYER_MOVE_INTERVAL_MS,
            power_duration_ms: POWER_DURATION_MS,
            lives: PLAYER_LIVES,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerStep {
    pub moved: bool,
    pub points: i32,
    pub powered_up: bool,
}

#[derive(Clone, Debug)]
pub struct Player {
    tuning: PlayerTuning,
    spawn: Tile,
    position: Tile,
    direction: Direction,
    next_direction: Direction,
    score: i32,
    lives: i32,
    powered_up: bool,
    power_started_ms: u64,
    last_move_ms: u64,
    last_power_pellet_ms: u64,
}

impl Player {
    pub fn new(spawn: Tile, tuning: PlayerTuning, now_ms: u64) -> Self {
        let lives = tuning.lives;
        Self {
            tuning,
            spawn,
            position: spawn,
            direction: Direction::Right,
            next_direction: Direction::Right,
            score: 0,
            lives,
            powered_up: false,
            power_started_ms: 0,
            last_move_ms: now_ms,
            last_power_pellet_ms: now_ms,
        }
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn add_score(&mut self, points: i32) {
        self.score += points;
    }

    pub fn lives(&self) -> i32 {
        self.lives
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn next_direction(&self) -> Direction {
        self.next_direction
    }

    pub fn set_next_direction(&mut self, dir: Direction) {
        self.next_direction = dir;
    }

    pub fn power_time_left_ms(&self, now_ms: u64) -> u64 {
        if !self.powered_up {
            return 0;
        }
        self.tuning
            .power_duration_ms
            .saturating_sub(now_ms.saturating_sub(self.power_started_ms))
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            x: self.position.x,
            y: self.position.y,
            dir: self.direction,
            score: self.score,
            lives: self.lives,
            powered_up: self.powered_up,
        }
    }

    pub fn update(
        &mut self,
        now_ms: u64,
        maze: &mut Maze,
        learning: &mut PredictionModel,
        ghost_positions: &[Tile],
    ) -> PlayerStep {
        if self.powered_up
            && now_ms.saturating_sub(self.power_started_ms) > self.tuning.power_duration_ms
        {
            self.powered_up = false;
        }
        if now_ms.saturating_sub(self.last_move_ms) < self.tuning.move_interval_ms {
            return PlayerStep::default();
        }
        self.last_move_ms = now_ms;
        self.step(now_ms, maze, learning, ghost_positions)
    }

    fn step(
        &mut self,
        now_ms: u64,
        maze: &mut Maze,
        learning: &mut PredictionModel,
        ghost_positions: &[Tile],
    ) -> PlayerStep {
        let previous = self.position;
        let previous_direction = self.direction;
        let taken = [self.next_direction, self.direction]
            .into_iter()
            .find(|dir| maze.is_valid_move(previous.offset(*dir)));

        let mut step = PlayerStep::default();
        if let Some(dir) = taken {
            self.position = previous.offset(dir);
            self.direction = dir;
            step.moved = true;
        }

        let points = maze.collect_pellet(self.position);
        self.score += points;
        step.points = points;
        if points == POWER_PELLET_SCORE {
            self.powered_up = true;
            self.power_started_ms = now_ms;
            step.powered_up = true;
            let interval_ms = now_ms.saturating_sub(self.last_power_pellet_ms);
            learning.record_power_pellet_interval(interval_ms as f64 / 1000.0);
            self.last_power_pellet_ms = now_ms;
        }

        if step.moved {
            let context = MoveContext {
                direction: Some(self.direction),
                next_direction: Some(self.next_direction),
                is_corner: self.direction != previous_direction,
                score: self.score,
            };
            learning.record_move(previous, self.position, context, ghost_positions);
        }
        step
    }

    pub fn lose_life(&mut self) -> bool {
        self.lives -= 1;
        self.respawn();
        self.lives <= 0
    }

    pub fn restart(&mut self, now_ms: u64) {
        self.respawn();
        self.score = 0;
        self.lives = self.tuning.lives;
        self.last_move_ms = now_ms;
        self.last_power_pellet_ms = now_ms;
    }

    fn respawn(&mut self) {
        self.position = self.spawn;
        self.direction = Direction::Right;
        self.next_direction = Direction::Right;
        self.powered_up = false;
    }
}

impl PlayerStatus for Player {
    fn position(&self) -> Tile {
        self.position
    }

    fn is_powered_up(&self) -> bool {
        self.powered_up
    }

    fn facing_direction(&self) -> Option<Direction> {
        Some(self.direction)
    }
}

pub fn autopilot_direction<R: Rng>(
    player: &Player,
    maze: &Maze,
    ghost_positions: &[Tile],
    pathfinder: &mut PathFinder,
    rng: &mut R,
) -> Option<Direction> {
    let position = player.position();
    let threatened = !player.is_powered_up()
        && ghost_positions
            .iter()
            .any(|ghost| ghost.manhattan(position) <= AUTOPILOT_DANGER_DISTANCE);

    if threatened {
        let route = pathfinder.find_escape_route(maze, position, ghost_positions, ESCAPE_MAX_HOPS);
        if let Some(dir) = route.first().and_then(|next| direction_between(position, *next)) {
            debug!(?position, ?dir, "autopilot escaping");
            return Some(dir);
        }
    }

    let pellets = maze.pellet_positions();
    let pellet_path = pathfinder.find_pellet_path(maze, position, &pellets, ghost_positions);
    if let Some(target) = pellet_path.last().copied() {
        let safe = pathfinder.find_path_avoiding_agents(
            maze,
            position,
            target,
            ghost_positions,
            AVOID_SAFETY_RADIUS,
        );
        let path = if safe.is_empty() { &pellet_path } else { &safe };
        if let Some(dir) = path.first().and_then(|next| direction_between(position, *next)) {
            return Some(dir);
        }
    }

    let options: Vec<Tile> = maze.valid_adjacent_tiles(position);
    if options.is_empty() {
        return None;
    }
    let pick = options[rng.random_range(0..options.len())];
    direction_between(position, pick)
}
