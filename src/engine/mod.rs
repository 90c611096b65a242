use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};

use crate::constants::{
    frightened_move_interval_ms, GHOST_FRIGHTENED_SPEED_RATIO, GHOST_MOVE_INTERVAL_MS,
    GHOST_RESPAWN_DELAY_MS, MIN_PREDICTION_PHASE, POST_RESPAWN_CHASE_MS, PREDICTION_RADIUS,
};
use crate::learning::PredictionModel;
use crate::maze::GridOracle;
use crate::pathfinding::{is_well_formed_path, PathFinder};
use crate::player::PlayerStatus;
use crate::types::{GhostArchetype, GhostColor, GhostState, GhostView, Tile};

pub mod policy;
mod spawn_system;

#[derive(Clone, Debug)]
pub struct GhostTuning {
    pub move_interval_ms: u64,
    pub frightened_speed_ratio: f32,
    pub respawn_delay_ms: u64,
    pub post_respawn_chase_ms: u64,
    pub prediction_radius: i32,
    pub min_prediction_phase: usize,
}

impl Default for GhostTuning {
    fn default() -> Self {
        Self {
            move_interval_ms: GHOST_MOVE_INTERVAL_MS,
            frightened_speed_ratio: GHOST_FRIGHTENED_SPEED_RATIO,
            respawn_delay_ms: GHOST_RESPAWN_DELAY_MS,
            post_respawn_chase_ms: POST_RESPAWN_CHASE_MS,
            prediction_radius: PREDICTION_RADIUS,
            min_prediction_phase: MIN_PREDICTION_PHASE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GhostSnapshot {
    pub position: Tile,
    pub next_tile: Option<Tile>,
}

pub struct GhostContext<'a> {
    pub maze: &'a dyn GridOracle,
    pub player: &'a dyn PlayerStatus,
    pub learning: &'a PredictionModel,
}

#[derive(Clone, Debug)]
pub struct GhostController {
    archetype: GhostArchetype,
    spawn: Tile,
    position: Tile,
    state: GhostState,
    path: VecDeque<Tile>,
    tuning: GhostTuning,
    last_move_ms: u64,
    respawn_at_ms: Option<u64>,
    post_respawn_until_ms: Option<u64>,
}

impl GhostController {
    pub fn new(archetype: GhostArchetype, spawn: Tile, tuning: GhostTuning, now_ms: u64) -> Self {
        Self {
            archetype,
            spawn,
            position: spawn,
            state: GhostState::Chase,
            path: VecDeque::new(),
            tuning,
            last_move_ms: now_ms,
            respawn_at_ms: None,
            post_respawn_until_ms: None,
        }
    }

    pub fn archetype(&self) -> GhostArchetype {
        self.archetype
    }

    pub fn color(&self) -> GhostColor {
        self.archetype.color()
    }

    pub fn position(&self) -> Tile {
        self.position
    }

    pub fn spawn(&self) -> Tile {
        self.spawn
    }

    pub fn state(&self) -> GhostState {
        self.state
    }

    pub fn path(&self) -> &VecDeque<Tile> {
        &self.path
    }

    pub fn snapshot(&self) -> GhostSnapshot {
        GhostSnapshot {
            position: self.position,
            next_tile: self.path.front().copied(),
        }
    }

    pub fn view(&self) -> GhostView {
        GhostView {
            archetype: self.archetype,
            color: self.color(),
            x: self.position.x,
            y: self.position.y,
            state: self.state,
            path_len: self.path.len(),
        }
    }

    pub fn is_holding(&self, now_ms: u64) -> bool {
        self.respawn_at_ms
            .map(|at| now_ms.saturating_sub(at) < self.tuning.respawn_delay_ms)
            .unwrap_or(false)
    }

    pub fn is_collidable(&self, now_ms: u64) -> bool {
        !self.is_holding(now_ms)
    }

    pub fn move_interval_ms(&self) -> u64 {
        match self.state {
            GhostState::Frightened => frightened_move_interval_ms(
                self.tuning.move_interval_ms,
                self.tuning.frightened_speed_ratio,
            ),
            _ => self.tuning.move_interval_ms,
        }
    }

    pub fn reset(&mut self, now_ms: u64) {
        self.position = self.spawn;
        self.state = GhostState::RespawnHold;
        self.path.clear();
        self.last_move_ms = now_ms;
        self.respawn_at_ms = Some(now_ms);
        self.post_respawn_until_ms = Some(
            now_ms
                .saturating_add(self.tuning.respawn_delay_ms)
                .saturating_add(self.tuning.post_respawn_chase_ms),
        );
    }

    pub fn update(
        &mut self,
        now_ms: u64,
        ctx: &GhostContext<'_>,
        siblings: &[GhostSnapshot],
        pathfinder: &mut PathFinder,
    ) {
        if self.is_holding(now_ms) {
            self.state = GhostState::RespawnHold;
            return;
        }

        let player_pos = ctx.player.position();
        let in_post_respawn = self
            .post_respawn_until_ms
            .map(|until| now_ms < until)
            .unwrap_or(false);

        if in_post_respawn {
            self.state = GhostState::PostRespawnChase;
            self.plan_toward(player_pos, ctx.maze, pathfinder);
        } else if ctx.player.is_powered_up() {
            self.state = GhostState::Frightened;
            self.plan_flight(player_pos, ctx.maze);
        } else {
            self.state = GhostState::Chase;
            let target = self.chase_target(ctx, siblings);
            self.plan_toward(target, ctx.maze, pathfinder);
        }

        if now_ms.saturating_sub(self.last_move_ms) >= self.move_interval_ms() {
            self.advance(ctx.maze, siblings);
            self.last_move_ms = now_ms;
        }
    }

    fn chase_target(&self, ctx: &GhostContext<'_>, siblings: &[GhostSnapshot]) -> Tile {
        let sibling_positions: Vec<Tile> = siblings.iter().map(|s| s.position).collect();
        let target = policy::chase_target(self.archetype, ctx.player, ctx.maze, &sibling_positions);

        let player_pos = ctx.player.position();
        if ctx.learning.phase() >= self.tuning.min_prediction_phase
            && self.position.manhattan(player_pos) < self.tuning.prediction_radius
        {
            let predicted = ctx.learning.predict(self.position, &sibling_positions);
            if predicted != self.position && ctx.maze.is_valid_move(predicted) {
                return predicted;
            }
        }
        target
    }

    fn plan_toward(&mut self, target: Tile, maze: &dyn GridOracle, pathfinder: &mut PathFinder) {
        if target == self.position {
            self.path.clear();
            return;
        }
        let path = pathfinder.find_path(maze, self.position, target, &HashSet::new());
        if is_well_formed_path(maze, self.position, &path) {
            self.path = path.into();
        } else {
            warn!(
                archetype = ?self.archetype,
                from = ?self.position,
                ?target,
                "discarding malformed path"
            );
            self.path.clear();
        }
    }

    fn plan_flight(&mut self, player_pos: Tile, maze: &dyn GridOracle) {
        let mut best: Option<(Tile, i32)> = None;
        let mut best_distance = self.position.manhattan(player_pos);
        for next in maze.valid_adjacent_tiles(self.position) {
            let distance = next.manhattan(player_pos);
            if distance > best_distance {
                best_distance = distance;
                best = Some((next, distance));
            }
        }
        self.path.clear();
        if let Some((tile, _)) = best {
            self.path.push_back(tile);
        }
    }

    fn advance(&mut self, maze: &dyn GridOracle, siblings: &[GhostSnapshot]) {
        let Some(next) = self.path.front().copied() else {
            return;
        };
        let contested = siblings
            .iter()
            .any(|sibling| sibling.position == next || sibling.next_tile == Some(next));
        if !contested {
            self.position = next;
            self.path.pop_front();
            return;
        }

        let detour = maze
            .valid_adjacent_tiles(self.position)
            .into_iter()
            .find(|tile| *tile != next && siblings.iter().all(|s| s.position != *tile));
        match detour {
            Some(tile) => {
                debug!(archetype = ?self.archetype, blocked = ?next, ?tile, "detouring");
                self.position = tile;
            }
            None => {
                debug!(archetype = ?self.archetype, blocked = ?next, "holding, no detour");
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct GhostFleet {
    ghosts: Vec<GhostController>,
    pathfinder: PathFinder,
}

impl GhostFleet {
    pub fn new(ghosts: Vec<GhostController>, pathfinder: PathFinder) -> Self {
        Self { ghosts, pathfinder }
    }

    pub fn ghosts(&self) -> &[GhostController] {
        &self.ghosts
    }

    pub fn ghosts_mut(&mut self) -> &mut [GhostController] {
        &mut self.ghosts
    }

    pub fn pathfinder(&self) -> &PathFinder {
        &self.pathfinder
    }

    pub fn pathfinder_mut(&mut self) -> &mut PathFinder {
        &mut self.pathfinder
    }

    pub fn positions(&self) -> Vec<Tile> {
        self.ghosts.iter().map(|ghost| ghost.position()).collect()
    }

    pub fn views(&self) -> Vec<GhostView> {
        self.ghosts.iter().map(|ghost| ghost.view()).collect()
    }

    pub fn update(&mut self, now_ms: u64, ctx: &GhostContext<'_>) {
        for idx in 0..self.ghosts.len() {
            let siblings: Vec<GhostSnapshot> = self
                .ghosts
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != idx)
                .map(|(_, ghost)| ghost.snapshot())
                .collect();
            self.ghosts[idx].update(now_ms, ctx, &siblings, &mut self.pathfinder);
        }
    }

    pub fn reset(&mut self, now_ms: u64) {
        for ghost in &mut self.ghosts {
            ghost.reset(now_ms);
        }
    }

    pub fn clear_path_cache(&mut self) {
        self.pathfinder.clear_cache();
    }
}
