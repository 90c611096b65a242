use super::*;

use crate::constants::{FALLBACK_SPAWN_BASE, REQUIRED_GHOSTS};
use crate::maze::Maze;

impl GhostFleet {
    pub fn spawn(maze: &Maze, tuning: &GhostTuning, pathfinder: PathFinder, now_ms: u64) -> Self {
        let spawns = resolve_spawn_points(maze.ghost_spawn_points());
        for tile in blocked_spawns(maze, &spawns) {
            warn!(?tile, "ghost spawn is off the grid or in a wall, ghost will not move");
        }
        let ghosts = GhostArchetype::ALL
            .iter()
            .zip(spawns)
            .map(|(archetype, spawn)| {
                debug!(?archetype, ?spawn, "ghost spawned");
                GhostController::new(*archetype, spawn, tuning.clone(), now_ms)
            })
            .collect();
        Self::new(ghosts, pathfinder)
    }
}

pub(super) fn blocked_spawns<G: GridOracle + ?Sized>(grid: &G, spawns: &[Tile]) -> Vec<Tile> {
    spawns
        .iter()
        .copied()
        .filter(|tile| !grid.is_valid_move(*tile))
        .collect()
}

pub(super) fn resolve_spawn_points(declared: &[Tile]) -> Vec<Tile> {
    let mut spawns: Vec<Tile> = declared.iter().copied().take(REQUIRED_GHOSTS).collect();
    let base = FALLBACK_SPAWN_BASE;
    let mut skipped = 0i32;
    while spawns.len() < REQUIRED_GHOSTS {
        let n = spawns.len() as i32 + skipped;
        let candidates = [
            Tile::new(base.x + 2 * (n % 2), base.y + 2 * (n / 2)),
            Tile::new(base.x + 2 * (n % 3), base.y + 2 * (n / 3) + 1),
        ];
        match candidates.into_iter().find(|tile| !spawns.contains(tile)) {
            Some(tile) => {
                warn!(
                    declared = declared.len(),
                    ?tile,
                    "not enough ghost spawn points, synthesizing one"
                );
                spawns.push(tile);
            }
            None => skipped += 1,
        }
    }
    spawns
}
