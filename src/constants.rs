use crate::types::Tile;

pub const GHOST_MOVE_INTERVAL_MS: u64 = 220;
pub const GHOST_FRIGHTENED_SPEED_RATIO: f32 = 0.5;
pub const GHOST_RESPAWN_DELAY_MS: u64 = 500;
pub const POST_RESPAWN_CHASE_MS: u64 = 2_000;
pub const PREDICTION_RADIUS: i32 = 8;
pub const MIN_PREDICTION_PHASE: usize = 0;

pub const PLAYER_MOVE_INTERVAL_MS: u64 = 100;
pub const POWER_DURATION_MS: u64 = 3_000;
pub const PLAYER_LIVES: i32 = 3;
pub const DEATH_PAUSE_MS: u64 = 1_000;

pub const PELLET_SCORE: i32 = 10;
pub const POWER_PELLET_SCORE: i32 = 50;
pub const GHOST_BASE_SCORE: i32 = 200;

pub const PATH_CACHE_CAPACITY: usize = 1_000;
pub const AVOID_SAFETY_RADIUS: i32 = 2;
pub const ESCAPE_MAX_HOPS: usize = 10;
pub const PELLET_SAFE_DISTANCE: i32 = 10;
pub const AUTOPILOT_DANGER_DISTANCE: i32 = 4;

pub const MAX_LEARNING_HISTORY: usize = 200;
pub const SEED_LEARNING_PHASE: usize = 1;
pub const NEARBY_GHOST_RADIUS: i32 = 2;
pub const CROWDED_GHOST_COUNT: u32 = 2;
pub const CROWDED_MOVE_WEIGHT: f32 = 0.2;
pub const LEARNING_PHASE_THRESHOLDS: [u32; 12] =
    [0, 5, 15, 30, 50, 100, 200, 500, 1000, 2000, 5000, 10000];
pub const LEARNING_DATA_FILE: &str = "learning_data.json";

pub const REQUIRED_GHOSTS: usize = 4;
pub const FALLBACK_SPAWN_BASE: Tile = Tile::new(10, 10);
pub const DEFAULT_PLAYER_SPAWN: Tile = Tile::new(1, 1);

pub const DEFAULT_MAP: [[u8; 20]; 21] = [
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
    [1, 2, 2, 2, 2, 2, 2, 2, 2, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 1],
    [1, 3, 1, 1, 2, 1, 1, 1, 2, 1, 1, 2, 1, 1, 1, 2, 1, 1, 3, 1],
    [1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 1],
    [1, 2, 1, 1, 2, 1, 2, 1, 1, 1, 1, 1, 1, 2, 1, 2, 1, 1, 2, 1],
    [1, 2, 2, 2, 2, 1, 2, 2, 2, 1, 1, 2, 2, 2, 1, 2, 2, 2, 2, 1],
    [1, 1, 1, 1, 2, 1, 1, 1, 0, 1, 1, 0, 1, 1, 1, 2, 1, 1, 1, 1],
    [0, 0, 0, 1, 2, 1, 0, 0, 0, 4, 4, 0, 0, 0, 1, 2, 1, 0, 0, 0],
    [1, 1, 1, 1, 2, 1, 0, 1, 4, 4, 4, 4, 1, 0, 1, 2, 1, 1, 1, 1],
    [0, 0, 0, 0, 2, 0, 0, 1, 4, 4, 4, 4, 1, 0, 0, 2, 0, 0, 0, 0],
    [1, 1, 1, 1, 2, 1, 0, 1, 1, 1, 1, 1, 1, 0, 1, 2, 1, 1, 1, 1],
    [0, 0, 0, 1, 2, 1, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 1, 0, 0, 0],
    [1, 1, 1, 1, 2, 1, 1, 1, 2, 1, 1, 2, 1, 1, 1, 2, 1, 1, 1, 1],
    [1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 1],
    [1, 2, 1, 1, 2, 1, 1, 1, 2, 1, 1, 2, 1, 1, 1, 2, 1, 1, 2, 1],
    [1, 3, 2, 1, 2, 2, 2, 2, 2, 5, 5, 2, 2, 2, 2, 2, 1, 2, 3, 1],
    [1, 1, 2, 1, 2, 1, 2, 1, 1, 1, 1, 1, 1, 2, 1, 2, 1, 2, 1, 1],
    [1, 2, 2, 2, 2, 1, 2, 2, 2, 1, 1, 2, 2, 2, 1, 2, 2, 2, 2, 1],
    [1, 2, 1, 1, 1, 1, 1, 1, 2, 1, 1, 2, 1, 1, 1, 1, 1, 1, 2, 1],
    [1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 1],
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
];

pub fn frightened_move_interval_ms(base_ms: u64, speed_ratio: f32) -> u64 {
    if speed_ratio <= 0.0 {
        return base_ms;
    }
    (base_ms as f32 / speed_ratio).round() as u64
}

pub fn learning_phase_for(move_count: u32, thresholds: &[u32]) -> usize {
    thresholds
        .iter()
        .rposition(|threshold| move_count >= *threshold)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frightened_interval_is_slower_than_base() {
        assert_eq!(frightened_move_interval_ms(220, 0.5), 440);
        assert_eq!(frightened_move_interval_ms(220, 0.0), 220);
    }

    #[test]
    fn phase_is_highest_reached_threshold() {
        assert_eq!(learning_phase_for(0, &LEARNING_PHASE_THRESHOLDS), 0);
        assert_eq!(learning_phase_for(4, &LEARNING_PHASE_THRESHOLDS), 0);
        assert_eq!(learning_phase_for(5, &LEARNING_PHASE_THRESHOLDS), 1);
        assert_eq!(learning_phase_for(29, &LEARNING_PHASE_THRESHOLDS), 2);
        assert_eq!(learning_phase_for(50_000, &LEARNING_PHASE_THRESHOLDS), 11);
    }
}
